use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Dedup TTL must stay shorter than platform redelivery windows.
pub const DEFAULT_DEDUP_TTL_SECS: u64 = 60;
/// Ceilings sit just under the platform's hard per-message size limit,
/// leaving headroom for the `[i/N]` sequence prefix.
pub const DEFAULT_TEXT_CEILING: usize = 3900;
pub const DEFAULT_CODE_CEILING: usize = 2900;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
/// Workspace list cache tiers: local must expire before shared.
pub const DEFAULT_LOCAL_CACHE_TTL_SECS: u64 = 60;
pub const DEFAULT_SHARED_CACHE_TTL_SECS: u64 = 300;

/// Top-level config (courier.toml + COURIER_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CourierConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub workspaces: WorkspacesConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Seconds an admitted event id blocks redelivery.
    #[serde(default = "default_dedup_ttl")]
    pub ttl_secs: u64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_DEDUP_TTL_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspacesConfig {
    /// Workspace used when the question carries no recognised `#token`.
    #[serde(default = "default_workspace")]
    pub default: String,
    /// Slugs assumed valid when the remote listing call is unreachable.
    #[serde(default = "default_fallback_set")]
    pub fallback: Vec<String>,
    #[serde(default = "default_local_ttl")]
    pub local_ttl_secs: u64,
    #[serde(default = "default_shared_ttl")]
    pub shared_ttl_secs: u64,
}

impl Default for WorkspacesConfig {
    fn default() -> Self {
        Self {
            default: default_workspace(),
            fallback: default_fallback_set(),
            local_ttl_secs: DEFAULT_LOCAL_CACHE_TTL_SECS,
            shared_ttl_secs: DEFAULT_SHARED_CACHE_TTL_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum characters packed into a non-code chunk.
    #[serde(default = "default_text_ceiling")]
    pub text_ceiling: usize,
    /// Maximum characters for a chunk holding a preformatted block.
    #[serde(default = "default_code_ceiling")]
    pub code_ceiling: usize,
    /// Timeout applied to every remote call; a timeout is terminal.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl LimitsConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            text_ceiling: DEFAULT_TEXT_CEILING,
            code_ceiling: DEFAULT_CODE_CEILING,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Replies shorter than this never get rating controls.
    #[serde(default = "default_min_substantive_len")]
    pub min_substantive_len: usize,
    #[serde(default = "bool_true")]
    pub enabled: bool,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            min_substantive_len: default_min_substantive_len(),
            enabled: true,
        }
    }
}

fn bool_true() -> bool {
    true
}
fn default_dedup_ttl() -> u64 {
    DEFAULT_DEDUP_TTL_SECS
}
fn default_workspace() -> String {
    "default".to_string()
}
fn default_fallback_set() -> Vec<String> {
    vec!["default".to_string()]
}
fn default_local_ttl() -> u64 {
    DEFAULT_LOCAL_CACHE_TTL_SECS
}
fn default_shared_ttl() -> u64 {
    DEFAULT_SHARED_CACHE_TTL_SECS
}
fn default_text_ceiling() -> usize {
    DEFAULT_TEXT_CEILING
}
fn default_code_ceiling() -> usize {
    DEFAULT_CODE_CEILING
}
fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
fn default_min_substantive_len() -> usize {
    20
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.courier/courier.db", home)
}

impl CourierConfig {
    /// Load config from a TOML file with COURIER_* env var overrides.
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: CourierConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("COURIER_").split("_"))
            .extract()
            .map_err(|e| crate::error::CourierError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.courier/courier.toml", home)
}
