//! Resolves a chat thread to its persistent remote conversation, creating
//! it exactly once, plus the two-tier workspace-list cache backing the
//! `#workspace` question marker.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use courier_core::CourierError;
use courier_store::{InsertOutcome, MappingLookup, MappingStore, SharedWorkspaceCache};

use crate::collaborators::LlmBackend;

/// Cached, time-bounded list of valid workspace slugs.
///
/// Tier 1 lives in process memory and expires first; tier 2 is the shared
/// SQLite row other processes refresh too. A full miss fetches from the
/// backend's listing call; total failure falls back to a fixed set.
pub struct WorkspaceCache {
    local: Mutex<Option<(Instant, Vec<String>)>>,
    local_ttl: Duration,
    shared: SharedWorkspaceCache,
    shared_ttl_secs: u64,
    fallback: Vec<String>,
    request_timeout: Duration,
}

impl WorkspaceCache {
    pub fn new(
        shared: SharedWorkspaceCache,
        local_ttl: Duration,
        shared_ttl_secs: u64,
        fallback: Vec<String>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            local: Mutex::new(None),
            local_ttl,
            shared,
            shared_ttl_secs,
            fallback,
            request_timeout,
        }
    }

    /// The current workspace set, fetched through the tiers.
    pub async fn current(&self, backend: &dyn LlmBackend) -> Vec<String> {
        if let Some(slugs) = self.local_fresh() {
            return slugs;
        }

        match self.shared.load(self.shared_ttl_secs) {
            Ok(Some(slugs)) => {
                self.set_local(&slugs);
                return slugs;
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "shared workspace cache unreadable"),
        }

        match tokio::time::timeout(self.request_timeout, backend.list_workspaces()).await {
            Ok(Ok(slugs)) => {
                debug!(count = slugs.len(), "workspace list refreshed from backend");
                if let Err(e) = self.shared.store(&slugs) {
                    warn!(error = %e, "failed to write shared workspace cache");
                }
                self.set_local(&slugs);
                slugs
            }
            Ok(Err(e)) => {
                warn!(error = %e, "workspace listing failed; using fallback set");
                self.fallback.clone()
            }
            Err(_) => {
                warn!("workspace listing timed out; using fallback set");
                self.fallback.clone()
            }
        }
    }

    fn local_fresh(&self) -> Option<Vec<String>> {
        let local = self.local.lock().unwrap();
        match local.as_ref() {
            Some((at, slugs)) if at.elapsed() < self.local_ttl => Some(slugs.clone()),
            _ => None,
        }
    }

    fn set_local(&self, slugs: &[String]) {
        let mut local = self.local.lock().unwrap();
        *local = Some((Instant::now(), slugs.to_vec()));
    }
}

/// The conversation context an event runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContext {
    pub workspace: String,
    pub remote_thread_id: String,
    /// False when an existing mapping was reused.
    pub fresh: bool,
}

/// Maps (channel, thread root) to a remote conversation, creating the
/// remote thread and the mapping row on first contact.
///
/// The insert-if-absent on the mapping table is the only mutual exclusion
/// here; no lock is ever held across the remote thread-creation call.
/// Concurrent first contacts may each create a remote thread, but only the
/// first inserted mapping survives and everyone returns that row (the
/// loser's remote thread is orphaned, which is acceptable at per-thread
/// concurrency levels).
pub struct ContextResolver {
    mappings: MappingStore,
    cache: WorkspaceCache,
    default_workspace: String,
    request_timeout: Duration,
}

impl ContextResolver {
    pub fn new(
        mappings: MappingStore,
        cache: WorkspaceCache,
        default_workspace: String,
        request_timeout: Duration,
    ) -> Self {
        Self {
            mappings,
            cache,
            default_workspace,
            request_timeout,
        }
    }

    pub async fn resolve(
        &self,
        backend: &Arc<dyn LlmBackend>,
        channel_id: &str,
        thread_root: &str,
        query_text: &str,
    ) -> Result<ResolvedContext, CourierError> {
        match self.mappings.lookup(channel_id, thread_root) {
            Ok(MappingLookup::Found(mapping)) => {
                // Best-effort access-time refresh; never blocks or fails
                // the caller.
                let store = self.mappings.clone();
                let (ch, root) = (channel_id.to_string(), thread_root.to_string());
                tokio::spawn(async move {
                    if let Err(e) = store.touch_last_access(&ch, &root) {
                        debug!(error = %e, "last-access touch failed");
                    }
                });
                return Ok(ResolvedContext {
                    workspace: mapping.workspace,
                    remote_thread_id: mapping.remote_thread_id,
                    fresh: false,
                });
            }
            Ok(MappingLookup::Missing) => {}
            Err(e) => {
                // Fail closed: answer without remembered context.
                warn!(error = %e, channel_id, "mapping lookup failed; starting fresh");
            }
        }

        let workspace = self.pick_workspace(backend.as_ref(), query_text).await;

        let remote_thread_id =
            match tokio::time::timeout(self.request_timeout, backend.create_thread(&workspace))
                .await
            {
                Ok(Ok(id)) => id,
                Ok(Err(e)) => return Err(CourierError::ContextCreation(e.to_string())),
                Err(_) => {
                    return Err(CourierError::UpstreamTimeout {
                        secs: self.request_timeout.as_secs(),
                    })
                }
            };

        match self
            .mappings
            .insert_if_absent(channel_id, thread_root, &workspace, &remote_thread_id)
        {
            Ok(InsertOutcome::Inserted(m)) => {
                info!(
                    channel_id,
                    thread_root,
                    workspace = %m.workspace,
                    "bound thread to new remote conversation"
                );
                Ok(ResolvedContext {
                    workspace: m.workspace,
                    remote_thread_id: m.remote_thread_id,
                    fresh: true,
                })
            }
            Ok(InsertOutcome::Lost(m)) => {
                info!(
                    channel_id,
                    thread_root,
                    orphaned = %remote_thread_id,
                    "lost mapping race; adopting surviving conversation"
                );
                Ok(ResolvedContext {
                    workspace: m.workspace,
                    remote_thread_id: m.remote_thread_id,
                    fresh: false,
                })
            }
            Err(e) => {
                // Fail closed: the thread exists remotely but will not be
                // remembered; the next message starts over.
                warn!(error = %e, channel_id, "mapping insert failed; context not persisted");
                Ok(ResolvedContext {
                    workspace,
                    remote_thread_id,
                    fresh: true,
                })
            }
        }
    }

    /// Initial workspace for a brand-new thread: the first `#token` in the
    /// question naming a known workspace, else the configured default.
    async fn pick_workspace(&self, backend: &dyn LlmBackend, query_text: &str) -> String {
        let candidates: Vec<&str> = query_text
            .split_whitespace()
            .filter_map(|word| word.strip_prefix('#'))
            .map(|tag| tag.trim_end_matches(['.', ',', '!', '?', ':', ';']))
            .filter(|tag| !tag.is_empty())
            .collect();

        if candidates.is_empty() {
            return self.default_workspace.clone();
        }

        let known = self.cache.current(backend).await;
        for tag in candidates {
            if let Some(slug) = known.iter().find(|s| s.eq_ignore_ascii_case(tag)) {
                debug!(workspace = %slug, "workspace selected from question marker");
                return slug.clone();
            }
        }
        self.default_workspace.clone()
    }
}
