use thiserror::Error;

/// Failure taxonomy for a single relayed event.
///
/// Every variant is terminal for its event; there are no automatic retries.
/// Anything shown to the user goes through [`CourierError::user_notice`],
/// which never leaks internal identifiers.
#[derive(Debug, Error)]
pub enum CourierError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Context creation failed: {0}")]
    ContextCreation(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Upstream timeout after {secs}s")]
    UpstreamTimeout { secs: u64 },

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CourierError {
    /// Short error code string used in structured log fields.
    pub fn code(&self) -> &'static str {
        match self {
            CourierError::Config(_) => "CONFIG_ERROR",
            CourierError::ContextCreation(_) => "CONTEXT_CREATION_FAILED",
            CourierError::Upstream(_) => "UPSTREAM_ERROR",
            CourierError::UpstreamTimeout { .. } => "UPSTREAM_TIMEOUT",
            CourierError::Delivery(_) => "DELIVERY_FAILED",
            CourierError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            CourierError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Generic notice posted back to the user. Deliberately vague: no error
    /// codes, stack traces or internal identifiers cross the platform
    /// boundary.
    pub fn user_notice(&self) -> &'static str {
        match self {
            CourierError::UpstreamTimeout { .. } => {
                "Something went wrong: the answer took too long. Please try again."
            }
            _ => "Something went wrong while answering. Please try again.",
        }
    }
}

pub type Result<T> = std::result::Result<T, CourierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_has_no_internals() {
        let err = CourierError::ContextCreation("thread create: HTTP 503 from backend".into());
        let notice = err.user_notice();
        assert!(!notice.contains("503"));
        assert!(!notice.contains("backend"));
    }

    #[test]
    fn code_is_stable_per_variant() {
        assert_eq!(
            CourierError::UpstreamTimeout { secs: 120 }.code(),
            "UPSTREAM_TIMEOUT"
        );
        assert_eq!(
            CourierError::StoreUnavailable("x".into()).code(),
            "STORE_UNAVAILABLE"
        );
    }
}
