use serde::{Deserialize, Serialize};

/// An inbound question event from the chat platform.
///
/// `thread_root` is the platform key of the thread's first message. It is
/// absent for top-level messages, in which case the event's own timestamp
/// roots the thread it starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    pub event_id: String,
    pub channel_id: String,
    pub user_id: String,
    pub text: String,
    pub timestamp: String,
    pub thread_root: Option<String>,
}

impl InboundEvent {
    /// Key identifying the conversation thread this event belongs to.
    pub fn thread_root_key(&self) -> &str {
        self.thread_root.as_deref().unwrap_or(&self.timestamp)
    }
}
