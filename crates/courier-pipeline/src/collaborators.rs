//! Interfaces to the two remote collaborators. Network details (HTTP
//! clients, auth, retries the platforms themselves perform) stay behind
//! these traits; the pipeline only sees typed results.

use async_trait::async_trait;
use thiserror::Error;

use courier_format::Chunk;

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("api error: {0}")]
    Api(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// The remote LLM backend. Conversations live server-side as workspaces
/// containing persistent threads.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// List the workspace slugs currently valid for this deployment.
    async fn list_workspaces(&self) -> Result<Vec<String>, CollaboratorError>;

    /// Create a persistent conversation thread scoped to `workspace`.
    async fn create_thread(&self, workspace: &str) -> Result<String, CollaboratorError>;

    /// Send one user turn into a thread and return the generated reply.
    async fn chat(
        &self,
        workspace: &str,
        thread_id: &str,
        text: &str,
    ) -> Result<String, CollaboratorError>;
}

/// The chat platform's messaging surface.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Post one chunk into a thread; returns the platform message id.
    async fn post(
        &self,
        channel_id: &str,
        thread_root: &str,
        chunk: &Chunk,
    ) -> Result<String, CollaboratorError>;

    /// Replace the content of an already-posted message.
    async fn update(&self, message_id: &str, chunk: &Chunk) -> Result<(), CollaboratorError>;

    /// Remove an already-posted message.
    async fn delete(&self, message_id: &str) -> Result<(), CollaboratorError>;
}
