//! Per-event relay pipeline: admit → resolve context → ask the LLM →
//! format → deliver.
//!
//! The HTTP server, webhook wiring and concrete platform clients live
//! outside this crate; they hand events to [`Courier::spawn`] and implement
//! the [`collaborators`] traits.

pub mod app;
pub mod collaborators;
pub mod process;
pub mod resolver;

pub use app::Courier;
pub use collaborators::{CollaboratorError, LlmBackend, Messenger};
pub use process::{process_event, EventContext, EventOutcome, EventPhase};
pub use resolver::{ContextResolver, ResolvedContext, WorkspaceCache};
