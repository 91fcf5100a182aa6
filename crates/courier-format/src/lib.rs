//! Response formatting: raw LLM markdown → platform-ready message chunks.
//!
//! Stages: [`segment::segment`] splits fenced code out of the text,
//! [`render::render_blocks`] turns segments into styled blocks,
//! [`assemble::assemble`] packs blocks into size-bounded chunks, and
//! [`feedback::FeedbackPolicy`] decides whether the last chunk carries
//! rating controls.

pub mod assemble;
pub mod block;
pub mod feedback;
pub mod render;
pub mod segment;

pub use assemble::assemble;
pub use block::{Block, Chunk, FeedbackControls, Inline};
pub use feedback::FeedbackPolicy;
pub use render::render_blocks;
pub use segment::{segment, Segment};
