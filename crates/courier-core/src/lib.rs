pub mod config;
pub mod error;
pub mod event;

pub use config::CourierConfig;
pub use error::{CourierError, Result};
pub use event::InboundEvent;
