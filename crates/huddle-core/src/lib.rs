//! # Huddle Core
//! Shared foundation for the huddlebot workspace: configuration, the unified
//! error type, channel message types and the `Channel` transport trait.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::HuddleConfig;
pub use error::{HuddleError, Result};
pub use traits::Channel;
pub use types::{IncomingMessage, OutgoingMessage, ThreadType};
