//! All bridge data types: messages, errors, capabilities, context, content.

pub mod bridge;
pub mod capabilities;
pub mod content;
pub mod context;
pub mod error;
pub mod message;

// Re-export commonly used types for convenience.
pub use bridge::*;
pub use capabilities::*;
pub use content::*;
pub use context::*;
pub use error::*;
pub use message::*;
