//! Core types used throughout the library.

pub mod input;
pub mod message;
pub mod model;

// Re-export commonly used types
pub use input::*;
pub use message::*;
pub use model::*;
