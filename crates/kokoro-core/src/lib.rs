pub mod auth;
pub mod calendar;
pub mod entry;
pub mod error;
pub mod mood;
pub mod validators;

// Re-export common error type
pub use error::{KokoroError, Result};
