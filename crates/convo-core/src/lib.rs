pub mod auth;
pub mod config;
pub mod enhanced;
pub mod error;
pub mod session;

// Re-export common error type
pub use error::{ChatError, ErrorKind, SurfacedError};
