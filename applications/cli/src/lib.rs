//! Cadence CLI Library
//!
//! Terminal front end for the Cadence playback engine: configuration,
//! the stdin command language, event rendering and command dispatch.
//!
//! This library exposes the core components for testing purposes.

pub mod commands;
pub mod config;
pub mod error;
pub mod render;
pub mod session;

// Re-export commonly used types for convenience
pub use commands::Command;
pub use config::CliConfig;
pub use error::{CliError, Result};
pub use session::{execute, Flow};
