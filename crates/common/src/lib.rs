//! Glance Common Utilities
//!
//! Shared infrastructure for all Glance crates:
//! - Error types and result aliases
//! - Timing helpers that pace the render loop and analysis submissions
//! - Tracing/logging initialization
//! - Configuration and profile loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
