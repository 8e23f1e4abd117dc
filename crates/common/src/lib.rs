//! Storyreel Common Utilities
//!
//! Shared infrastructure for all Storyreel crates:
//! - Error types and result aliases
//! - Time-unit conversions and the host clock used for bundle timestamps
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
