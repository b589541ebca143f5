//! texbake Common Utilities
//!
//! Shared infrastructure for all texbake crates:
//! - Error types and result aliases
//! - Injectable wall clock for date tokens and artifact timestamps
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
