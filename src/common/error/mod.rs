//! Unified error types for epubtool.
//!
//! This module provides a single error type covering archive access, XML
//! parsing and metadata editing failures.

// Submodule declarations
pub mod types;
pub mod conversions;

// Re-exports
pub use types::{Error, Result};
