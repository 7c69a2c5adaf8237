//! Scanner configuration and constants.
//!
//! This module provides:
//! - Configuration constants (record prefixes, defaults, limits)
//! - The validated `ScannerConfig` and runtime `ScannerOption`
//! - Validators for DKIM selectors and nameserver addresses
//! - The `dss` command-line options

mod cli;
mod constants;
mod types;
mod validation;

pub use cli::Cli;

// Re-export all constants
pub use constants::*;
pub use types::{
    resolve_concurrency, LogFormat, LogLevel, Protocol, ScannerConfig, ScannerOption,
};
pub use validation::{normalize_nameserver, validate_dkim_selector, validate_dkim_selectors};
