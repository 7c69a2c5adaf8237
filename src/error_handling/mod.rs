//! Error handling.
//!
//! Errors are split by where they arise:
//! - **Configuration**: invalid options or scan input, raised before any query
//! - **Transport**: a single DNS exchange failed
//! - **Lookup**: a record lookup failed (wraps transport errors, recursion limits)
//! - **Zone**: domain names could not be read from the input
//! - **Scan**: a whole `scan` call was refused
//!
//! Per-domain failures never surface as a `ScanError`; they are recorded on
//! that domain's `ScanResult` instead.

mod types;

// Re-export public API
pub use types::{
    ConfigError, InitializationError, LookupError, ScanError, SelectorError, TransportError,
    ZoneError,
};
