//! mailsec_scanner library: email-security record scanning for domains
//!
//! For every domain the scanner collects the records that describe how it
//! protects its mail: BIMI, DKIM, DMARC, SPF, MX and NS. Queries go straight
//! to the configured nameservers over UDP, TCP or DNS over TLS, many domains
//! are scanned concurrently, and results are cached for a configurable time.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use mailsec_scanner::{Protocol, Scanner, ScannerConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ScannerConfig::default()
//!     .concurrency(32)
//!     .protocol(Protocol::TcpTls)
//!     .nameservers(["1.1.1.1:853"])
//!     .cache_duration(Duration::from_secs(300));
//! let scanner = Scanner::new(config)?;
//!
//! for result in scanner.scan(["example.org", "example.com"]).await? {
//!     if result.is_error() {
//!         eprintln!("{}: {}", result.domain, result.error);
//!     } else {
//!         println!("{}: spf={:?} dmarc={:?}", result.domain, result.spf, result.dmarc);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Scans spawn one task per domain, so
//! a multi-threaded runtime is recommended.

pub mod cache;
pub mod config;
pub mod dns;
pub mod error_handling;
pub mod initialization;
pub mod scanner;
pub mod zone;

// Re-export public API
pub use config::{Protocol, ScannerConfig, ScannerOption};
pub use error_handling::{ConfigError, LookupError, ScanError, TransportError, ZoneError};
pub use scanner::{ScanResult, Scanner};

// Record types accepted by `Scanner::lookup`
pub use hickory_proto::rr::RecordType;
