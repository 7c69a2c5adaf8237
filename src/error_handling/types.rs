//! Error type definitions.
//!
//! This module defines all error types used throughout the scanner.

use std::time::Duration;

use hickory_proto::error::ProtoError;
use log::SetLoggerError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Reasons a DKIM selector is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("DKIM selector is empty")]
    Empty,

    #[error("DKIM selector length is {0}, can't exceed 63")]
    TooLong(usize),

    #[error("DKIM selector should not start with '{0}'")]
    InvalidStart(char),

    #[error("DKIM selector should not end with '{0}'")]
    InvalidEnd(char),

    #[error("DKIM selector has invalid character '{character}' at offset {offset}")]
    InvalidCharacter { character: char, offset: usize },
}

/// Invalid scanner configuration or scan input.
///
/// Every variant is raised before a single DNS query is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The EDNS0 buffer exceeds the 4096 byte ceiling.
    #[error("DNS buffer size {0} should not be larger than 4096")]
    DnsBufferTooLarge(u16),

    /// An explicitly empty DKIM selector list was supplied.
    #[error("no DKIM selectors provided")]
    NoSelectors,

    /// A DKIM selector failed validation.
    #[error("invalid DKIM selector {selector:?}: {source}")]
    InvalidSelector {
        selector: String,
        #[source]
        source: SelectorError,
    },

    /// A nameserver is not an IP address, optionally with a port.
    #[error("invalid nameserver address: {0}")]
    InvalidNameserver(String),

    /// The nameserver list ended up empty.
    #[error("no nameservers configured")]
    NoNameservers,

    /// The DNS transport protocol name is not recognized.
    #[error("unknown DNS protocol {0:?} (expected udp, tcp or tcp-tls)")]
    UnknownProtocol(String),

    /// A zero per-exchange timeout would fail every query.
    #[error("DNS timeout must be greater than zero")]
    ZeroTimeout,

    /// `scan` was called without domains.
    #[error("no domains provided")]
    NoDomains,

    /// One of the domains passed to `scan` is an empty string.
    #[error("empty domain name provided")]
    EmptyDomain,
}

/// Failure of a single DNS exchange.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Socket or stream failure.
    #[error("network error: {0}")]
    Io(#[from] std::io::Error),

    /// The exchange did not complete within the configured timeout.
    #[error("DNS query timed out after {0:?}")]
    Timeout(Duration),

    /// Message encoding or decoding failed.
    #[error("DNS protocol error: {0}")]
    Proto(#[from] ProtoError),

    /// The response does not belong to the query that was sent.
    #[error("DNS response id {actual} does not match query id {expected}")]
    IdMismatch { expected: u16, actual: u16 },

    /// The nameserver string could not be turned into a socket address.
    #[error("invalid nameserver address: {0}")]
    InvalidNameserver(String),

    /// TLS session setup failed.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// The query does not fit the two-byte TCP length prefix.
    #[error("DNS message too large for TCP framing ({0} bytes)")]
    MessageTooLarge(usize),
}

/// Failure of a record lookup, possibly spanning several exchanges.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// CNAME chain or SPF redirect chain longer than the recursion limit.
    #[error("recursion limit of {limit} reached while resolving {name}")]
    RecursionLimit { name: String, limit: usize },
}

/// Failure while reading domain names out of a zone file or text list.
#[derive(Error, Debug)]
pub enum ZoneError {
    #[error("failed to read zone input: {0}")]
    Io(#[from] std::io::Error),

    #[error("zone syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// `$INCLUDE` would read files the caller did not hand over.
    #[error("$INCLUDE directive on line {line} is not supported")]
    Include { line: usize },
}

/// Failure of a whole scan call (as opposed to a single domain).
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Zone(#[from] ZoneError),

    /// A single raw-record lookup failed.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// The scanner has been closed.
    #[error("scanner is closed")]
    Closed,
}
