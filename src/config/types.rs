//! Configuration types.
//!
//! This module defines the scanner configuration, the options that can be
//! overwritten on a running scanner, and the enums shared with the CLI.

use std::str::FromStr;
use std::time::Duration;

use clap::ValueEnum;
use strum_macros::{Display, EnumString};

use crate::config::constants::{
    DEFAULT_CACHE_DURATION, DEFAULT_DNS_BUFFER, DEFAULT_NAMESERVERS, DEFAULT_TIMEOUT,
    MAX_DNS_BUFFER,
};
use crate::config::validation::{
    normalize_nameserver, validate_dkim_selector, validate_dkim_selectors,
};
use crate::error_handling::ConfigError;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Transport used for DNS exchanges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString, ValueEnum)]
#[strum(serialize_all = "kebab-case")]
pub enum Protocol {
    /// Plain DNS over UDP (default)
    #[default]
    Udp,
    /// Plain DNS over TCP with two-byte length framing
    Tcp,
    /// DNS over TLS (RFC 7858)
    TcpTls,
}

impl Protocol {
    /// Parses a protocol name (`udp`, `tcp`, `tcp-tls`), case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownProtocol` for any other name.
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        <Protocol as FromStr>::from_str(&name.trim().to_ascii_lowercase())
            .map_err(|_| ConfigError::UnknownProtocol(name.to_string()))
    }
}

/// Scanner configuration.
///
/// Build it with struct update syntax or the chained setters, then hand it to
/// [`Scanner::new`](crate::Scanner::new), which validates every field before
/// any network I/O happens.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use mailsec_scanner::{Protocol, ScannerConfig};
///
/// let config = ScannerConfig::default()
///     .concurrency(8)
///     .dkim_selectors(["s1", "s2"])
///     .protocol(Protocol::Tcp)
///     .cache_duration(Duration::ZERO);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerConfig {
    /// Domains scanned at once. 0 means the number of logical CPUs.
    pub concurrency: usize,

    /// Selectors tried before the built-in DKIM selector list.
    pub dkim_selectors: Vec<String>,

    /// EDNS0 buffer size advertised in queries (at most 4096).
    pub dns_buffer: u16,

    /// DNS transport protocol.
    pub protocol: Protocol,

    /// Nameservers to query. Empty means the built-in public resolvers.
    pub nameservers: Vec<String>,

    /// How long scan results are cached. Zero disables the cache.
    pub cache_duration: Duration,

    /// Timeout for a single DNS exchange.
    pub timeout: Duration,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            concurrency: 0,
            dkim_selectors: Vec::new(),
            dns_buffer: DEFAULT_DNS_BUFFER,
            protocol: Protocol::Udp,
            nameservers: Vec::new(),
            cache_duration: DEFAULT_CACHE_DURATION,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ScannerConfig {
    pub fn concurrency(mut self, quota: usize) -> Self {
        self.concurrency = quota;
        self
    }

    pub fn dkim_selectors<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dkim_selectors = selectors.into_iter().map(Into::into).collect();
        self
    }

    pub fn dns_buffer(mut self, size: u16) -> Self {
        self.dns_buffer = size;
        self
    }

    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn nameservers<I, S>(mut self, nameservers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nameservers = nameservers.into_iter().map(Into::into).collect();
        self
    }

    pub fn cache_duration(mut self, duration: Duration) -> Self {
        self.cache_duration = duration;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Checks every field without building anything.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.normalized().map(|_| ())
    }

    /// Returns a validated copy with defaults filled in: the concurrency
    /// quota resolved to a concrete value and nameservers in `host:port` form.
    pub(crate) fn normalized(&self) -> Result<ScannerConfig, ConfigError> {
        if self.dns_buffer > MAX_DNS_BUFFER {
            return Err(ConfigError::DnsBufferTooLarge(self.dns_buffer));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        for selector in &self.dkim_selectors {
            validate_dkim_selector(selector).map_err(|source| ConfigError::InvalidSelector {
                selector: selector.clone(),
                source,
            })?;
        }

        let nameservers = if self.nameservers.is_empty() {
            DEFAULT_NAMESERVERS.iter().map(|ns| ns.to_string()).collect()
        } else {
            self.nameservers
                .iter()
                .map(|ns| normalize_nameserver(ns))
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(ScannerConfig {
            concurrency: resolve_concurrency(self.concurrency),
            nameservers,
            ..self.clone()
        })
    }
}

/// Resolves a concurrency quota, mapping 0 to the number of logical CPUs.
pub fn resolve_concurrency(quota: usize) -> usize {
    if quota > 0 {
        return quota;
    }
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// A single configuration change applied to a running scanner with
/// [`Scanner::overwrite_option`](crate::Scanner::overwrite_option).
///
/// A typical use is a per-request DKIM selector override in an HTTP handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannerOption {
    CacheDuration(Duration),
    Concurrency(usize),
    DkimSelectors(Vec<String>),
    DnsBuffer(u16),
    Protocol(Protocol),
    Nameservers(Vec<String>),
    Timeout(Duration),
}

impl ScannerOption {
    /// Applies the option to `config`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when the new value is invalid; `config` is
    /// left untouched in that case.
    pub fn apply(self, config: &mut ScannerConfig) -> Result<(), ConfigError> {
        match self {
            ScannerOption::CacheDuration(duration) => config.cache_duration = duration,
            ScannerOption::Concurrency(quota) => config.concurrency = quota,
            ScannerOption::DkimSelectors(selectors) => {
                validate_dkim_selectors(&selectors)?;
                config.dkim_selectors = selectors;
            }
            ScannerOption::DnsBuffer(size) => {
                if size > MAX_DNS_BUFFER {
                    return Err(ConfigError::DnsBufferTooLarge(size));
                }
                config.dns_buffer = size;
            }
            ScannerOption::Protocol(protocol) => config.protocol = protocol,
            ScannerOption::Nameservers(nameservers) => {
                let normalized = nameservers
                    .iter()
                    .map(|ns| normalize_nameserver(ns))
                    .collect::<Result<Vec<_>, _>>()?;
                config.nameservers = normalized;
            }
            ScannerOption::Timeout(timeout) => {
                if timeout.is_zero() {
                    return Err(ConfigError::ZeroTimeout);
                }
                config.timeout = timeout;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::SelectorError;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_protocol_names() {
        assert_eq!(Protocol::Udp.to_string(), "udp");
        assert_eq!(Protocol::TcpTls.to_string(), "tcp-tls");
        assert_eq!(Protocol::from_name("TCP").unwrap(), Protocol::Tcp);
        assert_eq!(Protocol::from_name("tcp-tls").unwrap(), Protocol::TcpTls);
        assert_eq!(
            Protocol::from_name("quic"),
            Err(ConfigError::UnknownProtocol("quic".to_string()))
        );
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ScannerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dns_buffer, 4096);
        assert_eq!(config.protocol, Protocol::Udp);
    }

    #[test]
    fn test_buffer_above_4096_rejected() {
        let config = ScannerConfig::default().dns_buffer(5000);
        assert_eq!(
            config.validate(),
            Err(ConfigError::DnsBufferTooLarge(5000))
        );
        assert!(ScannerConfig::default().dns_buffer(4096).validate().is_ok());
        assert!(ScannerConfig::default().dns_buffer(512).validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ScannerConfig::default().timeout(Duration::ZERO);
        assert_eq!(config.validate(), Err(ConfigError::ZeroTimeout));
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let config = ScannerConfig::default().dkim_selectors(["selector1."]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSelector {
                source: SelectorError::InvalidEnd('.'),
                ..
            })
        ));
    }

    #[test]
    fn test_normalized_fills_defaults() {
        let config = ScannerConfig::default().normalized().unwrap();
        assert!(config.concurrency >= 1);
        assert_eq!(
            config.nameservers,
            vec!["8.8.8.8:53", "8.8.4.4:53", "1.1.1.1:53"]
        );
    }

    #[test]
    fn test_normalized_rewrites_nameservers() {
        let config = ScannerConfig::default()
            .concurrency(3)
            .nameservers(["9.9.9.9", "2620:fe::fe", "1.0.0.1:5353"])
            .normalized()
            .unwrap();
        assert_eq!(config.concurrency, 3);
        assert_eq!(
            config.nameservers,
            vec!["9.9.9.9:53", "[2620:fe::fe]:53", "1.0.0.1:5353"]
        );
    }

    #[test]
    fn test_normalized_rejects_hostname_nameserver() {
        let config = ScannerConfig::default().nameservers(["resolver.example"]);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidNameserver(
                "resolver.example".to_string()
            ))
        );
    }

    #[test]
    fn test_option_apply_valid() {
        let mut config = ScannerConfig::default();
        ScannerOption::CacheDuration(Duration::from_secs(10))
            .apply(&mut config)
            .unwrap();
        ScannerOption::DkimSelectors(vec!["selector1".into(), "selector1._google".into()])
            .apply(&mut config)
            .unwrap();
        assert_eq!(config.cache_duration, Duration::from_secs(10));
        assert_eq!(config.dkim_selectors, vec!["selector1", "selector1._google"]);
    }

    #[test]
    fn test_option_apply_invalid_leaves_config() {
        let mut config = ScannerConfig::default();
        let before = config.clone();
        assert_eq!(
            ScannerOption::DnsBuffer(8192).apply(&mut config),
            Err(ConfigError::DnsBufferTooLarge(8192))
        );
        assert_eq!(
            ScannerOption::DkimSelectors(Vec::new()).apply(&mut config),
            Err(ConfigError::NoSelectors)
        );
        assert!(ScannerOption::Nameservers(vec!["nope".into()])
            .apply(&mut config)
            .is_err());
        assert_eq!(config, before);
    }
}
