//! Command-line options of the `dss` binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::constants::{DEFAULT_CACHE_DURATION, DEFAULT_DNS_BUFFER, DEFAULT_TIMEOUT};
use crate::config::types::{LogFormat, LogLevel, Protocol, ScannerConfig};

/// Command-line options.
///
/// Domains come from positional arguments, or when there are none, from
/// `--file` (or stdin) as a plain list or, with `--zone-file`, as an RFC 1035
/// zone.
///
/// # Examples
///
/// ```bash
/// # Scan two domains through Cloudflare over DNS over TLS
/// dss example.org example.com --dns-protocol tcp-tls --nameservers 1.1.1.1:853
///
/// # Scan every host of a zone, 64 at a time
/// dss --zone-file --file example.org.zone --concurrent 64
///
/// # Domains from stdin with an extra DKIM selector
/// cat domains.txt | dss --dkim-selector s2024
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "dss",
    about = "Scans domains for BIMI, DKIM, DMARC, SPF, MX and NS records."
)]
pub struct Cli {
    /// Domains to scan
    pub domains: Vec<String>,

    /// File to read domains from when none are given as arguments (default: stdin)
    #[arg(short, long, value_parser)]
    pub file: Option<PathBuf>,

    /// Parse the input as an RFC 1035 zone file instead of one domain per line
    #[arg(short, long)]
    pub zone_file: bool,

    /// Domains scanned at once (0 = number of CPUs)
    #[arg(short, long, default_value_t = 0)]
    pub concurrent: usize,

    /// DKIM selectors tried before the built-in list (comma separated or repeated)
    #[arg(long = "dkim-selector", value_delimiter = ',')]
    pub dkim_selectors: Vec<String>,

    /// EDNS0 buffer size in bytes (at most 4096)
    #[arg(long, default_value_t = DEFAULT_DNS_BUFFER)]
    pub dns_buffer: u16,

    /// DNS protocol: udp|tcp|tcp-tls
    #[arg(long, value_enum, default_value_t = Protocol::Udp)]
    pub dns_protocol: Protocol,

    /// Nameservers as ip or ip:port (comma separated or repeated)
    #[arg(short, long, value_delimiter = ',')]
    pub nameservers: Vec<String>,

    /// Result cache duration in seconds (0 disables the cache)
    #[arg(long, default_value_t = DEFAULT_CACHE_DURATION.as_secs())]
    pub cache: u64,

    /// Timeout of a single DNS exchange in seconds
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout: u64,

    /// Pretty-print the results as one JSON array
    #[arg(long)]
    pub pretty: bool,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl Cli {
    /// Maps the scanner options onto a `ScannerConfig`. Validation happens
    /// when the scanner is built.
    pub fn scanner_config(&self) -> ScannerConfig {
        ScannerConfig::default()
            .concurrency(self.concurrent)
            .dkim_selectors(self.dkim_selectors.iter().cloned())
            .dns_buffer(self.dns_buffer)
            .protocol(self.dns_protocol)
            .nameservers(self.nameservers.iter().cloned())
            .cache_duration(Duration::from_secs(self.cache))
            .timeout(Duration::from_secs(self.timeout))
    }
}
