//! Configuration constants.
//!
//! This module defines all configuration constants used by the scanner,
//! including record prefixes, built-in selector and nameserver lists, timeouts
//! and size limits.

use std::time::Duration;

// Record prefixes
/// Prefix identifying a BIMI TXT record.
pub const BIMI_PREFIX: &str = "v=BIMI1;";
/// Prefix identifying a DKIM TXT record.
pub const DKIM_PREFIX: &str = "v=DKIM1;";
/// Prefix identifying a DMARC TXT record.
pub const DMARC_PREFIX: &str = "v=DMARC1;";
/// Prefix identifying an SPF TXT record (the trailing space is significant).
pub const SPF_PREFIX: &str = "v=spf1 ";

/// DKIM selectors tried after any caller-supplied selectors, in order.
pub const KNOWN_DKIM_SELECTORS: &[&str] = &[
    "x",             // Generic
    "google",        // Google
    "selector1",     // Microsoft
    "selector2",     // Microsoft
    "k1",            // MailChimp
    "mandrill",      // Mandrill
    "everlytickey1", // Everlytic
    "everlytickey2", // Everlytic
    "dkim",          // Hetzner
    "mxvault",       // MxVault
];

/// Public resolvers used when no nameservers are configured.
pub const DEFAULT_NAMESERVERS: &[&str] = &["8.8.8.8:53", "8.8.4.4:53", "1.1.1.1:53"];

/// Port appended to nameservers given without one.
pub const DEFAULT_DNS_PORT: u16 = 53;

// DNS message sizing
/// Largest EDNS0 buffer the scanner will advertise.
/// Also the buffer used when retrying a truncated response.
pub const MAX_DNS_BUFFER: u16 = 4096;
/// Default EDNS0 buffer size.
pub const DEFAULT_DNS_BUFFER: u16 = 4096;
/// Receive buffer for UDP responses. Large enough for any DNS message.
pub const UDP_RECEIVE_BUFFER: usize = 65_535;

// Network operation timeouts
/// Default per-exchange timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
/// Default result cache lifetime.
pub const DEFAULT_CACHE_DURATION: Duration = Duration::from_secs(3 * 60);

/// Maximum number of CNAME hops or SPF redirects followed for one lookup.
pub const MAX_RECURSION_DEPTH: usize = 10;

/// Maximum length of a single DNS label (and so of a DKIM selector).
pub const MAX_SELECTOR_LENGTH: usize = 63;

/// Error recorded on a result when a domain has neither NS nor TXT records.
pub const INVALID_DOMAIN_ERROR: &str = "invalid domain name";
