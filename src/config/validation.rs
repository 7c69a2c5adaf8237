//! Option validators.
//!
//! DKIM selectors and nameserver addresses are checked here so that a bad
//! value fails scanner construction instead of producing odd queries later.

use std::net::{IpAddr, SocketAddr};

use crate::config::constants::{DEFAULT_DNS_PORT, MAX_SELECTOR_LENGTH};
use crate::error_handling::{ConfigError, SelectorError};

/// Validates a single DKIM selector.
///
/// A selector is one or more DNS labels, so it may contain ASCII letters,
/// digits, `-`, `.` and `_`, must not start or end with `.` or `_`, and is
/// limited to 63 characters.
///
/// # Errors
///
/// Returns the first rule the selector breaks.
pub fn validate_dkim_selector(selector: &str) -> Result<(), SelectorError> {
    let Some(first) = selector.chars().next() else {
        return Err(SelectorError::Empty);
    };
    if selector.len() > MAX_SELECTOR_LENGTH {
        return Err(SelectorError::TooLong(selector.len()));
    }
    if first == '.' || first == '_' {
        return Err(SelectorError::InvalidStart(first));
    }
    if let Some(last) = selector.chars().last() {
        if last == '.' || last == '_' {
            return Err(SelectorError::InvalidEnd(last));
        }
    }

    for (offset, character) in selector.char_indices() {
        if !(character.is_ascii_alphanumeric() || matches!(character, '-' | '.' | '_')) {
            return Err(SelectorError::InvalidCharacter { character, offset });
        }
    }

    Ok(())
}

/// Validates a list of DKIM selectors.
///
/// # Errors
///
/// Returns `ConfigError::NoSelectors` for an empty list, otherwise the error
/// for the first invalid selector.
pub fn validate_dkim_selectors(selectors: &[String]) -> Result<(), ConfigError> {
    if selectors.is_empty() {
        return Err(ConfigError::NoSelectors);
    }
    for selector in selectors {
        validate_dkim_selector(selector).map_err(|source| ConfigError::InvalidSelector {
            selector: selector.clone(),
            source,
        })?;
    }
    Ok(())
}

/// Normalizes a nameserver address to `host:port` form.
///
/// Accepts a bare IPv4/IPv6 address (port 53 is appended, IPv6 is bracketed)
/// or an address that already carries a port (`1.1.1.1:853`,
/// `[2606:4700::1111]:53`). Hostnames are rejected: the scanner never
/// resolves its own nameservers.
///
/// # Errors
///
/// Returns `ConfigError::InvalidNameserver` when the input is neither form.
///
/// # Examples
///
/// ```
/// use mailsec_scanner::config::normalize_nameserver;
///
/// assert_eq!(normalize_nameserver("8.8.8.8").unwrap(), "8.8.8.8:53");
/// assert_eq!(normalize_nameserver("2001:4860:4860::8888").unwrap(), "[2001:4860:4860::8888]:53");
/// ```
pub fn normalize_nameserver(nameserver: &str) -> Result<String, ConfigError> {
    let trimmed = nameserver.trim();

    if let Ok(ip) = trimmed.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_DNS_PORT).to_string());
    }

    // "[v6]" without a port is common enough in resolver configs
    if let Some(inner) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        if let Ok(ip) = inner.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, DEFAULT_DNS_PORT).to_string());
        }
    }

    trimmed
        .parse::<SocketAddr>()
        .map(|addr| addr.to_string())
        .map_err(|_| ConfigError::InvalidNameserver(nameserver.to_string()))
}
