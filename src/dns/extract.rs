//! TXT record extraction utilities.
//!
//! This module reassembles prefixed records (SPF, DMARC, DKIM, BIMI) from
//! flattened TXT segments and interprets SPF redirects.

use std::sync::LazyLock;

use regex::Regex;

/// Matches an SPF `all` mechanism with an optional qualifier.
static SPF_ALL_MECHANISM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+\-~?]?all$").expect("SPF all regex is valid"));

/// Finds the record starting with `prefix` among TXT segments.
///
/// TXT records longer than 255 bytes arrive split into several segments. When
/// the prefix starts segment `i`, the logical record is the concatenation of
/// segments `i..` with no separator.
///
/// # Arguments
///
/// * `segments` - TXT character-strings in answer order
/// * `prefix` - The record prefix, e.g. `"v=DMARC1;"`
///
/// # Returns
///
/// The reassembled record, or `None` if no segment starts with the prefix.
pub fn extract_prefixed_record(segments: &[String], prefix: &str) -> Option<String> {
    segments
        .iter()
        .position(|segment| segment.starts_with(prefix))
        .map(|index| segments[index..].concat())
}

/// Returns the `redirect=` target of an SPF record.
///
/// RFC 7208 ignores the redirect modifier when the record has an `all`
/// mechanism, so `None` is returned in that case as well as when there is no
/// redirect.
pub fn spf_redirect_target(record: &str) -> Option<&str> {
    let mut target = None;

    for term in record.split_whitespace() {
        if SPF_ALL_MECHANISM.is_match(term) {
            return None;
        }
        if let Some(domain) = term.strip_prefix("redirect=") {
            if target.is_none() && !domain.is_empty() {
                target = Some(domain);
            }
        }
    }

    target
}
