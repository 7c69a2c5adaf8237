//! Domain name sources.
//!
//! Two input formats are supported:
//! - RFC 1035 zone files (`domains`, `parse_zone`): every record owner except
//!   NS records and the bare zone apex becomes a domain to scan
//! - Plain text lists (`domains_from_text`, `parse_domain_list`): one domain
//!   per line, blank lines and `#` comments ignored

mod lexer;

use std::collections::HashSet;
use std::str::FromStr;

use hickory_proto::rr::{DNSClass, RecordType};
use hickory_proto::serialize::txt::Parser;
use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error_handling::ZoneError;
use lexer::{Entry, Lexer};

/// Reads a zone file and returns the domain names to scan.
///
/// # Errors
///
/// Returns `ZoneError` if the input cannot be read or is not valid zone file
/// syntax.
pub async fn domains<R>(reader: R) -> Result<Vec<String>, ZoneError>
where
    R: AsyncRead + Unpin,
{
    let input = read_to_string(reader).await?;
    parse_zone(&input)
}

/// Reads a newline-separated list of domain names.
///
/// # Errors
///
/// Returns `ZoneError::Io` if the input cannot be read or is not UTF-8.
pub async fn domains_from_text<R>(reader: R) -> Result<Vec<String>, ZoneError>
where
    R: AsyncRead + Unpin,
{
    let input = read_to_string(reader).await?;
    Ok(parse_domain_list(&input))
}

async fn read_to_string<R>(mut reader: R) -> Result<String, ZoneError>
where
    R: AsyncRead + Unpin,
{
    let mut input = String::new();
    reader.read_to_string(&mut input).await?;
    Ok(input)
}

/// Extracts the domain names of a zone.
///
/// Records of type NS are skipped, as are owners without a `.` once the
/// surrounding dots are trimmed (the zone apex acting as an anchor). Each
/// name is returned once, in order of first appearance, without its
/// trailing root dot.
///
/// Supported syntax: comments, quoted strings, parenthesized continuation
/// lines, `$ORIGIN`, `$TTL`, `@` and indented records inheriting the previous
/// owner. `$INCLUDE` is rejected.
///
/// # Errors
///
/// Returns `ZoneError::Syntax` or `ZoneError::Include` with the offending
/// line.
///
/// # Examples
///
/// ```
/// use mailsec_scanner::zone::parse_zone;
///
/// let zone = "\
/// $ORIGIN example.com.
/// @     IN NS ns1.example.com.
/// host  IN A  192.0.2.1
/// ";
/// assert_eq!(parse_zone(zone).unwrap(), vec!["host.example.com"]);
/// ```
pub fn parse_zone(input: &str) -> Result<Vec<String>, ZoneError> {
    let entries = Lexer::new(input).entries()?;

    let mut origin: Option<String> = None;
    let mut last_owner: Option<String> = None;
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for entry in entries {
        let Some(first) = entry.first() else {
            continue;
        };

        if !entry.indented && !first.quoted && first.text.starts_with('$') {
            if let Some(new_origin) = directive(&entry)? {
                origin = Some(new_origin);
            }
            continue;
        }

        let (owner, fields) = if entry.indented {
            let owner = last_owner.clone().ok_or_else(|| syntax(&entry, "no previous owner"))?;
            (owner, &entry.tokens[..])
        } else {
            let owner = absolute_name(&first.text, origin.as_deref())
                .ok_or_else(|| syntax(&entry, "'@' used without an origin"))?;
            (owner, &entry.tokens[1..])
        };
        last_owner = Some(owner.clone());

        let is_ns = is_ns_record(fields).ok_or_else(|| syntax(&entry, "missing record type"))?;
        if is_ns {
            continue;
        }

        let name = owner.trim_matches('.');
        if !name.contains('.') {
            debug!("Skipping zone anchor {owner} on line {}", entry.line);
            continue;
        }
        if seen.insert(name.to_ascii_lowercase()) {
            names.push(name.to_string());
        }
    }

    Ok(names)
}

/// Parses a newline-separated domain list.
///
/// Surrounding whitespace and dots are trimmed from each line; blank lines
/// and lines starting with `#` are skipped.
pub fn parse_domain_list(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.trim_matches('.').to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Handles a `$` control entry, returning the new origin for `$ORIGIN`.
fn directive(entry: &Entry) -> Result<Option<String>, ZoneError> {
    let name = entry.tokens[0].text.to_ascii_uppercase();
    let argument = entry.tokens.get(1).map(|token| token.text.as_str());

    match (name.as_str(), argument) {
        ("$ORIGIN", Some(origin)) => {
            let origin = if origin.ends_with('.') {
                origin.to_string()
            } else {
                format!("{origin}.")
            };
            Ok(Some(origin))
        }
        ("$TTL", Some(ttl)) if is_ttl(ttl) => Ok(None),
        ("$TTL", Some(ttl)) => Err(syntax(entry, &format!("invalid TTL '{ttl}'"))),
        ("$INCLUDE", _) => Err(ZoneError::Include { line: entry.line }),
        ("$ORIGIN" | "$TTL", None) => Err(syntax(entry, &format!("{name} needs an argument"))),
        _ => Err(syntax(entry, &format!("unknown directive {name}"))),
    }
}

/// Resolves an owner field against the current origin.
///
/// Returns `None` for `@` when no origin is known. Relative names without an
/// origin are returned unchanged.
fn absolute_name(owner: &str, origin: Option<&str>) -> Option<String> {
    if owner == "@" {
        return origin.map(str::to_string);
    }
    if owner.ends_with('.') {
        return Some(owner.to_string());
    }
    match origin {
        Some(".") => Some(format!("{owner}.")),
        Some(origin) => Some(format!("{owner}.{origin}")),
        None => Some(owner.to_string()),
    }
}

/// Reports whether an entry is an NS record.
///
/// The type is the first field after `[<TTL>] [<class>]` or
/// `[<class>] [<TTL>]`. Any mnemonic is accepted, so record types this crate
/// has no name for are treated as ordinary records. Returns `None` when the
/// type field is missing or quoted.
fn is_ns_record(fields: &[lexer::Token]) -> Option<bool> {
    let rtype = fields
        .iter()
        .take(3)
        .find(|field| field.quoted || !is_ttl_or_class(&field.text))?;
    if rtype.quoted {
        return None;
    }

    let upper = rtype.text.to_ascii_uppercase();
    let is_ns = match upper.strip_prefix("TYPE").map(str::parse::<u16>) {
        Some(Ok(code)) => RecordType::from(code) == RecordType::NS,
        _ => RecordType::from_str(&upper).is_ok_and(|rtype| rtype == RecordType::NS),
    };
    Some(is_ns)
}

fn is_ttl_or_class(field: &str) -> bool {
    is_ttl(field) || DNSClass::from_str(&field.to_ascii_uppercase()).is_ok()
}

/// Accepts plain seconds and BIND-style unit TTLs such as `1h30m`.
fn is_ttl(value: &str) -> bool {
    Parser::parse_time(value).is_ok()
}

fn syntax(entry: &Entry, message: &str) -> ZoneError {
    ZoneError::Syntax {
        line: entry.line,
        message: message.to_string(),
    }
}
