//! Raw record lookups (A, AAAA, CNAME, MX, NS, TXT).
//!
//! Record data is flattened to strings. TXT records contribute one string per
//! character-string segment so that derived-record extraction can reassemble
//! records split across segments.

use futures::future::BoxFuture;
use hickory_proto::rr::{RData, Record, RecordType};
use log::debug;

use crate::config::MAX_RECURSION_DEPTH;
use crate::dns::transport::Transport;
use crate::error_handling::LookupError;

/// Looks up `record_type` records for `name`, following CNAME aliases.
///
/// When the answer holds no records of the requested type but does hold a
/// CNAME, the alias target is queried for the same type and its records are
/// accumulated. Alias chains longer than `MAX_RECURSION_DEPTH` fail.
///
/// # Returns
///
/// The record data as strings, in answer order: addresses for A/AAAA, host
/// names for CNAME/MX/NS, and individual character-strings for TXT. An empty
/// vector means the name exists without such records or does not exist.
///
/// # Errors
///
/// Returns `LookupError` if any exchange in the chain fails or the alias chain
/// is too long.
pub async fn lookup_records(
    transport: &Transport,
    name: &str,
    record_type: RecordType,
) -> Result<Vec<String>, LookupError> {
    lookup_at_depth(transport, name.to_string(), record_type, 0).await
}

fn lookup_at_depth(
    transport: &Transport,
    name: String,
    record_type: RecordType,
    depth: usize,
) -> BoxFuture<'_, Result<Vec<String>, LookupError>> {
    Box::pin(async move {
        if depth > MAX_RECURSION_DEPTH {
            return Err(LookupError::RecursionLimit {
                name,
                limit: MAX_RECURSION_DEPTH,
            });
        }

        let answers = transport.exchange(&name, record_type).await?;
        let mut records = extract_record_data(&answers, record_type);

        if records.is_empty() && record_type != RecordType::CNAME {
            for target in extract_record_data(&answers, RecordType::CNAME) {
                debug!("{name} is an alias for {target}, following for {record_type}");
                let aliased = lookup_at_depth(transport, target, record_type, depth + 1).await?;
                records.extend(aliased);
            }
        }

        Ok(records)
    })
}

/// Converts the answers of type `record_type` to strings.
pub fn extract_record_data(answers: &[Record], record_type: RecordType) -> Vec<String> {
    let mut records = Vec::new();

    for answer in answers {
        if answer.record_type() != record_type {
            continue;
        }
        match answer.data() {
            Some(RData::A(a)) => records.push(a.to_string()),
            Some(RData::AAAA(aaaa)) => records.push(aaaa.to_string()),
            Some(RData::CNAME(cname)) => records.push(cname.0.to_utf8()),
            Some(RData::MX(mx)) => records.push(mx.exchange().to_utf8()),
            Some(RData::NS(ns)) => records.push(ns.0.to_utf8()),
            Some(RData::TXT(txt)) => records.extend(
                txt.iter()
                    .map(|segment| String::from_utf8_lossy(segment).to_string()),
            ),
            _ => {}
        }
    }

    records
}
