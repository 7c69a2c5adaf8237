//! Email-authentication record resolvers (BIMI, DKIM, DMARC, SPF) plus the
//! MX and NS lookups a scan needs.
//!
//! The TXT-derived lookups are best effort: an exchange error is logged and
//! treated like a missing record, so they return plain strings that are
//! empty when nothing was found. MX and NS failures are returned to the
//! caller.

use futures::future::BoxFuture;
use hickory_proto::rr::RecordType;
use log::debug;

use crate::config::{
    BIMI_PREFIX, DKIM_PREFIX, DMARC_PREFIX, KNOWN_DKIM_SELECTORS, MAX_RECURSION_DEPTH, SPF_PREFIX,
};
use crate::dns::extract::{extract_prefixed_record, spf_redirect_target};
use crate::dns::records::lookup_records;
use crate::dns::transport::Transport;
use crate::error_handling::LookupError;

/// Resolves raw and derived records for domains over one [`Transport`].
pub struct RecordResolver {
    transport: Transport,
    dkim_selectors: Vec<String>,
}

impl RecordResolver {
    /// Creates a resolver. `dkim_selectors` are tried before the built-in
    /// selector list.
    pub fn new(transport: Transport, dkim_selectors: Vec<String>) -> Self {
        Self {
            transport,
            dkim_selectors,
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Looks up raw records of any supported type, following CNAMEs.
    pub async fn records(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<String>, LookupError> {
        lookup_records(&self.transport, name, record_type).await
    }

    /// DKIM selectors in the order they are tried: configured ones first,
    /// then the built-in list.
    pub fn dkim_candidates(&self) -> impl Iterator<Item = &str> {
        self.dkim_selectors
            .iter()
            .map(String::as_str)
            .chain(KNOWN_DKIM_SELECTORS.iter().copied())
    }

    /// Returns the BIMI record of `domain`, checking `default._bimi.<domain>`
    /// and then `<domain>`.
    pub async fn bimi(&self, domain: &str) -> String {
        let names = [format!("default._bimi.{domain}"), domain.to_string()];
        self.first_prefixed(names, BIMI_PREFIX).await
    }

    /// Returns the first DKIM record found under any candidate selector.
    pub async fn dkim(&self, domain: &str) -> String {
        let names: Vec<String> = self
            .dkim_candidates()
            .map(|selector| format!("{selector}._domainkey.{domain}"))
            .collect();
        self.first_prefixed(names, DKIM_PREFIX).await
    }

    /// Returns the DMARC record of `domain`, checking `_dmarc.<domain>` and
    /// then `<domain>`.
    pub async fn dmarc(&self, domain: &str) -> String {
        let names = [format!("_dmarc.{domain}"), domain.to_string()];
        self.first_prefixed(names, DMARC_PREFIX).await
    }

    /// Returns the effective SPF record of `domain`.
    ///
    /// A record that redirects (`redirect=`) without an `all` mechanism is
    /// replaced by the SPF record of the redirect target, up to
    /// `MAX_RECURSION_DEPTH` redirects.
    pub async fn spf(&self, domain: &str) -> String {
        match self.spf_at_depth(domain.to_string(), 0).await {
            Ok(record) => record.unwrap_or_default(),
            Err(e) => {
                debug!("SPF lookup failed for {domain}: {e}");
                String::new()
            }
        }
    }

    pub async fn mx(&self, domain: &str) -> Result<Vec<String>, LookupError> {
        self.records(domain, RecordType::MX).await
    }

    pub async fn ns(&self, domain: &str) -> Result<Vec<String>, LookupError> {
        self.records(domain, RecordType::NS).await
    }

    fn spf_at_depth(
        &self,
        domain: String,
        depth: usize,
    ) -> BoxFuture<'_, Result<Option<String>, LookupError>> {
        Box::pin(async move {
            let segments = self.records(&domain, RecordType::TXT).await?;
            let Some(record) = extract_prefixed_record(&segments, SPF_PREFIX) else {
                return Ok(None);
            };

            let Some(target) = spf_redirect_target(&record) else {
                return Ok(Some(record));
            };
            if depth >= MAX_RECURSION_DEPTH {
                return Err(LookupError::RecursionLimit {
                    name: domain,
                    limit: MAX_RECURSION_DEPTH,
                });
            }

            debug!("SPF record of {domain} redirects to {target}");
            self.spf_at_depth(target.to_string(), depth + 1).await
        })
    }

    /// Queries `names` for TXT records in order and returns the first record
    /// carrying `prefix`. Failed exchanges count as "not found".
    async fn first_prefixed<I>(&self, names: I, prefix: &str) -> String
    where
        I: IntoIterator<Item = String>,
    {
        for name in names {
            match self.records(&name, RecordType::TXT).await {
                Ok(segments) => {
                    if let Some(record) = extract_prefixed_record(&segments, prefix) {
                        return record;
                    }
                }
                Err(e) => debug!("TXT lookup for {name} failed: {e}"),
            }
        }
        String::new()
    }
}
