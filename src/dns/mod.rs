//! DNS resolution and record querying.
//!
//! This module provides the protocol side of a scan:
//! - Nameserver rotation (`NameserverPool`)
//! - Single exchanges with EDNS0 and truncation retry (`Transport`)
//! - Raw record lookups with CNAME following (A, AAAA, CNAME, MX, NS, TXT)
//! - BIMI, DKIM, DMARC and SPF extraction from TXT records
//!
//! All operations are async and talk to the configured nameservers directly
//! instead of going through the system resolver.

mod email;
mod extract;
mod pool;
mod records;
mod transport;

// Re-export public API
pub use email::RecordResolver;
pub use extract::{extract_prefixed_record, spf_redirect_target};
pub use pool::NameserverPool;
pub use records::{extract_record_data, lookup_records};
pub use transport::{build_query, fqdn, Connector, NetworkConnector, Transport};
