// Shared test helpers: an in-memory DNS connector.
//
// The mock answers from a table keyed by (name, record type), counts every
// exchange and can delay answers or truncate responses below a buffer size.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::rdata::{CNAME, MX, NS, TXT};
use hickory_proto::rr::{Name, RData, Record, RecordType};

use mailsec_scanner::dns::{fqdn, Connector};
use mailsec_scanner::{Protocol, Scanner, ScannerConfig, TransportError};

/// One exchange as seen by the mock.
#[derive(Debug, Clone)]
#[allow(dead_code)] // not every test file reads every field
pub struct SeenQuery {
    pub nameserver: String,
    pub name: String,
    pub record_type: RecordType,
    pub payload: u16,
}

#[derive(Default)]
pub struct MockConnector {
    answers: HashMap<(String, RecordType), Vec<Record>>,
    failing: Vec<(String, RecordType)>,
    codes: HashMap<(String, RecordType), ResponseCode>,
    delay: Option<Duration>,
    truncate_below: Option<u16>,
    seen: Mutex<Vec<SeenQuery>>,
    ns_in_flight: AtomicUsize,
    max_ns_in_flight: AtomicUsize,
}

#[allow(dead_code)]
impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(mut self, name: &str, record_type: RecordType, data: RData) -> Self {
        let owner = Name::from_ascii(fqdn(name)).expect("valid owner name");
        self.answers
            .entry((fqdn(name), record_type))
            .or_default()
            .push(Record::from_rdata(owner, 300, data));
        self
    }

    pub fn txt(self, name: &str, segments: &[&str]) -> Self {
        let segments = segments.iter().map(|s| s.to_string()).collect();
        self.record(name, RecordType::TXT, RData::TXT(TXT::new(segments)))
    }

    pub fn ns(self, name: &str, host: &str) -> Self {
        self.record(name, RecordType::NS, RData::NS(NS(host_name(host))))
    }

    pub fn mx(self, name: &str, preference: u16, host: &str) -> Self {
        self.record(
            name,
            RecordType::MX,
            RData::MX(MX::new(preference, host_name(host))),
        )
    }

    /// Answers `record_type` queries for `name` with a CNAME to `target`.
    pub fn cname(self, name: &str, record_type: RecordType, target: &str) -> Self {
        self.record(name, record_type, RData::CNAME(CNAME(host_name(target))))
    }

    /// Fails exchanges for `name`/`record_type` with a network error.
    pub fn failing(mut self, name: &str, record_type: RecordType) -> Self {
        self.failing.push((fqdn(name), record_type));
        self
    }

    /// Answers `name`/`record_type` with `code` and an empty answer section.
    pub fn rcode(mut self, name: &str, record_type: RecordType, code: ResponseCode) -> Self {
        self.codes.insert((fqdn(name), record_type), code);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sets the TC bit on responses to queries advertising less than `size`.
    pub fn truncate_below(mut self, size: u16) -> Self {
        self.truncate_below = Some(size);
        self
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn seen(&self) -> Vec<SeenQuery> {
        self.seen.lock().unwrap().clone()
    }

    pub fn calls_for(&self, name: &str, record_type: RecordType) -> usize {
        let name = fqdn(name);
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|q| q.name == name && q.record_type == record_type)
            .count()
    }

    /// Highest number of NS exchanges that were in progress at once. Every
    /// domain scan starts with exactly one NS exchange.
    pub fn max_ns_in_flight(&self) -> usize {
        self.max_ns_in_flight.load(Ordering::SeqCst)
    }

    fn respond(&self, nameserver: &str, request: &Message) -> Result<Message, TransportError> {
        let query = request.queries()[0].clone();
        let name = query.name().to_ascii();
        let record_type = query.query_type();
        let payload = request
            .extensions()
            .as_ref()
            .map(|edns| edns.max_payload())
            .unwrap_or(512);

        self.seen.lock().unwrap().push(SeenQuery {
            nameserver: nameserver.to_string(),
            name: name.clone(),
            record_type,
            payload,
        });

        if self.failing.contains(&(name.clone(), record_type)) {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )));
        }

        let mut response = Message::new();
        response
            .set_id(request.id())
            .set_message_type(MessageType::Response)
            .add_query(query);

        if let Some(code) = self.codes.get(&(name.clone(), record_type)) {
            response.set_response_code(*code);
            return Ok(response);
        }

        if !self.answers.keys().any(|(owner, _)| *owner == name) {
            response.set_response_code(ResponseCode::NXDomain);
        }
        if let Some(records) = self.answers.get(&(name, record_type)) {
            for record in records {
                response.add_answer(record.clone());
            }
        }
        if self.truncate_below.is_some_and(|limit| payload < limit) {
            response.set_truncated(true);
        }
        Ok(response)
    }
}

impl Connector for MockConnector {
    fn send<'a>(
        &'a self,
        nameserver: &'a str,
        _protocol: Protocol,
        request: &'a Message,
    ) -> BoxFuture<'a, Result<Message, TransportError>> {
        Box::pin(async move {
            let is_ns = request
                .queries()
                .first()
                .is_some_and(|q| q.query_type() == RecordType::NS);

            if is_ns {
                let now = self.ns_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_ns_in_flight.fetch_max(now, Ordering::SeqCst);
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if is_ns {
                self.ns_in_flight.fetch_sub(1, Ordering::SeqCst);
            }

            self.respond(nameserver, request)
        })
    }
}

fn host_name(host: &str) -> Name {
    Name::from_ascii(fqdn(host)).expect("valid host name")
}

/// Builds a scanner on top of `connector` with a single test nameserver.
#[allow(dead_code)]
pub fn scanner_with(connector: Arc<MockConnector>, config: ScannerConfig) -> Scanner {
    let config = if config.nameservers.is_empty() {
        config.nameservers(["192.0.2.53"])
    } else {
        config
    };
    Scanner::with_connector(config, connector).expect("valid scanner config")
}
