//! Single DNS query/response exchanges.
//!
//! [`Transport`] builds the query, applies the EDNS0 buffer size, enforces the
//! per-exchange timeout and retries a truncated answer once with a 4096 byte
//! buffer. The bytes on the wire are moved by a [`Connector`];
//! [`NetworkConnector`] speaks UDP, TCP and DNS over TLS.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures::future::BoxFuture;
use hickory_proto::op::{Edns, Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{Name, Record, RecordType};
use log::{debug, warn};
use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

use crate::config::{Protocol, MAX_DNS_BUFFER, UDP_RECEIVE_BUFFER};
use crate::dns::pool::NameserverPool;
use crate::error_handling::TransportError;

/// Moves one encoded DNS message to a nameserver and back.
///
/// Implementations only handle I/O. Timeouts, EDNS0 and truncation handling
/// live in [`Transport`], so a test double only has to produce responses.
pub trait Connector: Send + Sync {
    fn send<'a>(
        &'a self,
        nameserver: &'a str,
        protocol: Protocol,
        request: &'a Message,
    ) -> BoxFuture<'a, Result<Message, TransportError>>;
}

/// Connector that talks to real nameservers.
#[derive(Default)]
pub struct NetworkConnector {
    tls: OnceLock<TlsConnector>,
}

impl NetworkConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn tls_connector(&self) -> Result<&TlsConnector, TransportError> {
        if let Some(connector) = self.tls.get() {
            return Ok(connector);
        }

        let mut root_store = RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let config = ClientConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()?
        .with_root_certificates(root_store)
        .with_no_client_auth();

        Ok(self
            .tls
            .get_or_init(|| TlsConnector::from(Arc::new(config))))
    }

    async fn exchange(
        &self,
        nameserver: &str,
        protocol: Protocol,
        request: &Message,
    ) -> Result<Message, TransportError> {
        let addr: SocketAddr = nameserver
            .parse()
            .map_err(|_| TransportError::InvalidNameserver(nameserver.to_string()))?;
        let payload = request.to_vec()?;

        let response = match protocol {
            Protocol::Udp => udp_exchange(addr, &payload).await?,
            Protocol::Tcp => {
                let mut stream = TcpStream::connect(addr).await?;
                stream_exchange(&mut stream, &payload).await?
            }
            Protocol::TcpTls => {
                let connector = self.tls_connector()?;
                let stream = TcpStream::connect(addr).await?;
                let mut stream = connector
                    .connect(ServerName::from(addr.ip()), stream)
                    .await?;
                stream_exchange(&mut stream, &payload).await?
            }
        };

        Ok(Message::from_vec(&response)?)
    }
}

impl Connector for NetworkConnector {
    fn send<'a>(
        &'a self,
        nameserver: &'a str,
        protocol: Protocol,
        request: &'a Message,
    ) -> BoxFuture<'a, Result<Message, TransportError>> {
        Box::pin(self.exchange(nameserver, protocol, request))
    }
}

async fn udp_exchange(addr: SocketAddr, payload: &[u8]) -> Result<Vec<u8>, TransportError> {
    let local: SocketAddr = if addr.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };

    let socket = UdpSocket::bind(local).await?;
    socket.connect(addr).await?;
    socket.send(payload).await?;

    let mut buf = vec![0u8; UDP_RECEIVE_BUFFER];
    let len = socket.recv(&mut buf).await?;
    buf.truncate(len);
    Ok(buf)
}

/// Sends a message over a stream with the two-byte length prefix used by
/// TCP and TLS transports (RFC 1035 section 4.2.2).
async fn stream_exchange<S>(stream: &mut S, payload: &[u8]) -> Result<Vec<u8>, TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let len =
        u16::try_from(payload.len()).map_err(|_| TransportError::MessageTooLarge(payload.len()))?;

    let mut framed = Vec::with_capacity(payload.len() + 2);
    framed.extend_from_slice(&len.to_be_bytes());
    framed.extend_from_slice(payload);
    stream.write_all(&framed).await?;
    stream.flush().await?;

    let mut len_bytes = [0u8; 2];
    stream.read_exact(&mut len_bytes).await?;
    let mut buf = vec![0u8; usize::from(u16::from_be_bytes(len_bytes))];
    stream.read_exact(&mut buf).await?;
    Ok(buf)
}

/// Appends the root label if `name` is not already fully qualified.
pub fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}

fn edns(buffer: u16) -> Edns {
    let mut edns = Edns::new();
    edns.set_max_payload(buffer);
    edns.set_dnssec_ok(true);
    edns
}

/// Builds a recursive query for `name` advertising `buffer` via EDNS0.
pub fn build_query(
    name: &str,
    record_type: RecordType,
    buffer: u16,
) -> Result<Message, TransportError> {
    let name = Name::from_ascii(fqdn(name))?;

    let mut message = Message::new();
    message
        .set_id(rand::random::<u16>())
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true)
        .add_query(Query::query(name, record_type));
    message.set_edns(edns(buffer));
    Ok(message)
}

/// Issues DNS exchanges against a nameserver pool.
pub struct Transport {
    connector: Arc<dyn Connector>,
    pool: NameserverPool,
    protocol: Protocol,
    buffer: u16,
    timeout: Duration,
}

impl Transport {
    pub fn new(
        connector: Arc<dyn Connector>,
        pool: NameserverPool,
        protocol: Protocol,
        buffer: u16,
        timeout: Duration,
    ) -> Self {
        Self {
            connector,
            pool,
            protocol,
            buffer,
            timeout,
        }
    }

    pub fn pool(&self) -> &NameserverPool {
        &self.pool
    }

    /// Queries `name` for `record_type` and returns the answer section.
    ///
    /// One nameserver is taken from the pool per exchange. A truncated
    /// response is retried once, against the same nameserver, with a 4096
    /// byte buffer when the configured buffer is smaller; whatever the retry
    /// returns is used as-is.
    ///
    /// The response code is not an error: NXDOMAIN, SERVFAIL, REFUSED and the
    /// rest return whatever answer section came back, which is normally
    /// empty.
    ///
    /// # Errors
    ///
    /// Network failures, timeouts and undecodable or mismatched responses.
    pub async fn exchange(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<Record>, TransportError> {
        let nameserver = self.pool.next();
        let mut request = build_query(name, record_type, self.buffer)?;

        debug!("Querying {nameserver} for {record_type} {name}");
        let mut response = self.send(nameserver, &request).await?;

        if response.truncated() && self.buffer < MAX_DNS_BUFFER {
            warn!(
                "DNS buffer {} was too small for {name}, retrying with larger buffer ({MAX_DNS_BUFFER})",
                self.buffer
            );
            request.set_edns(edns(MAX_DNS_BUFFER));
            response = self.send(nameserver, &request).await?;
        }

        let code = response.response_code();
        if !matches!(code, ResponseCode::NoError | ResponseCode::NXDomain) {
            debug!("{nameserver} answered {code} for {record_type} {name}");
        }
        Ok(response.answers().to_vec())
    }

    async fn send(&self, nameserver: &str, request: &Message) -> Result<Message, TransportError> {
        let response = tokio::time::timeout(
            self.timeout,
            self.connector.send(nameserver, self.protocol, request),
        )
        .await
        .map_err(|_| TransportError::Timeout(self.timeout))??;

        if response.id() != request.id() {
            return Err(TransportError::IdMismatch {
                expected: request.id(),
                actual: response.id(),
            });
        }
        Ok(response)
    }
}
