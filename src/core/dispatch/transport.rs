//! Blocking request transport.
//!
//! [`Transport`] is the seam between the dispatcher and the network. The
//! production [`TcpTransport`] opens one connection per request, optionally
//! wrapped in TLS, writes the request and reads until the server closes the
//! stream or [`MAX_RESPONSE_BYTES`] have arrived.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};

use super::request::OutboundRequest;
use crate::core::error::{Result, SentinelError, TransportError};

/// Upper bound on the bytes read back for one response.
pub const MAX_RESPONSE_BYTES: usize = 16 * 1024;

/// Sends one request and returns the raw response bytes.
pub trait Transport {
    fn send(&mut self, request: &OutboundRequest) -> std::result::Result<Vec<u8>, TransportError>;
}

struct TlsSettings {
    config: Arc<ClientConfig>,
    server_name: ServerName<'static>,
}

/// One TCP (optionally TLS) connection per request, closed after the response.
pub struct TcpTransport {
    host: String,
    port: u16,
    timeout: Duration,
    tls: Option<TlsSettings>,
}

impl TcpTransport {
    /// Build the transport and check that the endpoint is reachable by name.
    ///
    /// Failures here mean the device has no usable network capability and
    /// are reported as [`SentinelError::ModuleFailure`].
    pub fn new(host: &str, port: u16, use_tls: bool, timeout: Duration) -> Result<Self> {
        resolve(host, port).map_err(|e| SentinelError::module("network", e.to_string()))?;

        let tls = if use_tls {
            let server_name = ServerName::try_from(host.to_string()).map_err(|e| {
                SentinelError::module("network", format!("invalid TLS server name {host}: {e}"))
            })?;
            Some(TlsSettings {
                config: client_config()?,
                server_name,
            })
        } else {
            log::warn!("TLS disabled, alerts to {host}:{port} travel in plaintext");
            None
        };

        Ok(Self {
            host: host.to_string(),
            port,
            timeout,
            tls,
        })
    }

    fn connect(&self) -> std::result::Result<TcpStream, TransportError> {
        let addr = resolve(&self.host, self.port)?;
        let stream =
            TcpStream::connect_timeout(&addr, self.timeout).map_err(|source| {
                TransportError::Connect {
                    addr: addr.to_string(),
                    source,
                }
            })?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;
        Ok(stream)
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, request: &OutboundRequest) -> std::result::Result<Vec<u8>, TransportError> {
        let tcp = self.connect()?;
        match &self.tls {
            Some(tls) => {
                let conn = ClientConnection::new(tls.config.clone(), tls.server_name.clone())?;
                exchange(StreamOwned::new(conn, tcp), request)
            }
            None => exchange(tcp, request),
        }
    }
}

fn client_config() -> Result<Arc<ClientConfig>> {
    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(|e| SentinelError::module("tls", e.to_string()))?
    .with_root_certificates(root_store)
    .with_no_client_auth();

    Ok(Arc::new(config))
}

fn resolve(host: &str, port: u16) -> std::result::Result<SocketAddr, TransportError> {
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| TransportError::Resolve {
            host: host.to_string(),
            source,
        })?;
    addrs.next().ok_or_else(|| TransportError::Resolve {
        host: host.to_string(),
        source: io::Error::new(io::ErrorKind::NotFound, "no addresses"),
    })
}

/// Write the request and read the response up to the size cap.
fn exchange<S: Read + Write>(
    mut stream: S,
    request: &OutboundRequest,
) -> std::result::Result<Vec<u8>, TransportError> {
    stream.write_all(&request.to_bytes())?;
    stream.flush()?;

    let mut response = Vec::new();
    let mut buf = [0u8; 1024];
    while response.len() < MAX_RESPONSE_BYTES {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                let take = n.min(MAX_RESPONSE_BYTES - response.len());
                response.extend_from_slice(&buf[..take]);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            // Servers often drop the connection without a TLS close_notify.
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof && !response.is_empty() => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(response)
}
