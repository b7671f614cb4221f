//! Gemini client implementation
//!
//! One request per connection: connect, handshake, send the URL, read until
//! the server closes, parse.

use super::session::{GeminiSession, SessionOps};
use super::tls::{TlsConfig, TlsError};
use super::{parse_response, ClientConfig, ConnectionError, Response, Result, CRLF};
use crate::address::Address;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Gemini client
///
/// Holds the prepared TLS context; every [`GeminiClient::request`] opens and
/// releases its own connection.
pub struct GeminiClient {
    config: ClientConfig,
    tls: TlsConfig,
}

impl GeminiClient {
    /// Create a new client
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = TlsConfig::client()?.certificate_policy(&config.certificate_policy)?;
        if let Some((min, max)) = config.tls_versions {
            builder = builder.version_range(min, max)?;
        }

        Ok(GeminiClient {
            tls: builder.build(),
            config,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Request an address and return the parsed response
    ///
    /// The connection is closed before returning, on success and on failure.
    pub fn request(&self, address: &Address) -> Result<Response> {
        let host = address.hostname();
        log::debug!("requesting {} from {}:{}", address, host, self.config.port);

        let tcp_stream = connect_tcp(host, self.config.port, self.config.timeout)?;
        if let Some(timeout) = self.config.timeout {
            // Bounds the handshake; reads and writes afterwards are polled
            tcp_stream.set_read_timeout(Some(timeout))?;
            tcp_stream.set_write_timeout(Some(timeout))?;
        }

        let tls_session = self.tls.connect(tcp_stream, host).map_err(|e| match e {
            TlsError::HandshakeTimeout => ConnectionError::Timeout,
            e => ConnectionError::Handshake(e),
        })?;

        let mut session = GeminiSession::new(tls_session);
        session.set_timeout(self.config.timeout);
        exchange(&mut session, address)
    }
}

/// Run one request over an already connected session
///
/// The session is consumed and closed before returning.
pub fn request_over<S: SessionOps>(session: S, address: &Address, timeout: Option<Duration>) -> Result<Response> {
    let mut session = GeminiSession::new(session);
    session.set_timeout(timeout);
    exchange(&mut session, address)
}

fn exchange<S: SessionOps>(session: &mut GeminiSession<S>, address: &Address) -> Result<Response> {
    let request_line = format!("{}{}", address.reconstructed_url(), CRLF);
    session.write_all(request_line.as_bytes())?;
    log::trace!("sent {} byte request line", request_line.len());

    let raw = session.read_to_end()?;
    log::trace!("received {} bytes", raw.len());

    if let Err(e) = session.close() {
        log::debug!("error closing connection: {}", e);
    }

    let response = parse_response(&raw)?;
    log::debug!("{} -> {} {}", address, response.status(), response.meta());
    Ok(response)
}

/// Resolve `host` and connect to the first address that accepts
fn connect_tcp(host: &str, port: u16, timeout: Option<Duration>) -> std::result::Result<TcpStream, ConnectionError> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|source| ConnectionError::Resolve {
            host: host.to_string(),
            source,
        })?
        .collect();

    if addrs.is_empty() {
        return Err(ConnectionError::Resolve {
            host: host.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no addresses found"),
        });
    }

    let mut last_error = None;
    for addr in addrs {
        match connect_addr(&addr, timeout) {
            Ok(stream) => {
                log::trace!("connected to {}", addr);
                return Ok(stream);
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                log::debug!("connect to {} timed out", addr);
                last_error = Some(e);
            }
            Err(e) => {
                log::debug!("connect to {} failed: {}", addr, e);
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if e.kind() == io::ErrorKind::TimedOut => Err(ConnectionError::Timeout),
        Some(source) => Err(ConnectionError::Connect {
            host: host.to_string(),
            source,
        }),
        None => Err(ConnectionError::Connect {
            host: host.to_string(),
            source: io::Error::from(io::ErrorKind::NotConnected),
        }),
    }
}

fn connect_addr(addr: &SocketAddr, timeout: Option<Duration>) -> io::Result<TcpStream> {
    let socket = Socket::new(Domain::for_address(*addr), Type::STREAM, Some(Protocol::TCP))?;
    // Request line goes out in one small write
    socket.set_nodelay(true)?;

    let sockaddr = SockAddr::from(*addr);
    match timeout {
        Some(timeout) => socket.connect_timeout(&sockaddr, timeout)?,
        None => socket.connect(&sockaddr)?,
    }

    Ok(socket.into())
}
