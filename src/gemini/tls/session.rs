//! TLS session operations
//!
//! This module implements the SessionOps trait for TLS connections,
//! enabling transparent switching between plain TCP and TLS I/O.

use super::cert::CertInfo;
use super::config::{TlsConfig, TlsError};
use crate::gemini::session::{poll_fd, PollEvents, SessionOps};
use crate::gemini::{Error, Result as GeminiResult};
use openssl::ssl::{ErrorCode, HandshakeError, Ssl, SslStream};
use std::io::{self, Write};
use std::net::{IpAddr, TcpStream};
use std::os::fd::AsRawFd;
use std::time::Duration;

/// TLS session operations
///
/// Implements SessionOps trait for TLS-encrypted connections.
/// Wraps an OpenSSL SslStream and provides poll/read/write/close operations.
pub struct TlsSessionOps {
    stream: SslStream<TcpStream>,
    failed: bool,
}

/// Many servers close the TCP connection without sending close_notify.
/// OpenSSL 3 reports that as an error; for Gemini it is the end of the body.
fn is_unexpected_eof(e: &openssl::ssl::Error) -> bool {
    if e.code() != ErrorCode::SSL {
        return false;
    }
    e.ssl_error().map_or(false, |stack| {
        stack
            .errors()
            .iter()
            .any(|err| err.reason().map_or(false, |r| r.contains("unexpected eof")))
    })
}

/// A blocking socket with a read or write timeout surfaces an expired
/// deadline as an interrupted handshake or a would-block I/O error.
fn is_handshake_timeout(e: &HandshakeError<TcpStream>) -> bool {
    match e {
        HandshakeError::SetupFailure(_) => false,
        HandshakeError::WouldBlock(_) => true,
        HandshakeError::Failure(mid) => mid.error().io_error().map_or(false, |io| {
            matches!(io.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
        }),
    }
}

impl TlsSessionOps {
    /// Create a client TLS connection (perform handshake)
    pub fn connect(tcp_stream: TcpStream, config: TlsConfig, servername: &str) -> std::result::Result<Self, TlsError> {
        let mut ssl = Ssl::new(&config.ctx)?;

        // SNI is only defined for DNS names
        match servername.parse::<IpAddr>() {
            Ok(ip) => {
                if config.verify_peer {
                    ssl.param_mut().set_ip(ip)?;
                }
            }
            Err(_) => {
                ssl.set_hostname(servername)?;
                if config.verify_peer {
                    ssl.param_mut().set_host(servername)?;
                }
            }
        }

        if !config.verify_peer {
            log::debug!("certificate verification disabled for {}", servername);
        }

        // The openssl crate's connect() method handles the handshake synchronously
        let ssl_stream = ssl.connect(tcp_stream).map_err(|e| {
            if is_handshake_timeout(&e) {
                TlsError::HandshakeTimeout
            } else {
                TlsError::HandshakeFailed(format!("Connection failed: {}", e))
            }
        })?;

        let session = TlsSessionOps {
            stream: ssl_stream,
            failed: false,
        };

        log::debug!(
            "TLS handshake with {} complete: {} {}",
            servername,
            session.version(),
            session.cipher().unwrap_or("<undef>")
        );
        if let Some(peer) = session.peer_certificate() {
            log::debug!("peer certificate: {} (self-signed: {})", peer, peer.is_self_signed());
        }

        Ok(session)
    }

    /// Accept a client connection with TLS (perform handshake)
    pub fn accept(tcp_stream: TcpStream, config: TlsConfig) -> std::result::Result<Self, TlsError> {
        let ssl = Ssl::new(&config.ctx)?;

        let ssl_stream = ssl
            .accept(tcp_stream)
            .map_err(|e| TlsError::HandshakeFailed(format!("Accept failed: {}", e)))?;

        Ok(TlsSessionOps {
            stream: ssl_stream,
            failed: false,
        })
    }

    /// Negotiated protocol version (e.g. "TLSv1.3")
    pub fn version(&self) -> &'static str {
        self.stream.ssl().version_str()
    }

    /// Negotiated cipher suite
    pub fn cipher(&self) -> Option<&'static str> {
        self.stream.ssl().current_cipher().map(|c| c.name())
    }

    /// Identity of the certificate the peer presented
    pub fn peer_certificate(&self) -> Option<CertInfo> {
        self.stream
            .ssl()
            .peer_certificate()
            .map(|cert| CertInfo::from_x509_ref(&cert))
    }

    /// Check if TLS failed
    pub fn failed(&self) -> bool {
        self.failed
    }
}

impl SessionOps for TlsSessionOps {
    fn poll(&self, events: PollEvents, timeout: Option<Duration>) -> GeminiResult<bool> {
        // Check if SSL has pending data
        if matches!(events, PollEvents::Read | PollEvents::Both) && self.stream.ssl().pending() > 0 {
            return Ok(true);
        }

        poll_fd(self.stream.get_ref().as_raw_fd(), events, timeout)
    }

    fn read(&mut self, buf: &mut [u8]) -> GeminiResult<usize> {
        match self.stream.ssl_read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.code() == ErrorCode::ZERO_RETURN => Ok(0),
            Err(e) if e.code() == ErrorCode::SYSCALL && e.io_error().is_none() => Ok(0),
            Err(e) if is_unexpected_eof(&e) => {
                log::trace!("peer closed without close_notify");
                self.failed = true;
                Ok(0)
            }
            Err(e) => {
                self.failed = true;
                Err(Error::from(
                    e.into_io_error()
                        .unwrap_or_else(|e| io::Error::new(io::ErrorKind::Other, e)),
                ))
            }
        }
    }

    fn write(&mut self, buf: &[u8]) -> GeminiResult<usize> {
        self.stream.write(buf).map_err(|e| {
            self.failed = true;
            Error::from(e)
        })
    }

    fn flush(&mut self) -> GeminiResult<()> {
        self.stream.flush().map_err(|e| {
            self.failed = true;
            Error::from(e)
        })
    }

    fn close(&mut self) -> GeminiResult<()> {
        // Send close_notify unless the connection already broke
        if !self.failed {
            let _ = self.stream.shutdown();
        }

        use std::net::Shutdown;
        match self.stream.get_mut().shutdown(Shutdown::Both) {
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other.map_err(Error::from),
        }
    }
}
