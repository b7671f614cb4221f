//! Gemini request/response engine
//!
//! This module opens a TLS connection to a capsule, sends the single request
//! line, reads the response until the server closes the connection and splits
//! it into status, meta and body.
//!
//! # Architecture
//!
//! Transport I/O goes through the session operations abstraction:
//!
//! - `SessionOps` trait defines operations (poll, read, write, close)
//! - `FdSessionOps` is plain TCP, `tls::TlsSessionOps` is OpenSSL over TCP
//! - `GeminiSession` wraps either one, applies the optional timeout and
//!   closes the transport when dropped
//!
//! The request/response exchange itself never knows which transport it runs
//! over, so it can be exercised over plain TCP in tests.
//!
//! # Examples
//!
//! ```no_run
//! use gemlite::address::Address;
//! use gemlite::gemini::{ClientConfig, GeminiClient};
//!
//! let client = GeminiClient::new(ClientConfig::default()).unwrap();
//! let address = Address::parse("gemini://geminiprotocol.net/").unwrap();
//! let response = client.request(&address).unwrap();
//! println!("{} {}", response.status(), response.meta());
//! ```

pub mod client;
pub mod config;
pub mod message;
pub mod parser;
pub mod server;
pub mod session;
pub mod tls;

pub use client::GeminiClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use message::{Response, Status, StatusCategory};
pub use parser::parse_response;
pub use server::GeminiServer;
pub use session::{FdSessionOps, GeminiSession, PollEvents, SessionOps};
pub use tls::{CertificatePolicy, TlsConfig, TlsError, TlsVersion};

use crate::address::InvalidAddress;

/// Result type for Gemini operations
pub type Result<T> = std::result::Result<T, Error>;

/// Reason a request produced no response
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("unknown host {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to connect to {host}: {source}")]
    Connect {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] TlsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("server closed the connection without a response")]
    EmptyResponse,

    #[error("timed out")]
    Timeout,
}

/// Gemini operation errors
///
/// Every variant is a distinct failure kind so front-ends can report each
/// one precisely.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    InvalidAddress(#[from] InvalidAddress),

    #[error("request failed: {0}")]
    Connection(#[from] ConnectionError),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("not a Gemini link: {0}")]
    NotGeminiLink(String),

    #[error("too many redirects (limit {0})")]
    TooManyRedirects(usize),

    #[error("TLS configuration error: {0}")]
    Tls(#[from] TlsError),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match e.kind() {
            // Socket-level deadlines surface as these kinds
            ErrorKind::WouldBlock | ErrorKind::TimedOut => Error::Connection(ConnectionError::Timeout),
            _ => Error::Connection(ConnectionError::Io(e)),
        }
    }
}

impl Error {
    /// True for failures where the request produced nothing usable
    /// (connection problems and unparseable responses alike)
    pub fn is_request_failure(&self) -> bool {
        matches!(self, Error::Connection(_) | Error::MalformedResponse(_))
    }
}

/// Port reserved for Gemini
pub const DEFAULT_GEMINI_PORT: u16 = 1965;

/// CRLF line ending
pub const CRLF: &str = "\r\n";

/// Longest request line a server has to accept (URL only, CRLF excluded)
pub const MAX_URL_LEN: usize = 1024;
