//! TLS support for Gemini connections
//!
//! Every Gemini exchange runs over TLS. This module wraps OpenSSL behind the
//! session operations abstraction so the exchange code only sees
//! `SessionOps`.
//!
//! # Certificate policy
//!
//! Capsules overwhelmingly use self-signed certificates, so the default
//! client policy is [`CertificatePolicy::TrustAll`]: no chain validation and
//! no hostname check. This is a known insecurity. `SystemRoots` and `CaFile`
//! turn on peer verification and hostname checking without touching the
//! request/response code.
//!
//! # Examples
//!
//! ## Client
//!
//! ```no_run
//! use gemlite::gemini::tls::{CertificatePolicy, TlsConfig, TlsVersion};
//! use std::net::TcpStream;
//!
//! let tls_config = TlsConfig::client()
//!     .unwrap()
//!     .certificate_policy(&CertificatePolicy::TrustAll)
//!     .unwrap()
//!     .version_range(TlsVersion::Tls12, TlsVersion::Tls13)
//!     .unwrap()
//!     .build();
//!
//! let tcp_stream = TcpStream::connect("geminiprotocol.net:1965").unwrap();
//! let tls_session = tls_config.connect(tcp_stream, "geminiprotocol.net").unwrap();
//! ```
//!
//! ## Test capsule
//!
//! ```no_run
//! use gemlite::gemini::tls::TlsConfig;
//! use std::net::TcpListener;
//!
//! // Without a certificate the server generates a self-signed one for "localhost"
//! let tls_config = TlsConfig::server().unwrap().build().unwrap();
//!
//! let listener = TcpListener::bind("127.0.0.1:0").unwrap();
//! let (tcp_stream, _) = listener.accept().unwrap();
//! let tls_session = tls_config.accept(tcp_stream).unwrap();
//! ```

pub mod cert;
pub mod config;
pub mod selfsigned;
pub mod session;

pub use cert::CertInfo;
pub use config::{
    CertificatePolicy, ClientConfigBuilder, ServerConfigBuilder, TlsConfig, TlsError, TlsVersion,
};
pub use selfsigned::SelfSigned;
pub use session::TlsSessionOps;

/// Result type for TLS operations
pub type Result<T> = std::result::Result<T, TlsError>;
