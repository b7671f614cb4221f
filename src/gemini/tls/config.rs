//! TLS configuration
//!
//! This module provides TLS configuration builders for both client and server.

use super::selfsigned::SelfSigned;
use openssl::pkey::{PKeyRef, Private};
use openssl::ssl::{SslContext, SslContextBuilder, SslMethod, SslVerifyMode};
use openssl::x509::X509Ref;
use std::fs::File;
use std::io::Read;
use std::net::TcpStream;
use std::path::{Path, PathBuf};

/// TLS version
///
/// Gemini requires TLS 1.2 or later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TlsVersion {
    /// TLS 1.2
    Tls12,
    /// TLS 1.3
    Tls13,
}

impl TlsVersion {
    /// Get OpenSSL protocol version constant
    pub fn to_openssl_version(&self) -> openssl::ssl::SslVersion {
        use openssl::ssl::SslVersion;
        match self {
            TlsVersion::Tls12 => SslVersion::TLS1_2,
            TlsVersion::Tls13 => SslVersion::TLS1_3,
        }
    }

    /// Get version as string
    pub fn as_str(&self) -> &'static str {
        match self {
            TlsVersion::Tls12 => "TLSv1.2",
            TlsVersion::Tls13 => "TLSv1.3",
        }
    }
}

/// How the client treats server certificates
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CertificatePolicy {
    /// Accept any certificate without chain or hostname checks
    #[default]
    TrustAll,
    /// Verify against the system trust store and check the hostname
    SystemRoots,
    /// Verify against the PEM certificates in a file and check the hostname
    CaFile(PathBuf),
}

impl CertificatePolicy {
    /// True if the peer certificate is verified
    pub fn verifies_peer(&self) -> bool {
        !matches!(self, CertificatePolicy::TrustAll)
    }
}

/// TLS errors
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Certificate error: {0}")]
    Certificate(String),

    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),

    #[error("Handshake timed out")]
    HandshakeTimeout,
}

/// TLS configuration (immutable after building)
#[derive(Clone)]
pub struct TlsConfig {
    pub(crate) ctx: SslContext,
    pub(crate) is_server: bool,
    pub(crate) verify_peer: bool,
}

impl TlsConfig {
    /// Create a new client configuration builder
    pub fn client() -> Result<ClientConfigBuilder, TlsError> {
        ClientConfigBuilder::new()
    }

    /// Create a new server configuration builder
    pub fn server() -> Result<ServerConfigBuilder, TlsError> {
        ServerConfigBuilder::new()
    }

    /// True if the peer certificate is verified during the handshake
    pub fn verifies_peer(&self) -> bool {
        self.verify_peer
    }

    /// Connect to a server with TLS (client-side)
    ///
    /// `servername` is sent as SNI and, when verification is on, checked
    /// against the certificate.
    pub fn connect(&self, stream: TcpStream, servername: &str) -> Result<super::TlsSessionOps, TlsError> {
        if self.is_server {
            return Err(TlsError::InvalidConfig(
                "Cannot use server config for client connection".to_string(),
            ));
        }
        super::session::TlsSessionOps::connect(stream, self.clone(), servername)
    }

    /// Accept a client connection with TLS (server-side)
    pub fn accept(&self, stream: TcpStream) -> Result<super::TlsSessionOps, TlsError> {
        if !self.is_server {
            return Err(TlsError::InvalidConfig(
                "Cannot use client config for server accept".to_string(),
            ));
        }
        super::session::TlsSessionOps::accept(stream, self.clone())
    }
}

fn set_version_range(
    ctx_builder: &mut SslContextBuilder,
    min: TlsVersion,
    max: TlsVersion,
) -> Result<(), TlsError> {
    if min > max {
        return Err(TlsError::InvalidConfig(format!(
            "minimum version {} is above maximum {}",
            min.as_str(),
            max.as_str()
        )));
    }
    ctx_builder.set_min_proto_version(Some(min.to_openssl_version()))?;
    ctx_builder.set_max_proto_version(Some(max.to_openssl_version()))?;
    Ok(())
}

/// Read a PEM file into memory
fn read_pem<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, TlsError> {
    let mut pem = Vec::new();
    File::open(path.as_ref())?.read_to_end(&mut pem)?;
    Ok(pem)
}

/// Client configuration builder
pub struct ClientConfigBuilder {
    ctx_builder: SslContextBuilder,
    verify_peer: bool,
}

impl ClientConfigBuilder {
    fn new() -> Result<Self, TlsError> {
        let mut ctx_builder = SslContextBuilder::new(SslMethod::tls_client())?;
        ctx_builder.set_min_proto_version(Some(TlsVersion::Tls12.to_openssl_version()))?;

        // Default: trust any certificate
        ctx_builder.set_verify(SslVerifyMode::NONE);

        Ok(ClientConfigBuilder {
            ctx_builder,
            verify_peer: false,
        })
    }

    /// Apply a certificate policy
    pub fn certificate_policy(mut self, policy: &CertificatePolicy) -> Result<Self, TlsError> {
        match policy {
            CertificatePolicy::TrustAll => {
                self.ctx_builder.set_verify(SslVerifyMode::NONE);
            }
            CertificatePolicy::SystemRoots => {
                self.ctx_builder.set_default_verify_paths()?;
                self.ctx_builder.set_verify(SslVerifyMode::PEER);
            }
            CertificatePolicy::CaFile(path) => {
                if !path.is_file() {
                    return Err(TlsError::Certificate(format!(
                        "CA file {} does not exist",
                        path.display()
                    )));
                }
                self.ctx_builder.set_ca_file(path)?;
                self.ctx_builder.set_verify(SslVerifyMode::PEER);
            }
        }
        self.verify_peer = policy.verifies_peer();
        Ok(self)
    }

    /// Set TLS version (both min and max)
    pub fn version(self, version: TlsVersion) -> Result<Self, TlsError> {
        self.version_range(version, version)
    }

    /// Set TLS version range
    pub fn version_range(mut self, min: TlsVersion, max: TlsVersion) -> Result<Self, TlsError> {
        set_version_range(&mut self.ctx_builder, min, max)?;
        Ok(self)
    }

    /// Build the TLS configuration
    pub fn build(self) -> TlsConfig {
        TlsConfig {
            ctx: self.ctx_builder.build(),
            is_server: false,
            verify_peer: self.verify_peer,
        }
    }
}

/// Server configuration builder
pub struct ServerConfigBuilder {
    ctx_builder: SslContextBuilder,
    has_cert: bool,
}

impl ServerConfigBuilder {
    fn new() -> Result<Self, TlsError> {
        let mut ctx_builder = SslContextBuilder::new(SslMethod::tls_server())?;
        ctx_builder.set_min_proto_version(Some(TlsVersion::Tls12.to_openssl_version()))?;

        Ok(ServerConfigBuilder {
            ctx_builder,
            has_cert: false,
        })
    }

    /// Set TLS version (both min and max)
    pub fn version(self, version: TlsVersion) -> Result<Self, TlsError> {
        self.version_range(version, version)
    }

    /// Set TLS version range
    pub fn version_range(mut self, min: TlsVersion, max: TlsVersion) -> Result<Self, TlsError> {
        set_version_range(&mut self.ctx_builder, min, max)?;
        Ok(self)
    }

    /// Use an in-memory certificate and private key
    pub fn certificate(mut self, cert: &X509Ref, key: &PKeyRef<Private>) -> Result<Self, TlsError> {
        self.ctx_builder.set_certificate(cert)?;
        self.ctx_builder.set_private_key(key)?;
        self.ctx_builder.check_private_key()?;
        self.has_cert = true;
        Ok(self)
    }

    /// Load certificate and private key from one PEM file
    pub fn cert_file<P: AsRef<Path>>(self, path: P) -> Result<Self, TlsError> {
        use openssl::pkey::PKey;
        use openssl::x509::X509;

        let pem = read_pem(path)?;

        let cert = X509::from_pem(&pem)
            .map_err(|e| TlsError::Certificate(format!("Failed to load certificate: {}", e)))?;
        let key = PKey::private_key_from_pem(&pem)
            .map_err(|e| TlsError::Certificate(format!("Failed to load private key: {}", e)))?;

        self.certificate(&cert, &key)
    }

    /// Build the TLS configuration
    ///
    /// Without a configured certificate a self-signed one for `localhost` is
    /// generated.
    pub fn build(mut self) -> Result<TlsConfig, TlsError> {
        if !self.has_cert {
            let generated = SelfSigned::generate("localhost")?;
            self = self.certificate(&generated.cert, &generated.key)?;
        }

        Ok(TlsConfig {
            ctx: self.ctx_builder.build(),
            is_server: true,
            verify_peer: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_client_defaults_to_trust_all() {
        let config = TlsConfig::client().unwrap().build();
        assert!(!config.is_server);
        assert!(!config.verifies_peer());
    }

    #[test]
    fn test_client_system_roots() {
        let config = TlsConfig::client()
            .unwrap()
            .certificate_policy(&CertificatePolicy::SystemRoots)
            .unwrap()
            .build();
        assert!(config.verifies_peer());
    }

    #[test]
    fn test_client_missing_ca_file() {
        let result = TlsConfig::client()
            .unwrap()
            .certificate_policy(&CertificatePolicy::CaFile("/nonexistent/ca.pem".into()));
        assert!(matches!(result, Err(TlsError::Certificate(_))));
    }

    #[test]
    fn test_client_ca_file() {
        let generated = SelfSigned::generate("capsule.test").unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&generated.cert.to_pem().unwrap()).unwrap();

        let config = TlsConfig::client()
            .unwrap()
            .certificate_policy(&CertificatePolicy::CaFile(file.path().to_path_buf()))
            .unwrap()
            .build();
        assert!(config.verifies_peer());
    }

    #[test]
    fn test_version_range() {
        let config = TlsConfig::client()
            .unwrap()
            .version_range(TlsVersion::Tls12, TlsVersion::Tls13)
            .unwrap()
            .build();
        assert!(!config.is_server);

        let inverted = TlsConfig::client()
            .unwrap()
            .version_range(TlsVersion::Tls13, TlsVersion::Tls12);
        assert!(matches!(inverted, Err(TlsError::InvalidConfig(_))));
    }

    #[test]
    fn test_server_generates_certificate() {
        let config = TlsConfig::server()
            .unwrap()
            .version(TlsVersion::Tls13)
            .unwrap()
            .build()
            .unwrap();
        assert!(config.is_server);
    }

    #[test]
    fn test_server_cert_file() {
        let generated = SelfSigned::generate("localhost").unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&generated.cert.to_pem().unwrap()).unwrap();
        file.write_all(&generated.key.private_key_to_pem_pkcs8().unwrap()).unwrap();

        let config = TlsConfig::server()
            .unwrap()
            .cert_file(file.path())
            .unwrap()
            .build()
            .unwrap();
        assert!(config.is_server);
    }

    #[test]
    fn test_role_mismatch() {
        let client = TlsConfig::client().unwrap().build();
        let server = TlsConfig::server().unwrap().build().unwrap();

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let stream = TcpStream::connect(addr).unwrap();
        assert!(matches!(client.accept(stream), Err(TlsError::InvalidConfig(_))));

        let stream = TcpStream::connect(addr).unwrap();
        assert!(matches!(
            server.connect(stream, "localhost"),
            Err(TlsError::InvalidConfig(_))
        ));
    }
}
