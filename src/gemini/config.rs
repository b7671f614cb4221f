//! Client configuration

use super::tls::{CertificatePolicy, TlsVersion};
use super::DEFAULT_GEMINI_PORT;
use std::time::Duration;

/// Gemini client configuration (immutable after building)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub(crate) certificate_policy: CertificatePolicy,
    pub(crate) port: u16,
    pub(crate) timeout: Option<Duration>,
    pub(crate) tls_versions: Option<(TlsVersion, TlsVersion)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            certificate_policy: CertificatePolicy::TrustAll,
            port: DEFAULT_GEMINI_PORT,
            timeout: None,
            tls_versions: None,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: ClientConfig::default(),
        }
    }

    pub fn certificate_policy(&self) -> &CertificatePolicy {
        &self.certificate_policy
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Client configuration builder
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// How server certificates are checked (default: trust all)
    pub fn certificate_policy(mut self, policy: CertificatePolicy) -> Self {
        self.config.certificate_policy = policy;
        self
    }

    /// Port to connect to (default: 1965)
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Deadline for connecting and for each read or write
    ///
    /// There is no deadline by default: a hung server blocks the caller.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Restrict the negotiated TLS versions
    pub fn tls_version_range(mut self, min: TlsVersion, max: TlsVersion) -> Self {
        self.config.tls_versions = Some((min, max));
        self
    }

    /// Build the configuration
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
