//! Certificate handling and parsing
//!
//! Peer certificates are never validated under the trust-all policy, but
//! their identity is still extracted so it can be logged and inspected.

use openssl::nid::Nid;
use openssl::x509::{X509NameRef, X509Ref};
use std::fmt;

/// Certificate information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertInfo {
    /// Certificate subject (Common Name)
    pub subject: String,
    /// Certificate issuer (Common Name)
    pub issuer: String,
    /// Subject Alternative Names (DNS names and IP addresses)
    pub subject_alt_names: Vec<String>,
}

impl CertInfo {
    /// Extract certificate information from an X.509 certificate reference
    pub fn from_x509_ref(cert: &X509Ref) -> Self {
        CertInfo {
            subject: Self::get_cn(cert.subject_name()),
            issuer: Self::get_cn(cert.issuer_name()),
            subject_alt_names: Self::get_subject_alt_names(cert),
        }
    }

    /// True when subject and issuer match
    pub fn is_self_signed(&self) -> bool {
        self.subject == self.issuer
    }

    /// Get Common Name from X509_NAME
    fn get_cn(name: &X509NameRef) -> String {
        name.entries_by_nid(Nid::COMMONNAME)
            .next()
            .map(|entry| String::from_utf8_lossy(entry.data().as_slice()).into_owned())
            .unwrap_or_else(|| "<undef>".to_string())
    }

    fn get_subject_alt_names(cert: &X509Ref) -> Vec<String> {
        let Some(san_ext) = cert.subject_alt_names() else {
            return Vec::new();
        };

        san_ext
            .iter()
            .filter_map(|name| {
                if let Some(dns) = name.dnsname() {
                    return Some(format!("DNS:{}", dns));
                }
                let ip = name.ipaddress()?;
                match ip.len() {
                    4 => {
                        let octets: [u8; 4] = ip.try_into().ok()?;
                        Some(format!("IP:{}", std::net::Ipv4Addr::from(octets)))
                    }
                    16 => {
                        let octets: [u8; 16] = ip.try_into().ok()?;
                        Some(format!("IP:{}", std::net::Ipv6Addr::from(octets)))
                    }
                    _ => None,
                }
            })
            .collect()
    }
}

impl fmt::Display for CertInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subject={} issuer={}", self.subject, self.issuer)?;
        if !self.subject_alt_names.is_empty() {
            write!(f, " san={}", self.subject_alt_names.join(","))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::tls::SelfSigned;

    #[test]
    fn test_get_cn() {
        let generated = SelfSigned::generate("example.com").unwrap();
        let subject = CertInfo::get_cn(generated.cert.subject_name());
        assert_eq!(subject, "example.com");
    }

    #[test]
    fn test_display() {
        let generated = SelfSigned::generate("example.com").unwrap();
        let info = CertInfo::from_x509_ref(&generated.cert);
        assert!(info.is_self_signed());
        assert_eq!(
            info.to_string(),
            "subject=example.com issuer=example.com san=DNS:example.com"
        );
    }
}
