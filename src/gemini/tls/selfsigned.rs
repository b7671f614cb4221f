//! Self-signed certificate generation
//!
//! Test capsules need a server certificate; generating one at startup
//! avoids shipping key material.

use super::config::TlsError;
use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::x509::extension::SubjectAlternativeName;
use openssl::x509::{X509Builder, X509NameBuilder, X509};

/// Validity period of generated certificates
const VALIDITY_DAYS: u32 = 3650;

/// A certificate with its private key
pub struct SelfSigned {
    pub cert: X509,
    pub key: PKey<Private>,
}

impl SelfSigned {
    /// Generate a P-256 certificate for `common_name`, also listed as a DNS SAN
    pub fn generate(common_name: &str) -> Result<Self, TlsError> {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1)?;
        let key = PKey::from_ec_key(EcKey::generate(&group)?)?;

        let mut name = X509NameBuilder::new()?;
        name.append_entry_by_nid(Nid::COMMONNAME, common_name)?;
        let name = name.build();

        let serial = {
            let mut bn = BigNum::new()?;
            bn.rand(64, MsbOption::MAYBE_ZERO, false)?;
            bn.to_asn1_integer()?
        };

        let mut builder = X509Builder::new()?;
        builder.set_version(2)?;
        builder.set_serial_number(&serial)?;
        builder.set_subject_name(&name)?;
        builder.set_issuer_name(&name)?;
        builder.set_pubkey(&key)?;
        let not_before = Asn1Time::days_from_now(0)?;
        let not_after = Asn1Time::days_from_now(VALIDITY_DAYS)?;
        builder.set_not_before(&not_before)?;
        builder.set_not_after(&not_after)?;

        let san = SubjectAlternativeName::new()
            .dns(common_name)
            .build(&builder.x509v3_context(None, None))?;
        builder.append_extension(san)?;

        builder.sign(&key, MessageDigest::sha256())?;

        Ok(SelfSigned {
            cert: builder.build(),
            key,
        })
    }
}
