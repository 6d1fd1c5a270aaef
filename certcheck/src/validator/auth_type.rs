//! Authentication/key exchange tags, as used when a TLS client decides whether a server certificate
//! is suitable for a negotiated cipher suite

use core::fmt;
use core::str::FromStr;

use der::asn1::ObjectIdentifier;
use x509_cert::ext::pkix::KeyUsages;

use crate::util::error::*;
use crate::util::pdv_alg_oids::*;

/// Public key algorithm families that may be paired with an [`AuthType`]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum KeyAlgorithm {
    /// rsaEncryption
    Rsa,
    /// id-dsa
    Dsa,
    /// id-ecPublicKey or id-ecDH
    Ec,
    /// dhpublicnumber
    Dh,
}

impl KeyAlgorithm {
    /// Returns the family for a SubjectPublicKeyInfo algorithm OID, if recognized.
    pub fn from_oid(oid: &ObjectIdentifier) -> Option<KeyAlgorithm> {
        match *oid {
            PKIXALG_RSA_ENCRYPTION => Some(KeyAlgorithm::Rsa),
            PKIXALG_DSA => Some(KeyAlgorithm::Dsa),
            PKIXALG_EC_PUBLIC_KEY | PKIXALG_ECDH => Some(KeyAlgorithm::Ec),
            PKIXALG_DH_PUBLIC_NUMBER => Some(KeyAlgorithm::Dh),
            _ => None,
        }
    }
}

/// Authentication/key exchange algorithm tags accepted when checking server certificates.
///
/// Tags are parsed case-insensitively.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AuthType {
    /// RSA key transport
    Rsa,
    /// Export grade RSA key transport
    RsaExport,
    /// Ephemeral Diffie-Hellman signed with RSA
    DheRsa,
    /// Ephemeral ECDH signed with RSA
    EcdheRsa,
    /// Ephemeral Diffie-Hellman signed with DSA
    DheDss,
    /// ECDSA authentication
    Ecdsa,
    /// Ephemeral ECDH signed with ECDSA
    EcdheEcdsa,
    /// Static ECDH, certificate signed with ECDSA
    EcdhEcdsa,
    /// Static ECDH, certificate signed with RSA
    EcdhRsa,
    /// Static Diffie-Hellman, certificate signed with RSA
    DhRsa,
    /// Static Diffie-Hellman, certificate signed with DSA
    DhDss,
    /// Key exchange not known to the caller
    Unknown,
}

impl AuthType {
    /// Returns the key usage bit a server certificate must assert, when it has a keyUsage
    /// extension, to be used with this authentication type.
    pub fn required_key_usage(&self) -> KeyUsages {
        match self {
            AuthType::Rsa => KeyUsages::KeyEncipherment,
            AuthType::EcdhEcdsa | AuthType::EcdhRsa | AuthType::DhRsa | AuthType::DhDss => {
                KeyUsages::KeyAgreement
            }
            _ => KeyUsages::DigitalSignature,
        }
    }

    /// Returns the public key algorithm family required of the server certificate, or None if any
    /// family is acceptable.
    pub fn key_algorithm(&self) -> Option<KeyAlgorithm> {
        match self {
            AuthType::Rsa | AuthType::RsaExport | AuthType::DheRsa | AuthType::EcdheRsa => {
                Some(KeyAlgorithm::Rsa)
            }
            AuthType::DheDss => Some(KeyAlgorithm::Dsa),
            AuthType::Ecdsa | AuthType::EcdheEcdsa | AuthType::EcdhEcdsa | AuthType::EcdhRsa => {
                Some(KeyAlgorithm::Ec)
            }
            AuthType::DhRsa | AuthType::DhDss => Some(KeyAlgorithm::Dh),
            AuthType::Unknown => None,
        }
    }

    /// Returns true if a key identified by the given SubjectPublicKeyInfo algorithm OID may be
    /// used with this authentication type.
    pub fn permits_key_algorithm(&self, oid: &ObjectIdentifier) -> bool {
        match self.key_algorithm() {
            Some(required) => KeyAlgorithm::from_oid(oid) == Some(required),
            None => true,
        }
    }
}

impl FromStr for AuthType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "RSA" => Ok(AuthType::Rsa),
            "RSA_EXPORT" => Ok(AuthType::RsaExport),
            "DHE_RSA" => Ok(AuthType::DheRsa),
            "ECDHE_RSA" => Ok(AuthType::EcdheRsa),
            "DHE_DSS" => Ok(AuthType::DheDss),
            "ECDSA" => Ok(AuthType::Ecdsa),
            "ECDHE_ECDSA" => Ok(AuthType::EcdheEcdsa),
            "ECDH_ECDSA" => Ok(AuthType::EcdhEcdsa),
            "ECDH_RSA" => Ok(AuthType::EcdhRsa),
            "DH_RSA" => Ok(AuthType::DhRsa),
            "DH_DSS" => Ok(AuthType::DhDss),
            "UNKNOWN" => Ok(AuthType::Unknown),
            _ => Err(Error::PathValidation(PathValidationStatus::UnknownAuthType)),
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuthType::Rsa => "RSA",
            AuthType::RsaExport => "RSA_EXPORT",
            AuthType::DheRsa => "DHE_RSA",
            AuthType::EcdheRsa => "ECDHE_RSA",
            AuthType::DheDss => "DHE_DSS",
            AuthType::Ecdsa => "ECDSA",
            AuthType::EcdheEcdsa => "ECDHE_ECDSA",
            AuthType::EcdhEcdsa => "ECDH_ECDSA",
            AuthType::EcdhRsa => "ECDH_RSA",
            AuthType::DhRsa => "DH_RSA",
            AuthType::DhDss => "DH_DSS",
            AuthType::Unknown => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}
