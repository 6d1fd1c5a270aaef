//! Wrapper around a decoded certificate to support validation of server certificates

use der::{asn1::ObjectIdentifier, Decode, Encode};
use x509_cert::Certificate;

use crate::util::error::*;
use crate::validator::pdv_extension::*;

/// [`PDVCertificate`] is used to aggregate a binary, DER-encoded Certificate, a parsed Certificate, a locator
/// and parsed extensions in support of validation operations.
///
/// The parsed extensions are those listed in [`EXTS_OF_INTEREST`].
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct PDVCertificate {
    /// Binary, encoded Certificate object
    pub encoded_cert: Vec<u8>,
    /// Decoded Certificate object
    pub decoded_cert: Certificate,
    /// File name or other locator for troubleshooting purposes. May be empty.
    pub locator: String,
    /// Parsed extensions from the Certificate
    pub parsed_extensions: ParsedExtensions,
}

impl PDVCertificate {
    /// Sets the locator, i.e., the file name the certificate was read from.
    pub fn with_locator(mut self, locator: &str) -> Self {
        self.locator = locator.to_string();
        self
    }
}

impl TryFrom<&[u8]> for PDVCertificate {
    type Error = der::Error;

    fn try_from(enc_cert: &[u8]) -> der::Result<Self> {
        let cert = Certificate::from_der(enc_cert)?;
        let mut pdv_cert = PDVCertificate {
            encoded_cert: enc_cert.to_vec(),
            decoded_cert: cert,
            locator: String::new(),
            parsed_extensions: Default::default(),
        };
        pdv_cert.parse_extensions(EXTS_OF_INTEREST);
        Ok(pdv_cert)
    }
}

impl TryFrom<Certificate> for PDVCertificate {
    type Error = der::Error;

    fn try_from(cert: Certificate) -> der::Result<Self> {
        let enc_cert = cert.to_der()?;
        let mut pdv_cert = PDVCertificate {
            encoded_cert: enc_cert,
            decoded_cert: cert,
            locator: String::new(),
            parsed_extensions: Default::default(),
        };
        pdv_cert.parse_extensions(EXTS_OF_INTEREST);
        Ok(pdv_cert)
    }
}

impl ExtensionProcessing for PDVCertificate {
    /// `get_extension` takes an ObjectIdentifier that identifies an extension type and returns
    /// a previously parsed [`PDVExtension`] instance containing the decoded extension if the extension was present.
    fn get_extension(&self, oid: &ObjectIdentifier) -> Result<Option<&'_ PDVExtension>> {
        Ok(self.parsed_extensions.get(oid))
    }

    fn parse_extension(&mut self, oid: &ObjectIdentifier) -> Result<Option<&PDVExtension>> {
        if !self.parsed_extensions.contains_key(oid) {
            match parse_extension_from_list(&self.decoded_cert.tbs_certificate.extensions, oid)? {
                Some(ext) => {
                    self.parsed_extensions.insert(*oid, ext);
                }
                None => return Ok(None),
            }
        }
        Ok(self.parsed_extensions.get(oid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use const_oid::db::rfc5912::{ID_CE_BASIC_CONSTRAINTS, ID_CE_KEY_USAGE};
    use rcgen::{
        BasicConstraints, CertificateParams, CustomExtension, IsCa, KeyPair, KeyUsagePurpose,
    };

    #[test]
    fn parse_extensions_test() {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(vec!["ca.example.com".to_string()]).unwrap();
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
        let cert = params.self_signed(&key).unwrap();

        let pdv_cert = PDVCertificate::try_from(cert.der().as_ref())
            .unwrap()
            .with_locator("ca.der");
        assert_eq!("ca.der", pdv_cert.locator);
        assert_eq!(cert.der().as_ref(), pdv_cert.encoded_cert.as_slice());

        match pdv_cert.get_extension(&ID_CE_BASIC_CONSTRAINTS).unwrap() {
            Some(PDVExtension::BasicConstraints(bc)) => assert!(bc.ca),
            _ => panic!("expected basicConstraints"),
        }
        match pdv_cert.get_extension(&ID_CE_KEY_USAGE).unwrap() {
            Some(PDVExtension::KeyUsage(ku)) => {
                assert!(ku.key_cert_sign());
                assert!(!ku.digital_signature());
            }
            _ => panic!("expected keyUsage"),
        }
    }

    #[test]
    fn undecodable_extensions_are_not_cached() {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(vec!["www.example.com".to_string()]).unwrap();
        params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
        params.custom_extensions = vec![
            CustomExtension::from_oid_content(&[2, 5, 29, 15], vec![0x03, 0x02, 0x07, 0x80]),
            CustomExtension::from_oid_content(&[2, 5, 29, 19], vec![0x05, 0x00]),
        ];
        let cert = params.self_signed(&key).unwrap();

        let mut pdv_cert = PDVCertificate::try_from(cert.der().as_ref()).unwrap();
        assert_eq!(None, pdv_cert.get_extension(&ID_CE_KEY_USAGE).unwrap());
        assert_eq!(None, pdv_cert.get_extension(&ID_CE_BASIC_CONSTRAINTS).unwrap());
        assert_eq!(
            Some(Error::PathValidation(PathValidationStatus::EncodingError)),
            pdv_cert.parse_extension(&ID_CE_KEY_USAGE).err()
        );
        assert!(matches!(
            pdv_cert.parse_extension(&ID_CE_BASIC_CONSTRAINTS),
            Err(Error::Asn1Error(_))
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(PDVCertificate::try_from([0x30u8, 0x03, 0x02, 0x01, 0x01].as_slice()).is_err());
    }
}
