//! Wrapper around a decoded trust anchor to support validation of server certificates
use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(feature = "webpki")] {
        use log::error;
        use sha1::{Digest, Sha1};
        use webpki_roots::TrustAnchor;
        use der::{asn1::OctetString, Length};
        use x509_cert::anchor::{CertPathControls, TrustAnchorInfo};
        use x509_cert::ext::pkix::NameConstraints;
    }
}

use der::{asn1::ObjectIdentifier, Decode, Encode};
use spki::SubjectPublicKeyInfoOwned;
use x509_cert::anchor::TrustAnchorChoice;
use x509_cert::ext::Extensions;
use x509_cert::name::Name;
use x509_cert::Certificate;

use crate::util::error::*;
use crate::validator::pdv_extension::*;

/// [`PDVTrustAnchorChoice`] is used to aggregate a binary TrustAnchorChoice, a parsed TrustAnchorChoice,
/// a locator and parsed extensions in support of validation operations.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct PDVTrustAnchorChoice {
    /// Binary, encoded TrustAnchorChoice object
    pub encoded_ta: Vec<u8>,
    /// Decoded TrustAnchorChoice object
    pub decoded_ta: TrustAnchorChoice,
    /// Where the trust anchor came from, i.e., a system store entry index or a webpki-roots index
    pub locator: String,
    /// Parsed extensions from the TrustAnchorChoice
    pub parsed_extensions: ParsedExtensions,
}

impl PDVTrustAnchorChoice {
    /// Sets the locator for the trust anchor.
    pub fn with_locator(mut self, locator: &str) -> Self {
        self.locator = locator.to_string();
        self
    }
}

impl TryFrom<&[u8]> for PDVTrustAnchorChoice {
    type Error = der::Error;

    fn try_from(enc_ta: &[u8]) -> der::Result<Self> {
        let ta = TrustAnchorChoice::from_der(enc_ta)?;
        let mut pdv_ta = PDVTrustAnchorChoice {
            encoded_ta: enc_ta.to_vec(),
            decoded_ta: ta,
            locator: String::new(),
            parsed_extensions: Default::default(),
        };
        pdv_ta.parse_extensions(EXTS_OF_INTEREST);
        Ok(pdv_ta)
    }
}

impl TryFrom<Certificate> for PDVTrustAnchorChoice {
    type Error = der::Error;

    fn try_from(cert: Certificate) -> der::Result<Self> {
        let enc_cert = cert.to_der()?;
        let mut pdv_ta = PDVTrustAnchorChoice {
            encoded_ta: enc_cert,
            decoded_ta: TrustAnchorChoice::Certificate(cert),
            locator: String::new(),
            parsed_extensions: Default::default(),
        };
        pdv_ta.parse_extensions(EXTS_OF_INTEREST);
        Ok(pdv_ta)
    }
}

/// The webpki-roots TrustAnchor structure stores values with the outer SEQUENCE tag and length
/// removed. This function restores the outer SEQUENCE tag and length and returns the encoding.
#[cfg(feature = "webpki")]
fn restore_sequence(partial_bytes: &[u8]) -> der::Result<Vec<u8>> {
    let l = Length::try_from(partial_bytes.len())?;
    let mut enc = vec![0x30];
    enc.append(&mut l.to_der()?);
    enc.extend_from_slice(partial_bytes);
    Ok(enc)
}

#[cfg(feature = "webpki")]
fn partial_name_to_name(partial_name_bytes: &[u8]) -> der::Result<Name> {
    Name::from_der(&restore_sequence(partial_name_bytes)?)
}

#[cfg(feature = "webpki")]
fn partial_spki_to_spki(partial_spki_bytes: &[u8]) -> der::Result<SubjectPublicKeyInfoOwned> {
    SubjectPublicKeyInfoOwned::from_der(&restore_sequence(partial_spki_bytes)?)
}

#[cfg(feature = "webpki")]
impl TryFrom<&TrustAnchor<'_>> for PDVTrustAnchorChoice {
    type Error = crate::Error;

    /// Takes a webpki-roots TrustAnchor and attempts to produce a PDVTrustAnchorChoice by first
    /// generating an [RFC5914](https://datatracker.ietf.org/doc/html/rfc5914) TrustAnchorInfo info
    /// structure containing the name, public key and, optionally, name constraints from the TrustAnchor.
    fn try_from(ta: &TrustAnchor<'_>) -> crate::Result<Self> {
        let n = partial_name_to_name(ta.subject)?;
        let spki = partial_spki_to_spki(ta.spki)?;
        let nc = match ta.name_constraints {
            Some(nc) => Some(NameConstraints::from_der(nc)?),
            None => None,
        };

        // webpki-roots omits the key identifier, so calculate one using the SHA-1 method from
        // RFC 5280 section 4.2.1.2, which is what most CAs put in their SKID extension.
        let key_id = match spki.subject_public_key.as_bytes() {
            Some(b) => Sha1::digest(b),
            None => {
                error!("Failed to calculate key identifier for {}", n);
                return Err(Error::Unrecognized);
            }
        };

        // the name is conveyed in CertPathControls so it must be present
        let cp = CertPathControls {
            ta_name: n,
            certificate: None,
            policy_set: None,
            policy_flags: None,
            name_constr: nc,
            path_len_constraint: None,
        };
        let tai = TrustAnchorInfo {
            version: Default::default(),
            pub_key: spki,
            key_id: OctetString::new(key_id.to_vec())?,
            ta_title: None,
            cert_path: Some(cp),
            extensions: None,
            ta_title_lang_tag: None,
        };
        let tac = TrustAnchorChoice::TaInfo(tai);
        let enc_ta = tac.to_der()?;
        Ok(PDVTrustAnchorChoice {
            encoded_ta: enc_ta,
            decoded_ta: tac,
            locator: String::new(),
            parsed_extensions: Default::default(),
        })
    }
}

/// Returns the extensions of the certificate conveyed by a trust anchor, if any.
fn get_trust_anchor_extensions(ta: &TrustAnchorChoice) -> Option<&Extensions> {
    get_certificate_from_trust_anchor(ta).and_then(|c| c.tbs_certificate.extensions.as_ref())
}

impl ExtensionProcessing for PDVTrustAnchorChoice {
    /// `get_extension` takes an ObjectIdentifier that identifies an extension type and returns
    /// a previously parsed PDVExtension instance containing the decoded extension if the extension was present.
    fn get_extension(&self, oid: &ObjectIdentifier) -> Result<Option<&'_ PDVExtension>> {
        Ok(self.parsed_extensions.get(oid))
    }

    fn parse_extension(&mut self, oid: &ObjectIdentifier) -> Result<Option<&PDVExtension>> {
        if !self.parsed_extensions.contains_key(oid) {
            let exts = get_trust_anchor_extensions(&self.decoded_ta).cloned();
            match parse_extension_from_list(&exts, oid)? {
                Some(ext) => {
                    self.parsed_extensions.insert(*oid, ext);
                }
                None => return Ok(None),
            }
        }
        Ok(self.parsed_extensions.get(oid))
    }
}

/// [`get_trust_anchor_name`] returns the name of the trust anchor.
///
/// The name is read from the subject field of a certificate if the Certificate option is used or
/// from the CertPathControls field within a TrustAnchorInfo if that option is used.
pub fn get_trust_anchor_name(ta: &TrustAnchorChoice) -> Result<&Name> {
    match ta {
        TrustAnchorChoice::Certificate(cert) => Ok(&cert.tbs_certificate.subject),
        TrustAnchorChoice::TaInfo(tai) => match &tai.cert_path {
            Some(cert_path) => Ok(&cert_path.ta_name),
            None => Err(Error::PathValidation(
                PathValidationStatus::MissingTrustAnchorName,
            )),
        },
        #[allow(unreachable_patterns)]
        _ => Err(Error::NotFound),
    }
}

/// `get_subject_public_key_info_from_trust_anchor` returns a reference to the subject public key
/// contained in a TrustAnchorChoice object:
/// - Certificate.tbs_certificate.subject_public_key_info
/// - TrustAnchorInfo.pub_key field.
pub fn get_subject_public_key_info_from_trust_anchor(
    ta: &TrustAnchorChoice,
) -> Result<&SubjectPublicKeyInfoOwned> {
    match ta {
        TrustAnchorChoice::Certificate(cert) => Ok(&cert.tbs_certificate.subject_public_key_info),
        TrustAnchorChoice::TaInfo(tai) => Ok(&tai.pub_key),
        #[allow(unreachable_patterns)]
        _ => Err(Error::NotFound),
    }
}

/// get_certificate_from_trust_anchor returns the certificate from the TrustAnchorChoice. This will
/// be either the Certificate choice itself or the TrustAnchorInfo.cert_path.certificate field.
pub fn get_certificate_from_trust_anchor(ta: &TrustAnchorChoice) -> Option<&Certificate> {
    match ta {
        TrustAnchorChoice::Certificate(cert) => Some(cert),
        TrustAnchorChoice::TaInfo(tai) => match &tai.cert_path {
            Some(cp) => cp.certificate.as_ref(),
            None => None,
        },
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use const_oid::db::rfc5912::ID_CE_BASIC_CONSTRAINTS;

    #[test]
    fn ta_from_cert_test() {
        let key = rcgen::KeyPair::generate().unwrap();
        let mut params = rcgen::CertificateParams::new(vec![]).unwrap();
        params
            .distinguished_name
            .push(rcgen::DnType::CommonName, "Test Root");
        params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
        let cert = params.self_signed(&key).unwrap();
        let decoded = Certificate::from_der(cert.der()).unwrap();

        let ta = PDVTrustAnchorChoice::try_from(decoded.clone()).unwrap();
        assert_eq!(
            &decoded.tbs_certificate.subject,
            get_trust_anchor_name(&ta.decoded_ta).unwrap()
        );
        assert_eq!(
            &decoded.tbs_certificate.subject_public_key_info,
            get_subject_public_key_info_from_trust_anchor(&ta.decoded_ta).unwrap()
        );
        assert!(get_certificate_from_trust_anchor(&ta.decoded_ta).is_some());
        assert!(matches!(
            ta.get_extension(&ID_CE_BASIC_CONSTRAINTS),
            Ok(Some(PDVExtension::BasicConstraints(_)))
        ));

        // a TrustAnchorChoice with the Certificate option is encoded as the certificate itself
        let reparsed = PDVTrustAnchorChoice::try_from(ta.encoded_ta.as_slice()).unwrap();
        assert_eq!(ta.decoded_ta, reparsed.decoded_ta);
    }

    #[cfg(feature = "webpki")]
    #[test]
    fn ta_from_webpki_test() {
        let mut converted = 0;
        for ta in webpki_roots::TLS_SERVER_ROOTS.iter() {
            if let Ok(pdv_ta) = PDVTrustAnchorChoice::try_from(ta) {
                assert!(get_trust_anchor_name(&pdv_ta.decoded_ta).is_ok());
                assert!(get_certificate_from_trust_anchor(&pdv_ta.decoded_ta).is_none());
                converted += 1;
            }
        }
        assert!(converted > 0);
    }
}
