//! Wrappers around asn.1 encoder/decoder structures to support certification path processing

use std::collections::BTreeMap;

use const_oid::db::rfc5912::{
    ID_CE_AUTHORITY_KEY_IDENTIFIER, ID_CE_BASIC_CONSTRAINTS, ID_CE_EXT_KEY_USAGE, ID_CE_KEY_USAGE,
    ID_CE_SUBJECT_ALT_NAME, ID_CE_SUBJECT_KEY_IDENTIFIER,
};
use der::{asn1::ObjectIdentifier, Decode};
use x509_cert::ext::pkix::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectAltName,
    SubjectKeyIdentifier,
};
use x509_cert::ext::Extensions;

use crate::util::error::*;

/// `EXTS_OF_INTEREST` provides a list of extensions that will be automatically parsed when preparing
/// a [`PDVCertificate`](crate::PDVCertificate) or [`PDVTrustAnchorChoice`](crate::PDVTrustAnchorChoice)
/// instance. These extensions are used when locating trust anchors and validating a target and are
/// subsequently available via get_extension without re-parsing.
pub const EXTS_OF_INTEREST: &[ObjectIdentifier] = &[
    ID_CE_SUBJECT_KEY_IDENTIFIER,
    ID_CE_AUTHORITY_KEY_IDENTIFIER,
    ID_CE_BASIC_CONSTRAINTS,
    ID_CE_SUBJECT_ALT_NAME,
    ID_CE_EXT_KEY_USAGE,
    ID_CE_KEY_USAGE,
];

/// The [`ExtensionProcessing`] trait provides a common means of extracting extensions from objects that
/// feature extensions, like Certificate, TrustAnchorChoice, etc. and that retain copies of the
/// decoded extension structures, like `PDVCertificate`, `PDVTrustAnchorChoice`, etc.
///
/// Prior to validating a certificate, the parse_extensions method should be used to parse the
/// extensions that will be consulted. The decoded extensions are cached and accessed via the
/// get_extension function.
pub trait ExtensionProcessing {
    /// `get_extension` takes an ObjectIdentifier that identifies an extension type and returns
    /// a previously parsed PDVExtension instance containing the decoded extension if the extension was present.
    fn get_extension(&self, oid: &ObjectIdentifier) -> Result<Option<&'_ PDVExtension>>;

    /// `parse_extension` takes an ObjectIdentifier that identifies an extension type and returns
    /// a `PDVExtension` containing the decoded extension if the extension was present.
    fn parse_extension(&'_ mut self, oid: &ObjectIdentifier) -> Result<Option<&'_ PDVExtension>>;

    /// `parse_extensions` parses each extension in the list, ignoring any that fail to parse.
    fn parse_extensions(&'_ mut self, oids: &[ObjectIdentifier]) {
        for oid in oids {
            let _r = self.parse_extension(oid);
        }
    }
}

/// [`ParsedExtensions`] is a typedef of a BTreeMap map that associates [`PDVExtension`] objects with object
/// identifier values. This is used to avoid parsing extensions repeatedly when validating certificates.
pub type ParsedExtensions = BTreeMap<ObjectIdentifier, PDVExtension>;

/// [`PDVExtension`] provides a wrapper for the extension types consulted while validating a server
/// certificate.
#[derive(PartialEq, Clone, Eq, Debug)]
pub enum PDVExtension {
    /// Parsed BasicConstraints extension
    BasicConstraints(BasicConstraints),
    /// Parsed SubjectKeyIdentifier extension
    SubjectKeyIdentifier(SubjectKeyIdentifier),
    /// Parsed ExtendedKeyUsage extension
    ExtendedKeyUsage(ExtendedKeyUsage),
    /// Parsed KeyUsage extension
    KeyUsage(KeyUsage),
    /// Parsed SubjectAltName extension
    SubjectAltName(SubjectAltName),
    /// Parsed AuthorityKeyIdentifier extension
    AuthorityKeyIdentifier(AuthorityKeyIdentifier),
}

/// `parse_extension_from_list` locates the extension identified by `oid` in `exts` and decodes it.
///
/// Returns Ok(None) when the extension is absent or is not one of the types wrapped by [`PDVExtension`].
/// An extension that appears more than once yields an EncodingError.
pub(crate) fn parse_extension_from_list(
    exts: &Option<Extensions>,
    oid: &ObjectIdentifier,
) -> Result<Option<PDVExtension>> {
    macro_rules! decode_as {
        ($v:ident, $t:ident) => {
            match $t::from_der($v) {
                Ok(r) => Ok(Some(PDVExtension::$t(r))),
                Err(e) => Err(Error::Asn1Error(e)),
            }
        };
    }

    let exts = match exts {
        Some(exts) => exts,
        None => return Ok(None),
    };

    let mut matches = exts.iter().filter(|&ext| ext.extn_id == *oid);
    let v = match matches.next() {
        Some(ext) => ext.extn_value.as_bytes(),
        None => return Ok(None),
    };
    if matches.next().is_some() {
        return Err(Error::PathValidation(PathValidationStatus::EncodingError));
    }

    match *oid {
        ID_CE_BASIC_CONSTRAINTS => decode_as!(v, BasicConstraints),
        ID_CE_SUBJECT_KEY_IDENTIFIER => decode_as!(v, SubjectKeyIdentifier),
        ID_CE_EXT_KEY_USAGE => decode_as!(v, ExtendedKeyUsage),
        ID_CE_KEY_USAGE => decode_as!(v, KeyUsage),
        ID_CE_SUBJECT_ALT_NAME => decode_as!(v, SubjectAltName),
        ID_CE_AUTHORITY_KEY_IDENTIFIER => decode_as!(v, AuthorityKeyIdentifier),
        // ignore unrecognized
        _ => Ok(None),
    }
}
