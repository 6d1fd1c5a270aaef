//! Error types

use core::fmt;

/// Result type
pub type Result<T> = core::result::Result<T, Error>;

/// Reasons a certificate can fail validation
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum PathValidationStatus {
    /// No errors were encountered while validating the certificate
    Valid,
    /// NameChainingFailure occurs when the issuer name of the target certificate does not match
    /// the name of the trust anchor.
    NameChainingFailure,
    /// SignatureVerificationFailure occurs when the public key of the trust anchor does not verify
    /// the signature of the target certificate.
    SignatureVerificationFailure,
    /// InvalidNotBeforeDate occurs when a certificate contains a notBefore date that is after the
    /// time of interest used for a validation operation.
    InvalidNotBeforeDate,
    /// InvalidNotAfterDate occurs when a certificate contains a notAfter date that is before the
    /// time of interest used for a validation operation.
    InvalidNotAfterDate,
    /// InvalidKeyUsage occurs when the keyUsage or extendedKeyUsage extension of the target does not
    /// permit use for server authentication with the configured authentication type.
    InvalidKeyUsage,
    /// KeyAlgorithmMismatch occurs when the public key algorithm of the target certificate cannot be
    /// used with the configured authentication type.
    KeyAlgorithmMismatch,
    /// UnknownAuthType occurs when the configured authentication type is not recognized.
    UnknownAuthType,
    /// UnprocessedCriticalExtension occurs when a certificate features a critical extension that was not
    /// processed during validation.
    UnprocessedCriticalExtension,
    /// MissingTrustAnchor occurs when no trust anchor could be found for the target certificate.
    MissingTrustAnchor,
    /// MissingTrustAnchorName occurs when a TrustAnchorChoice object features a TaInfo field that
    /// has no CertPathControls.
    MissingTrustAnchorName,
    /// ProhibitedAlg occurs when the target is signed with an unsupported or prohibited algorithm.
    ProhibitedAlg,
    /// EncodingError occurs when an object cannot be parsed.
    EncodingError,
}

/// Error type
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// PathValidationError encountered
    PathValidation(PathValidationStatus),
    /// NotFound occurs when an action failed because a necessary artifact was not found.
    NotFound,
    /// Unrecognized occurs when an error conditions does not match anything else here.
    Unrecognized,
    /// An artifact could not be parsed
    ParseError,
    /// Asn1Error is used to propagate error information from the der crate.
    Asn1Error(der::Error),
    /// Error encapsulates an error derived from [std::io::ErrorKind]
    StdIoError(std::io::ErrorKind),
}

impl Error {
    /// Returns true when the error describes a failure to read or parse a certificate, as opposed
    /// to a certificate that was read and found not to be trusted.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Error::ParseError | Error::Asn1Error(_) | Error::StdIoError(_)
        )
    }
}

impl From<der::Error> for Error {
    fn from(err: der::Error) -> Error {
        Error::Asn1Error(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::StdIoError(err.kind())
    }
}

impl fmt::Display for PathValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathValidationStatus::Valid => write!(f, "Valid"),
            PathValidationStatus::NameChainingFailure => {
                write!(f, "issuer name does not match the trust anchor name")
            }
            PathValidationStatus::SignatureVerificationFailure => {
                write!(f, "signature verification failure")
            }
            PathValidationStatus::InvalidNotBeforeDate => write!(f, "certificate is not yet valid"),
            PathValidationStatus::InvalidNotAfterDate => write!(f, "certificate has expired"),
            PathValidationStatus::InvalidKeyUsage => {
                write!(f, "key usage does not permit server authentication")
            }
            PathValidationStatus::KeyAlgorithmMismatch => {
                write!(f, "public key algorithm does not match the auth type")
            }
            PathValidationStatus::UnknownAuthType => write!(f, "unknown auth type"),
            PathValidationStatus::UnprocessedCriticalExtension => {
                write!(f, "unrecognized critical extension")
            }
            PathValidationStatus::MissingTrustAnchor => {
                write!(f, "issuer is not a trusted certificate authority")
            }
            PathValidationStatus::MissingTrustAnchorName => write!(f, "trust anchor has no name"),
            PathValidationStatus::ProhibitedAlg => {
                write!(f, "unsupported or prohibited signature algorithm")
            }
            PathValidationStatus::EncodingError => write!(f, "encoding error"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::PathValidation(err) => write!(f, "{}", err),
            Error::NotFound => write!(f, "NotFound"),
            Error::Unrecognized => write!(f, "Unrecognized"),
            Error::ParseError => write!(f, "could not parse certificate"),
            Error::Asn1Error(err) => write!(f, "could not parse certificate: {}", err),
            Error::StdIoError(err) => write!(f, "could not read certificate: {:?}", err),
        }
    }
}

impl std::error::Error for Error {}

#[test]
fn error_test() {
    for s in [
        PathValidationStatus::Valid,
        PathValidationStatus::NameChainingFailure,
        PathValidationStatus::SignatureVerificationFailure,
        PathValidationStatus::InvalidNotBeforeDate,
        PathValidationStatus::InvalidNotAfterDate,
        PathValidationStatus::InvalidKeyUsage,
        PathValidationStatus::KeyAlgorithmMismatch,
        PathValidationStatus::UnknownAuthType,
        PathValidationStatus::UnprocessedCriticalExtension,
        PathValidationStatus::MissingTrustAnchor,
        PathValidationStatus::MissingTrustAnchorName,
        PathValidationStatus::ProhibitedAlg,
        PathValidationStatus::EncodingError,
    ] {
        assert!(!format!("{}", Error::PathValidation(s)).is_empty());
    }

    assert_eq!(
        "certificate has expired",
        format!(
            "{}",
            Error::PathValidation(PathValidationStatus::InvalidNotAfterDate)
        )
    );
    assert_eq!("could not parse certificate", format!("{}", Error::ParseError));
    assert!(Error::ParseError.is_load_error());
    assert!(Error::StdIoError(std::io::ErrorKind::PermissionDenied).is_load_error());
    assert!(!Error::PathValidation(PathValidationStatus::MissingTrustAnchor).is_load_error());
}
