//! The pki_environment_traits module features trait definitions and type definitions that are used
//! by [`PkiEnvironment`] to provide functionality that supports validating server certificates.

use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::name::Name;

use crate::util::error::*;
use crate::{
    CertificationPath, CertificationPathResults, CertificationPathSettings, PDVCertificate,
    PDVTrustAnchorChoice, PkiEnvironment,
};

/// `ValidatePath` provides a function signature for implementations that perform certification path
/// validation or that provide functionality in support of certification path validation.
pub type ValidatePath = fn(
    &PkiEnvironment,
    &CertificationPathSettings,    // path settings to govern validation
    &CertificationPath<'_>,        // path to verify
    &mut CertificationPathResults, // path validation results
) -> Result<()>;

/// `VerifySignatureMessage` provides a function signature for implementations that perform signature
/// verification over a message.
pub type VerifySignatureMessage = fn(
    &PkiEnvironment,
    &[u8],                      // message to hash and verify
    &[u8],                      // signature
    &AlgorithmIdentifierOwned,  // signature algorithm
    &SubjectPublicKeyInfoOwned, // public key
) -> Result<()>;

/// The [`TrustAnchorSource`] trait enables trait objects to provide access to trust anchors backed via
/// some means, i.e., the host's trust store, the webpki-roots crate or a set prepared by a test.
pub trait TrustAnchorSource {
    /// get_trust_anchors returns a vector with references to available trust anchors.
    fn get_trust_anchors(&'_ self) -> Result<Vec<&PDVTrustAnchorChoice>>;

    /// get_trust_anchor_by_hex_skid returns a reference to a trust anchor corresponding to the presented hexadecimal SKID.
    fn get_trust_anchor_by_hex_skid(&'_ self, hex_skid: &str) -> Result<&PDVTrustAnchorChoice>;

    /// get_trust_anchors_by_name returns references to the trust anchors with the presented name.
    fn get_trust_anchors_by_name(&'_ self, name: &'_ Name) -> Result<Vec<&PDVTrustAnchorChoice>>;

    /// get_trust_anchors_for_target returns references to trust anchors that may have issued the
    /// presented target, located by authority key identifier then by issuer name.
    fn get_trust_anchors_for_target(
        &'_ self,
        target: &'_ PDVCertificate,
    ) -> Result<Vec<&PDVTrustAnchorChoice>>;

    /// is_cert_a_trust_anchor returns the trust anchor with the same name and public key as the
    /// presented certificate, if any.
    fn is_cert_a_trust_anchor(&'_ self, cert: &'_ PDVCertificate) -> Result<&PDVTrustAnchorChoice>;
}
