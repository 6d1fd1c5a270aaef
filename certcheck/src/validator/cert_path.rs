//! Provides structure that represents a one-element certification path, i.e., a target certificate
//! and the trust anchor expected to have issued it.

use crate::{PDVCertificate, PDVTrustAnchorChoice};

/// `CertificationPath` is used to represent the trust anchor and target certificate that comprise
/// a certification path. No intermediate CA certificates are supported.
#[derive(Clone, Copy, Debug)]
pub struct CertificationPath<'a> {
    /// `target` contains the target certificate for the certification path
    pub target: &'a PDVCertificate,
    /// `trust_anchor` contains the trust anchor for the certification path
    pub trust_anchor: &'a PDVTrustAnchorChoice,
}

impl<'a> CertificationPath<'a> {
    /// instantiates a new CertificationPath
    pub fn new(
        trust_anchor: &'a PDVTrustAnchorChoice,
        target: &'a PDVCertificate,
    ) -> CertificationPath<'a> {
        CertificationPath {
            trust_anchor,
            target,
        }
    }
}
