//! PkiEnvironment aggregates a set of function pointers and trait objects that supply functionality
//! useful when validating a server certificate.
//!
//! The sample below illustrates preparation of a PkiEnvironment object for use in validating
//! certificates against the trust anchors published by the webpki-roots crate.
//! ```
//! use certcheck::*;
//!
//! let mut pe = PkiEnvironment::default();
//!
//! // add signature verification and path validation capabilities
//! pe.populate_default_pki_environment();
//!
//! #[cfg(feature = "webpki")]
//! pe.add_trust_anchor_source(Box::new(TaSource::new_from_webpki().unwrap()));
//! ```
//!
//! The aggregation of function pointers and trait objects allows for implementations of features to
//! vary. For example, tests register a small set of trust anchors in place of the host's trust store.

use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::name::Name;

use crate::{
    environment::pki_environment_traits::*, util::crypto::*, util::error::*,
    validator::path_validator::validate_path_server, CertificationPath, CertificationPathResults,
    CertificationPathSettings, PDVCertificate, PDVTrustAnchorChoice,
};

/// [`PkiEnvironment`] provides a switchboard of callback functions that allow support to vary on
/// different platforms or to allow support to be tailored for specific use cases.
#[derive(Default)]
pub struct PkiEnvironment {
    //--------------------------------------------------------------------------
    //Crypto interfaces
    //--------------------------------------------------------------------------
    /// List of functions that provide a signature verification functionality given a message
    verify_signature_message_callbacks: Vec<VerifySignatureMessage>,

    //--------------------------------------------------------------------------
    //Certification path processing interfaces
    //--------------------------------------------------------------------------
    /// List of functions that provide certification path validation functionality
    validate_path_callbacks: Vec<ValidatePath>,

    //--------------------------------------------------------------------------
    //Storage and retrieval interfaces
    //--------------------------------------------------------------------------
    /// List of trait objects that provide access to trust anchors
    trust_anchor_sources: Vec<Box<dyn TrustAnchorSource + Send + Sync>>,
}

impl PkiEnvironment {
    /// PkiEnvironment::new returns a new [`PkiEnvironment`] with empty callback vectors for each type of callback
    pub fn new() -> PkiEnvironment {
        PkiEnvironment::default()
    }

    /// populate_default_pki_environment adds [`verify_signature_message_rust_crypto`] and
    /// [`validate_path_server`] to the environment. Trust anchor sources must be added separately.
    pub fn populate_default_pki_environment(&mut self) {
        self.add_validate_path_callback(validate_path_server);
        self.add_verify_signature_message_callback(verify_signature_message_rust_crypto);
    }

    /// clear_all_callbacks clears the contents of all function pointer and trait object vectors
    /// associated with an instance of [`PkiEnvironment`].
    pub fn clear_all_callbacks(&mut self) {
        self.clear_trust_anchor_sources();
        self.clear_validate_path_callbacks();
        self.clear_verify_signature_message_callbacks();
    }

    /// add_validate_path_callback adds a [`ValidatePath`] callback to the list used by validate_path.
    pub fn add_validate_path_callback(&mut self, c: ValidatePath) {
        self.validate_path_callbacks.push(c);
    }

    /// clear_validate_path_callbacks clears the list of [`ValidatePath`] callbacks used by validate_path.
    pub fn clear_validate_path_callbacks(&mut self) {
        self.validate_path_callbacks.clear();
    }

    /// validate_path iterates over validate_path_callbacks until an authoritative answer is found
    /// or all options have been exhausted
    pub fn validate_path(
        &self,
        pe: &PkiEnvironment,
        cps: &CertificationPathSettings,
        cp: &CertificationPath<'_>,
        cpr: &mut CertificationPathResults,
    ) -> Result<()> {
        let mut err = None;
        for f in &self.validate_path_callbacks {
            match f(pe, cps, cp, cpr) {
                Ok(r) => {
                    return Ok(r);
                }
                Err(e) => {
                    err = Some(e);
                }
            }
        }
        if let Some(e) = err {
            return Err(e);
        }
        Err(Error::Unrecognized)
    }

    /// add_verify_signature_message_callback adds a [`VerifySignatureMessage`] callback to the list used by verify_signature_message.
    pub fn add_verify_signature_message_callback(&mut self, c: VerifySignatureMessage) {
        self.verify_signature_message_callbacks.push(c);
    }

    /// clear_verify_signature_message_callbacks clears the list of [`VerifySignatureMessage`] callbacks used by verify_signature_message.
    pub fn clear_verify_signature_message_callbacks(&mut self) {
        self.verify_signature_message_callbacks.clear();
    }

    /// verify_signature_message iterates over verify_signature_message_callbacks until one succeeds
    /// or all options have been exhausted, in which case the last error is returned.
    pub fn verify_signature_message(
        &self,
        pe: &PkiEnvironment,
        message_to_verify: &[u8],                 // buffer to verify
        signature: &[u8],                         // signature
        signature_alg: &AlgorithmIdentifierOwned, // signature algorithm
        spki: &SubjectPublicKeyInfoOwned,         // public key
    ) -> Result<()> {
        let mut err = None;
        for f in &self.verify_signature_message_callbacks {
            match f(pe, message_to_verify, signature, signature_alg, spki) {
                Ok(r) => return Ok(r),
                Err(e) => err = Some(e),
            }
        }
        Err(err.unwrap_or(Error::Unrecognized))
    }

    /// add_trust_anchor_source adds a [`TrustAnchorSource`] object to the list used by get_trust_anchors.
    pub fn add_trust_anchor_source(&mut self, c: Box<dyn TrustAnchorSource + Send + Sync>) {
        self.trust_anchor_sources.push(c);
    }

    /// clear_trust_anchor_sources clears the list of [`TrustAnchorSource`] objects used by get_trust_anchors.
    pub fn clear_trust_anchor_sources(&mut self) {
        self.trust_anchor_sources.clear();
    }

    /// get_trust_anchors returns the trust anchors from all registered sources.
    pub fn get_trust_anchors(&self) -> Result<Vec<&PDVTrustAnchorChoice>> {
        let mut v = vec![];
        for f in &self.trust_anchor_sources {
            if let Ok(mut tas) = f.get_trust_anchors() {
                v.append(&mut tas);
            }
        }
        Ok(v)
    }

    /// get_trust_anchor_by_hex_skid returns a reference to a trust anchor corresponding to the presented hexadecimal SKID.
    pub fn get_trust_anchor_by_hex_skid(&'_ self, hex_skid: &str) -> Result<&PDVTrustAnchorChoice> {
        for f in &self.trust_anchor_sources {
            let r = f.get_trust_anchor_by_hex_skid(hex_skid);
            if let Ok(r) = r {
                return Ok(r);
            }
        }
        Err(Error::NotFound)
    }

    /// get_trust_anchors_by_name returns trust anchors with the presented name from all registered sources.
    pub fn get_trust_anchors_by_name(&'_ self, name: &Name) -> Result<Vec<&PDVTrustAnchorChoice>> {
        let mut v = vec![];
        for f in &self.trust_anchor_sources {
            if let Ok(mut tas) = f.get_trust_anchors_by_name(name) {
                v.append(&mut tas);
            }
        }
        match v.is_empty() {
            true => Err(Error::NotFound),
            false => Ok(v),
        }
    }

    /// get_trust_anchors_for_target takes a target certificate and returns the trust anchors from
    /// all registered sources that may be useful in verifying the certificate.
    pub fn get_trust_anchors_for_target(
        &'_ self,
        target: &'_ PDVCertificate,
    ) -> Result<Vec<&PDVTrustAnchorChoice>> {
        let mut v: Vec<&PDVTrustAnchorChoice> = vec![];
        for f in &self.trust_anchor_sources {
            if let Ok(tas) = f.get_trust_anchors_for_target(target) {
                for ta in tas {
                    if !v.iter().any(|t| core::ptr::eq(*t, ta)) {
                        v.push(ta);
                    }
                }
            }
        }
        match v.is_empty() {
            true => Err(Error::PathValidation(
                crate::PathValidationStatus::MissingTrustAnchor,
            )),
            false => Ok(v),
        }
    }

    /// is_cert_a_trust_anchor returns the trust anchor that matches the presented certificate's
    /// name and public key, if any registered source has one.
    pub fn is_cert_a_trust_anchor(
        &'_ self,
        target: &'_ PDVCertificate,
    ) -> Result<&PDVTrustAnchorChoice> {
        for f in &self.trust_anchor_sources {
            if let Ok(ta) = f.is_cert_a_trust_anchor(target) {
                return Ok(ta);
            }
        }
        Err(Error::NotFound)
    }
}
