//! Structures and functions related to results from certificate validation operations

use std::collections::BTreeSet;

use der::asn1::ObjectIdentifier;

use crate::PathValidationStatus;

/// `ObjectIdentifierSet` is a typedef for a set of ObjectIdentifier values.
pub type ObjectIdentifierSet = BTreeSet<ObjectIdentifier>;

/// `CertificationPathResults` collects information produced while validating a certification path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CertificationPathResults {
    validation_status: Option<PathValidationStatus>,
    processed_extensions: ObjectIdentifierSet,
    trust_anchor_locator: Option<String>,
}

impl CertificationPathResults {
    /// Creates a new [`CertificationPathResults`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of a validation operation.
    pub fn set_validation_status(&mut self, status: PathValidationStatus) {
        self.validation_status = Some(status);
    }

    /// Returns the recorded outcome, if any.
    pub fn get_validation_status(&self) -> Option<PathValidationStatus> {
        self.validation_status
    }

    /// Notes that an extension type was processed. Used to detect unprocessed critical extensions.
    pub fn add_processed_extension(&mut self, oid: ObjectIdentifier) {
        self.processed_extensions.insert(oid);
    }

    /// Returns the set of extension types processed so far.
    pub fn get_processed_extensions(&self) -> &ObjectIdentifierSet {
        &self.processed_extensions
    }

    /// Records the locator of the trust anchor that was used.
    pub fn set_trust_anchor_locator(&mut self, locator: &str) {
        self.trust_anchor_locator = Some(locator.to_string());
    }

    /// Returns the locator of the trust anchor that was used, if any.
    pub fn get_trust_anchor_locator(&self) -> Option<&str> {
        self.trust_anchor_locator.as_deref()
    }
}
