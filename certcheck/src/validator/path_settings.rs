//! Structures and functions related to configuring certificate validation operations

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// `DEFAULT_AUTH_TYPE` is the authentication/key exchange tag used when none is configured.
pub const DEFAULT_AUTH_TYPE: &str = "RSA";

/// `CertificationPathSettings` governs validation of a server certificate.
///
/// The settings are serializable to support logging and troubleshooting. Unset values fall back to
/// their defaults via the getters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationPathSettings {
    /// Time to use when evaluating validity periods as seconds since the Unix epoch. When absent,
    /// the current time is used. Zero disables validity period checks.
    #[serde(skip_serializing_if = "Option::is_none")]
    time_of_interest: Option<u64>,

    /// Authentication/key exchange tag, i.e., RSA or ECDHE_ECDSA.
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_type: Option<String>,

    /// Whether the validity period of a trust anchor expressed as a certificate is enforced. Host
    /// trust stores may retain expired roots, which are honored unless this is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    enforce_trust_anchor_validity: Option<bool>,
}

impl CertificationPathSettings {
    /// Creates a new empty [`CertificationPathSettings`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the configured time of interest or the current time if none was set.
    pub fn get_time_of_interest(&self) -> u64 {
        match self.time_of_interest {
            Some(toi) => toi,
            None => get_now_as_unix_epoch(),
        }
    }

    /// Sets the time of interest as seconds since the Unix epoch. Zero disables validity checks.
    pub fn set_time_of_interest(&mut self, toi: u64) {
        self.time_of_interest = Some(toi);
    }

    /// Returns the configured authentication tag or [`DEFAULT_AUTH_TYPE`].
    pub fn get_auth_type(&self) -> String {
        match &self.auth_type {
            Some(at) => at.clone(),
            None => DEFAULT_AUTH_TYPE.to_string(),
        }
    }

    /// Sets the authentication tag. The value is not checked here; unrecognized tags cause each
    /// validation to fail.
    pub fn set_auth_type(&mut self, auth_type: &str) {
        self.auth_type = Some(auth_type.to_string());
    }

    /// Returns whether trust anchor validity is enforced (default false).
    pub fn get_enforce_trust_anchor_validity(&self) -> bool {
        self.enforce_trust_anchor_validity.unwrap_or(false)
    }

    /// Sets whether trust anchor validity is enforced.
    pub fn set_enforce_trust_anchor_validity(&mut self, v: bool) {
        self.enforce_trust_anchor_validity = Some(v);
    }
}

/// Returns the current time as seconds since the Unix epoch, or zero if the clock reads before it.
pub fn get_now_as_unix_epoch() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(n) => n.as_secs(),
        Err(_) => 0,
    }
}

#[test]
fn settings_test() {
    let mut cps = CertificationPathSettings::new();
    let before = get_now_as_unix_epoch();
    assert!(cps.get_time_of_interest() >= before);
    assert_eq!("RSA", cps.get_auth_type());
    assert!(!cps.get_enforce_trust_anchor_validity());
    assert_eq!("{}", serde_json::to_string(&cps).unwrap());

    cps.set_time_of_interest(0);
    assert_eq!(0, cps.get_time_of_interest());
    cps.set_auth_type("ECDHE_ECDSA");
    assert_eq!("ECDHE_ECDSA", cps.get_auth_type());
    cps.set_enforce_trust_anchor_validity(true);
    assert!(cps.get_enforce_trust_anchor_validity());

    let json = serde_json::to_string(&cps).unwrap();
    let cps2: CertificationPathSettings = serde_json::from_str(&json).unwrap();
    assert_eq!(cps, cps2);
}
