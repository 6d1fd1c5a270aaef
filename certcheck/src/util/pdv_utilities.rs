//! Utility functions related to names, validity periods and algorithm identifiers

use der::asn1::{Ia5StringRef, PrintableStringRef, Utf8StringRef};
use der::{Encode, Tagged};
use log::debug;
use spki::{AlgorithmIdentifier, AlgorithmIdentifierOwned};
use x509_cert::anchor::TrustAnchorChoice;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::Name;
use x509_cert::TbsCertificate;

use const_oid::ObjectIdentifier;

use crate::{util::error::*, util::pdv_alg_oids::*, PDVCertificate};

/// `valid_at_time` evaluates the not_before and not_after fields of the given TBSCertificate instance
/// and provides an indication of validity relative to presented time of interest.
///
/// It returns the number of seconds left to live if the certificate is valid at the given time or
/// an error indicating which field failed if the certificate is not valid. The not_before field is
/// evaluated first.
///
/// To stifle logging output upon error, pass true for the stifle_log parameter.
pub fn valid_at_time(target: &TbsCertificate, toi: u64, stifle_log: bool) -> Result<u64> {
    if 0 == toi {
        // zero is used to disable validity check
        return Ok(0);
    }

    let nb = target.validity.not_before.to_unix_duration().as_secs();
    if nb > toi {
        if !stifle_log {
            log_error_for_name(
                &target.subject,
                "certificate is not yet valid, i.e., not_before is after the configured time of interest",
            );
        }
        return Err(Error::PathValidation(
            PathValidationStatus::InvalidNotBeforeDate,
        ));
    }

    let na = target.validity.not_after.to_unix_duration().as_secs();
    if na < toi {
        if !stifle_log {
            log_error_for_name(
                &target.subject,
                format!(
                    "certificate is expired relative to the configured time of interest: {}",
                    target.validity.not_after
                )
                .as_str(),
            );
        }
        Err(Error::PathValidation(
            PathValidationStatus::InvalidNotAfterDate,
        ))
    } else {
        Ok(na - toi)
    }
}

/// ta_valid_at_time checks the validity of the given trust anchor relative to the given time of interest.
///
/// Trust anchors that are not expressed as certificates, i.e., those read from webpki-roots, carry
/// no validity period and are always considered valid.
pub fn ta_valid_at_time(ta: &TrustAnchorChoice, toi: u64, stifle_log: bool) -> Result<u64> {
    match ta {
        TrustAnchorChoice::Certificate(c) => valid_at_time(&c.tbs_certificate, toi, stifle_log),
        TrustAnchorChoice::TaInfo(tai) => {
            if let Some(cp) = &tai.cert_path {
                if let Some(c) = &cp.certificate {
                    return valid_at_time(&c.tbs_certificate, toi, stifle_log);
                }
            }
            Ok(0)
        }
        #[allow(unreachable_patterns)]
        _ => Ok(0),
    }
}

/// get_hash_alg_from_sig_alg takes an ObjectIdentifier that notionally contains a signature algorithm,
/// i.e., PKIXALG_SHA256_WITH_RSA_ENCRYPTION or PKIXALG_ECDSA_WITH_SHA256, and returns the indicated hash
/// algorithm.
pub fn get_hash_alg_from_sig_alg(sig_alg: &ObjectIdentifier) -> Result<AlgorithmIdentifierOwned> {
    let oid = match *sig_alg {
        PKIXALG_SHA256_WITH_RSA_ENCRYPTION | PKIXALG_ECDSA_WITH_SHA256 => PKIXALG_SHA256,
        PKIXALG_SHA384_WITH_RSA_ENCRYPTION | PKIXALG_ECDSA_WITH_SHA384 => PKIXALG_SHA384,
        PKIXALG_SHA224_WITH_RSA_ENCRYPTION | PKIXALG_ECDSA_WITH_SHA224 => PKIXALG_SHA224,
        PKIXALG_SHA512_WITH_RSA_ENCRYPTION | PKIXALG_ECDSA_WITH_SHA512 => PKIXALG_SHA512,
        _ => return Err(Error::Unrecognized),
    };
    Ok(AlgorithmIdentifier {
        oid,
        parameters: None,
    })
}

pub(crate) fn log_error_for_name(name: &Name, msg: &str) {
    let name_str = name_to_string(name);
    debug!(
        "Encountered error while processing certificate with subject {}: {}",
        name_str, msg
    );
}

/// `log_error_for_cert` emits a debug-level message naming the certificate's subject and locator.
///
/// Validation failures are reported to the user by the caller, so the detail is kept at debug level.
pub(crate) fn log_error_for_cert(cert: &PDVCertificate, msg: &str) {
    debug!(
        "Certificate issued to {} ({}): {}",
        name_to_string(&cert.decoded_cert.tbs_certificate.subject),
        cert.locator,
        msg
    );
}

/// `name_to_string` returns a string representation of given Name value.
pub fn name_to_string(name: &Name) -> String {
    name.to_string()
}

/// get_value_from_rdn returns the value from AttributeTypeAndValue as a string for use in comparing
/// values where leading whitespace may be a factor
pub fn get_value_from_rdn(atav: &AttributeTypeAndValue) -> Result<String> {
    let val = match atav.value.tag() {
        der::Tag::PrintableString => atav
            .value
            .decode_as()
            .ok()
            .map(|s: PrintableStringRef<'_>| s.to_string()),
        der::Tag::Utf8String => atav
            .value
            .decode_as()
            .ok()
            .map(|s: Utf8StringRef<'_>| s.to_string()),
        der::Tag::Ia5String => atav
            .value
            .decode_as()
            .ok()
            .map(|s: Ia5StringRef<'_>| s.to_string()),
        _ => None,
    };

    match val {
        Some(val) => Ok(val),
        None => {
            let enc = atav.value.to_der()?;
            let mut s = format!("{}=#", atav.oid);
            for c in enc {
                s.push_str(format!("{:02x}", c).as_str());
            }
            Ok(s)
        }
    }
}

/// Lower cases the value and collapses runs of whitespace, per the RFC 5280 name matching rules
/// for string attribute values.
fn normalize_rdn_value(val: &str) -> String {
    val.split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .to_lowercase()
}

/// [`compare_names`] compares two Name values returning true if they match and false otherwise.
pub fn compare_names(left: &Name, right: &Name) -> bool {
    if left == right {
        return true;
    }

    // no match if not the same number of RDNs
    if left.0.len() != right.0.len() {
        return false;
    }

    for (lrdn, rrdn) in left.0.iter().zip(right.0.iter()) {
        if lrdn.0.len() != rrdn.0.len() {
            return false;
        }

        if lrdn == rrdn {
            continue;
        }

        for (l, r) in lrdn.0.iter().zip(rrdn.0.iter()) {
            if l.oid != r.oid {
                return false;
            }

            let (l_val, r_val) = match (get_value_from_rdn(l), get_value_from_rdn(r)) {
                (Ok(l_val), Ok(r_val)) => (l_val, r_val),
                _ => return false,
            };

            if normalize_rdn_value(&l_val) != normalize_rdn_value(&r_val) {
                return false;
            }
        }
    }
    true
}

/// Retrieves a string value from the last RDN element in the presented Name.
pub fn get_leaf_rdn(name: &Name) -> String {
    match name.0.last() {
        Some(rdn) => rdn.to_string(),
        None => "".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;

    #[test]
    fn compare_names_test() {
        let l = Name::from_str("CN=Test  Root,O=Example").unwrap();
        let r = Name::from_str("CN=test root,O=EXAMPLE").unwrap();
        assert!(compare_names(&l, &r));

        let other = Name::from_str("CN=Other Root,O=Example").unwrap();
        assert!(!compare_names(&l, &other));

        let shorter = Name::from_str("CN=Test Root").unwrap();
        assert!(!compare_names(&l, &shorter));
    }

    #[test]
    fn get_leaf_rdn_test() {
        let n = Name::from_str("CN=Test Root,O=Example").unwrap();
        assert!(!get_leaf_rdn(&n).is_empty());
        assert_eq!("", get_leaf_rdn(&Name::default()));
    }

    #[test]
    fn get_hash_alg_from_sig_alg_test() {
        assert_eq!(
            PKIXALG_SHA256,
            get_hash_alg_from_sig_alg(&PKIXALG_ECDSA_WITH_SHA256)
                .unwrap()
                .oid
        );
        assert_eq!(
            PKIXALG_SHA384,
            get_hash_alg_from_sig_alg(&PKIXALG_SHA384_WITH_RSA_ENCRYPTION)
                .unwrap()
                .oid
        );
        assert_eq!(
            Err(Error::Unrecognized),
            get_hash_alg_from_sig_alg(&PKIXALG_SHA1_WITH_RSA_ENCRYPTION)
        );
    }
}
