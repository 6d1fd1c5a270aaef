//! Functions related to validating a target certificate as a TLS server certificate

use der::Encode;
use log::{debug, info};

use const_oid::ObjectIdentifier;
use const_oid::db::rfc5912::{
    ANY_EXTENDED_KEY_USAGE, ID_CE_AUTHORITY_KEY_IDENTIFIER, ID_CE_BASIC_CONSTRAINTS,
    ID_CE_EXT_KEY_USAGE, ID_CE_KEY_USAGE, ID_CE_SUBJECT_ALT_NAME, ID_CE_SUBJECT_KEY_IDENTIFIER,
    ID_KP_SERVER_AUTH,
};

use crate::{
    environment::pki_environment::*, path_results::*, path_settings::*, pdv_certificate::*,
    pdv_extension::*, util::error::*, util::pdv_utilities::*, validator::auth_type::*,
    validator::pdv_trust_anchor::*, CertificationPath,
};

//-----------------------------------------------------------------------------
// Top level functions
//-----------------------------------------------------------------------------
/// `check_server_trusted` decides whether `target`, presented on its own, is acceptable as a TLS
/// server certificate for the authentication type read from `cps`.
///
/// A target that matches a trust anchor by name and public key is trusted directly, subject only to
/// a validity period check. Otherwise, candidate trust anchors are located via the authority key
/// identifier and issuer name of the target and a [`CertificationPath`] is validated for each using
/// [`PkiEnvironment::validate_path`]. The first success is returned. If every candidate fails, the
/// last error is returned.
pub fn check_server_trusted(
    pe: &PkiEnvironment,
    cps: &CertificationPathSettings,
    target: &PDVCertificate,
) -> Result<CertificationPathResults> {
    if let Ok(json) = serde_json::to_string(cps) {
        debug!("Checking {} using settings: {json}", target.locator);
    }

    let mut cpr = CertificationPathResults::new();
    if let Err(e) = cps.get_auth_type().parse::<AuthType>() {
        log_error_for_cert(
            target,
            format!("unrecognized auth type: {}", cps.get_auth_type()).as_str(),
        );
        return Err(e);
    }

    if let Ok(ta) = pe.is_cert_a_trust_anchor(target) {
        debug!("Target is a trust anchor ({})", ta.locator);
        valid_at_time(
            &target.decoded_cert.tbs_certificate,
            cps.get_time_of_interest(),
            false,
        )?;
        cpr.set_trust_anchor_locator(&ta.locator);
        cpr.set_validation_status(PathValidationStatus::Valid);
        return Ok(cpr);
    }

    let tas = match pe.get_trust_anchors_for_target(target) {
        Ok(tas) => tas,
        Err(_) => {
            log_error_for_cert(target, "no trust anchor found for target");
            return Err(Error::PathValidation(
                PathValidationStatus::MissingTrustAnchor,
            ));
        }
    };

    let mut err = Error::PathValidation(PathValidationStatus::MissingTrustAnchor);
    for ta in tas {
        let cp = CertificationPath::new(ta, target);
        let mut cur_cpr = CertificationPathResults::new();
        match pe.validate_path(pe, cps, &cp, &mut cur_cpr) {
            Ok(()) => {
                cur_cpr.set_trust_anchor_locator(&ta.locator);
                return Ok(cur_cpr);
            }
            Err(e) => {
                debug!("Validation using trust anchor {} failed: {e}", ta.locator);
                err = e;
            }
        }
    }
    Err(err)
}

/// `validate_path_server` aggregates the checks that determine whether a one-element certification
/// path, i.e., a trust anchor and a target issued by it, is acceptable for server authentication.
/// It is intended for use in the validate_path field of a [`PkiEnvironment`] structure.
///
/// The checks are run in the following order and the first failure is returned:
/// [`check_validity`], [`check_names`], [`check_auth_type_key_algorithm`], [`check_key_usage`],
/// [`check_extended_key_usage`], [`check_critical_extensions`] and [`verify_signatures`].
pub fn validate_path_server(
    pe: &PkiEnvironment,
    cps: &CertificationPathSettings,
    cp: &CertificationPath<'_>,
    cpr: &mut CertificationPathResults,
) -> Result<()> {
    check_validity(pe, cps, cp, cpr)?;
    check_names(pe, cps, cp, cpr)?;
    check_auth_type_key_algorithm(pe, cps, cp, cpr)?;
    check_key_usage(pe, cps, cp, cpr)?;
    check_extended_key_usage(pe, cps, cp, cpr)?;
    check_basic_constraints(pe, cps, cp, cpr)?;
    check_critical_extensions(pe, cps, cp, cpr)?;
    verify_signatures(pe, cps, cp, cpr)?;
    cpr.set_validation_status(PathValidationStatus::Valid);
    info!(
        "Successfully completed validation checks for certificate issued to {}",
        name_to_string(&cp.target.decoded_cert.tbs_certificate.subject)
    );
    Ok(())
}

fn fail(cpr: &mut CertificationPathResults, pvs: PathValidationStatus) -> Error {
    cpr.set_validation_status(pvs);
    Error::PathValidation(pvs)
}

/// `get_usage_extension` returns the decoded extension identified by `oid` from the target. When the
/// extension is present but absent from the parsed extension cache, i.e., it failed to decode or
/// occurs more than once, validation fails with EncodingError.
fn get_usage_extension(
    cp: &CertificationPath<'_>,
    oid: &ObjectIdentifier,
    cpr: &mut CertificationPathResults,
) -> Result<Option<PDVExtension>> {
    if let Some(ext) = cp.target.get_extension(oid)? {
        return Ok(Some(ext.clone()));
    }
    match parse_extension_from_list(&cp.target.decoded_cert.tbs_certificate.extensions, oid) {
        Ok(ext) => Ok(ext),
        Err(e) => {
            log_error_for_cert(
                cp.target,
                format!("failed to parse {oid} extension: {e}").as_str(),
            );
            Err(fail(cpr, PathValidationStatus::EncodingError))
        }
    }
}

//-----------------------------------------------------------------------------
// Functions that perform some small aspect of path validation
//-----------------------------------------------------------------------------
/// `check_validity` evaluates the target certificate and, if it is expressed as a certificate and
/// enforcement is enabled, the trust anchor against the time of interest read from the
/// [`CertificationPathSettings`] parameter. A time of interest of zero disables the check.
pub fn check_validity(
    _pe: &PkiEnvironment,
    cps: &CertificationPathSettings,
    cp: &CertificationPath<'_>,
    cpr: &mut CertificationPathResults,
) -> Result<()> {
    let toi = cps.get_time_of_interest();
    if 0 == toi {
        info!("check_validity invoked with no time of interest; validity check disabled");
        return Ok(());
    }

    if let Err(e) = valid_at_time(&cp.target.decoded_cert.tbs_certificate, toi, false) {
        if let Error::PathValidation(pvs) = e {
            cpr.set_validation_status(pvs);
        }
        return Err(e);
    }

    if cps.get_enforce_trust_anchor_validity() {
        // a TrustAnchorInfo without a certificate has no validity period
        if let Err(e) = ta_valid_at_time(&cp.trust_anchor.decoded_ta, toi, false) {
            if let Error::PathValidation(pvs) = e {
                cpr.set_validation_status(pvs);
            }
            return Err(e);
        }
    }

    Ok(())
}

/// `check_names` ensures that the issuer name in the target certificate matches the name of the
/// trust anchor.
pub fn check_names(
    _pe: &PkiEnvironment,
    _cps: &CertificationPathSettings,
    cp: &CertificationPath<'_>,
    cpr: &mut CertificationPathResults,
) -> Result<()> {
    let ta_name = match get_trust_anchor_name(&cp.trust_anchor.decoded_ta) {
        Ok(n) => n,
        Err(_) => {
            return Err(fail(cpr, PathValidationStatus::MissingTrustAnchorName));
        }
    };

    if !compare_names(&cp.target.decoded_cert.tbs_certificate.issuer, ta_name) {
        log_error_for_cert(
            cp.target,
            format!(
                "issuer name does not match trust anchor name {}",
                name_to_string(ta_name)
            )
            .as_str(),
        );
        return Err(fail(cpr, PathValidationStatus::NameChainingFailure));
    }
    Ok(())
}

/// `check_auth_type_key_algorithm` ensures the public key algorithm of the target certificate can
/// be used with the authentication type read from the [`CertificationPathSettings`] parameter.
pub fn check_auth_type_key_algorithm(
    _pe: &PkiEnvironment,
    cps: &CertificationPathSettings,
    cp: &CertificationPath<'_>,
    cpr: &mut CertificationPathResults,
) -> Result<()> {
    let auth_type = match cps.get_auth_type().parse::<AuthType>() {
        Ok(at) => at,
        Err(_) => return Err(fail(cpr, PathValidationStatus::UnknownAuthType)),
    };

    let key_alg = &cp
        .target
        .decoded_cert
        .tbs_certificate
        .subject_public_key_info
        .algorithm
        .oid;
    if !auth_type.permits_key_algorithm(key_alg) {
        log_error_for_cert(
            cp.target,
            format!("public key algorithm {key_alg} cannot be used with {auth_type}").as_str(),
        );
        return Err(fail(cpr, PathValidationStatus::KeyAlgorithmMismatch));
    }
    Ok(())
}

/// `check_key_usage` ensures that, if the target certificate features a keyUsage extension, the bit
/// required by the authentication type read from the [`CertificationPathSettings`] parameter is set.
pub fn check_key_usage(
    _pe: &PkiEnvironment,
    cps: &CertificationPathSettings,
    cp: &CertificationPath<'_>,
    cpr: &mut CertificationPathResults,
) -> Result<()> {
    cpr.add_processed_extension(ID_CE_KEY_USAGE);

    let auth_type = match cps.get_auth_type().parse::<AuthType>() {
        Ok(at) => at,
        Err(_) => return Err(fail(cpr, PathValidationStatus::UnknownAuthType)),
    };

    if let Some(PDVExtension::KeyUsage(ku)) = get_usage_extension(cp, &ID_CE_KEY_USAGE, cpr)? {
        let required = auth_type.required_key_usage();
        if !ku.0.contains(required) {
            log_error_for_cert(
                cp.target,
                format!("key usage does not include {:?} as required for {auth_type}", required)
                    .as_str(),
            );
            return Err(fail(cpr, PathValidationStatus::InvalidKeyUsage));
        }
    }
    Ok(())
}

/// `check_extended_key_usage` ensures that, if the target certificate features an extendedKeyUsage
/// extension, it includes either id-kp-serverAuth or anyExtendedKeyUsage.
pub fn check_extended_key_usage(
    _pe: &PkiEnvironment,
    _cps: &CertificationPathSettings,
    cp: &CertificationPath<'_>,
    cpr: &mut CertificationPathResults,
) -> Result<()> {
    cpr.add_processed_extension(ID_CE_EXT_KEY_USAGE);

    if let Some(PDVExtension::ExtendedKeyUsage(eku)) =
        get_usage_extension(cp, &ID_CE_EXT_KEY_USAGE, cpr)?
    {
        if !eku.0.contains(&ID_KP_SERVER_AUTH) && !eku.0.contains(&ANY_EXTENDED_KEY_USAGE) {
            log_error_for_cert(
                cp.target,
                "extended key usage does not permit server authentication",
            );
            return Err(fail(cpr, PathValidationStatus::InvalidKeyUsage));
        }
    }
    Ok(())
}

/// `check_basic_constraints` notes the extensions that carry no constraint on a one-element path,
/// i.e., basicConstraints, subjectAltName and the key identifier extensions, as processed.
///
/// Host name matching against subjectAltName is the responsibility of the TLS client and is not
/// performed here.
pub fn check_basic_constraints(
    _pe: &PkiEnvironment,
    _cps: &CertificationPathSettings,
    _cp: &CertificationPath<'_>,
    cpr: &mut CertificationPathResults,
) -> Result<()> {
    cpr.add_processed_extension(ID_CE_BASIC_CONSTRAINTS);
    cpr.add_processed_extension(ID_CE_SUBJECT_ALT_NAME);
    cpr.add_processed_extension(ID_CE_SUBJECT_KEY_IDENTIFIER);
    cpr.add_processed_extension(ID_CE_AUTHORITY_KEY_IDENTIFIER);
    Ok(())
}

/// `check_critical_extensions` affirms all critical extensions in the target certificate have been
/// processed by inspecting the processed extensions recorded in the [`CertificationPathResults`] object.
pub fn check_critical_extensions(
    _pe: &PkiEnvironment,
    _cps: &CertificationPathSettings,
    cp: &CertificationPath<'_>,
    cpr: &mut CertificationPathResults,
) -> Result<()> {
    if let Some(exts) = &cp.target.decoded_cert.tbs_certificate.extensions {
        for ext in exts {
            if ext.critical && !cpr.get_processed_extensions().contains(&ext.extn_id) {
                log_error_for_cert(
                    cp.target,
                    format!("unprocessed critical extension: {}", ext.extn_id).as_str(),
                );
                return Err(fail(cpr, PathValidationStatus::UnprocessedCriticalExtension));
            }
        }
    }
    Ok(())
}

/// `verify_signatures` verifies the signature of the target certificate using the public key of the
/// trust anchor.
pub fn verify_signatures(
    pe: &PkiEnvironment,
    _cps: &CertificationPathSettings,
    cp: &CertificationPath<'_>,
    cpr: &mut CertificationPathResults,
) -> Result<()> {
    let working_spki = get_subject_public_key_info_from_trust_anchor(&cp.trust_anchor.decoded_ta)?;
    let cert = &cp.target.decoded_cert;

    let tbs = cert.tbs_certificate.to_der()?;
    let sig = match cert.signature.as_bytes() {
        Some(sig) => sig,
        None => return Err(fail(cpr, PathValidationStatus::EncodingError)),
    };

    // the outer and inner signature algorithm identifiers must agree
    if cert.signature_algorithm != cert.tbs_certificate.signature {
        log_error_for_cert(cp.target, "signature algorithm mismatch");
        return Err(fail(cpr, PathValidationStatus::SignatureVerificationFailure));
    }

    if let Err(e) = pe.verify_signature_message(pe, &tbs, sig, &cert.signature_algorithm, working_spki)
    {
        log_error_for_cert(
            cp.target,
            format!("signature verification error: {:?}", e).as_str(),
        );
        return match e {
            Error::PathValidation(PathValidationStatus::ProhibitedAlg) => {
                Err(fail(cpr, PathValidationStatus::ProhibitedAlg))
            }
            _ => Err(fail(cpr, PathValidationStatus::SignatureVerificationFailure)),
        };
    }
    Ok(())
}
