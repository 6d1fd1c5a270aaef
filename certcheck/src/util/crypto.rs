//! Provides implementations of crypto-related [`PkiEnvironment`] interfaces using libraries from the
//! [Rust Crypto](https://github.com/RustCrypto) project for support.

use der::{asn1::ObjectIdentifier, Encode};
use log::debug;
use p256::ecdsa::signature::hazmat::PrehashVerifier;
use p256::ecdsa::{Signature as Signature256, VerifyingKey as VerifyingKey256};
use p384::ecdsa::{Signature as Signature384, VerifyingKey as VerifyingKey384};
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::util::error::{Error, PathValidationStatus, Result};
use crate::{
    environment::pki_environment::*, util::pdv_alg_oids::*,
    util::pdv_utilities::get_hash_alg_from_sig_alg,
};

/// get_padding_scheme takes an AlgorithmIdentifier containing a signature algorithm and returns
/// a corresponding PKCS #1 v1.5 signature scheme instance.
///
/// The [`PKIXALG_SHA224_WITH_RSA_ENCRYPTION`], [`PKIXALG_SHA256_WITH_RSA_ENCRYPTION`],
/// [`PKIXALG_SHA384_WITH_RSA_ENCRYPTION`] and [`PKIXALG_SHA512_WITH_RSA_ENCRYPTION`] algorithm
/// identifiers are supported.
pub fn get_padding_scheme(signature_alg: &AlgorithmIdentifierOwned) -> Result<Pkcs1v15Sign> {
    match signature_alg.oid {
        PKIXALG_SHA256_WITH_RSA_ENCRYPTION => Ok(Pkcs1v15Sign::new::<Sha256>()),
        PKIXALG_SHA384_WITH_RSA_ENCRYPTION => Ok(Pkcs1v15Sign::new::<Sha384>()),
        PKIXALG_SHA224_WITH_RSA_ENCRYPTION => Ok(Pkcs1v15Sign::new::<Sha224>()),
        PKIXALG_SHA512_WITH_RSA_ENCRYPTION => Ok(Pkcs1v15Sign::new::<Sha512>()),
        _ => Err(Error::Unrecognized),
    }
}

/// is_rsa returns true is the presented OID is one of [`PKIXALG_SHA224_WITH_RSA_ENCRYPTION`],
/// [`PKIXALG_SHA256_WITH_RSA_ENCRYPTION`], [`PKIXALG_SHA384_WITH_RSA_ENCRYPTION`] or
/// [`PKIXALG_SHA512_WITH_RSA_ENCRYPTION`] and false otherwise.
pub(crate) fn is_rsa(oid: &ObjectIdentifier) -> bool {
    *oid == PKIXALG_SHA256_WITH_RSA_ENCRYPTION
        || *oid == PKIXALG_SHA384_WITH_RSA_ENCRYPTION
        || *oid == PKIXALG_SHA224_WITH_RSA_ENCRYPTION
        || *oid == PKIXALG_SHA512_WITH_RSA_ENCRYPTION
}

/// is_ecdsa returns true is the presented OID is one of [`PKIXALG_ECDSA_WITH_SHA224`],
/// [`PKIXALG_ECDSA_WITH_SHA256`], [`PKIXALG_ECDSA_WITH_SHA384`] or [`PKIXALG_ECDSA_WITH_SHA512`] and false otherwise.
pub(crate) fn is_ecdsa(oid: &ObjectIdentifier) -> bool {
    *oid == PKIXALG_ECDSA_WITH_SHA256
        || *oid == PKIXALG_ECDSA_WITH_SHA384
        || *oid == PKIXALG_ECDSA_WITH_SHA224
        || *oid == PKIXALG_ECDSA_WITH_SHA512
}

/// calculate_hash_rust_crypto returns the digest of the given buffer using implementations from
/// the Rust Crypto project.
///
/// It supports [`PKIXALG_SHA224`], [`PKIXALG_SHA256`], [`PKIXALG_SHA384`] and [`PKIXALG_SHA512`].
pub fn calculate_hash_rust_crypto(
    hash_alg: &AlgorithmIdentifierOwned,
    buffer_to_hash: &[u8],
) -> Result<Vec<u8>> {
    match hash_alg.oid {
        PKIXALG_SHA224 => Ok(Sha224::digest(buffer_to_hash).to_vec()),
        PKIXALG_SHA256 => Ok(Sha256::digest(buffer_to_hash).to_vec()),
        PKIXALG_SHA384 => Ok(Sha384::digest(buffer_to_hash).to_vec()),
        PKIXALG_SHA512 => Ok(Sha512::digest(buffer_to_hash).to_vec()),
        _ => Err(Error::Unrecognized),
    }
}

/// get_named_curve_parameter returns the namedCurve OID from the parameters field of an
/// id-ecPublicKey algorithm identifier.
pub fn get_named_curve_parameter(alg_id: &AlgorithmIdentifierOwned) -> Result<ObjectIdentifier> {
    if let Some(params) = &alg_id.parameters {
        if let Ok(oid) = params.decode_as::<ObjectIdentifier>() {
            return Ok(oid);
        }
    }
    Err(Error::PathValidation(PathValidationStatus::EncodingError))
}

fn sig_failure() -> Error {
    Error::PathValidation(PathValidationStatus::SignatureVerificationFailure)
}

fn verify_rsa(
    message_to_verify: &[u8],
    signature: &[u8],
    signature_alg: &AlgorithmIdentifierOwned,
    spki: &SubjectPublicKeyInfoOwned,
) -> Result<()> {
    let enc_spki = spki.to_der()?;
    let rsa = match RsaPublicKey::from_public_key_der(&enc_spki) {
        Ok(rsa) => rsa,
        Err(e) => {
            debug!("Failed to parse RSA public key: {e}");
            return Err(sig_failure());
        }
    };
    let hash_alg = get_hash_alg_from_sig_alg(&signature_alg.oid)?;
    let hash_to_verify = calculate_hash_rust_crypto(&hash_alg, message_to_verify)?;
    let ps = get_padding_scheme(signature_alg)?;
    rsa.verify(ps, hash_to_verify.as_slice(), signature)
        .map_err(|_e| sig_failure())
}

fn verify_ecdsa(
    message_to_verify: &[u8],
    signature: &[u8],
    signature_alg: &AlgorithmIdentifierOwned,
    spki: &SubjectPublicKeyInfoOwned,
) -> Result<()> {
    let named_curve = get_named_curve_parameter(&spki.algorithm)?;
    let hash_alg = get_hash_alg_from_sig_alg(&signature_alg.oid)?;
    let hash_to_verify = calculate_hash_rust_crypto(&hash_alg, message_to_verify)?;
    let key_bytes = match spki.subject_public_key.as_bytes() {
        Some(b) => b,
        None => return Err(Error::PathValidation(PathValidationStatus::EncodingError)),
    };

    match named_curve {
        PKIXALG_SECP256R1 => {
            let ecdsa = VerifyingKey256::from_sec1_bytes(key_bytes).map_err(|_e| sig_failure())?;
            let s = Signature256::from_der(signature).map_err(|_e| sig_failure())?;
            ecdsa
                .verify_prehash(&hash_to_verify, &s)
                .map_err(|_e| sig_failure())
        }
        PKIXALG_SECP384R1 => {
            let ecdsa = VerifyingKey384::from_sec1_bytes(key_bytes).map_err(|_e| sig_failure())?;
            let s = Signature384::from_der(signature).map_err(|_e| sig_failure())?;
            ecdsa
                .verify_prehash(&hash_to_verify, &s)
                .map_err(|_e| sig_failure())
        }
        _ => {
            debug!("Unrecognized or unsupported named curve: {}", named_curve);
            Err(Error::PathValidation(PathValidationStatus::ProhibitedAlg))
        }
    }
}

/// verify_signature_message_rust_crypto implements the [`VerifySignatureMessage`](../pki_environment_traits/type.VerifySignatureMessage.html)
/// interface for [`PkiEnvironment`] using implementations from the [Rust Crypto](https://github.com/RustCrypto) project.
///
/// RSA PKCS #1 v1.5 signatures and ECDSA signatures on the P-256 and P-384 curves are supported,
/// each with SHA-224, SHA-256, SHA-384 or SHA-512. Any other signature algorithm, including those
/// using SHA-1, yields [`PathValidationStatus::ProhibitedAlg`].
pub fn verify_signature_message_rust_crypto(
    _pe: &PkiEnvironment,
    message_to_verify: &[u8],                 // buffer to verify
    signature: &[u8],                         // signature
    signature_alg: &AlgorithmIdentifierOwned, // signature algorithm
    spki: &SubjectPublicKeyInfoOwned,         // public key
) -> Result<()> {
    if is_rsa(&signature_alg.oid) {
        verify_rsa(message_to_verify, signature, signature_alg, spki)
    } else if is_ecdsa(&signature_alg.oid) {
        verify_ecdsa(message_to_verify, signature, signature_alg, spki)
    } else {
        debug!("Unrecognized or prohibited signature algorithm: {}", signature_alg.oid);
        Err(Error::PathValidation(PathValidationStatus::ProhibitedAlg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use der::Decode;
    use x509_cert::Certificate;

    #[test]
    fn test_calculate_hash() {
        use hex_literal::hex;
        let hash_algorithm = AlgorithmIdentifierOwned {
            oid: PKIXALG_SHA256,
            parameters: None,
        };
        let result = calculate_hash_rust_crypto(&hash_algorithm, "abc".as_bytes()).unwrap();
        assert_eq!(
            result,
            hex!("BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD")
        );

        let sha1 = AlgorithmIdentifierOwned {
            oid: PKIXALG_SHA1_WITH_RSA_ENCRYPTION,
            parameters: None,
        };
        assert_eq!(
            Err(Error::Unrecognized),
            calculate_hash_rust_crypto(&sha1, "abc".as_bytes())
        );
    }

    #[test]
    fn test_verify_ecdsa_self_signed() {
        let mut pe = PkiEnvironment::default();
        pe.clear_all_callbacks();
        pe.add_verify_signature_message_callback(verify_signature_message_rust_crypto);

        let key = rcgen::KeyPair::generate().unwrap();
        let params = rcgen::CertificateParams::new(vec!["localhost".to_string()]).unwrap();
        let der_cert = params.self_signed(&key).unwrap().der().to_vec();
        let cert = Certificate::from_der(&der_cert).unwrap();

        let tbs = cert.tbs_certificate.to_der().unwrap();
        let sig = cert.signature.raw_bytes();
        let spki = &cert.tbs_certificate.subject_public_key_info;
        assert!(pe
            .verify_signature_message(&pe, &tbs, sig, &cert.signature_algorithm, spki)
            .is_ok());

        let mut tampered = tbs.clone();
        let last = tampered.len() - 1;
        tampered[last] ^= 0x01;
        assert_eq!(
            Err(Error::PathValidation(
                PathValidationStatus::SignatureVerificationFailure
            )),
            pe.verify_signature_message(&pe, &tampered, sig, &cert.signature_algorithm, spki)
        );

        let sha1_alg = AlgorithmIdentifierOwned {
            oid: PKIXALG_SHA1_WITH_RSA_ENCRYPTION,
            parameters: None,
        };
        assert_eq!(
            Err(Error::PathValidation(PathValidationStatus::ProhibitedAlg)),
            pe.verify_signature_message(&pe, &tbs, sig, &sha1_alg, spki)
        );
    }

    #[test]
    fn test_verify_rsa() {
        use rsa::pkcs8::EncodePublicKey;
        use rsa::RsaPrivateKey;

        let mut rng = rsa::rand_core::OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, 1024).unwrap();
        let enc_spki = private_key
            .to_public_key()
            .to_public_key_der()
            .unwrap()
            .to_vec();
        let spki = SubjectPublicKeyInfoOwned::from_der(&enc_spki).unwrap();

        let msg = b"message to verify";
        let digest = Sha256::digest(msg);
        let sig = private_key
            .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
            .unwrap();

        let sig_alg = AlgorithmIdentifierOwned {
            oid: PKIXALG_SHA256_WITH_RSA_ENCRYPTION,
            parameters: None,
        };
        let pe = PkiEnvironment::default();
        assert!(verify_signature_message_rust_crypto(&pe, msg, &sig, &sig_alg, &spki).is_ok());
        assert_eq!(
            Err(sig_failure()),
            verify_signature_message_rust_crypto(&pe, b"other message", &sig, &sig_alg, &spki)
        );
    }
}
