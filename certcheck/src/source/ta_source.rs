//! Provides an in-memory, indexed trust anchor store. The following snip illustrates preparation and
//! use of a [`TaSource`] object populated from the host's trust store.
//!
//! ```no_run
//! use certcheck::{PkiEnvironment, TaSource};
//!
//! let mut pe = PkiEnvironment::default();
//! pe.populate_default_pki_environment();
//!
//! let ta_source = TaSource::new_from_native().unwrap();
//! ta_source.log_tas();
//!
//! // add ta_source to provide access to trust anchors
//! pe.add_trust_anchor_source(Box::new(ta_source));
//! ```
//!
//! A [`TaSource`] can also be populated by hand, i.e., by tests that want a known set of trust
//! anchors, using [`TaSource::push`] followed by [`TaSource::initialize`].

use std::collections::BTreeMap;
use std::str;

use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use subtle_encoding::hex;
use x509_cert::anchor::TrustAnchorChoice;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::name::Name;

#[cfg(feature = "webpki")]
use webpki_roots::TLS_SERVER_ROOTS;

use const_oid::db::rfc5912::{ID_CE_AUTHORITY_KEY_IDENTIFIER, ID_CE_SUBJECT_KEY_IDENTIFIER};

use crate::{
    environment::pki_environment_traits::TrustAnchorSource,
    util::error::*,
    util::pdv_utilities::{get_leaf_rdn, name_to_string},
    validator::pdv_extension::*,
    validator::pdv_trust_anchor::{
        get_subject_public_key_info_from_trust_anchor, get_trust_anchor_name,
    },
    PDVCertificate, PDVTrustAnchorChoice,
};

/// `CertFile` pairs an encoded trust anchor or certificate with the name of the place it was read from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CertFile {
    /// Name of the file or other locator the bytes were read from
    pub filename: String,
    /// Encoded trust anchor or certificate
    pub bytes: Vec<u8>,
}

/// `buffer_to_hex` takes a byte array and returns a string featuring upper case ASCII hex characters (without
/// commas, spaces, or brackets).
/// ```
/// use certcheck::buffer_to_hex;
/// let buf :[u8; 3] = [1,2,3];
/// let bufhex = buffer_to_hex(&buf);
/// assert_eq!(bufhex, "010203");
/// ```
pub fn buffer_to_hex(buffer: &[u8]) -> String {
    let hex = hex::encode_upper(buffer);
    match str::from_utf8(hex.as_slice()) {
        Ok(s) => s.to_string(),
        Err(_) => "".to_string(),
    }
}

fn hex_digest_of_key(key_bits: Option<&[u8]>) -> String {
    match key_bits {
        Some(b) => buffer_to_hex(Sha256::digest(b).as_slice()),
        None => "".to_string(),
    }
}

/// `hex_skid_from_ta` takes a trust anchor object and returns a string featuring upper case ASCII hex
/// characters (without commas, spaces, or brackets).
///
/// The value represents one of the following:
/// - the value of the SubjectKeyIdentifier (SKID) extension in a Certificate option
/// - the value of a SHA256 hash of the public key from a Certificate option that lacks a SKID extension
/// - the value of the key ID field in a TrustAnchorInfo option.
pub fn hex_skid_from_ta(ta: &PDVTrustAnchorChoice) -> String {
    match &ta.decoded_ta {
        TrustAnchorChoice::Certificate(cert) => {
            let skid = ta.get_extension(&ID_CE_SUBJECT_KEY_IDENTIFIER);
            if let Ok(Some(PDVExtension::SubjectKeyIdentifier(skid))) = skid {
                buffer_to_hex(skid.0.as_bytes())
            } else {
                hex_digest_of_key(
                    cert.tbs_certificate
                        .subject_public_key_info
                        .subject_public_key
                        .as_bytes(),
                )
            }
        }
        TrustAnchorChoice::TaInfo(tai) => buffer_to_hex(tai.key_id.as_bytes()),
        #[allow(unreachable_patterns)]
        _ => "".to_string(),
    }
}

/// `hex_skid_from_cert` takes a certificate object and returns a string featuring upper case ASCII hex
/// characters (without commas, spaces, or brackets) representing either the value of the SKID extension
/// or a SHA256 hash of the public key.
pub fn hex_skid_from_cert(cert: &PDVCertificate) -> String {
    let skid = cert.get_extension(&ID_CE_SUBJECT_KEY_IDENTIFIER);
    if let Ok(Some(PDVExtension::SubjectKeyIdentifier(skid))) = skid {
        buffer_to_hex(skid.0.as_bytes())
    } else {
        hex_digest_of_key(
            cert.decoded_cert
                .tbs_certificate
                .subject_public_key_info
                .subject_public_key
                .as_bytes(),
        )
    }
}

/// Returns the key used to index names, i.e., the string form of the name in lower case with
/// whitespace runs collapsed. Candidates found via this key are re-checked with compare_names.
fn name_key(name: &Name) -> String {
    name_to_string(name)
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .to_lowercase()
}

/// Structure containing a vector of encoded trust anchors and a vector of parsed trust anchors
/// prepared from those buffers. Two internal maps are used to correlate key IDs and names to
/// values in the parsed vector.
#[derive(Clone, Default)]
pub struct TaSource {
    /// list of TAs parsed from the buffers field
    tas: Vec<PDVTrustAnchorChoice>,

    /// Contains list of buffers the tas field is prepared from
    buffers: Vec<CertFile>,

    /// Maps TA SKIDs to keys in the tas vector
    skid_map: BTreeMap<String, usize>,

    /// Maps TA names to keys in the tas vector. More than one TA may share a name.
    name_map: BTreeMap<String, Vec<usize>>,
}

impl TaSource {
    /// instantiates a new, empty TaSource
    pub fn new() -> TaSource {
        TaSource::default()
    }

    /// Adds an encoded trust anchor to the list of buffers. Duplicates are ignored. Call
    /// [`TaSource::initialize`] after adding buffers.
    pub fn push(&mut self, cf: CertFile) {
        if !self.buffers.contains(&cf) {
            self.buffers.push(cf)
        }
    }

    /// Returns the number of trust anchors available after initialization.
    pub fn len(&self) -> usize {
        self.tas.len()
    }

    /// Returns true if no trust anchors are available.
    pub fn is_empty(&self) -> bool {
        self.tas.is_empty()
    }

    /// Creates a new TaSource instance from the host's trust store as read by the
    /// [rustls-native-certs crate](https://crates.io/crates/rustls-native-certs). Entries that cannot
    /// be read or parsed are logged and skipped.
    #[cfg(feature = "native")]
    pub fn new_from_native() -> Result<Self> {
        let result = rustls_native_certs::load_native_certs();
        for e in &result.errors {
            warn!("Error encountered while reading the system trust store: {e}");
        }

        let mut tas = Self::new();
        for (i, cert) in result.certs.iter().enumerate() {
            tas.push(CertFile {
                filename: format!("System TrustAnchor #{i}"),
                bytes: cert.as_ref().to_vec(),
            });
        }
        tas.initialize()?;
        if tas.is_empty() {
            warn!("No trust anchors were read from the system trust store");
        }
        Ok(tas)
    }

    /// Creates a new TaSource instance from the [TLS_SERVER_ROOTS](https://docs.rs/webpki-roots/0.25.1/webpki_roots/constant.TLS_SERVER_ROOTS.html)
    /// variable in [webpki-roots crate](https://crates.io/crates/webpki-roots). This conversion is best effort.
    /// Any trust anchors that cannot be converted are logged and the process continues.
    #[cfg(feature = "webpki")]
    pub fn new_from_webpki() -> Result<Self> {
        let mut tas = Self::new();
        for (i, ta) in TLS_SERVER_ROOTS.iter().enumerate() {
            let pdv_ta = match PDVTrustAnchorChoice::try_from(ta) {
                Ok(t) => t,
                Err(e) => {
                    warn!("Failed to convert WebPKI TrustAnchor #{i}: {e}");
                    continue;
                }
            };
            tas.push(CertFile {
                filename: format!("WebPKI TrustAnchor #{i}"),
                bytes: pdv_ta.encoded_ta,
            });
        }
        tas.initialize()?;
        Ok(tas)
    }

    /// Parses the buffers added to the instance then indexes the resulting trust anchors.
    ///
    /// Buffers may contain a DER-encoded Certificate or TrustAnchorChoice. Buffers that cannot be
    /// parsed are logged and skipped.
    pub fn initialize(&mut self) -> Result<()> {
        self.tas.clear();
        for cf in &self.buffers {
            match PDVTrustAnchorChoice::try_from(cf.bytes.as_slice()) {
                Ok(ta) => self.tas.push(ta.with_locator(&cf.filename)),
                Err(e) => {
                    info!("Failed to parse trust anchor from {}: {e}", cf.filename);
                }
            }
        }
        self.index_tas();
        Ok(())
    }

    /// index_tas builds internally used maps based on key identifiers and names. It is called by
    /// [`TaSource::initialize`].
    pub fn index_tas(&mut self) {
        self.skid_map.clear();
        self.name_map.clear();
        for (i, ta) in self.tas.iter().enumerate() {
            let hex_skid = hex_skid_from_ta(ta);
            self.skid_map.entry(hex_skid).or_insert(i);

            if let Ok(name) = get_trust_anchor_name(&ta.decoded_ta) {
                self.name_map.entry(name_key(name)).or_default().push(i);
            };
        }
    }

    /// Log trust anchor details at info level.
    pub fn log_tas(&self) {
        for (i, ta) in self.tas.iter().enumerate() {
            let hex_skid = hex_skid_from_ta(ta);
            if let Ok(name) = get_trust_anchor_name(&ta.decoded_ta) {
                let sub = get_leaf_rdn(name);
                info!(
                    "Index: {:3}; SKID: {}; Subject: {}; Locator: {}",
                    i, hex_skid, sub, ta.locator
                );
            } else {
                info!(
                    "Index: {:3}; SKID: {}; Subject: No Name; Locator: {}",
                    i, hex_skid, ta.locator
                );
            }
        }
    }

    fn push_unique<'a>(&'a self, v: &mut Vec<&'a PDVTrustAnchorChoice>, index: usize) {
        let ta = &self.tas[index];
        if !v.iter().any(|t| core::ptr::eq(*t, ta)) {
            v.push(ta);
        }
    }
}

impl TrustAnchorSource for TaSource {
    fn get_trust_anchors(&'_ self) -> Result<Vec<&PDVTrustAnchorChoice>> {
        Ok(self.tas.iter().collect())
    }

    fn get_trust_anchor_by_hex_skid(&'_ self, hex_skid: &str) -> Result<&PDVTrustAnchorChoice> {
        match self.skid_map.get(hex_skid) {
            Some(i) => Ok(&self.tas[*i]),
            None => Err(Error::NotFound),
        }
    }

    fn get_trust_anchors_by_name(&'_ self, name: &'_ Name) -> Result<Vec<&PDVTrustAnchorChoice>> {
        match self.name_map.get(&name_key(name)) {
            Some(indices) => Ok(indices.iter().map(|i| &self.tas[*i]).collect()),
            None => Err(Error::NotFound),
        }
    }

    fn get_trust_anchors_for_target(
        &'_ self,
        target: &'_ PDVCertificate,
    ) -> Result<Vec<&PDVTrustAnchorChoice>> {
        let mut v = vec![];
        let mut name_vec = vec![&target.decoded_cert.tbs_certificate.issuer];

        let akid_ext = target.get_extension(&ID_CE_AUTHORITY_KEY_IDENTIFIER);
        if let Ok(Some(PDVExtension::AuthorityKeyIdentifier(akid))) = akid_ext {
            if let Some(kid) = &akid.key_identifier {
                let akid_hex = buffer_to_hex(kid.as_bytes());
                match self.skid_map.get(&akid_hex) {
                    Some(i) => self.push_unique(&mut v, *i),
                    None => debug!("No trust anchor found for key identifier {akid_hex}"),
                }
            }
            if let Some(names) = &akid.authority_cert_issuer {
                for n in names {
                    if let GeneralName::DirectoryName(dn) = n {
                        name_vec.push(dn);
                    }
                }
            }
        }

        for n in name_vec {
            if let Some(indices) = self.name_map.get(&name_key(n)) {
                for i in indices {
                    self.push_unique(&mut v, *i);
                }
            }
        }

        match v.is_empty() {
            true => Err(Error::NotFound),
            false => Ok(v),
        }
    }

    /// is_cert_a_trust_anchor returns the trust anchor with the same name and public key as the
    /// presented certificate, if any
    fn is_cert_a_trust_anchor(&'_ self, cert: &'_ PDVCertificate) -> Result<&PDVTrustAnchorChoice> {
        let target_spki = &cert.decoded_cert.tbs_certificate.subject_public_key_info;
        let candidates = self.get_trust_anchors_by_name(&cert.decoded_cert.tbs_certificate.subject)?;
        for ta in candidates {
            if let Ok(spki) = get_subject_public_key_info_from_trust_anchor(&ta.decoded_ta) {
                if spki.algorithm.oid == target_spki.algorithm.oid
                    && spki.subject_public_key == target_spki.subject_public_key
                {
                    return Ok(ta);
                }
            }
        }
        Err(Error::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair, KeyUsagePurpose};

    fn make_ca(cn: &str) -> (rcgen::Certificate, KeyPair) {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(vec![]).unwrap();
        params.distinguished_name.push(DnType::CommonName, cn);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![KeyUsagePurpose::KeyCertSign];
        let cert = params.self_signed(&key).unwrap();
        (cert, key)
    }

    fn source_for(certs: &[&rcgen::Certificate]) -> TaSource {
        let mut tas = TaSource::new();
        for (i, c) in certs.iter().enumerate() {
            tas.push(CertFile {
                filename: format!("ta{i}.der"),
                bytes: c.der().to_vec(),
            });
        }
        tas.initialize().unwrap();
        tas
    }

    #[test]
    fn index_and_lookup() {
        let (ca1, ca1_key) = make_ca("Test Root One");
        let (ca2, _) = make_ca("Test Root Two");
        let mut tas = source_for(&[&ca1, &ca2]);
        assert_eq!(2, tas.len());

        // duplicates and garbage are ignored
        tas.push(CertFile {
            filename: "ta0.der".to_string(),
            bytes: ca1.der().to_vec(),
        });
        tas.push(CertFile {
            filename: "garbage".to_string(),
            bytes: vec![1, 2, 3],
        });
        tas.initialize().unwrap();
        assert_eq!(2, tas.len());
        assert_eq!(2, tas.get_trust_anchors().unwrap().len());

        let ca1_pdv = PDVCertificate::try_from(ca1.der().as_ref()).unwrap();
        let ta = tas.is_cert_a_trust_anchor(&ca1_pdv).unwrap();
        assert_eq!("ta0.der", ta.locator);
        let skid = hex_skid_from_cert(&ca1_pdv);
        assert_eq!(ta, tas.get_trust_anchor_by_hex_skid(&skid).unwrap());

        // a leaf issued by ca1 is matched to ca1 by AKID and name
        let leaf_key = KeyPair::generate().unwrap();
        let mut leaf_params = CertificateParams::new(vec!["www.example.com".to_string()]).unwrap();
        leaf_params.use_authority_key_identifier_extension = true;
        let leaf = leaf_params.signed_by(&leaf_key, &ca1, &ca1_key).unwrap();
        let leaf_pdv = PDVCertificate::try_from(leaf.der().as_ref()).unwrap();
        let candidates = tas.get_trust_anchors_for_target(&leaf_pdv).unwrap();
        assert_eq!(1, candidates.len());
        assert_eq!("ta0.der", candidates[0].locator);
        assert!(tas.is_cert_a_trust_anchor(&leaf_pdv).is_err());
    }

    #[test]
    fn same_name_different_key() {
        let (ca1, _) = make_ca("Shared Name");
        let (ca2, _) = make_ca("Shared Name");
        let (impostor, _) = make_ca("Shared Name");
        let tas = source_for(&[&ca1, &ca2]);

        let ca1_pdv = PDVCertificate::try_from(ca1.der().as_ref()).unwrap();
        let n = &ca1_pdv.decoded_cert.tbs_certificate.subject;
        assert_eq!(2, tas.get_trust_anchors_by_name(n).unwrap().len());

        let ca2_pdv = PDVCertificate::try_from(ca2.der().as_ref()).unwrap();
        assert_eq!("ta1.der", tas.is_cert_a_trust_anchor(&ca2_pdv).unwrap().locator);

        let impostor_pdv = PDVCertificate::try_from(impostor.der().as_ref()).unwrap();
        assert_eq!(
            Err(Error::NotFound),
            tas.is_cert_a_trust_anchor(&impostor_pdv).map(|_| ())
        );
    }

    #[cfg(feature = "webpki")]
    #[test]
    fn webpki_source() {
        let tas = TaSource::new_from_webpki().unwrap();
        assert!(!tas.is_empty());
        for ta in tas.get_trust_anchors().unwrap() {
            assert!(tas
                .get_trust_anchor_by_hex_skid(&hex_skid_from_ta(ta))
                .is_ok());
        }
    }
}
