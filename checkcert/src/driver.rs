//! Per-path processing: existence checks, loading, validation and status line output

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use log::{debug, info};

use certcheck::{
    check_server_trusted, load_certificate, CertificationPathSettings, Error, PkiEnvironment,
};

/// Outcome of checking a single path
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum CertStatus {
    /// Certificate loaded and validated
    Ok,
    /// Path does not refer to an existing file system entry
    Missing,
    /// Path refers to something other than a regular file, i.e., a directory
    NotRegularFile,
    /// File could not be read or did not contain a certificate
    LoadFailed(Error),
    /// Certificate was read but is not trusted
    ValidationFailed(Error),
}

impl CertStatus {
    pub(crate) fn is_failure(&self) -> bool {
        !matches!(self, CertStatus::Ok)
    }

    /// Returns the text that follows "Checking <path>: " on a status line.
    pub(crate) fn render(&self, verbose: bool) -> String {
        match self {
            CertStatus::Ok => "✓ ok".to_string(),
            CertStatus::Missing => "missing".to_string(),
            CertStatus::NotRegularFile => "not a regular file".to_string(),
            CertStatus::LoadFailed(e) | CertStatus::ValidationFailed(e) => match verbose {
                true => format!("✗ (failed) - {e}"),
                false => "✗ (failed)".to_string(),
            },
        }
    }
}

/// Checks certificate files against the trust anchors registered with a [`PkiEnvironment`].
pub(crate) struct CertChecker<'a> {
    pe: &'a PkiEnvironment,
    cps: &'a CertificationPathSettings,
}

impl<'a> CertChecker<'a> {
    pub(crate) fn new(pe: &'a PkiEnvironment, cps: &'a CertificationPathSettings) -> Self {
        CertChecker { pe, cps }
    }

    /// Determines the status of the certificate file at `path`.
    pub(crate) fn check_path(&self, path: &Path) -> CertStatus {
        let metadata = match fs::metadata(path) {
            Ok(md) => md,
            Err(e) => {
                debug!("Failed to read metadata for {}: {e}", path.display());
                return CertStatus::Missing;
            }
        };
        if !metadata.is_file() {
            return CertStatus::NotRegularFile;
        }

        let target = match load_certificate(path) {
            Ok(target) => target,
            Err(e) => {
                info!("Failed to load certificate from {}: {e}", path.display());
                return CertStatus::LoadFailed(e);
            }
        };

        match check_server_trusted(self.pe, self.cps, &target) {
            Ok(_) => CertStatus::Ok,
            Err(e) => {
                info!("Validation failed for {}: {e}", path.display());
                CertStatus::ValidationFailed(e)
            }
        }
    }

    /// Checks each path in order, writing one status line per path to `out`. Returns true if
    /// every path was Ok.
    pub(crate) fn check_all<W: Write>(
        &self,
        paths: &[String],
        verbose: bool,
        out: &mut W,
    ) -> io::Result<bool> {
        let mut all_ok = true;
        for p in paths {
            let status = self.check_path(Path::new(p));
            if status.is_failure() {
                all_ok = false;
            }
            writeln!(out, "Checking {}: {}", p, status.render(verbose))?;
            out.flush()?;
        }
        Ok(all_ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certcheck::{CertFile, PathValidationStatus, TaSource};
    use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair, KeyUsagePurpose};

    fn make_ca() -> (rcgen::Certificate, KeyPair) {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(vec![]).unwrap();
        params.distinguished_name.push(DnType::CommonName, "Driver Test Root");
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let cert = params.self_signed(&key).unwrap();
        (cert, key)
    }

    fn env_with(ca: &rcgen::Certificate) -> PkiEnvironment {
        let mut tas = TaSource::new();
        tas.push(CertFile {
            filename: "root.der".to_string(),
            bytes: ca.der().to_vec(),
        });
        tas.initialize().unwrap();
        let mut pe = PkiEnvironment::new();
        pe.populate_default_pki_environment();
        pe.add_trust_anchor_source(Box::new(tas));
        pe
    }

    #[test]
    fn render() {
        let e = Error::PathValidation(PathValidationStatus::InvalidNotAfterDate);
        assert_eq!("✓ ok", CertStatus::Ok.render(true));
        assert_eq!("missing", CertStatus::Missing.render(true));
        assert_eq!("not a regular file", CertStatus::NotRegularFile.render(false));
        assert_eq!("✗ (failed)", CertStatus::ValidationFailed(e).render(false));
        assert_eq!(
            "✗ (failed) - certificate has expired",
            CertStatus::ValidationFailed(e).render(true)
        );
        assert_eq!(
            "✗ (failed) - could not parse certificate",
            CertStatus::LoadFailed(Error::ParseError).render(true)
        );
        assert!(!CertStatus::Ok.is_failure());
        assert!(CertStatus::Missing.is_failure());
    }

    #[test]
    fn check_paths() {
        let (ca, ca_key) = make_ca();
        let pe = env_with(&ca);
        let mut cps = CertificationPathSettings::new();
        cps.set_auth_type("ECDHE_ECDSA");

        let dir = tempfile::tempdir().unwrap();
        let leaf_key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::new(vec!["www.example.com".to_string()]).unwrap();
        params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
        let leaf = params.signed_by(&leaf_key, &ca, &ca_key).unwrap();
        let leaf_path = dir.path().join("leaf.pem");
        fs::write(&leaf_path, leaf.pem()).unwrap();

        let (stranger, _) = make_ca();
        let stranger_path = dir.path().join("stranger.der");
        fs::write(&stranger_path, stranger.der()).unwrap();

        let garbage_path = dir.path().join("garbage.der");
        fs::write(&garbage_path, b"garbage").unwrap();

        let missing_path = dir.path().join("missing.der");

        let checker = CertChecker::new(&pe, &cps);
        assert_eq!(CertStatus::Ok, checker.check_path(&leaf_path));
        assert_eq!(CertStatus::Missing, checker.check_path(&missing_path));
        assert_eq!(CertStatus::NotRegularFile, checker.check_path(dir.path()));
        assert_eq!(
            CertStatus::LoadFailed(Error::ParseError),
            checker.check_path(&garbage_path)
        );
        // same name as the trusted root but a different key
        assert!(matches!(
            checker.check_path(&stranger_path),
            CertStatus::ValidationFailed(_)
        ));

        let leaf_str = leaf_path.to_string_lossy().to_string();
        let mut out = vec![];
        assert!(checker
            .check_all(&[leaf_str.clone()], false, &mut out)
            .unwrap());
        assert_eq!(
            format!("Checking {leaf_str}: ✓ ok\n"),
            String::from_utf8(out).unwrap()
        );

        let paths = vec![
            missing_path.to_string_lossy().to_string(),
            leaf_str.clone(),
            garbage_path.to_string_lossy().to_string(),
        ];
        let mut out = vec![];
        assert!(!checker.check_all(&paths, true, &mut out).unwrap());
        assert_eq!(
            format!(
                "Checking {}: missing\nChecking {}: ✓ ok\nChecking {}: ✗ (failed) - could not parse certificate\n",
                paths[0], paths[1], paths[2]
            ),
            String::from_utf8(out).unwrap()
        );

        let mut out = vec![];
        assert!(checker.check_all(&[], false, &mut out).unwrap());
        assert!(out.is_empty());
    }
}
