#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

mod args;
mod driver;
mod logging;

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use log::{debug, error, info};

use certcheck::{CertificationPathSettings, PkiEnvironment, TaSource};

use crate::args::*;
use crate::driver::CertChecker;
use crate::logging::configure_logging;

/// Reads the trust anchors selected by the command line arguments. Problems are logged and an empty
/// source is returned, in which case every certificate fails for want of a trust anchor.
#[allow(unused_variables)]
fn load_trust_anchors(args: &CheckCertArgs) -> TaSource {
    #[cfg(feature = "webpki")]
    if args.webpki_tas {
        return match TaSource::new_from_webpki() {
            Ok(tas) => tas,
            Err(e) => {
                error!("Failed to load trust anchors from webpki-roots: {e}");
                TaSource::new()
            }
        };
    }

    #[cfg(feature = "native")]
    let tas = match TaSource::new_from_native() {
        Ok(tas) => tas,
        Err(e) => {
            error!("Failed to load trust anchors from the system trust store: {e}");
            TaSource::new()
        }
    };

    #[cfg(not(feature = "native"))]
    let tas = {
        error!("No trust anchor source is available in this build");
        TaSource::new()
    };

    tas
}

/// Point of entry for checkcert application.
fn main() -> ExitCode {
    let args = CheckCertArgs::parse();
    configure_logging(&args.logging_config);
    debug!("checkcert start");
    if let Ok(json) = serde_json::to_string(&args) {
        debug!("Arguments: {json}");
    }

    let tas = load_trust_anchors(&args);
    info!("Loaded {} trust anchors", tas.len());
    tas.log_tas();

    let mut pe = PkiEnvironment::new();
    pe.populate_default_pki_environment();
    pe.add_trust_anchor_source(Box::new(tas));

    let mut cps = CertificationPathSettings::new();
    cps.set_auth_type(&args.auth_type);
    if let Some(toi) = args.time_of_interest {
        cps.set_time_of_interest(toi);
    }

    let checker = CertChecker::new(&pe, &cps);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut all_ok = match checker.check_all(&args.certs, args.verbose, &mut out) {
        Ok(all_ok) => all_ok,
        Err(e) => {
            error!("Failed to write results: {e}");
            false
        }
    };
    if let Err(e) = out.flush() {
        error!("Failed to flush results: {e}");
        all_ok = false;
    }
    debug!("checkcert end");

    match all_ok {
        true => ExitCode::SUCCESS,
        false => ExitCode::FAILURE,
    }
}
