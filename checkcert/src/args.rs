//! Arguments for the checkcert utility

use clap::Parser;
use serde::{Deserialize, Serialize};

use certcheck::DEFAULT_AUTH_TYPE;

/// Checks whether certificate files are trusted as TLS server certificates by the host's default
/// trust anchors.
#[derive(Parser, Debug, Serialize, Deserialize, Default)]
#[clap(author, version, about, long_about = None)]
pub struct CheckCertArgs {
    /// Paths of DER or PEM encoded certificate files to check. Files containing more than one
    /// certificate are checked using the first.
    pub certs: Vec<String>,

    /// Include the reason for each failure in the output.
    #[clap(long)]
    pub verbose: bool,

    /// Authentication/key exchange algorithm tag the certificates must be suitable for, i.e., RSA,
    /// ECDHE_RSA, ECDHE_ECDSA, ECDH_ECDSA, DHE_DSS or UNKNOWN. Tags are not case-sensitive.
    #[clap(long, default_value = DEFAULT_AUTH_TYPE)]
    pub auth_type: String,

    /// Time to use for validation expressed as the number of seconds since Unix epoch (defaults to
    /// current system time). Zero disables validity period checks.
    #[clap(short = 'i', long)]
    pub time_of_interest: Option<u64>,

    /// Use trust anchors from webpki-roots crate (which are from Mozilla) instead of the host's
    /// trust store
    #[cfg(feature = "webpki")]
    #[clap(long)]
    pub webpki_tas: bool,

    /// Full path and filename of YAML-formatted configuration file for log4rs logging mechanism.
    /// See <https://docs.rs/log4rs/latest/log4rs/> for details.
    #[clap(short, long)]
    pub logging_config: Option<String>,
}
