//! Validation of a target certificate as a TLS server certificate issued by a trust anchor

pub mod auth_type;
pub mod cert_path;
pub mod path_results;
pub mod path_settings;
pub mod path_validator;
pub mod pdv_certificate;
pub mod pdv_extension;
pub mod pdv_trust_anchor;

pub use crate::{
    validator::auth_type::*, validator::cert_path::*, validator::path_results::*,
    validator::path_settings::*, validator::path_validator::*, validator::pdv_certificate::*,
    validator::pdv_extension::*, validator::pdv_trust_anchor::*,
};
