//! Basic utility functionality supporting certificate validation

pub mod crypto;
pub mod error;
pub mod pdv_alg_oids;
pub mod pdv_utilities;

pub use crate::{
    util::crypto::*, util::error::*, util::pdv_alg_oids::*, util::pdv_utilities::*,
};
