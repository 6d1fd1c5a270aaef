//! Sources of trust anchors

pub mod ta_source;

pub use crate::source::ta_source::*;
