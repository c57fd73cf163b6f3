//! Sources of trust anchors for certificate chain and attribute certificate validation

pub mod trust_material;

pub use crate::source::trust_material::*;
