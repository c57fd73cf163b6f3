//! Certificate chain extraction, RFC 5280 chain verification and attribute certificate validation

pub mod ac_extractor;
pub mod cert_path;
pub mod chain_extractor;
pub mod path_validator;
pub mod pdv_certificate;
pub mod pdv_extension;
pub mod voms_validator;

pub use crate::{
    validator::ac_extractor::*, validator::cert_path::*, validator::chain_extractor::*,
    validator::path_validator::*, validator::pdv_certificate::*, validator::pdv_extension::*,
    validator::voms_validator::*,
};
