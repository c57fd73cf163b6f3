//! Basic utility functionality supporting certificate chain processing

pub mod crypto;
pub mod error;
pub mod logging;
pub mod pdv_alg_oids;
pub mod pdv_utilities;
pub mod pem_reader;
pub mod time_of_interest;

pub use crate::{
    util::crypto::*, util::error::*, util::logging::*, util::pdv_alg_oids::*,
    util::pdv_utilities::*, util::pem_reader::*, util::time_of_interest::*,
};
