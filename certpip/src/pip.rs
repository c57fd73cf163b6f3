//! Policy information points that derive subject attributes from certificate chains

pub mod grid_profile;
pub mod pip_settings;
pub mod x509_pip;

pub use crate::{pip::grid_profile::*, pip::pip_settings::*, pip::x509_pip::*};
