//! Callback switchboard to support certificate chain extraction and validation

pub mod pip_environment;
pub mod pip_environment_traits;

pub use crate::{environment::pip_environment::*, environment::pip_environment_traits::*};
