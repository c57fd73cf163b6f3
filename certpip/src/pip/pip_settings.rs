//! Structures and functions related to configuring a policy information point
//!
//! [`PipSettings`] is a string-keyed map of typed values that serializes to and from JSON. Typed
//! accessors for each `PS_*` key are generated by the `pipprocmacros` crate.
//!
//! ```
//! use certpip::*;
//!
//! let mut ps = PipSettings::default();
//! assert!(ps.get_perform_pkix_validation());
//! ps.set_require_proxy(true);
//! assert!(ps.get_require_proxy());
//! assert_eq!(None, ps.get_ac_trust_folder());
//! ```

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use std::path::Path;

use serde::{Deserialize, Serialize};

use pipprocmacros::*;

use crate::{util::error::*, TimeOfInterest, GRID_CERT_CHAIN_ATTRIBUTE_ID};

/// Small assortment of types that can be saved in a [`PipSettings`] map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipSettingTypes {
    /// Used for settings represented as a bool
    Bool(bool),
    /// Used for settings represented as a String
    String(String),
    /// Used for settings represented as a [`TimeOfInterest`]
    TimeOfInterest(TimeOfInterest),
}

/// `PipSettings` is a newtype for a `BTreeMap` that maps `PS_*` keys to typed values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipSettings(pub BTreeMap<String, PipSettingTypes>);

impl PipSettings {
    /// Creates a new empty [`PipSettings`]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Default value of the PS_PIP_ID setting
pub static PS_PIP_ID_DEFAULT: &str = "certpip";

/// PS_PIP_ID is used to retrieve a String value that identifies the policy information point in logs
pub static PS_PIP_ID: &str = "psPipId";
/// PS_REQUIRE_PROXY is used to retrieve a bool value that indicates whether certificate chains must include a proxy certificate
pub static PS_REQUIRE_PROXY: &str = "psRequireProxy";
/// PS_PERFORM_PKIX_VALIDATION is used to retrieve a bool value that indicates whether certificate chains are validated against the configured trust anchors
pub static PS_PERFORM_PKIX_VALIDATION: &str = "psPerformPkixValidation";
/// PS_TIME_OF_INTEREST is used to retrieve a [`TimeOfInterest`] used for validity checks. When absent, the current time is used for each request.
pub static PS_TIME_OF_INTEREST: &str = "psTimeOfInterest";
/// PS_TRUST_ANCHOR_FOLDER is used to retrieve a String value containing the full path of a folder with end entity trust anchors
pub static PS_TRUST_ANCHOR_FOLDER: &str = "psTrustAnchorFolder";
/// PS_AC_TRUST_FOLDER is used to retrieve a String value containing the full path of a folder with attribute authority certificates. When absent, attribute certificate support is disabled.
pub static PS_AC_TRUST_FOLDER: &str = "psAcTrustFolder";
/// PS_CERTIFICATE_ATTRIBUTE_ID is used to retrieve a String value containing the identifier of the subject attribute that carries the certificate chain
pub static PS_CERTIFICATE_ATTRIBUTE_ID: &str = "psCertificateAttributeId";
/// PS_ALLOW_SHA1_SIGNATURES is used to retrieve a bool value that indicates whether RSA with SHA-1 signatures are accepted on certificates and attribute certificates
pub static PS_ALLOW_SHA1_SIGNATURES: &str = "psAllowSha1Signatures";
/// PS_PROFILE_ID is used to retrieve a String value that requests must carry in their profile-id environment attribute
pub static PS_PROFILE_ID: &str = "psProfileId";

//-----------------------------------------------------------------------------------------------
// Getters/setters for settings
//-----------------------------------------------------------------------------------------------
pps_gets_and_sets_with_default!(PS_PIP_ID, String, PS_PIP_ID_DEFAULT.to_string());
pps_gets_and_sets_with_default!(PS_REQUIRE_PROXY, bool, false);
pps_gets_and_sets_with_default!(PS_PERFORM_PKIX_VALIDATION, bool, true);
pps_gets_and_sets!(PS_TIME_OF_INTEREST, TimeOfInterest);
pps_gets_and_sets!(PS_TRUST_ANCHOR_FOLDER, String);
pps_gets_and_sets!(PS_AC_TRUST_FOLDER, String);
pps_gets_and_sets_with_default!(
    PS_CERTIFICATE_ATTRIBUTE_ID,
    String,
    GRID_CERT_CHAIN_ATTRIBUTE_ID.to_string()
);
pps_gets_and_sets!(PS_PROFILE_ID, String);
pps_gets_and_sets_with_default!(PS_ALLOW_SHA1_SIGNATURES, bool, false);

/// `read_settings` accepts the name of a file that contains JSON data that represents
/// [`PipSettings`]. When no file name is given, default settings are returned.
pub fn read_settings(fname: &Option<String>) -> Result<PipSettings> {
    if let Some(fname) = fname {
        let p = Path::new(fname.as_str());
        if !Path::exists(p) {
            return Err(Error::Configuration(format!(
                "settings file {} does not exist",
                fname
            )));
        }
        let json = std::fs::read(p)?;
        let ps: PipSettings = serde_json::from_slice(&json)?;
        return Ok(ps);
    }
    Ok(PipSettings::new())
}

/// `write_settings` saves [`PipSettings`] as pretty-printed JSON to the named file
pub fn write_settings(fname: &str, ps: &PipSettings) -> Result<()> {
    let json = serde_json::to_vec_pretty(ps)?;
    std::fs::write(fname, json)?;
    Ok(())
}

#[test]
fn test_default_gets_ps() {
    let ps = PipSettings::default();
    assert_eq!("certpip", ps.get_pip_id());
    assert!(!ps.get_require_proxy());
    assert!(ps.get_perform_pkix_validation());
    assert_eq!(None, ps.get_time_of_interest());
    assert_eq!(None, ps.get_trust_anchor_folder());
    assert_eq!(None, ps.get_ac_trust_folder());
    assert_eq!(
        GRID_CERT_CHAIN_ATTRIBUTE_ID,
        ps.get_certificate_attribute_id()
    );
    assert_eq!(None, ps.get_profile_id());
    assert!(!ps.get_allow_sha1_signatures());
}

#[test]
fn test_sets_ps() {
    let mut ps = PipSettings::default();
    ps.set_pip_id("grid".to_string());
    ps.set_require_proxy(true);
    ps.set_perform_pkix_validation(false);
    ps.set_time_of_interest(TimeOfInterest::from_unix_secs(1_700_000_000));
    ps.set_profile_id("http://example.org/profile".to_string());
    assert_eq!("grid", ps.get_pip_id());
    assert!(ps.get_require_proxy());
    assert!(!ps.get_perform_pkix_validation());
    assert_eq!(
        Some(TimeOfInterest::from_unix_secs(1_700_000_000)),
        ps.get_time_of_interest()
    );
    assert_eq!(
        Some("http://example.org/profile".to_string()),
        ps.get_profile_id()
    );

    // a value of the wrong type reads as absent
    ps.0.insert(
        PS_REQUIRE_PROXY.to_string(),
        PipSettingTypes::String("yes".to_string()),
    );
    assert!(!ps.get_require_proxy());
}

#[test]
fn test_read_write_settings() {
    let dir = tempfile::tempdir().unwrap();
    let fname = dir.path().join("settings.json");
    let fname = fname.to_str().unwrap().to_string();

    let mut ps = PipSettings::default();
    ps.set_require_proxy(true);
    ps.set_trust_anchor_folder("/etc/grid-security/certificates".to_string());
    write_settings(&fname, &ps).unwrap();
    assert_eq!(ps, read_settings(&Some(fname)).unwrap());

    assert_eq!(PipSettings::default(), read_settings(&None).unwrap());
    assert!(read_settings(&Some("/no/such/settings.json".to_string())).is_err());
}
