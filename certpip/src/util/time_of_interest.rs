//! Time of interest used when checking certificate and attribute certificate validity periods

use core::{cmp::Ordering, fmt};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Time of interest for the validation of a certificate chain or attribute certificate, expressed
/// as seconds since the Unix epoch. A value of zero disables validity period checks.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeOfInterest(pub u64);

impl fmt::Display for TimeOfInterest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_disabled() {
            return write!(f, "disabled");
        }
        match der::DateTime::from_unix_duration(core::time::Duration::from_secs(self.0)) {
            Ok(dt) => dt.fmt(f),
            Err(_) => write!(f, "{}", self.0),
        }
    }
}

impl TimeOfInterest {
    /// Make [`TimeOfInterest`] where checks are disabled
    pub fn disabled() -> Self {
        TimeOfInterest(0)
    }

    /// Should time checks be disabled?
    pub fn is_disabled(&self) -> bool {
        self.0 == 0
    }

    /// Create a [`TimeOfInterest`] from Unix epoch
    pub fn from_unix_secs(v: u64) -> Self {
        Self(v)
    }

    /// Return Unix epoch (in seconds) for this value
    pub fn as_unix_secs(&self) -> u64 {
        self.0
    }

    /// Creates a [`TimeOfInterest`] for the current system time
    pub fn now() -> Self {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(n) => Self(n.as_secs()),
            Err(_) => Self::disabled(),
        }
    }
}

impl PartialEq<x509_cert::time::Time> for TimeOfInterest {
    fn eq(&self, other: &x509_cert::time::Time) -> bool {
        self.0 == other.to_unix_duration().as_secs()
    }
}

impl PartialOrd<x509_cert::time::Time> for TimeOfInterest {
    fn partial_cmp(&self, other: &x509_cert::time::Time) -> Option<Ordering> {
        self.0.partial_cmp(&other.to_unix_duration().as_secs())
    }
}

impl PartialEq<der::asn1::GeneralizedTime> for TimeOfInterest {
    fn eq(&self, other: &der::asn1::GeneralizedTime) -> bool {
        self.0 == other.to_unix_duration().as_secs()
    }
}

impl PartialOrd<der::asn1::GeneralizedTime> for TimeOfInterest {
    fn partial_cmp(&self, other: &der::asn1::GeneralizedTime) -> Option<Ordering> {
        self.0.partial_cmp(&other.to_unix_duration().as_secs())
    }
}

#[test]
fn disabled_toi_test() {
    let toi = TimeOfInterest::disabled();
    assert!(toi.is_disabled());
    assert_eq!(0, toi.as_unix_secs());
    assert_eq!("disabled", toi.to_string());

    let toi = TimeOfInterest::from_unix_secs(1_700_000_000);
    assert!(!toi.is_disabled());
    assert_eq!("2023-11-14T22:13:20Z", toi.to_string());
    let json = serde_json::to_string(&toi).unwrap();
    assert_eq!("1700000000", json);
    let back: TimeOfInterest = serde_json::from_str(&json).unwrap();
    assert_eq!(toi, back);
}
