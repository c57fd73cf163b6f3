//! Profile that derives grid authorization interoperability attributes from certificate chains
//!
//! The end entity subject and issuer names are always produced. When attribute certificate support
//! is enabled and a valid VOMS attribute certificate is bound to the chain, the VO name and FQANs
//! are produced as well.

use alloc::string::{String, ToString};
use alloc::{vec, vec::Vec};

use crate::{
    util::error::*, Attribute, PDVCertificate, PipContext, PipSettings, Request, X509PipProfile,
};

/// Subject attribute that carries the PEM-encoded certificate chain
pub static GRID_CERT_CHAIN_ATTRIBUTE_ID: &str = "http://authz-interop.org/xacml/subject/cert-chain";
/// End entity subject name
pub static GRID_SUBJECT_X509_ID: &str = "http://authz-interop.org/xacml/subject/subject-x509-id";
/// End entity issuer name
pub static GRID_SUBJECT_X509_ISSUER: &str =
    "http://authz-interop.org/xacml/subject/subject-x509-issuer";
/// VO named in the attribute certificate
pub static GRID_VO: &str = "http://authz-interop.org/xacml/subject/vo";
/// First FQAN in the attribute certificate
pub static GRID_VOMS_PRIMARY_FQAN: &str =
    "http://authz-interop.org/xacml/subject/voms-primary-fqan";
/// All FQANs in the attribute certificate
pub static GRID_VOMS_FQAN: &str = "http://authz-interop.org/xacml/subject/voms-fqan";
/// Environment attribute that names the profile a request conforms to
pub static GRID_PROFILE_ID: &str = "http://authz-interop.org/xacml/environment/profile-id";

/// [`GridProfile`] implements [`X509PipProfile`] using the authz-interop subject attributes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GridProfile {
    certificate_attribute_id: String,
    profile_id: Option<String>,
}

impl Default for GridProfile {
    fn default() -> Self {
        GridProfile {
            certificate_attribute_id: GRID_CERT_CHAIN_ATTRIBUTE_ID.to_string(),
            profile_id: None,
        }
    }
}

impl GridProfile {
    /// Creates a profile that reads chains from [`GRID_CERT_CHAIN_ATTRIBUTE_ID`] and applies to any
    /// request with at least one subject
    pub fn new() -> Self {
        GridProfile::default()
    }

    /// Reads `PS_CERTIFICATE_ATTRIBUTE_ID` and `PS_PROFILE_ID` from settings
    pub fn from_settings(settings: &PipSettings) -> Self {
        GridProfile {
            certificate_attribute_id: settings.get_certificate_attribute_id(),
            profile_id: settings.get_profile_id(),
        }
    }

    /// Restricts the profile to requests whose environment names the given profile
    pub fn with_profile_id(mut self, profile_id: &str) -> Self {
        self.profile_id = Some(profile_id.to_string());
        self
    }
}

impl X509PipProfile for GridProfile {
    fn applies_to_request(&self, request: &Request) -> bool {
        if request.subjects.is_empty() {
            return false;
        }
        match &self.profile_id {
            None => true,
            Some(profile_id) => request
                .get_environment_attributes(GRID_PROFILE_ID)
                .iter()
                .any(|a| a.values.iter().any(|v| v == profile_id)),
        }
    }

    fn certificate_attribute_id(&self) -> &str {
        &self.certificate_attribute_id
    }

    fn process_cert_chain(
        &self,
        ctx: &PipContext<'_>,
        end_entity: &PDVCertificate,
        chain: &[PDVCertificate],
    ) -> Result<Option<Vec<Attribute>>> {
        let mut attrs = vec![
            Attribute::with_values(GRID_SUBJECT_X509_ID, [end_entity.subject_name()]),
            Attribute::with_values(GRID_SUBJECT_X509_ISSUER, [end_entity.issuer_name()]),
        ];

        if ctx.ac_support_enabled() {
            if let Some(ac) = ctx.extract_attribute_certificate(chain)? {
                attrs.push(Attribute::with_values(GRID_VO, [ac.vo]));
                if let Some(primary) = ac.fqans.first() {
                    attrs.push(Attribute::with_values(
                        GRID_VOMS_PRIMARY_FQAN,
                        [primary.clone()],
                    ));
                    attrs.push(Attribute::with_values(GRID_VOMS_FQAN, ac.fqans));
                }
            }
        }
        Ok(Some(attrs))
    }
}

#[test]
fn grid_profile_applies_test() {
    use crate::Subject;

    let profile = GridProfile::new();
    let mut request = Request::default();
    assert!(!profile.applies_to_request(&request));
    request.subjects.push(Subject::new());
    assert!(profile.applies_to_request(&request));

    let profile = GridProfile::new().with_profile_id("http://example.org/grid");
    assert!(!profile.applies_to_request(&request));
    request.environment.push(Attribute::with_values(
        GRID_PROFILE_ID,
        ["http://example.org/other"],
    ));
    assert!(!profile.applies_to_request(&request));
    request.environment.push(Attribute::with_values(
        GRID_PROFILE_ID,
        ["http://example.org/grid"],
    ));
    assert!(profile.applies_to_request(&request));

    let mut ps = PipSettings::default();
    ps.set_certificate_attribute_id("chain".to_string());
    assert_eq!("chain", GridProfile::from_settings(&ps).certificate_attribute_id());
}
