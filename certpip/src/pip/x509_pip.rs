//! Policy information point that derives subject attributes from X.509 certificate chains
//!
//! [`X509Pip`] drives the per-request protocol: for each subject, in order, the certificate chain
//! attribute is extracted and checked against version and proxy policy, the end entity certificate
//! is located, the chain is optionally validated against the configured trust anchors and a
//! profile-specific hook derives attributes. The first subject for which the hook yields attributes
//! receives them and no further subjects are processed.
//!
//! Profiles implement [`X509PipProfile`]. [`GridProfile`](crate::GridProfile) is provided.

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, Ordering};

use log::{debug, error, info};

use crate::{
    environment::pip_environment::*, util::crypto::verify_signature_message_rust_crypto_sha1,
    util::error::*, validator::ac_extractor::*,
    validator::chain_extractor::extract, Attribute, PDVCertificate, PipSettings, Request,
    TimeOfInterest, TrustMaterial, VomsAttributeCertificate,
};

/// Message used when a policy information point is configured without end entity trust anchors
pub static EMPTY_TRUST_MATERIAL: &str = "Policy information point trust material may not be null";

/// Attribute certificate support, enabled by supplying trust material for attribute authorities
#[derive(Clone, Debug, Default)]
pub enum AcSupport {
    /// Attribute certificates are ignored
    #[default]
    Disabled,
    /// Attribute certificates issued by the given attribute authorities are processed
    Enabled(Arc<TrustMaterial>),
}

impl AcSupport {
    /// Returns true when attribute certificate support is enabled
    pub fn is_enabled(&self) -> bool {
        matches!(self, AcSupport::Enabled(_))
    }
}

/// Immutable snapshot of the configuration that governs a single `populate_request` call
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PipCallConfig {
    /// Identifier of the subject attribute that carries the certificate chain
    pub certificate_attribute_id: String,
    /// Whether chains without a proxy certificate are set aside
    pub require_proxy: bool,
    /// Whether chains are validated against the end entity trust anchors
    pub perform_pkix_validation: bool,
    /// Time used for validity checks
    pub time_of_interest: TimeOfInterest,
}

/// Context made available to [`X509PipProfile::process_cert_chain`]
pub struct PipContext<'a> {
    /// Configuration snapshot for the current call
    pub config: &'a PipCallConfig,
    /// Callbacks used to process chains and attribute certificates
    pub pe: &'a PipEnvironment,
    ac_support: &'a AcSupport,
}

impl<'a> PipContext<'a> {
    /// Returns true when attribute certificate support is enabled
    pub fn ac_support_enabled(&self) -> bool {
        self.ac_support.is_enabled()
    }

    /// `extract_attribute_certificate` returns the single valid attribute certificate bound to the
    /// chain, if any. It returns `Ok(None)` when attribute certificate support is disabled and
    /// [`Error::MultipleAc`] when more than one valid attribute certificate is found.
    pub fn extract_attribute_certificate(
        &self,
        chain: &[PDVCertificate],
    ) -> Result<Option<VomsAttributeCertificate>> {
        match self.ac_support {
            AcSupport::Disabled => Ok(None),
            AcSupport::Enabled(trust) => {
                extract_attribute_certificate(self.pe, trust, chain, self.config.time_of_interest)
            }
        }
    }
}

/// The [`X509PipProfile`] trait supplies the parts of an [`X509Pip`] that vary by deployment.
pub trait X509PipProfile: Send + Sync {
    /// Returns false when the request is outside the scope of the profile. The request is then left
    /// untouched and `populate_request` reports not applicable.
    fn applies_to_request(&self, request: &Request) -> bool;

    /// Identifier of the subject attribute that carries the PEM-encoded certificate chain
    fn certificate_attribute_id(&self) -> &str;

    /// Derives attributes from a validated chain. `Ok(None)` or an empty vector means the subject
    /// yields nothing and the next subject is tried.
    fn process_cert_chain(
        &self,
        ctx: &PipContext<'_>,
        end_entity: &PDVCertificate,
        chain: &[PDVCertificate],
    ) -> Result<Option<Vec<Attribute>>>;
}

/// The [`PolicyInformationPoint`] trait is implemented by components that add attributes to
/// authorization requests.
pub trait PolicyInformationPoint {
    /// Identifier of the policy information point
    fn id(&self) -> &str;

    /// Adds attributes to the request. Returns `Ok(false)` when the policy information point does
    /// not apply to the request and `Ok(true)` when attributes were added.
    fn populate_request(&self, request: &mut Request) -> Result<bool>;
}

/// [`X509Pip`] is a policy information point that derives attributes from certificate chains
/// carried by request subjects.
pub struct X509Pip<P: X509PipProfile> {
    id: String,
    require_proxy: bool,
    time_of_interest: Option<TimeOfInterest>,
    trust: Arc<TrustMaterial>,
    ac_support: AcSupport,
    perform_pkix_validation: AtomicBool,
    pe: PipEnvironment,
    profile: P,
}

impl<P: X509PipProfile> X509Pip<P> {
    /// Creates a policy information point that validates chains against `trust`. The trust material
    /// must not be empty.
    pub fn new(
        id: &str,
        profile: P,
        trust: Arc<TrustMaterial>,
        ac_support: AcSupport,
        require_proxy: bool,
    ) -> Result<Self> {
        if trust.is_empty() {
            error!("{}: {}", id, EMPTY_TRUST_MATERIAL);
            return Err(Error::Configuration(EMPTY_TRUST_MATERIAL.to_string()));
        }
        Ok(X509Pip {
            id: id.to_string(),
            require_proxy,
            time_of_interest: None,
            trust,
            ac_support,
            perform_pkix_validation: AtomicBool::new(true),
            pe: PipEnvironment::new(),
            profile,
        })
    }

    /// `from_settings` creates a policy information point from [`PipSettings`]. Trust anchors are
    /// read from `PS_TRUST_ANCHOR_FOLDER` and, when `PS_AC_TRUST_FOLDER` is present, attribute
    /// authority certificates are read from it and attribute certificate support is enabled.
    pub fn from_settings(settings: &PipSettings, profile: P) -> Result<Self> {
        let ta_folder = settings.get_trust_anchor_folder().ok_or_else(|| {
            Error::Configuration("no trust anchor folder was configured".to_string())
        })?;
        let trust = TrustMaterial::new_from_folder(&ta_folder)?;
        info!("Read {} trust anchors from {}", trust.len(), ta_folder);

        let ac_support = match settings.get_ac_trust_folder() {
            Some(folder) => {
                let aa = TrustMaterial::new_from_folder(&folder)?;
                info!("Read {} attribute authorities from {}", aa.len(), folder);
                AcSupport::Enabled(Arc::new(aa))
            }
            None => AcSupport::Disabled,
        };

        let mut pip = X509Pip::new(
            &settings.get_pip_id(),
            profile,
            Arc::new(trust),
            ac_support,
            settings.get_require_proxy(),
        )?;
        pip.set_perform_pkix_validation(settings.get_perform_pkix_validation());
        if settings.get_allow_sha1_signatures() {
            info!("{}: accepting RSA with SHA-1 signatures", pip.id);
            pip.pe
                .add_verify_signature_message_callback(verify_signature_message_rust_crypto_sha1);
        }
        pip.time_of_interest = settings.get_time_of_interest();
        Ok(pip)
    }

    /// Replaces the callbacks used to process chains and attribute certificates
    pub fn with_environment(mut self, pe: PipEnvironment) -> Self {
        self.pe = pe;
        self
    }

    /// Uses a fixed time for validity checks instead of the time at which each request is processed
    pub fn with_time_of_interest(mut self, toi: TimeOfInterest) -> Self {
        self.time_of_interest = Some(toi);
        self
    }

    /// Enables or disables chain validation for subsequent calls
    pub fn set_perform_pkix_validation(&self, perform: bool) {
        self.perform_pkix_validation.store(perform, Ordering::SeqCst);
    }

    /// Returns true when chain validation is enabled
    pub fn performs_pkix_validation(&self) -> bool {
        self.perform_pkix_validation.load(Ordering::SeqCst)
    }

    /// Returns the end entity trust anchors
    pub fn trust_material(&self) -> &TrustMaterial {
        &self.trust
    }

    /// Returns the attribute certificate support mode
    pub fn ac_support(&self) -> &AcSupport {
        &self.ac_support
    }

    /// Returns the profile
    pub fn profile(&self) -> &P {
        &self.profile
    }

    /// Takes the configuration snapshot used by one `populate_request` call
    pub fn call_config(&self) -> PipCallConfig {
        PipCallConfig {
            certificate_attribute_id: self.profile.certificate_attribute_id().to_string(),
            require_proxy: self.require_proxy,
            perform_pkix_validation: self.performs_pkix_validation(),
            time_of_interest: self.time_of_interest.unwrap_or_else(TimeOfInterest::now),
        }
    }

    /// `populate_request_with_config` runs the subject iteration protocol under the given
    /// configuration snapshot.
    pub fn populate_request_with_config(
        &self,
        request: &mut Request,
        config: &PipCallConfig,
    ) -> Result<bool> {
        if !self.profile.applies_to_request(request) {
            debug!("{} does not apply to request", self.id);
            return Ok(false);
        }

        let ctx = PipContext {
            config,
            pe: &self.pe,
            ac_support: &self.ac_support,
        };

        for (i, subject) in request.subjects.iter_mut().enumerate() {
            let chain = match extract(
                &self.pe,
                subject,
                &config.certificate_attribute_id,
                config.require_proxy,
            )? {
                Some(chain) => chain,
                None => continue,
            };

            let ee_index = self.pe.find_client_cert(&self.pe, &chain)?;
            let end_entity = chain.get(ee_index).ok_or(Error::EndEntityNotFound)?;

            if config.perform_pkix_validation {
                if let Err(e) =
                    self.pe
                        .validate_chain(&self.pe, &self.trust, &chain, config.time_of_interest)
                {
                    error!(
                        "{}: certificate chain for {} failed validation: {}",
                        self.id,
                        end_entity.subject_name(),
                        e
                    );
                    return Err(Error::Validation(end_entity.subject_name()));
                }
            }

            if let Some(attrs) = self.profile.process_cert_chain(&ctx, end_entity, &chain)? {
                if !attrs.is_empty() {
                    info!(
                        "{}: added {} attributes to subject {} ({})",
                        self.id,
                        attrs.len(),
                        i,
                        end_entity.subject_name()
                    );
                    subject.add_attributes(attrs);
                    // first subject to yield attributes wins
                    return Ok(true);
                }
            }
            debug!("{}: subject {} yielded no attributes", self.id, i);
        }

        Err(Error::NoValidSubject)
    }
}

impl<P: X509PipProfile> PolicyInformationPoint for X509Pip<P> {
    fn id(&self) -> &str {
        &self.id
    }

    fn populate_request(&self, request: &mut Request) -> Result<bool> {
        let config = self.call_config();
        self.populate_request_with_config(request, &config)
    }
}

#[cfg(test)]
struct RoleProfile;

#[cfg(test)]
impl X509PipProfile for RoleProfile {
    fn applies_to_request(&self, request: &Request) -> bool {
        !request.subjects.is_empty()
    }

    fn certificate_attribute_id(&self) -> &str {
        "chain"
    }

    fn process_cert_chain(
        &self,
        _ctx: &PipContext<'_>,
        _end_entity: &PDVCertificate,
        _chain: &[PDVCertificate],
    ) -> Result<Option<Vec<Attribute>>> {
        Ok(Some(alloc::vec![Attribute::with_values("role", ["test"])]))
    }
}

#[cfg(test)]
fn chain_subject(pem: &str) -> crate::Subject {
    let mut subject = crate::Subject::new();
    subject.add_attributes(alloc::vec![Attribute::with_values("chain", [pem])]);
    subject
}

#[cfg(test)]
fn test_pip() -> X509Pip<RoleProfile> {
    let trust = TrustMaterial::new_from_pem(include_bytes!("../../tests/examples/root_ca.pem"));
    X509Pip::new("test", RoleProfile, Arc::new(trust), AcSupport::Disabled, false)
        .unwrap()
        .with_time_of_interest(TimeOfInterest::from_unix_secs(1_700_000_000))
}

#[test]
fn x509_pip_new_test() {
    let r = X509Pip::new(
        "test",
        RoleProfile,
        Arc::new(TrustMaterial::new()),
        AcSupport::Disabled,
        false,
    );
    assert_eq!(
        Some(Error::Configuration(EMPTY_TRUST_MATERIAL.to_string())),
        r.err()
    );

    let pip = test_pip();
    assert_eq!("test", pip.id());
    assert!(pip.performs_pkix_validation());
    pip.set_perform_pkix_validation(false);
    assert!(!pip.call_config().perform_pkix_validation);
    assert_eq!(
        TimeOfInterest::from_unix_secs(1_700_000_000),
        pip.call_config().time_of_interest
    );
}

#[test]
fn x509_pip_populate_request_test() {
    let proxy = include_str!("../../tests/examples/chain_proxy.pem");
    let mallory = include_str!("../../tests/examples/chain_mallory.pem");
    let pip = test_pip();

    // not applicable, request untouched
    let mut request = Request::default();
    assert!(!pip.populate_request(&mut request).unwrap());
    assert_eq!(Request::default(), request);

    // only the first productive subject receives attributes
    let mut request = Request::default();
    request.subjects.push(crate::Subject::new());
    request.subjects.push(chain_subject(proxy));
    request.subjects.push(chain_subject(proxy));
    assert!(pip.populate_request(&mut request).unwrap());
    assert!(request.subjects[0].attributes.is_empty());
    assert_eq!(1, request.subjects[1].get_attributes("role").len());
    assert!(request.subjects[2].get_attributes("role").is_empty());

    // no subject carries a chain
    let mut request = Request::default();
    request.subjects.push(crate::Subject::new());
    assert_eq!(
        Some(Error::NoValidSubject),
        pip.populate_request(&mut request).err()
    );

    // untrusted chain aborts processing
    let mut request = Request::default();
    request.subjects.push(chain_subject(mallory));
    request.subjects.push(chain_subject(proxy));
    match pip.populate_request(&mut request) {
        Err(Error::Validation(_)) => {}
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(request.subjects[1].get_attributes("role").is_empty());

    // without validation the untrusted chain yields attributes
    pip.set_perform_pkix_validation(false);
    assert!(pip.populate_request(&mut request).unwrap());
    assert_eq!(1, request.subjects[0].get_attributes("role").len());
}

#[test]
fn x509_pip_require_proxy_test() {
    let alice = include_str!("../../tests/examples/chain_alice.pem");
    let trust = TrustMaterial::new_from_pem(include_bytes!("../../tests/examples/root_ca.pem"));
    let pip = X509Pip::new("test", RoleProfile, Arc::new(trust), AcSupport::Disabled, true)
        .unwrap()
        .with_time_of_interest(TimeOfInterest::from_unix_secs(1_700_000_000));

    let mut request = Request::default();
    request.subjects.push(chain_subject(alice));
    assert_eq!(
        Some(Error::NoValidSubject),
        pip.populate_request(&mut request).err()
    );
}

#[test]
fn x509_pip_call_config_snapshot_test() {
    let mallory = include_str!("../../tests/examples/chain_mallory.pem");
    let alice = include_str!("../../tests/examples/chain_alice.pem");
    let pip = test_pip();

    // a snapshot taken before the toggle is unaffected by it
    let config = pip.call_config();
    pip.set_perform_pkix_validation(false);
    let mut request = Request::default();
    request.subjects.push(chain_subject(mallory));
    assert!(matches!(
        pip.populate_request_with_config(&mut request, &config),
        Err(Error::Validation(_))
    ));
    assert!(pip.populate_request(&mut request).unwrap());

    // single version 3 end entity certificate with validation disabled
    let mut request = Request::default();
    request.subjects.push(chain_subject(alice));
    assert!(pip.populate_request(&mut request).unwrap());
    assert_eq!(
        alloc::vec!["test".to_string()],
        request.subjects[0].get_attributes("role")[0].values
    );
}

#[test]
fn x509_pip_end_entity_out_of_range_test() {
    fn past_the_end(_pe: &PipEnvironment, chain: &[PDVCertificate]) -> Result<usize> {
        Ok(chain.len())
    }

    let mut pe = PipEnvironment::new();
    pe.clear_find_client_cert_callbacks();
    pe.add_find_client_cert_callback(past_the_end);
    let pip = test_pip().with_environment(pe);

    let mut request = Request::default();
    request
        .subjects
        .push(chain_subject(include_str!("../../tests/examples/chain_proxy.pem")));
    assert_eq!(
        Some(Error::EndEntityNotFound),
        pip.populate_request(&mut request).err()
    );
}
