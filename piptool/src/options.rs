//! Actions performed by piptool

use std::fs;

use log::{error, info};

use certpip::*;

use crate::args::PiptoolArgs;

/// Outcome of evaluating a request
#[derive(Debug)]
pub enum Outcome {
    /// The populated request
    Populated(Request),
    /// The policy information point did not apply to the request
    NotApplicable,
    /// Trust anchor names, one per line
    Listing(Vec<String>),
}

/// `settings_from_args` reads the settings file, if any, and applies command line overrides
pub fn settings_from_args(args: &PiptoolArgs) -> Result<PipSettings> {
    let mut ps = read_settings(&args.settings)?;
    if let Some(ta_folder) = &args.ta_folder {
        ps.set_trust_anchor_folder(ta_folder.clone());
    }
    if let Some(ac_trust_folder) = &args.ac_trust_folder {
        ps.set_ac_trust_folder(ac_trust_folder.clone());
    }
    if let Some(toi) = args.time_of_interest {
        ps.set_time_of_interest(TimeOfInterest::from_unix_secs(toi));
    }
    if args.require_proxy {
        ps.set_require_proxy(true);
    }
    if args.no_pkix {
        ps.set_perform_pkix_validation(false);
    }
    if args.allow_sha1 {
        ps.set_allow_sha1_signatures(true);
    }
    Ok(ps)
}

/// `request_from_args` reads the request named by `--request` or wraps the chain named by `--chain`
/// in a single subject request
pub fn request_from_args(args: &PiptoolArgs, ps: &PipSettings) -> Result<Request> {
    if let Some(request) = &args.request {
        let json = fs::read(request)?;
        return Ok(serde_json::from_slice(&json)?);
    }
    if let Some(chain) = &args.chain {
        let pem = fs::read_to_string(chain)?;
        let mut subject = Subject::new();
        subject.add_attributes(vec![Attribute::with_values(
            &ps.get_certificate_attribute_id(),
            [pem],
        )]);
        let mut request = Request::default();
        request.subjects.push(subject);
        if let Some(profile_id) = ps.get_profile_id() {
            request
                .environment
                .push(Attribute::with_values(GRID_PROFILE_ID, [profile_id]));
        }
        return Ok(request);
    }
    Err(Error::Configuration(
        "either a request or a chain must be provided".to_string(),
    ))
}

/// `run` performs the action indicated by the arguments
pub fn run(args: &PiptoolArgs) -> Result<Outcome> {
    let ps = settings_from_args(args)?;

    if args.list_trust_anchors {
        let folder = ps.get_trust_anchor_folder().ok_or_else(|| {
            Error::Configuration("no trust anchor folder was configured".to_string())
        })?;
        let trust = TrustMaterial::new_from_folder(&folder)?;
        trust.log_trust_anchors();
        return Ok(Outcome::Listing(
            trust
                .get_trust_anchors()
                .iter()
                .map(|ta| ta.subject_name())
                .collect(),
        ));
    }

    let pip = X509Pip::from_settings(&ps, GridProfile::from_settings(&ps))?;
    let mut request = request_from_args(args, &ps)?;
    match pip.populate_request(&mut request) {
        Ok(true) => {
            info!("{} populated request", pip.id());
            Ok(Outcome::Populated(request))
        }
        Ok(false) => Ok(Outcome::NotApplicable),
        Err(e) => {
            error!("{} failed to populate request: {}", pip.id(), e);
            Err(e)
        }
    }
}
