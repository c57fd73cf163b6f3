use std::sync::Arc;

use certpip::*;

const TOI: u64 = 1_700_000_000;

fn chain_subject(file: &str) -> Subject {
    let pem = std::fs::read_to_string(format!("tests/examples/{}", file)).unwrap();
    let mut subject = Subject::new();
    subject.add_attributes(vec![Attribute::with_values(
        GRID_CERT_CHAIN_ATTRIBUTE_ID,
        [pem],
    )]);
    subject
}

fn make_request(files: &[&str]) -> Request {
    let mut request = Request::default();
    for f in files {
        request.subjects.push(chain_subject(f));
    }
    request
}

fn settings() -> PipSettings {
    let mut ps = PipSettings::default();
    ps.set_trust_anchor_folder("tests/examples/trust".to_string());
    ps.set_ac_trust_folder("tests/examples/ac_trust".to_string());
    ps.set_time_of_interest(TimeOfInterest::from_unix_secs(TOI));
    ps
}

fn grid_pip(ps: &PipSettings) -> X509Pip<GridProfile> {
    X509Pip::from_settings(ps, GridProfile::from_settings(ps)).unwrap()
}

fn values<'a>(subject: &'a Subject, id: &str) -> Vec<&'a str> {
    subject
        .get_attributes(id)
        .iter()
        .flat_map(|a| a.values.iter().map(|v| v.as_str()))
        .collect()
}

#[test]
fn grid_attributes_without_ac() {
    let pip = grid_pip(&settings());
    let mut request = make_request(&["chain_proxy.pem"]);
    assert!(pip.populate_request(&mut request).unwrap());

    let subject = &request.subjects[0];
    assert_eq!(
        vec!["CN=Alice Example,O=Example Grid,C=US"],
        values(subject, GRID_SUBJECT_X509_ID)
    );
    assert_eq!(
        vec!["CN=Example Grid Root CA,O=Example Grid,C=US"],
        values(subject, GRID_SUBJECT_X509_ISSUER)
    );
    assert!(values(subject, GRID_VO).is_empty());
    assert!(values(subject, GRID_VOMS_FQAN).is_empty());
}

#[test]
fn grid_attributes_with_ac() {
    let pip = grid_pip(&settings());
    let mut request = make_request(&["chain_proxy_ac.pem"]);
    assert!(pip.populate_request(&mut request).unwrap());

    let subject = &request.subjects[0];
    assert_eq!(vec!["testvo"], values(subject, GRID_VO));
    assert_eq!(
        vec!["/testvo/Role=NULL/Capability=NULL"],
        values(subject, GRID_VOMS_PRIMARY_FQAN)
    );
    assert_eq!(
        vec![
            "/testvo/Role=NULL/Capability=NULL",
            "/testvo/analysis/Role=NULL/Capability=NULL"
        ],
        values(subject, GRID_VOMS_FQAN)
    );
}

#[test]
fn ac_support_disabled() {
    let mut ps = settings();
    ps.0.remove(PS_AC_TRUST_FOLDER);
    let pip = grid_pip(&ps);
    assert!(!pip.ac_support().is_enabled());

    let mut request = make_request(&["chain_proxy_ac.pem"]);
    assert!(pip.populate_request(&mut request).unwrap());
    assert!(values(&request.subjects[0], GRID_VO).is_empty());
}

#[test]
fn unusable_acs_are_ignored() {
    let pip = grid_pip(&settings());
    for f in ["chain_proxy_foreign_ac.pem", "chain_proxy_forged_ac.pem"] {
        let mut request = make_request(&[f]);
        assert!(pip.populate_request(&mut request).unwrap(), "{}", f);
        assert!(values(&request.subjects[0], GRID_VO).is_empty(), "{}", f);
        assert_eq!(1, values(&request.subjects[0], GRID_SUBJECT_X509_ID).len());
    }
}

#[test]
fn multiple_acs_are_rejected() {
    let pip = grid_pip(&settings());
    let mut request = make_request(&["chain_proxy_two_acs.pem"]);
    assert_eq!(
        Some(Error::MultipleAc(
            "CN=2222,CN=Alice Example,O=Example Grid,C=US".to_string()
        )),
        pip.populate_request(&mut request).err()
    );
    assert!(request.subjects[0].get_attributes(GRID_VO).is_empty());
}

#[test]
fn first_productive_subject_wins() {
    let pip = grid_pip(&settings());
    let mut request = make_request(&["chain_v1.pem", "chain_bob_proxy.pem", "chain_proxy.pem"]);
    assert!(pip.populate_request(&mut request).unwrap());
    assert!(values(&request.subjects[0], GRID_SUBJECT_X509_ID).is_empty());
    assert_eq!(
        vec!["CN=Bob Example,O=Example Grid,C=US"],
        values(&request.subjects[1], GRID_SUBJECT_X509_ID)
    );
    assert!(values(&request.subjects[2], GRID_SUBJECT_X509_ID).is_empty());
}

#[test]
fn validation_failures() {
    let pip = grid_pip(&settings());

    let mut request = make_request(&["chain_expired.pem", "chain_proxy.pem"]);
    assert_eq!(
        Some(Error::Validation(
            "CN=Carol Example,O=Example Grid,C=US".to_string()
        )),
        pip.populate_request(&mut request).err()
    );

    pip.set_perform_pkix_validation(false);
    let mut request = make_request(&["chain_mallory.pem"]);
    assert!(pip.populate_request(&mut request).unwrap());
    assert_eq!(
        vec!["CN=Rogue Root CA,O=Example Grid,C=US"],
        values(&request.subjects[0], GRID_SUBJECT_X509_ISSUER)
    );
}

#[test]
fn sha1_signatures_setting() {
    let mut request = make_request(&["chain_sha1.pem"]);
    assert_eq!(
        Some(Error::Validation(
            "CN=Frank Example,O=Example Grid,C=US".to_string()
        )),
        grid_pip(&settings()).populate_request(&mut request).err()
    );

    let mut ps = settings();
    ps.set_allow_sha1_signatures(true);
    let mut request = make_request(&["chain_sha1.pem"]);
    assert!(grid_pip(&ps).populate_request(&mut request).unwrap());
    assert_eq!(
        vec!["CN=Frank Example,O=Example Grid,C=US"],
        values(&request.subjects[0], GRID_SUBJECT_X509_ID)
    );
}

#[test]
fn require_proxy() {
    let mut ps = settings();
    ps.set_require_proxy(true);
    let pip = grid_pip(&ps);

    let mut request = make_request(&["chain_alice.pem"]);
    assert_eq!(
        Some(Error::NoValidSubject),
        pip.populate_request(&mut request).err()
    );

    let mut request = make_request(&["chain_alice.pem", "chain_proxy.pem"]);
    assert!(pip.populate_request(&mut request).unwrap());
    assert!(request.subjects[0].get_attributes(GRID_SUBJECT_X509_ID).is_empty());
}

#[test]
fn profile_id_scoping() {
    let mut ps = settings();
    ps.set_profile_id("http://example.org/grid-profile".to_string());
    let pip = grid_pip(&ps);

    let mut req = make_request(&["chain_proxy.pem"]);
    let untouched = req.clone();
    assert!(!pip.populate_request(&mut req).unwrap());
    assert_eq!(untouched, req);

    req.environment.push(Attribute::with_values(
        GRID_PROFILE_ID,
        ["http://example.org/grid-profile"],
    ));
    assert!(pip.populate_request(&mut req).unwrap());
}

#[test]
fn configuration_errors() {
    assert!(matches!(
        X509Pip::from_settings(&PipSettings::default(), GridProfile::new()),
        Err(Error::Configuration(_))
    ));

    let mut ps = settings();
    ps.set_trust_anchor_folder("tests/examples/ac_trust/voms.pem".to_string());
    assert!(X509Pip::from_settings(&ps, GridProfile::new()).is_err());

    assert!(matches!(
        X509Pip::new(
            "grid",
            GridProfile::new(),
            Arc::new(TrustMaterial::new()),
            AcSupport::Disabled,
            false
        ),
        Err(Error::Configuration(_))
    ));
}

#[test]
fn shared_across_threads() {
    let pip = Arc::new(grid_pip(&settings()));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pip = Arc::clone(&pip);
            std::thread::spawn(move || {
                let mut request = make_request(&["chain_proxy_ac.pem"]);
                pip.populate_request(&mut request).unwrap()
            })
        })
        .collect();
    for h in handles {
        assert!(h.join().unwrap());
    }
}
