use certpip::*;

const TOI: u64 = 1_700_000_000;

fn trust() -> TrustMaterial {
    TrustMaterial::new_from_folder("tests/examples/trust").unwrap()
}

fn validate(file: &str) -> Result<()> {
    let pe = PipEnvironment::new();
    let data = std::fs::read(format!("tests/examples/{}", file)).unwrap();
    let chain = decode_pem_certificate_chain(&data).unwrap();
    pe.validate_chain(&pe, &trust(), &chain, TimeOfInterest::from_unix_secs(TOI))
}

#[test]
fn valid_chains() {
    for f in [
        "chain_alice.pem",
        "chain_alice_with_root.pem",
        "chain_proxy.pem",
        "chain_proxy2.pem",
        "chain_legacy_proxy.pem",
        "chain_draft_proxy.pem",
        "chain_bob_proxy.pem",
        "chain_proxy_ac.pem",
    ] {
        assert_eq!(Ok(()), validate(f), "{}", f);
    }
}

#[test]
fn untrusted_issuer() {
    assert_eq!(
        Err(Error::PathValidation(
            PathValidationStatus::MissingTrustAnchor
        )),
        validate("chain_mallory.pem")
    );
}

#[test]
fn expired_certificate() {
    assert_eq!(
        Err(Error::PathValidation(
            PathValidationStatus::InvalidNotAfterDate
        )),
        validate("chain_expired.pem")
    );

    // the same chain validates when time checks are disabled
    let pe = PipEnvironment::new();
    let chain =
        decode_pem_certificate_chain(include_bytes!("examples/chain_expired.pem")).unwrap();
    assert!(validate_chain_rfc5280(&pe, &trust(), &chain, TimeOfInterest::disabled()).is_ok());
}

#[test]
fn rejected_chains() {
    for (f, status) in [
        (
            "chain_name_mismatch.pem",
            PathValidationStatus::NameChainingFailure,
        ),
        (
            "chain_bad_signature.pem",
            PathValidationStatus::SignatureVerificationFailure,
        ),
        (
            "chain_ee_issued.pem",
            PathValidationStatus::InvalidBasicConstraints,
        ),
        (
            "chain_path_length.pem",
            PathValidationStatus::InvalidPathLength,
        ),
        (
            "chain_ca_key_usage.pem",
            PathValidationStatus::InvalidKeyUsage,
        ),
        (
            "chain_critical_ext.pem",
            PathValidationStatus::UnprocessedCriticalExtension,
        ),
        (
            "chain_proxy_issued_non_proxy.pem",
            PathValidationStatus::InvalidProxyCertificate,
        ),
        (
            "chain_proxy_bad_name.pem",
            PathValidationStatus::InvalidProxyCertificate,
        ),
        (
            "chain_proxy_path_len.pem",
            PathValidationStatus::InvalidProxyCertificate,
        ),
    ] {
        assert_eq!(Err(Error::PathValidation(status)), validate(f), "{}", f);
    }
}

#[test]
fn proxy_path_length_constraint() {
    let pe = PipEnvironment::new();
    let chain =
        decode_pem_certificate_chain(include_bytes!("examples/chain_proxy_path_len.pem")).unwrap();
    let toi = TimeOfInterest::from_unix_secs(TOI);

    // the constrained proxy may itself be used as the end of the chain
    assert!(validate_chain_rfc5280(&pe, &trust(), &chain[1..], toi).is_ok());
    assert!(validate_chain_rfc5280(&pe, &trust(), &chain, toi).is_err());
}

#[test]
fn sha1_signatures() {
    assert_eq!(
        Err(Error::PathValidation(
            PathValidationStatus::SignatureVerificationFailure
        )),
        validate("chain_sha1.pem")
    );

    let mut pe = PipEnvironment::new();
    pe.add_verify_signature_message_callback(verify_signature_message_rust_crypto_sha1);
    let chain = decode_pem_certificate_chain(include_bytes!("examples/chain_sha1.pem")).unwrap();
    assert_eq!(
        Ok(()),
        pe.validate_chain(&pe, &trust(), &chain, TimeOfInterest::from_unix_secs(TOI))
    );

    // sha-1 support does not relax verification of other algorithms
    let chain =
        decode_pem_certificate_chain(include_bytes!("examples/chain_bad_signature.pem")).unwrap();
    assert!(pe
        .validate_chain(&pe, &trust(), &chain, TimeOfInterest::from_unix_secs(TOI))
        .is_err());
}

#[test]
fn incomplete_chain() {
    let pe = PipEnvironment::new();
    let chain = decode_pem_certificate_chain(include_bytes!("examples/chain_proxy.pem")).unwrap();
    let toi = TimeOfInterest::from_unix_secs(TOI);
    assert_eq!(
        Err(Error::PathValidation(
            PathValidationStatus::MissingTrustAnchor
        )),
        validate_chain_rfc5280(&pe, &trust(), &chain[..1], toi)
    );
    assert_eq!(
        Err(Error::PathValidation(
            PathValidationStatus::MissingCertificate
        )),
        validate_chain_rfc5280(&pe, &trust(), &[], toi)
    );
}

#[test]
fn trust_anchor_alone() {
    let pe = PipEnvironment::new();
    let chain = decode_pem_certificate_chain(include_bytes!("examples/root_ca.pem")).unwrap();
    assert!(validate_chain_rfc5280(&pe, &trust(), &chain, TimeOfInterest::from_unix_secs(TOI)).is_ok());
}

#[test]
fn rogue_root_as_trust_anchor() {
    let pe = PipEnvironment::new();
    let rogue = TrustMaterial::new_from_pem(include_bytes!("examples/rogue_root_ca.pem"));
    let chain = decode_pem_certificate_chain(include_bytes!("examples/chain_mallory.pem")).unwrap();
    let toi = TimeOfInterest::from_unix_secs(TOI);
    assert!(validate_chain_rfc5280(&pe, &rogue, &chain, toi).is_ok());

    // chains issued under the real root are not accepted by the rogue root
    let chain = decode_pem_certificate_chain(include_bytes!("examples/chain_proxy.pem")).unwrap();
    assert!(validate_chain_rfc5280(&pe, &rogue, &chain, toi).is_err());
}

#[test]
fn validation_callback_replacement() {
    fn reject_all(
        _pe: &PipEnvironment,
        _trust: &TrustMaterial,
        _chain: &[PDVCertificate],
        _toi: TimeOfInterest,
    ) -> Result<()> {
        Err(Error::PathValidation(
            PathValidationStatus::SignatureVerificationFailure,
        ))
    }

    let mut pe = PipEnvironment::new();
    pe.clear_validate_chain_callbacks();
    pe.add_validate_chain_callback(reject_all);
    let chain = decode_pem_certificate_chain(include_bytes!("examples/chain_proxy.pem")).unwrap();
    assert!(pe
        .validate_chain(&pe, &trust(), &chain, TimeOfInterest::from_unix_secs(TOI))
        .is_err());
}
