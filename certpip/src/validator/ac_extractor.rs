//! Enforces the rule that at most one valid attribute certificate is bound to a certificate chain

use crate::{
    environment::pip_environment::*, util::error::*, PDVCertificate, TimeOfInterest,
    TrustMaterial, VomsAttributeCertificate,
};

/// `extract_attribute_certificate` runs attribute certificate discovery and validation over `chain`
/// via the [`PipEnvironment`] and returns `None` when no valid attribute certificate is found or the
/// single valid attribute certificate when one is found.
///
/// More than one valid attribute certificate yields [`Error::MultipleAc`] naming the subject of the
/// first certificate in the chain. Ambiguous attribute provenance is never resolved by picking one.
pub fn extract_attribute_certificate(
    pe: &PipEnvironment,
    trust: &TrustMaterial,
    chain: &[PDVCertificate],
    toi: TimeOfInterest,
) -> Result<Option<VomsAttributeCertificate>> {
    let mut acs = pe.validate_attribute_certificates(pe, trust, chain, toi);
    match acs.len() {
        0 => Ok(None),
        1 => Ok(acs.pop()),
        _ => Err(Error::MultipleAc(
            chain.first().map(|c| c.subject_name()).unwrap_or_default(),
        )),
    }
}

#[test]
fn extract_attribute_certificate_test() {
    use crate::decode_pem_certificate_chain;

    let pe = PipEnvironment::new();
    let aa = TrustMaterial::new_from_pem(include_bytes!("../../tests/examples/ac_trust/voms.pem"));
    let toi = TimeOfInterest::from_unix_secs(1_700_000_000);

    let chain =
        decode_pem_certificate_chain(include_bytes!("../../tests/examples/chain_proxy.pem"))
            .unwrap();
    assert_eq!(None, extract_attribute_certificate(&pe, &aa, &chain, toi).unwrap());

    let chain =
        decode_pem_certificate_chain(include_bytes!("../../tests/examples/chain_proxy_ac.pem"))
            .unwrap();
    let first = extract_attribute_certificate(&pe, &aa, &chain, toi).unwrap();
    assert_eq!("testvo", first.as_ref().unwrap().vo);
    // repeated extraction yields the same outcome
    assert_eq!(first, extract_attribute_certificate(&pe, &aa, &chain, toi).unwrap());

    let chain = decode_pem_certificate_chain(include_bytes!(
        "../../tests/examples/chain_proxy_two_acs.pem"
    ))
    .unwrap();
    let err = extract_attribute_certificate(&pe, &aa, &chain, toi).err();
    assert_eq!(
        Some(Error::MultipleAc(
            "CN=2222,CN=Alice Example,O=Example Grid,C=US".to_string()
        )),
        err
    );
    assert_eq!(err, extract_attribute_certificate(&pe, &aa, &chain, toi).err());
}
