//! Discovery and validation of VOMS attribute certificates carried in certificate chains
//!
//! VOMS servers issue RFC 5755 attribute certificates that clients embed in a proxy certificate
//! using the [`ID_VOMS_AC_SEQUENCE`] extension. An attribute certificate is only usable when it is
//! bound to the end entity certificate of the chain that carries it and was issued by a trusted
//! attribute authority.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::{vec, vec::Vec};

use der::{Decode, Encode};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use x509_cert::ext::pkix::name::{GeneralName, GeneralNames};
use x509_cert::name::Name;

use crate::{
    asn1::*, environment::pip_environment::*, pdv_certificate::*, pdv_extension::*,
    util::error::*, util::pdv_utilities::*, TimeOfInterest, TrustMaterial,
};

/// Attribute values read from a valid VOMS attribute certificate
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct VomsAttributeCertificate {
    /// Virtual organization name, i.e., the policy authority URI up to `://`
    pub vo: String,
    /// Policy authority URI from the FQAN attribute
    pub policy_authority: String,
    /// Fully qualified attribute names, in the order presented in the attribute certificate
    pub fqans: Vec<String>,
    /// Subject name of the attribute authority
    pub issuer: String,
    /// Serial number of the holder certificate as upper case hex
    pub holder_serial: String,
    /// Serial number of the attribute certificate as upper case hex
    pub serial: String,
    /// Start of the validity period, in seconds since the Unix epoch
    pub not_before: u64,
    /// End of the validity period, in seconds since the Unix epoch
    pub not_after: u64,
}

/// `find_attribute_certificates` returns the DER encoding of every attribute certificate carried in
/// the [`ID_VOMS_AC_SEQUENCE`] extension of any certificate in `chain`.
pub fn find_attribute_certificates(chain: &[PDVCertificate]) -> Vec<Vec<u8>> {
    let mut retval = vec![];
    for cert in chain {
        if let Ok(Some(PDVExtension::VomsAcSequences(seqs))) =
            cert.get_extension(&ID_VOMS_AC_SEQUENCE)
        {
            for ac in seqs.iter().flatten() {
                match ac.to_der() {
                    Ok(enc) => retval.push(enc),
                    Err(e) => log_error_for_ca(
                        cert,
                        format!("failed to encode attribute certificate: {}", e).as_str(),
                    ),
                }
            }
        }
    }
    retval
}

/// `validate_voms_attribute_certificates` implements the [`ValidateAttributeCertificates`](../environment/pip_environment_traits/type.ValidateAttributeCertificates.html)
/// interface. Each attribute certificate found in the chain is checked against the chain's end
/// entity certificate, the time of interest and `trust`, which contains the certificates of trusted
/// attribute authorities. Attribute certificates that fail any check are logged and omitted.
pub fn validate_voms_attribute_certificates(
    pe: &PipEnvironment,
    trust: &TrustMaterial,
    chain: &[PDVCertificate],
    toi: TimeOfInterest,
) -> Result<Vec<VomsAttributeCertificate>> {
    let encoded_acs = find_attribute_certificates(chain);
    if encoded_acs.is_empty() {
        return Ok(vec![]);
    }

    let ee_index = pe.find_client_cert(pe, chain)?;
    let end_entity = chain.get(ee_index).ok_or(Error::EndEntityNotFound)?;

    let mut retval = vec![];
    for enc_ac in encoded_acs {
        match validate_voms_attribute_certificate(pe, trust, end_entity, &enc_ac, toi) {
            Ok(ac) => {
                debug!("Accepted attribute certificate {} for VO {}", ac.serial, ac.vo);
                retval.push(ac);
            }
            Err(e) => {
                info!(
                    "Ignoring attribute certificate found in chain for {}: {}",
                    end_entity.subject_name(),
                    e
                );
            }
        }
    }
    Ok(retval)
}

/// `validate_voms_attribute_certificate` validates one DER encoded attribute certificate
/// relative to the given end entity certificate.
pub fn validate_voms_attribute_certificate(
    pe: &PipEnvironment,
    trust: &TrustMaterial,
    end_entity: &PDVCertificate,
    enc_ac: &[u8],
    toi: TimeOfInterest,
) -> Result<VomsAttributeCertificate> {
    let ac = AttributeCertificate::from_der(enc_ac)?;
    let acinfo = &ac.acinfo;

    check_holder(end_entity, &acinfo.holder)?;

    let not_before = acinfo
        .attr_cert_validity_period
        .not_before_time
        .to_unix_duration()
        .as_secs();
    let not_after = acinfo
        .attr_cert_validity_period
        .not_after_time
        .to_unix_duration()
        .as_secs();
    if !toi.is_disabled() {
        if toi.as_unix_secs() < not_before {
            return Err(Error::PathValidation(
                PathValidationStatus::InvalidNotBeforeDate,
            ));
        }
        if toi.as_unix_secs() > not_after {
            return Err(Error::PathValidation(
                PathValidationStatus::InvalidNotAfterDate,
            ));
        }
    }

    let issuer_name = match &acinfo.issuer {
        AttCertIssuer::V2Form(v2) => v2
            .issuer_name
            .as_ref()
            .and_then(first_directory_name)
            .ok_or(Error::Unrecognized)?,
        AttCertIssuer::V1Form(_) => return Err(Error::Unrecognized),
    };

    let defer_ac = DeferDecodeSigned::from_der(enc_ac)?;
    let mut status = PathValidationStatus::MissingTrustAnchor;
    let mut verified = false;
    for aa in trust.get_anchors_by_name(issuer_name) {
        if let Err(e) = valid_at_time(&aa.decoded_cert.tbs_certificate, toi, true) {
            debug!(
                "Attribute authority certificate {} is not valid at {}: {}",
                aa.subject_name(),
                toi,
                e
            );
            continue;
        }
        let r = pe.verify_signature_message(
            pe,
            &defer_ac.tbs_field,
            defer_ac.signature.raw_bytes(),
            &defer_ac.signature_algorithm,
            &aa.decoded_cert.tbs_certificate.subject_public_key_info,
        );
        if r.is_ok() {
            verified = true;
            break;
        }
        status = PathValidationStatus::SignatureVerificationFailure;
    }
    if !verified {
        return Err(Error::PathValidation(status));
    }

    let (policy_authority, fqans) = read_fqans(&acinfo.attributes)?;
    let vo = match policy_authority.find("://") {
        Some(pos) => policy_authority[..pos].to_string(),
        None => policy_authority.clone(),
    };

    Ok(VomsAttributeCertificate {
        vo,
        policy_authority,
        fqans,
        issuer: name_to_string(issuer_name),
        holder_serial: hex::encode_upper(
            end_entity
                .decoded_cert
                .tbs_certificate
                .serial_number
                .as_bytes(),
        ),
        serial: hex::encode_upper(acinfo.serial_number.as_bytes()),
        not_before,
        not_after,
    })
}

fn first_directory_name(names: &GeneralNames) -> Option<&Name> {
    names.iter().find_map(|gn| match gn {
        GeneralName::DirectoryName(name) => Some(name),
        _ => None,
    })
}

/// The holder must identify the end entity by issuer name and serial number.
fn check_holder(end_entity: &PDVCertificate, holder: &Holder) -> Result<()> {
    let tbs = &end_entity.decoded_cert.tbs_certificate;
    let base_id = holder.base_certificate_id.as_ref().ok_or(Error::Unrecognized)?;
    let issuer_matches = base_id
        .issuer
        .iter()
        .any(|gn| matches!(gn, GeneralName::DirectoryName(n) if compare_names(n, &tbs.issuer)));
    if !issuer_matches || base_id.serial != tbs.serial_number {
        debug!(
            "Attribute certificate holder does not match {} serial {}",
            name_to_string(&tbs.issuer),
            hex::encode_upper(tbs.serial_number.as_bytes())
        );
        return Err(Error::PathValidation(
            PathValidationStatus::NameChainingFailure,
        ));
    }
    Ok(())
}

/// Returns the policy authority and values of the first FQAN attribute.
fn read_fqans(attributes: &[x509_cert::attr::Attribute]) -> Result<(String, Vec<String>)> {
    let attr = attributes
        .iter()
        .find(|a| a.oid == ID_VOMS_FQAN_ATTRIBUTE)
        .ok_or(Error::Unrecognized)?;

    let mut policy_authority = String::new();
    let mut fqans = vec![];
    for v in attr.values.iter() {
        let syntax = v.decode_as::<IetfAttrSyntax>()?;
        if policy_authority.is_empty() {
            if let Some(GeneralName::UniformResourceIdentifier(uri)) = syntax
                .policy_authority
                .as_ref()
                .and_then(|gns| gns.first())
            {
                policy_authority = uri.to_string();
            }
        }
        fqans.extend(syntax.values.iter().filter_map(|v| v.as_text()));
    }
    Ok((policy_authority, fqans))
}

#[test]
fn validate_voms_attribute_certificates_test() {
    use crate::decode_pem_certificate_chain;

    let pe = PipEnvironment::new();
    let aa = TrustMaterial::new_from_pem(include_bytes!("../../tests/examples/ac_trust/voms.pem"));
    let toi = TimeOfInterest::from_unix_secs(1_700_000_000);

    let chain =
        decode_pem_certificate_chain(include_bytes!("../../tests/examples/chain_proxy_ac.pem"))
            .unwrap();
    assert_eq!(1, find_attribute_certificates(&chain).len());
    let acs = validate_voms_attribute_certificates(&pe, &aa, &chain, toi).unwrap();
    assert_eq!(1, acs.len());
    assert_eq!("testvo", acs[0].vo);
    assert_eq!("testvo://voms.example.org:15000", acs[0].policy_authority);
    assert_eq!(
        vec![
            "/testvo/Role=NULL/Capability=NULL".to_string(),
            "/testvo/analysis/Role=NULL/Capability=NULL".to_string()
        ],
        acs[0].fqans
    );
    assert_eq!("CN=voms.example.org,O=Example Grid,C=US", acs[0].issuer);
    assert_eq!("1001", acs[0].holder_serial);
    assert_eq!("3001", acs[0].serial);

    // no attribute authorities, no attribute certificates
    let acs = validate_voms_attribute_certificates(&pe, &TrustMaterial::new(), &chain, toi).unwrap();
    assert!(acs.is_empty());

    // expired relative to the time of interest
    let late = TimeOfInterest::from_unix_secs(2_600_000_000);
    assert!(validate_voms_attribute_certificates(&pe, &aa, &chain, late)
        .unwrap()
        .is_empty());

    for f in [
        include_bytes!("../../tests/examples/chain_proxy_foreign_ac.pem").as_slice(),
        include_bytes!("../../tests/examples/chain_proxy_forged_ac.pem").as_slice(),
    ] {
        let chain = decode_pem_certificate_chain(f).unwrap();
        assert_eq!(1, find_attribute_certificates(&chain).len());
        assert!(validate_voms_attribute_certificates(&pe, &aa, &chain, toi)
            .unwrap()
            .is_empty());
    }

    let chain =
        decode_pem_certificate_chain(include_bytes!("../../tests/examples/chain_proxy.pem"))
            .unwrap();
    assert!(find_attribute_certificates(&chain).is_empty());
}

#[test]
fn validate_voms_end_entity_out_of_range_test() {
    use crate::decode_pem_certificate_chain;

    fn past_the_end(_pe: &PipEnvironment, chain: &[PDVCertificate]) -> Result<usize> {
        Ok(chain.len())
    }

    let mut pe = PipEnvironment::new();
    pe.clear_find_client_cert_callbacks();
    pe.add_find_client_cert_callback(past_the_end);
    let aa = TrustMaterial::new_from_pem(include_bytes!("../../tests/examples/ac_trust/voms.pem"));
    let chain =
        decode_pem_certificate_chain(include_bytes!("../../tests/examples/chain_proxy_ac.pem"))
            .unwrap();
    assert_eq!(
        Some(Error::EndEntityNotFound),
        validate_voms_attribute_certificates(
            &pe,
            &aa,
            &chain,
            TimeOfInterest::from_unix_secs(1_700_000_000)
        )
        .err()
    );
}
