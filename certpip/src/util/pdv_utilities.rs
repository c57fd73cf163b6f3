//! Utility functions that support certificate chain processing

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use const_oid::db::rfc4519::COMMON_NAME;
use der::asn1::{Ia5String, PrintableString, Utf8StringRef};
use der::{asn1::ObjectIdentifier, Encode, Tagged};
use log::{debug, error};
use spki::AlgorithmIdentifierOwned;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::ext::pkix::{BasicConstraints, KeyUsages};
use x509_cert::name::{Name, RdnSequence};
use x509_cert::{Certificate, TbsCertificate};

use crate::{
    asn1::proxy_cert_info::{ID_PE_PROXY_CERT_INFO, ID_PE_PROXY_CERT_INFO_DRAFT},
    environment::pip_environment::PipEnvironment,
    pdv_certificate::*,
    pdv_extension::*,
    util::error::*,
    util::pdv_alg_oids::*,
    util::time_of_interest::TimeOfInterest,
};
use const_oid::db::rfc5912::{ID_CE_BASIC_CONSTRAINTS, ID_CE_KEY_USAGE};

/// Values of the trailing CN used by legacy Globus proxy certificates
pub const LEGACY_PROXY_CNS: &[&str] = &["proxy", "limited proxy"];

/// `is_self_signed_with_buffer` returns true if the public key in the parsed certificate can be
/// used to verify the TBSCertificate field as parsed from the encoded certificate object.
pub fn is_self_signed_with_buffer(pe: &PipEnvironment, cert: &Certificate, enc_cert: &[u8]) -> bool {
    use der::Decode;
    match DeferDecodeSigned::from_der(enc_cert) {
        Ok(defer_cert) => {
            let r = pe.verify_signature_message(
                pe,
                &defer_cert.tbs_field,
                cert.signature.raw_bytes(),
                &cert.tbs_certificate.signature,
                &cert.tbs_certificate.subject_public_key_info,
            );
            r.is_ok()
        }
        Err(e) => {
            error!(
                "Failed to defer decode certificate in is_self_signed with: {}",
                e
            );
            false
        }
    }
}

/// `is_self_signed` returns true if the public key in the certificate can be used to verify the
/// signature on the certificate.
pub fn is_self_signed(pe: &PipEnvironment, cert: &PDVCertificate) -> bool {
    is_self_signed_with_buffer(pe, &cert.decoded_cert, cert.encoded_cert.as_slice())
}

/// `is_self_issued` returns true if the subject field in the certificate is the same as the issuer
/// field.
pub fn is_self_issued(cert: &Certificate) -> bool {
    compare_names(&cert.tbs_certificate.issuer, &cert.tbs_certificate.subject)
}

/// `valid_at_time` evaluates the not_before and not_after fields of the given TBSCertificate instance
/// and provides an indication of validity relative to presented time of interest.
///
/// It returns the number of seconds left to live if the certificate is valid at the given time or
/// an error indicating which field failed if the certificate is not valid. The not_before field is
/// evaluated first. A disabled time of interest always yields Ok(0).
///
/// To stifle logging output upon error, pass true for the stifle_log parameter.
pub fn valid_at_time(target: &TbsCertificate, toi: TimeOfInterest, stifle_log: bool) -> Result<u64> {
    if toi.is_disabled() {
        return Ok(0);
    }

    if toi < target.validity.not_before {
        if !stifle_log {
            log_error_for_name(
                &target.subject,
                "certificate is not yet valid, i.e., not_before is later than the configured time of interest",
            );
        }
        return Err(Error::PathValidation(
            PathValidationStatus::InvalidNotBeforeDate,
        ));
    }

    let na = target.validity.not_after.to_unix_duration().as_secs();
    if na < toi.as_unix_secs() {
        if !stifle_log {
            log_error_for_name(
                &target.subject,
                format!(
                    "certificate is expired relative to the configured time of interest: {}",
                    target.validity.not_after
                )
                .as_str(),
            );
        }
        Err(Error::PathValidation(
            PathValidationStatus::InvalidNotAfterDate,
        ))
    } else {
        Ok(na - toi.as_unix_secs())
    }
}

/// get_hash_alg_from_sig_alg takes an ObjectIdentifier that notionally contains a signature algorithm,
/// i.e., PKIXALG_SHA256_WITH_RSA_ENCRYPTION or PKIXALG_ECDSA_WITH_SHA256, and returns the indicated hash
/// algorithm.
pub fn get_hash_alg_from_sig_alg(sig_alg: &ObjectIdentifier) -> Result<AlgorithmIdentifierOwned> {
    let oid = match *sig_alg {
        PKIXALG_SHA256_WITH_RSA_ENCRYPTION | PKIXALG_ECDSA_WITH_SHA256 => PKIXALG_SHA256,
        PKIXALG_SHA384_WITH_RSA_ENCRYPTION | PKIXALG_ECDSA_WITH_SHA384 => PKIXALG_SHA384,
        PKIXALG_SHA224_WITH_RSA_ENCRYPTION | PKIXALG_ECDSA_WITH_SHA224 => PKIXALG_SHA224,
        PKIXALG_SHA512_WITH_RSA_ENCRYPTION | PKIXALG_ECDSA_WITH_SHA512 => PKIXALG_SHA512,
        _ => return Err(Error::Unrecognized),
    };
    Ok(AlgorithmIdentifierOwned {
        oid,
        parameters: None,
    })
}

pub(crate) fn log_error_for_name(name: &Name, msg: &str) {
    let name_str = name_to_string(name);
    error!(
        "Encountered error while processing certificate with subject {}: {}",
        name_str, msg
    );
}

pub(crate) fn log_error_for_ca(ca: &PDVCertificate, msg: &str) {
    log_error_for_name(&ca.decoded_cert.tbs_certificate.subject, msg);
}

/// log a message with subject name of the certificate appended
pub fn log_error_for_subject(ca: &Certificate, msg: &str) {
    log_error_for_name(&ca.tbs_certificate.subject, msg);
}

/// `name_to_string` returns a string representation of given Name value.
pub fn name_to_string(name: &Name) -> String {
    name.to_string()
}

/// get_value_from_rdn returns the value from AttributeTypeAndValue as a string for use in comparing
/// values where leading whitespace may be a factor
pub fn get_value_from_rdn(atav: &AttributeTypeAndValue) -> Result<String> {
    let val = match atav.value.tag() {
        der::Tag::PrintableString => atav
            .value
            .decode_as()
            .ok()
            .map(|s: PrintableString| s.to_string()),
        der::Tag::Utf8String => atav
            .value
            .decode_as()
            .ok()
            .map(|s: Utf8StringRef<'_>| s.to_string()),
        der::Tag::Ia5String => atav
            .value
            .decode_as()
            .ok()
            .map(|s: Ia5String| s.to_string()),
        _ => None,
    };

    if let Some(val) = val {
        return Ok(val);
    }

    let mut s = format!("{}=#", atav.oid);
    for c in atav.value.to_der()? {
        s.push_str(format!("{:02x}", c).as_str());
    }
    Ok(s)
}

fn normalize_rdn_value(val: &str) -> String {
    val.split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .to_lowercase()
}

/// [`compare_names`] compares two Name values returning true if they match and false otherwise.
///
/// Where a binary comparison fails, attribute values are compared ignoring case and collapsing
/// runs of whitespace.
pub fn compare_names(left: &Name, right: &Name) -> bool {
    // no match if not the same number of RDNs
    if left.0.len() != right.0.len() {
        return false;
    }

    for (lrdn, rrdn) in left.0.iter().zip(right.0.iter()) {
        if lrdn.0.len() != rrdn.0.len() {
            return false;
        }

        if lrdn == rrdn {
            continue;
        }

        for (l, r) in lrdn.0.iter().zip(rrdn.0.iter()) {
            if l.oid != r.oid {
                return false;
            }

            let (l_val, r_val) = match (get_value_from_rdn(l), get_value_from_rdn(r)) {
                (Ok(l), Ok(r)) => (l, r),
                _ => return false,
            };

            if normalize_rdn_value(&l_val) != normalize_rdn_value(&r_val) {
                return false;
            }
        }
    }
    true
}

/// Retrieves a string value from the last RDN element in the presented Name.
pub fn get_leaf_rdn(name: &Name) -> String {
    match name.0.last() {
        Some(rdn) => rdn.to_string(),
        None => String::new(),
    }
}

/// Returns the value of the last RDN when that RDN consists of a single common name attribute
fn get_leaf_cn(name: &Name) -> Option<String> {
    let rdn = name.0.last()?;
    if rdn.0.len() != 1 {
        return None;
    }
    let atav = rdn.0.get(0)?;
    if atav.oid != COMMON_NAME {
        return None;
    }
    get_value_from_rdn(atav).ok()
}

/// `is_proxy_name` returns true if `subject` is `issuer` with exactly one additional common name
/// RDN appended, which is the naming convention for proxy certificates.
pub fn is_proxy_name(subject: &Name, issuer: &Name) -> bool {
    if subject.0.len() != issuer.0.len() + 1 || get_leaf_cn(subject).is_none() {
        return false;
    }
    let parent = RdnSequence(subject.0[..issuer.0.len()].to_vec());
    compare_names(&parent, issuer)
}

/// `is_proxy_certificate` returns true if the certificate is an RFC 3820 proxy certificate, a
/// proxy certificate that uses the pre-RFC draft extension or a legacy Globus proxy certificate,
/// i.e., one whose subject is the issuer name plus a CN of "proxy" or "limited proxy".
pub fn is_proxy_certificate(_pe: &PipEnvironment, cert: &PDVCertificate) -> bool {
    let tbs = &cert.decoded_cert.tbs_certificate;
    if let Some(exts) = &tbs.extensions {
        if exts
            .iter()
            .any(|e| e.extn_id == ID_PE_PROXY_CERT_INFO || e.extn_id == ID_PE_PROXY_CERT_INFO_DRAFT)
        {
            return true;
        }
    }

    if let Some(cn) = get_leaf_cn(&tbs.subject) {
        if LEGACY_PROXY_CNS.contains(&cn.as_str()) && is_proxy_name(&tbs.subject, &tbs.issuer) {
            debug!(
                "Treating {} as a legacy proxy certificate",
                name_to_string(&tbs.subject)
            );
            return true;
        }
    }
    false
}

/// `is_ca` returns true if the certificate asserts cA in a basicConstraints extension
pub fn is_ca(cert: &PDVCertificate) -> bool {
    matches!(
        cert.get_extension(&ID_CE_BASIC_CONSTRAINTS),
        Ok(Some(PDVExtension::BasicConstraints(BasicConstraints { ca: true, .. })))
    )
}

/// `asserts_key_cert_sign` returns true if the certificate has no keyUsage extension or has one that
/// asserts keyCertSign
pub fn asserts_key_cert_sign(cert: &PDVCertificate) -> bool {
    match cert.get_extension(&ID_CE_KEY_USAGE) {
        Ok(Some(PDVExtension::KeyUsage(ku))) => ku.0.contains(KeyUsages::KeyCertSign),
        _ => true,
    }
}

/// `find_client_cert_index` implements the [`FindClientCert`](../environment/pip_environment_traits/type.FindClientCert.html)
/// interface. It searches from the end of the chain toward index 0 and returns the index of the
/// first certificate that is neither a CA certificate nor a proxy certificate.
pub fn find_client_cert_index(pe: &PipEnvironment, chain: &[PDVCertificate]) -> Result<usize> {
    for (i, cert) in chain.iter().enumerate().rev() {
        if !is_ca(cert) && !pe.is_proxy(pe, cert) {
            return Ok(i);
        }
    }
    Err(Error::EndEntityNotFound)
}

#[test]
fn get_hash_alg_from_sig_alg_test() {
    let ai = |oid| AlgorithmIdentifierOwned {
        oid,
        parameters: None,
    };
    assert_eq!(
        get_hash_alg_from_sig_alg(&PKIXALG_ECDSA_WITH_SHA224).unwrap(),
        ai(PKIXALG_SHA224)
    );
    assert_eq!(
        get_hash_alg_from_sig_alg(&PKIXALG_SHA256_WITH_RSA_ENCRYPTION).unwrap(),
        ai(PKIXALG_SHA256)
    );
    assert_eq!(
        get_hash_alg_from_sig_alg(&PKIXALG_ECDSA_WITH_SHA384).unwrap(),
        ai(PKIXALG_SHA384)
    );
    assert_eq!(
        get_hash_alg_from_sig_alg(&PKIXALG_SHA512_WITH_RSA_ENCRYPTION).unwrap(),
        ai(PKIXALG_SHA512)
    );
    assert!(get_hash_alg_from_sig_alg(&PKIXALG_SHA256).is_err());
}

#[test]
fn compare_names_test() {
    use core::str::FromStr;
    let l = Name::from_str("CN=Alice  Example,O=Example Grid,C=US").unwrap();
    let r = Name::from_str("CN=alice example,O=Example Grid,C=US").unwrap();
    assert!(compare_names(&l, &r));
    let r = Name::from_str("CN=Bob Example,O=Example Grid,C=US").unwrap();
    assert!(!compare_names(&l, &r));
    let r = Name::from_str("O=Example Grid,C=US").unwrap();
    assert!(!compare_names(&l, &r));
}

#[test]
fn proxy_name_test() {
    use core::str::FromStr;
    let issuer = Name::from_str("CN=Alice Example,O=Example Grid,C=US").unwrap();
    let proxy = Name::from_str("CN=12345,CN=Alice Example,O=Example Grid,C=US").unwrap();
    let other = Name::from_str("CN=12345,CN=Bob Example,O=Example Grid,C=US").unwrap();
    let two = Name::from_str("CN=1,CN=2,CN=Alice Example,O=Example Grid,C=US").unwrap();
    let ou = Name::from_str("OU=12345,CN=Alice Example,O=Example Grid,C=US").unwrap();
    assert!(is_proxy_name(&proxy, &issuer));
    assert!(!is_proxy_name(&other, &issuer));
    assert!(!is_proxy_name(&two, &issuer));
    assert!(!is_proxy_name(&ou, &issuer));
    assert_eq!("CN=12345", get_leaf_rdn(&proxy));
}
