//! Functions related to certificate chain verification operations

use alloc::format;

use const_oid::db::rfc5912::*;
use der::{asn1::ObjectIdentifier, Decode};
use x509_cert::ext::pkix::KeyUsages;

use crate::{
    asn1::proxy_cert_info::{ID_PE_PROXY_CERT_INFO, ID_PE_PROXY_CERT_INFO_DRAFT},
    asn1::voms::ID_VOMS_AC_SEQUENCE,
    environment::pip_environment::*,
    pdv_certificate::*,
    pdv_extension::*,
    util::error::*,
    util::logging::*,
    util::pdv_utilities::*,
    CertificationPath, TimeOfInterest, TrustMaterial,
};

/// `EXTS_OF_INTEREST` provides a list of extensions that will be automatically parsed when preparing
/// a [`PDVCertificate`] instance. These extensions are used during chain extraction and validation and
/// are subsequently available via get_extension without re-parsing.
pub const EXTS_OF_INTEREST: &[ObjectIdentifier] = &[
    ID_CE_SUBJECT_KEY_IDENTIFIER,
    ID_CE_AUTHORITY_KEY_IDENTIFIER,
    ID_CE_BASIC_CONSTRAINTS,
    ID_CE_SUBJECT_ALT_NAME,
    ID_CE_EXT_KEY_USAGE,
    ID_CE_KEY_USAGE,
    ID_PE_PROXY_CERT_INFO,
    ID_PE_PROXY_CERT_INFO_DRAFT,
    ID_VOMS_AC_SEQUENCE,
];

/// `PROCESSED_EXTENSIONS` lists the extensions that may be marked critical without causing
/// [`check_critical_extensions`] to fail.
pub const PROCESSED_EXTENSIONS: &[ObjectIdentifier] = &[
    ID_CE_BASIC_CONSTRAINTS,
    ID_CE_KEY_USAGE,
    ID_CE_EXT_KEY_USAGE,
    ID_CE_SUBJECT_ALT_NAME,
    ID_CE_SUBJECT_KEY_IDENTIFIER,
    ID_CE_AUTHORITY_KEY_IDENTIFIER,
    ID_PE_PROXY_CERT_INFO,
    ID_PE_PROXY_CERT_INFO_DRAFT,
];

//-----------------------------------------------------------------------------
// Top level function for use via PipEnvironment's validate_chain member. This
// aggregates lower level checks.
//-----------------------------------------------------------------------------
/// `validate_chain_rfc5280` verifies a leaf first certificate chain against a set of trust anchors
/// per [RFC 5280 Section 6.1], extended with the proxy certificate rules of [RFC 3820 Section 4.1].
/// It is intended for use in the validate_chain field of a [`PipEnvironment`] structure.
///
/// No path building is performed. The chain is truncated at the first certificate that is itself a
/// trust anchor and the topmost remaining certificate must have been issued by a trust anchor.
///
/// [RFC 5280 Section 6.1]: <https://datatracker.ietf.org/doc/html/rfc5280.html#section-6.1>
/// [RFC 3820 Section 4.1]: <https://datatracker.ietf.org/doc/html/rfc3820.html#section-4.1>
pub fn validate_chain_rfc5280(
    pe: &PipEnvironment,
    trust: &TrustMaterial,
    chain: &[PDVCertificate],
    toi: TimeOfInterest,
) -> Result<()> {
    if chain.is_empty() {
        return Err(Error::PathValidation(
            PathValidationStatus::MissingCertificate,
        ));
    }

    let end = chain
        .iter()
        .position(|c| trust.is_trust_anchor(c))
        .unwrap_or(chain.len());
    if end == 0 {
        log_message(
            &PeLogLevels::PeInfo,
            format!("{} is a trust anchor", chain[0].subject_name()).as_str(),
        );
        return Ok(());
    }
    let chain = &chain[..end];

    let trust_anchor = find_trust_anchor(pe, trust, &chain[end - 1])?;
    let cp = CertificationPath::new(trust_anchor, chain);

    check_validity(pe, &cp, toi)?;
    check_names(pe, &cp)?;
    check_basic_constraints(pe, &cp)?;
    check_proxy_constraints(pe, &cp)?;
    check_key_usage(pe, &cp)?;
    check_critical_extensions(pe, &cp)?;
    verify_signatures(pe, &cp)?;
    log_message(
        &PeLogLevels::PeInfo,
        format!(
            "Successfully completed chain validation checks for certificate issued to {}",
            cp.target().subject_name()
        )
        .as_str(),
    );
    Ok(())
}

/// `find_trust_anchor` returns the first trust anchor whose subject matches the issuer of `cert` and
/// whose public key verifies the signature on `cert`.
pub fn find_trust_anchor<'a>(
    pe: &PipEnvironment,
    trust: &'a TrustMaterial,
    cert: &PDVCertificate,
) -> Result<&'a PDVCertificate> {
    let candidates = trust.get_anchors_by_name(&cert.decoded_cert.tbs_certificate.issuer);
    if candidates.is_empty() {
        log_error_for_ca(
            cert,
            format!("no trust anchor found for issuer {}", cert.issuer_name()).as_str(),
        );
        return Err(Error::PathValidation(
            PathValidationStatus::MissingTrustAnchor,
        ));
    }

    let defer_cert = DeferDecodeSigned::from_der(&cert.encoded_cert)?;
    for ta in candidates {
        let r = pe.verify_signature_message(
            pe,
            &defer_cert.tbs_field,
            defer_cert.signature.raw_bytes(),
            &defer_cert.signature_algorithm,
            &ta.decoded_cert.tbs_certificate.subject_public_key_info,
        );
        if r.is_ok() {
            return Ok(ta);
        }
    }

    log_error_for_ca(
        cert,
        "no trust anchor with a matching name verified the certificate signature",
    );
    Err(Error::PathValidation(
        PathValidationStatus::SignatureVerificationFailure,
    ))
}

//-----------------------------------------------------------------------------
// Functions that perform some small aspect of chain validation
//-----------------------------------------------------------------------------
/// `check_validity` evaluates each certificate in the path, including the trust anchor, against the
/// time of interest. A disabled time of interest skips the check.
pub fn check_validity(
    _pe: &PipEnvironment,
    cp: &CertificationPath<'_>,
    toi: TimeOfInterest,
) -> Result<()> {
    if toi.is_disabled() {
        log_message(
            &PeLogLevels::PeInfo,
            "check_validity invoked with no time of interest; validity check disabled",
        );
        return Ok(());
    }

    valid_at_time(&cp.trust_anchor.decoded_cert.tbs_certificate, toi, false)?;
    for cert in cp.certificates.iter() {
        valid_at_time(&cert.decoded_cert.tbs_certificate, toi, false)?;
    }
    Ok(())
}

/// `check_names` affirms the issuer name of each certificate matches the subject name of the
/// certificate that precedes it in the path.
pub fn check_names(_pe: &PipEnvironment, cp: &CertificationPath<'_>) -> Result<()> {
    for (i, cert) in cp.certificates.iter().enumerate() {
        let issuer = cp.issuer_of(i);
        if !compare_names(
            &cert.decoded_cert.tbs_certificate.issuer,
            &issuer.decoded_cert.tbs_certificate.subject,
        ) {
            log_error_for_ca(
                cert,
                format!("issuer name does not match {}", issuer.subject_name()).as_str(),
            );
            return Err(Error::PathValidation(
                PathValidationStatus::NameChainingFailure,
            ));
        }
    }
    Ok(())
}

/// `check_basic_constraints` ensures every certificate that issues a non-proxy certificate features a
/// basicConstraints extension with the cA field set to true and that the path does not violate
/// path length constraints. The initial path length constraint is taken from the trust anchor.
pub fn check_basic_constraints(pe: &PipEnvironment, cp: &CertificationPath<'_>) -> Result<()> {
    let mut path_len_constraint = match cp.trust_anchor.get_extension(&ID_CE_BASIC_CONSTRAINTS)? {
        Some(PDVExtension::BasicConstraints(bc)) => bc.path_len_constraint.unwrap_or(u8::MAX),
        _ => u8::MAX,
    };

    let count = cp.certificates.len();
    for (i, ca_cert) in cp.certificates.iter().enumerate().take(count.saturating_sub(1)) {
        // proxy issuance is governed by check_proxy_constraints
        if pe.is_proxy(pe, ca_cert) || pe.is_proxy(pe, cp.certificates[i + 1]) {
            continue;
        }

        let bc = match ca_cert.get_extension(&ID_CE_BASIC_CONSTRAINTS)? {
            Some(PDVExtension::BasicConstraints(bc)) if bc.ca => bc,
            _ => {
                log_error_for_ca(ca_cert, "issued a certificate but is not a CA");
                return Err(Error::PathValidation(
                    PathValidationStatus::InvalidBasicConstraints,
                ));
            }
        };

        // (l)  If the certificate was not self-issued, verify that
        //       max_path_length is greater than zero and decrement
        //       max_path_length by 1.
        if !is_self_issued(&ca_cert.decoded_cert) {
            if path_len_constraint == 0 {
                log_error_for_ca(ca_cert, "path length constraint violation");
                return Err(Error::PathValidation(
                    PathValidationStatus::InvalidPathLength,
                ));
            }
            path_len_constraint -= 1;
        }

        // (m)  If pathLenConstraint is present in the certificate and is
        //       less than max_path_length, set max_path_length to the value
        //       of pathLenConstraint.
        if let Some(pl) = bc.path_len_constraint {
            path_len_constraint = path_len_constraint.min(pl);
        }
    }
    Ok(())
}

/// `check_proxy_constraints` implements the proxy certificate path validation rules of RFC 3820. A
/// proxy certificate must be issued by an end entity or another proxy, its subject must be its
/// issuer's subject with one common name appended, and it may be followed by no more proxies than
/// the path length constraint in its proxyCertInfo extension permits. A proxy may not issue a
/// certificate that is not a proxy.
pub fn check_proxy_constraints(pe: &PipEnvironment, cp: &CertificationPath<'_>) -> Result<()> {
    for (i, cert) in cp.certificates.iter().enumerate() {
        let issuer = cp.issuer_of(i);
        let issuer_is_proxy = i > 0 && pe.is_proxy(pe, issuer);

        if !pe.is_proxy(pe, cert) {
            if issuer_is_proxy {
                log_error_for_ca(cert, "certificate that is not a proxy was issued by a proxy");
                return Err(Error::PathValidation(
                    PathValidationStatus::InvalidProxyCertificate,
                ));
            }
            continue;
        }

        if i == 0 || is_ca(issuer) {
            log_error_for_ca(cert, "proxy certificate was issued by a CA");
            return Err(Error::PathValidation(
                PathValidationStatus::InvalidProxyCertificate,
            ));
        }

        if !is_proxy_name(
            &cert.decoded_cert.tbs_certificate.subject,
            &issuer.decoded_cert.tbs_certificate.subject,
        ) {
            log_error_for_ca(
                cert,
                format!(
                    "proxy subject is not derived from issuer subject {}",
                    issuer.subject_name()
                )
                .as_str(),
            );
            return Err(Error::PathValidation(
                PathValidationStatus::InvalidProxyCertificate,
            ));
        }

        if let Some(limit) = proxy_path_len_constraint(cert) {
            let following = cp.certificates[i + 1..]
                .iter()
                .filter(|c| pe.is_proxy(pe, c))
                .count();
            if following as u64 > limit as u64 {
                log_error_for_ca(
                    cert,
                    format!(
                        "proxy path length constraint of {} exceeded by {} subsequent proxies",
                        limit, following
                    )
                    .as_str(),
                );
                return Err(Error::PathValidation(
                    PathValidationStatus::InvalidProxyCertificate,
                ));
            }
        }
    }
    Ok(())
}

fn proxy_path_len_constraint(cert: &PDVCertificate) -> Option<u32> {
    for oid in [ID_PE_PROXY_CERT_INFO, ID_PE_PROXY_CERT_INFO_DRAFT] {
        if let Ok(Some(PDVExtension::ProxyCertInfo(pci))) = cert.get_extension(&oid) {
            return pci.path_len_constraint;
        }
    }
    None
}

/// `check_key_usage` ensures that each CA certificate that issues a certificate asserts keyCertSign
/// when it features a key usage extension.
pub fn check_key_usage(pe: &PipEnvironment, cp: &CertificationPath<'_>) -> Result<()> {
    let count = cp.certificates.len();
    for (i, ca_cert) in cp.certificates.iter().enumerate().take(count.saturating_sub(1)) {
        if pe.is_proxy(pe, ca_cert) || pe.is_proxy(pe, cp.certificates[i + 1]) {
            continue;
        }
        // (n)  If a key usage extension is present, verify that the
        //      keyCertSign bit is set.
        if let Some(PDVExtension::KeyUsage(ku)) = ca_cert.get_extension(&ID_CE_KEY_USAGE)? {
            if !ku.0.contains(KeyUsages::KeyCertSign) {
                log_error_for_ca(ca_cert, "keyCertSign is not set in key usage extension");
                return Err(Error::PathValidation(PathValidationStatus::InvalidKeyUsage));
            }
        }
    }
    Ok(())
}

/// `check_critical_extensions` affirms all critical extensions in the certificates that comprise a
/// certification path appear in [`PROCESSED_EXTENSIONS`].
pub fn check_critical_extensions(_pe: &PipEnvironment, cp: &CertificationPath<'_>) -> Result<()> {
    for cert in cp.certificates.iter() {
        if let Some(exts) = &cert.decoded_cert.tbs_certificate.extensions {
            for ext in exts {
                if ext.critical && !PROCESSED_EXTENSIONS.contains(&ext.extn_id) {
                    log_error_for_ca(
                        cert,
                        format!("unprocessed critical extension: {}", ext.extn_id).as_str(),
                    );
                    return Err(Error::PathValidation(
                        PathValidationStatus::UnprocessedCriticalExtension,
                    ));
                }
            }
        }
    }
    Ok(())
}

/// `verify_signatures` verifies the certificate signatures of certificates found in a certification
/// path, beginning with the public key of the trust anchor.
pub fn verify_signatures(pe: &PipEnvironment, cp: &CertificationPath<'_>) -> Result<()> {
    let mut working_spki = &cp
        .trust_anchor
        .decoded_cert
        .tbs_certificate
        .subject_public_key_info;

    for cur_cert in cp.certificates.iter() {
        let defer_cert = DeferDecodeSigned::from_der(&cur_cert.encoded_cert)?;
        let r = pe.verify_signature_message(
            pe,
            &defer_cert.tbs_field,
            defer_cert.signature.raw_bytes(),
            &defer_cert.signature_algorithm,
            working_spki,
        );
        if let Err(e) = r {
            log_error_for_ca(
                cur_cert,
                format!("signature verification error: {:?}", e).as_str(),
            );
            return Err(Error::PathValidation(
                PathValidationStatus::SignatureVerificationFailure,
            ));
        }

        working_spki = &cur_cert
            .decoded_cert
            .tbs_certificate
            .subject_public_key_info;
    }
    Ok(())
}

#[test]
fn certification_path_test() {
    use crate::decode_pem_certificate_chain;

    let chain =
        decode_pem_certificate_chain(include_bytes!("../../tests/examples/chain_proxy2.pem"))
            .unwrap();
    let trust = TrustMaterial::new_from_pem(include_bytes!("../../tests/examples/root_ca.pem"));
    let ta = trust.get_trust_anchors()[0];
    let cp = CertificationPath::new(ta, &chain);
    assert_eq!(3, cp.certificates.len());
    assert_eq!(ta, cp.issuer_of(0));
    assert_eq!(&chain[2], cp.issuer_of(1));
    assert_eq!(&chain[0], cp.target());
}

#[test]
fn proxy_constraints_test() {
    use crate::decode_pem_certificate_chain;

    let pe = PipEnvironment::new();
    let trust = TrustMaterial::new_from_pem(include_bytes!("../../tests/examples/root_ca.pem"));
    let ta = trust.get_trust_anchors()[0];

    let chain =
        decode_pem_certificate_chain(include_bytes!("../../tests/examples/chain_proxy2.pem"))
            .unwrap();
    let cp = CertificationPath::new(ta, &chain);
    assert!(check_proxy_constraints(&pe, &cp).is_ok());
    assert!(check_basic_constraints(&pe, &cp).is_ok());
    assert!(check_names(&pe, &cp).is_ok());

    // a proxy presented without its end entity appears to have been issued by a CA
    let cp = CertificationPath::new(ta, &chain[..1]);
    assert_eq!(
        Err(Error::PathValidation(
            PathValidationStatus::InvalidProxyCertificate
        )),
        check_proxy_constraints(&pe, &cp)
    );
}
