//! Provides implementations of crypto-related [`PipEnvironment`] interfaces using libraries from the
//! [Rust Crypto](https://github.com/RustCrypto) project for support.

use alloc::{format, vec::Vec};

use const_oid::db::rfc5912::SHA_1_WITH_RSA_ENCRYPTION;
use der::{asn1::ObjectIdentifier, Encode};
use p256::ecdsa::signature::hazmat::PrehashVerifier;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::util::error::{Error, PathValidationStatus, Result};
use crate::{
    environment::pip_environment::*, log_message, util::pdv_alg_oids::*,
    util::pdv_utilities::get_hash_alg_from_sig_alg, PeLogLevels,
};

/// get_padding_scheme takes an AlgorithmIdentifier containing a signature algorithm and returns
/// a corresponding PKCS #1 v1.5 signature scheme instance.
///
/// [`PKIXALG_SHA224_WITH_RSA_ENCRYPTION`], [`PKIXALG_SHA256_WITH_RSA_ENCRYPTION`],
/// [`PKIXALG_SHA384_WITH_RSA_ENCRYPTION`] and [`PKIXALG_SHA512_WITH_RSA_ENCRYPTION`] are supported.
pub fn get_padding_scheme(signature_alg: &AlgorithmIdentifierOwned) -> Result<Pkcs1v15Sign> {
    match signature_alg.oid {
        PKIXALG_SHA256_WITH_RSA_ENCRYPTION => Ok(Pkcs1v15Sign::new::<Sha256>()),
        PKIXALG_SHA384_WITH_RSA_ENCRYPTION => Ok(Pkcs1v15Sign::new::<Sha384>()),
        PKIXALG_SHA224_WITH_RSA_ENCRYPTION => Ok(Pkcs1v15Sign::new::<Sha224>()),
        PKIXALG_SHA512_WITH_RSA_ENCRYPTION => Ok(Pkcs1v15Sign::new::<Sha512>()),
        _ => Err(Error::Unrecognized),
    }
}

/// is_rsa returns true is the presented OID is one of the supported RSA signature algorithms
pub(crate) fn is_rsa(oid: &ObjectIdentifier) -> bool {
    *oid == PKIXALG_SHA256_WITH_RSA_ENCRYPTION
        || *oid == PKIXALG_SHA384_WITH_RSA_ENCRYPTION
        || *oid == PKIXALG_SHA224_WITH_RSA_ENCRYPTION
        || *oid == PKIXALG_SHA512_WITH_RSA_ENCRYPTION
}

/// is_ecdsa returns true is the presented OID is one of the supported ECDSA signature algorithms
pub(crate) fn is_ecdsa(oid: &ObjectIdentifier) -> bool {
    *oid == PKIXALG_ECDSA_WITH_SHA256
        || *oid == PKIXALG_ECDSA_WITH_SHA384
        || *oid == PKIXALG_ECDSA_WITH_SHA224
        || *oid == PKIXALG_ECDSA_WITH_SHA512
}

/// calculate_hash_rust_crypto implements the [`CalculateHash`](../environment/pip_environment_traits/type.CalculateHash.html)
/// interface for [`PipEnvironment`] using implementations from the Rust Crypto project.
///
/// It supports [`PKIXALG_SHA224`], [`PKIXALG_SHA256`], [`PKIXALG_SHA384`] and [`PKIXALG_SHA512`].
pub fn calculate_hash_rust_crypto(
    _pe: &PipEnvironment,
    hash_alg: &AlgorithmIdentifierOwned,
    buffer_to_hash: &[u8],
) -> Result<Vec<u8>> {
    match hash_alg.oid {
        PKIXALG_SHA224 => Ok(Sha224::digest(buffer_to_hash).to_vec()),
        PKIXALG_SHA256 => Ok(Sha256::digest(buffer_to_hash).to_vec()),
        PKIXALG_SHA384 => Ok(Sha384::digest(buffer_to_hash).to_vec()),
        PKIXALG_SHA512 => Ok(Sha512::digest(buffer_to_hash).to_vec()),
        _ => Err(Error::Unrecognized),
    }
}

fn get_named_curve_parameter(alg_id: &AlgorithmIdentifierOwned) -> Result<ObjectIdentifier> {
    if let Some(params) = &alg_id.parameters {
        if let Ok(oid) = params.decode_as::<ObjectIdentifier>() {
            return Ok(oid);
        }
    }
    Err(Error::PathValidation(PathValidationStatus::EncodingError))
}

fn signature_failure<E>(_e: E) -> Error {
    Error::PathValidation(PathValidationStatus::SignatureVerificationFailure)
}

/// verify_signature_message_rust_crypto implements the [`VerifySignatureMessage`](../environment/pip_environment_traits/type.VerifySignatureMessage.html)
/// interface for [`PipEnvironment`] using implementations from the [Rust Crypto](https://github.com/RustCrypto) project.
///
/// RSA PKCS #1 v1.5 signatures and ECDSA signatures on the P-256 and P-384 curves are supported.
pub fn verify_signature_message_rust_crypto(
    pe: &PipEnvironment,
    message_to_verify: &[u8],                 // buffer to verify
    signature: &[u8],                         // signature
    signature_alg: &AlgorithmIdentifierOwned, // signature algorithm
    spki: &SubjectPublicKeyInfoOwned,         // public key
) -> Result<()> {
    if is_rsa(&signature_alg.oid) {
        let enc_spki = spki.to_der()?;
        let rsa = RsaPublicKey::from_public_key_der(&enc_spki)
            .map_err(|_| Error::PathValidation(PathValidationStatus::EncodingError))?;
        let hash_alg = get_hash_alg_from_sig_alg(&signature_alg.oid)?;
        let hash_to_verify = calculate_hash_rust_crypto(pe, &hash_alg, message_to_verify)?;
        let ps = get_padding_scheme(signature_alg)?;
        return rsa
            .verify(ps, hash_to_verify.as_slice(), signature)
            .map_err(signature_failure);
    } else if is_ecdsa(&signature_alg.oid) {
        let named_curve = get_named_curve_parameter(&spki.algorithm)?;
        let hash_alg = get_hash_alg_from_sig_alg(&signature_alg.oid)?;
        let hash_to_verify = calculate_hash_rust_crypto(pe, &hash_alg, message_to_verify)?;
        let public_key = spki.subject_public_key.raw_bytes();

        match named_curve {
            PKIXALG_SECP256R1 => {
                let ecdsa = p256::ecdsa::VerifyingKey::from_sec1_bytes(public_key)
                    .map_err(|_| Error::PathValidation(PathValidationStatus::EncodingError))?;
                let s = p256::ecdsa::Signature::from_der(signature).map_err(signature_failure)?;
                return ecdsa
                    .verify_prehash(&hash_to_verify, &s)
                    .map_err(signature_failure);
            }
            PKIXALG_SECP384R1 => {
                let ecdsa = p384::ecdsa::VerifyingKey::from_sec1_bytes(public_key)
                    .map_err(|_| Error::PathValidation(PathValidationStatus::EncodingError))?;
                let s = p384::ecdsa::Signature::from_der(signature).map_err(signature_failure)?;
                return ecdsa
                    .verify_prehash(&hash_to_verify, &s)
                    .map_err(signature_failure);
            }
            _ => {
                log_message(
                    &PeLogLevels::PeError,
                    format!("Unrecognized or unsupported named curve: {}", named_curve).as_str(),
                );
                return Err(Error::Unrecognized);
            }
        }
    }
    log_message(
        &PeLogLevels::PeError,
        format!("Unrecognized signature algorithm: {}", signature_alg.oid).as_str(),
    );
    Err(Error::Unrecognized)
}

/// verify_signature_message_rust_crypto_sha1 implements the [`VerifySignatureMessage`](../environment/pip_environment_traits/type.VerifySignatureMessage.html)
/// interface for RSA with SHA-1 only. It is not part of the default environment and is added when
/// the `PS_ALLOW_SHA1_SIGNATURES` setting is true, in support of chains issued by older grid CAs
/// and attribute authorities.
pub fn verify_signature_message_rust_crypto_sha1(
    _pe: &PipEnvironment,
    message_to_verify: &[u8],                 // buffer to verify
    signature: &[u8],                         // signature
    signature_alg: &AlgorithmIdentifierOwned, // signature algorithm
    spki: &SubjectPublicKeyInfoOwned,         // public key
) -> Result<()> {
    if SHA_1_WITH_RSA_ENCRYPTION != signature_alg.oid {
        return Err(Error::Unrecognized);
    }

    let enc_spki = spki.to_der()?;
    let rsa = RsaPublicKey::from_public_key_der(&enc_spki).map_err(|e| {
        log_message(
            &PeLogLevels::PeError,
            format!("Failed to parse public key as an RSA public key: {e:?}").as_str(),
        );
        Error::PathValidation(PathValidationStatus::EncodingError)
    })?;

    let hash_to_verify = Sha1::digest(message_to_verify);
    rsa.verify(
        Pkcs1v15Sign::new::<Sha1>(),
        hash_to_verify.as_slice(),
        signature,
    )
    .map_err(signature_failure)
}

#[test]
fn test_calculate_hash() {
    use hex_literal::hex;
    let mut pe = PipEnvironment::default();
    pe.clear_all_callbacks();
    pe.add_calculate_hash_callback(calculate_hash_rust_crypto);

    let hash_algorithm = AlgorithmIdentifierOwned {
        oid: PKIXALG_SHA256,
        parameters: None,
    };
    let result = pe
        .calculate_hash(&pe, &hash_algorithm, "abc".as_bytes())
        .unwrap();
    assert_eq!(
        result,
        hex!("BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD")
    );
}

#[test]
fn test_verify_signature_message() {
    use crate::{decode_pem_certificate_chain, DeferDecodeSigned};
    use der::Decode;

    let mut pe = PipEnvironment::default();
    pe.clear_all_callbacks();
    pe.add_verify_signature_message_callback(verify_signature_message_rust_crypto);
    pe.add_calculate_hash_callback(calculate_hash_rust_crypto);

    // RSA signed EE followed by ECDSA signed proxy, both checked against their issuers
    let chain =
        decode_pem_certificate_chain(include_bytes!("../../tests/examples/chain_proxy2.pem"))
            .unwrap();
    for pair in chain.windows(2) {
        let defer_cert = DeferDecodeSigned::from_der(&pair[0].encoded_cert).unwrap();
        let result = pe.verify_signature_message(
            &pe,
            &defer_cert.tbs_field,
            defer_cert.signature.raw_bytes(),
            &defer_cert.signature_algorithm,
            &pair[1].decoded_cert.tbs_certificate.subject_public_key_info,
        );
        assert!(result.is_ok());
    }

    let defer_cert = DeferDecodeSigned::from_der(&chain[0].encoded_cert).unwrap();
    let result = pe.verify_signature_message(
        &pe,
        &defer_cert.tbs_field,
        defer_cert.signature.raw_bytes(),
        &defer_cert.signature_algorithm,
        &chain[0].decoded_cert.tbs_certificate.subject_public_key_info,
    );
    assert!(result.is_err());
}

#[test]
fn test_verify_signature_message_sha1() {
    use crate::{decode_pem_certificate_chain, DeferDecodeSigned};
    use der::Decode;

    let ee = decode_pem_certificate_chain(include_bytes!("../../tests/examples/chain_sha1.pem"))
        .unwrap();
    let root = decode_pem_certificate_chain(include_bytes!("../../tests/examples/root_ca.pem"))
        .unwrap();
    let spki = &root[0].decoded_cert.tbs_certificate.subject_public_key_info;
    let defer_cert = DeferDecodeSigned::from_der(&ee[0].encoded_cert).unwrap();
    assert_eq!(SHA_1_WITH_RSA_ENCRYPTION, defer_cert.signature_algorithm.oid);

    let mut pe = PipEnvironment::default();
    pe.add_calculate_hash_callback(calculate_hash_rust_crypto);
    pe.add_verify_signature_message_callback(verify_signature_message_rust_crypto);
    let verify = |pe: &PipEnvironment| {
        pe.verify_signature_message(
            pe,
            &defer_cert.tbs_field,
            defer_cert.signature.raw_bytes(),
            &defer_cert.signature_algorithm,
            spki,
        )
    };
    assert_eq!(Err(Error::Unrecognized), verify(&pe));

    pe.add_verify_signature_message_callback(verify_signature_message_rust_crypto_sha1);
    assert_eq!(Ok(()), verify(&pe));

    // wrong key
    let alice = decode_pem_certificate_chain(include_bytes!("../../tests/examples/alice.pem"))
        .unwrap();
    assert_eq!(
        Err(Error::PathValidation(
            PathValidationStatus::SignatureVerificationFailure
        )),
        verify_signature_message_rust_crypto_sha1(
            &pe,
            &defer_cert.tbs_field,
            defer_cert.signature.raw_bytes(),
            &defer_cert.signature_algorithm,
            &alice[0].decoded_cert.tbs_certificate.subject_public_key_info,
        )
    );
}
