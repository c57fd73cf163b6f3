//! PipEnvironment aggregates a set of function pointers that supply the functionality used when
//! extracting certificate chains from request attributes, validating them and deriving attributes
//! from the attribute certificates they carry.
//!
//! The sample below illustrates preparation of a PipEnvironment object.
//! ```
//! use certpip::*;
//!
//! let mut pe = PipEnvironment::default();
//!
//! // add PEM decoding, proxy detection, hashing, signature verification and chain validation
//! populate_default_pip_environment(&mut pe);
//!
//! let chain = pe
//!     .decode_certificate_chain(&pe, include_bytes!("../../tests/examples/chain_proxy.pem"))
//!     .unwrap();
//! assert_eq!(2, chain.len());
//! assert!(pe.is_proxy(&pe, &chain[0]));
//! assert_eq!(1, pe.find_client_cert(&pe, &chain).unwrap());
//! ```
//!
//! The aggregation of function pointers allows implementations of features to vary. For example, a
//! deployment may recognize additional proxy certificate profiles by adding an [`IsProxy`] callback
//! without altering chain extraction.

use alloc::{vec, vec::Vec};

use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::{
    environment::pip_environment_traits::*, util::crypto::*, util::error::*,
    util::pdv_utilities::*, util::pem_reader::decode_pem_certificate_chain, validate_chain_rfc5280,
    validate_voms_attribute_certificates, PDVCertificate, TimeOfInterest, TrustMaterial,
    VomsAttributeCertificate,
};

/// [`PipEnvironment`] provides a switchboard of callback functions that allow support to vary on
/// different platforms or to allow support to be tailored for specific use cases.
#[derive(Clone, Default)]
pub struct PipEnvironment {
    //--------------------------------------------------------------------------
    //Crypto interfaces
    //--------------------------------------------------------------------------
    /// List of functions that provide a message digest functionality
    calculate_hash_callbacks: Vec<CalculateHash>,

    /// List of functions that provide a signature verification functionality given a message
    verify_signature_message_callbacks: Vec<VerifySignatureMessage>,

    //--------------------------------------------------------------------------
    //Chain processing interfaces
    //--------------------------------------------------------------------------
    /// List of functions that decode certificate chains
    decode_certificate_chain_callbacks: Vec<DecodeCertificateChain>,

    /// List of functions that locate the end entity certificate in a chain
    find_client_cert_callbacks: Vec<FindClientCert>,

    /// List of functions that recognize proxy certificates
    is_proxy_callbacks: Vec<IsProxy>,

    /// List of functions that provide chain validation functionality
    validate_chain_callbacks: Vec<ValidateChain>,

    /// List of functions that validate attribute certificates carried in a chain
    validate_attribute_certificates_callbacks: Vec<ValidateAttributeCertificates>,
}

impl PipEnvironment {
    /// PipEnvironment::new returns a new [`PipEnvironment`] populated with the default callbacks
    /// added by [`populate_default_pip_environment`].
    pub fn new() -> PipEnvironment {
        let mut pe = PipEnvironment::default();
        populate_default_pip_environment(&mut pe);
        pe
    }

    /// clear_all_callbacks clears the contents of all function pointer vectors associated with an
    /// instance of [`PipEnvironment`].
    pub fn clear_all_callbacks(&mut self) {
        self.clear_calculate_hash_callbacks();
        self.clear_verify_signature_message_callbacks();
        self.clear_decode_certificate_chain_callbacks();
        self.clear_find_client_cert_callbacks();
        self.clear_is_proxy_callbacks();
        self.clear_validate_chain_callbacks();
        self.clear_validate_attribute_certificates_callbacks();
    }

    /// add_calculate_hash_callback adds a [`CalculateHash`] callback to the list used by calculate_hash.
    pub fn add_calculate_hash_callback(&mut self, c: CalculateHash) {
        self.calculate_hash_callbacks.push(c);
    }

    /// clear_calculate_hash_callbacks clears the list of [`CalculateHash`] callbacks used by calculate_hash.
    pub fn clear_calculate_hash_callbacks(&mut self) {
        self.calculate_hash_callbacks.clear();
    }

    /// calculate_hash iterates over calculate_hash_callbacks until an authoritative answer is found
    /// or all options have been exhausted
    pub fn calculate_hash(
        &self,
        pe: &PipEnvironment,
        hash_alg: &AlgorithmIdentifierOwned,
        buffer_to_hash: &[u8],
    ) -> Result<Vec<u8>> {
        for f in &self.calculate_hash_callbacks {
            if let Ok(r) = f(pe, hash_alg, buffer_to_hash) {
                return Ok(r);
            }
        }
        Err(Error::Unrecognized)
    }

    /// add_verify_signature_message_callback adds a [`VerifySignatureMessage`] callback to the list used by verify_signature_message.
    pub fn add_verify_signature_message_callback(&mut self, c: VerifySignatureMessage) {
        self.verify_signature_message_callbacks.push(c);
    }

    /// clear_verify_signature_message_callbacks clears the list of [`VerifySignatureMessage`] callbacks used by verify_signature_message.
    pub fn clear_verify_signature_message_callbacks(&mut self) {
        self.verify_signature_message_callbacks.clear();
    }

    /// verify_signature_message iterates over verify_signature_message_callbacks until an
    /// authoritative answer is found or all options have been exhausted. The error returned by the
    /// last callback is returned when no callback verifies the signature.
    pub fn verify_signature_message(
        &self,
        pe: &PipEnvironment,
        message_to_verify: &[u8],                 // buffer to verify
        signature: &[u8],                         // signature
        signature_alg: &AlgorithmIdentifierOwned, // signature algorithm
        spki: &SubjectPublicKeyInfoOwned,         // public key
    ) -> Result<()> {
        let mut err = None;
        for f in &self.verify_signature_message_callbacks {
            match f(pe, message_to_verify, signature, signature_alg, spki) {
                Ok(r) => return Ok(r),
                Err(e) => err = Some(e),
            }
        }
        Err(err.unwrap_or(Error::Unrecognized))
    }

    /// add_decode_certificate_chain_callback adds a [`DecodeCertificateChain`] callback to the list used by decode_certificate_chain.
    pub fn add_decode_certificate_chain_callback(&mut self, c: DecodeCertificateChain) {
        self.decode_certificate_chain_callbacks.push(c);
    }

    /// clear_decode_certificate_chain_callbacks clears the list of [`DecodeCertificateChain`] callbacks used by decode_certificate_chain.
    pub fn clear_decode_certificate_chain_callbacks(&mut self) {
        self.decode_certificate_chain_callbacks.clear();
    }

    /// decode_certificate_chain iterates over decode_certificate_chain_callbacks until a chain is
    /// decoded or all options have been exhausted, in which case the last error is returned.
    pub fn decode_certificate_chain(
        &self,
        pe: &PipEnvironment,
        encoded_chain: &[u8],
    ) -> Result<Vec<PDVCertificate>> {
        let mut err = None;
        for f in &self.decode_certificate_chain_callbacks {
            match f(pe, encoded_chain) {
                Ok(r) => return Ok(r),
                Err(e) => err = Some(e),
            }
        }
        Err(err.unwrap_or(Error::Unrecognized))
    }

    /// add_find_client_cert_callback adds a [`FindClientCert`] callback to the list used by find_client_cert.
    pub fn add_find_client_cert_callback(&mut self, c: FindClientCert) {
        self.find_client_cert_callbacks.push(c);
    }

    /// clear_find_client_cert_callbacks clears the list of [`FindClientCert`] callbacks used by find_client_cert.
    pub fn clear_find_client_cert_callbacks(&mut self) {
        self.find_client_cert_callbacks.clear();
    }

    /// find_client_cert iterates over find_client_cert_callbacks until an end entity certificate is
    /// located or all options have been exhausted
    pub fn find_client_cert(&self, pe: &PipEnvironment, chain: &[PDVCertificate]) -> Result<usize> {
        let mut err = None;
        for f in &self.find_client_cert_callbacks {
            match f(pe, chain) {
                Ok(r) => return Ok(r),
                Err(e) => err = Some(e),
            }
        }
        Err(err.unwrap_or(Error::Unrecognized))
    }

    /// add_is_proxy_callback adds an [`IsProxy`] callback to the list used by is_proxy.
    pub fn add_is_proxy_callback(&mut self, c: IsProxy) {
        self.is_proxy_callbacks.push(c);
    }

    /// clear_is_proxy_callbacks clears the list of [`IsProxy`] callbacks used by is_proxy.
    pub fn clear_is_proxy_callbacks(&mut self) {
        self.is_proxy_callbacks.clear();
    }

    /// is_proxy returns true if any is_proxy_callbacks entry recognizes `cert` as a proxy certificate
    pub fn is_proxy(&self, pe: &PipEnvironment, cert: &PDVCertificate) -> bool {
        self.is_proxy_callbacks.iter().any(|f| f(pe, cert))
    }

    /// add_validate_chain_callback adds a [`ValidateChain`] callback to the list used by validate_chain.
    pub fn add_validate_chain_callback(&mut self, c: ValidateChain) {
        self.validate_chain_callbacks.push(c);
    }

    /// clear_validate_chain_callbacks clears the list of [`ValidateChain`] callbacks used by validate_chain.
    pub fn clear_validate_chain_callbacks(&mut self) {
        self.validate_chain_callbacks.clear();
    }

    /// validate_chain iterates over validate_chain_callbacks until an authoritative answer is found
    /// or all options have been exhausted
    pub fn validate_chain(
        &self,
        pe: &PipEnvironment,
        trust: &TrustMaterial,
        chain: &[PDVCertificate],
        toi: TimeOfInterest,
    ) -> Result<()> {
        let mut err = None;
        for f in &self.validate_chain_callbacks {
            match f(pe, trust, chain, toi) {
                Ok(r) => return Ok(r),
                Err(e) => err = Some(e),
            }
        }
        Err(err.unwrap_or(Error::Unrecognized))
    }

    /// add_validate_attribute_certificates_callback adds a [`ValidateAttributeCertificates`] callback to the list used by validate_attribute_certificates.
    pub fn add_validate_attribute_certificates_callback(&mut self, c: ValidateAttributeCertificates) {
        self.validate_attribute_certificates_callbacks.push(c);
    }

    /// clear_validate_attribute_certificates_callbacks clears the list of [`ValidateAttributeCertificates`] callbacks used by validate_attribute_certificates.
    pub fn clear_validate_attribute_certificates_callbacks(&mut self) {
        self.validate_attribute_certificates_callbacks.clear();
    }

    /// validate_attribute_certificates collects the attribute certificates returned by each
    /// validate_attribute_certificates_callbacks entry. Callbacks that fail contribute nothing.
    pub fn validate_attribute_certificates(
        &self,
        pe: &PipEnvironment,
        trust: &TrustMaterial,
        chain: &[PDVCertificate],
        toi: TimeOfInterest,
    ) -> Vec<VomsAttributeCertificate> {
        let mut retval = vec![];
        for f in &self.validate_attribute_certificates_callbacks {
            if let Ok(mut acs) = f(pe, trust, chain, toi) {
                retval.append(&mut acs);
            }
        }
        retval
    }
}

fn decode_pem_certificate_chain_callback(
    _pe: &PipEnvironment,
    encoded_chain: &[u8],
) -> Result<Vec<PDVCertificate>> {
    decode_pem_certificate_chain(encoded_chain)
}

/// `populate_default_pip_environment` populates a [`PipEnvironment`] object with PEM chain decoding,
/// RFC 3820 and legacy proxy recognition, end entity location, hashing and signature verification
/// from the Rust Crypto project, RFC 5280 chain validation and VOMS attribute certificate validation.
pub fn populate_default_pip_environment(pe: &mut PipEnvironment) {
    pe.add_decode_certificate_chain_callback(decode_pem_certificate_chain_callback);
    pe.add_is_proxy_callback(is_proxy_certificate);
    pe.add_find_client_cert_callback(find_client_cert_index);
    pe.add_calculate_hash_callback(calculate_hash_rust_crypto);
    pe.add_verify_signature_message_callback(verify_signature_message_rust_crypto);
    pe.add_validate_chain_callback(validate_chain_rfc5280);
    pe.add_validate_attribute_certificates_callback(validate_voms_attribute_certificates);
}

#[test]
fn pip_environment_test() {
    let mut pe = PipEnvironment::default();
    let chain = include_bytes!("../../tests/examples/chain_proxy.pem");
    assert_eq!(
        Some(Error::Unrecognized),
        pe.decode_certificate_chain(&pe, chain).err()
    );

    populate_default_pip_environment(&mut pe);
    let certs = pe.decode_certificate_chain(&pe, chain).unwrap();
    assert!(pe.is_proxy(&pe, &certs[0]));
    assert!(!pe.is_proxy(&pe, &certs[1]));
    assert_eq!(1, pe.find_client_cert(&pe, &certs).unwrap());

    pe.clear_is_proxy_callbacks();
    assert!(!pe.is_proxy(&pe, &certs[0]));

    fn everything_is_a_proxy(_pe: &PipEnvironment, _cert: &PDVCertificate) -> bool {
        true
    }
    pe.add_is_proxy_callback(everything_is_a_proxy);
    assert_eq!(
        Some(Error::EndEntityNotFound),
        pe.find_client_cert(&pe, &certs).err()
    );

    pe.clear_all_callbacks();
    assert!(pe
        .validate_attribute_certificates(&pe, &TrustMaterial::new(), &certs, TimeOfInterest::now())
        .is_empty());
}
