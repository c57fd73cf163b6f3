//! The pip_environment_traits module features the function signatures used by [`PipEnvironment`]
//! to provide functionality that supports extracting and validating certificate chains and
//! attribute certificates.

use alloc::vec::Vec;

use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::util::error::*;
use crate::{PDVCertificate, PipEnvironment, TimeOfInterest, TrustMaterial, VomsAttributeCertificate};

/// `DecodeCertificateChain` provides a function signature for implementations that decode a
/// certificate chain, leaf first, from the value of a request attribute.
pub type DecodeCertificateChain = fn(
    &PipEnvironment,
    &[u8], // encoded chain
) -> Result<Vec<PDVCertificate>>;

/// `FindClientCert` provides a function signature for implementations that locate the end entity
/// certificate within a decoded chain.
pub type FindClientCert = fn(&PipEnvironment, &[PDVCertificate]) -> Result<usize>;

/// `IsProxy` provides a function signature for implementations that determine whether a
/// certificate is a proxy certificate.
pub type IsProxy = fn(&PipEnvironment, &PDVCertificate) -> bool;

/// `ValidateChain` provides a function signature for implementations that verify an ordered,
/// leaf first certificate chain against a set of trust anchors.
pub type ValidateChain = fn(
    &PipEnvironment,
    &TrustMaterial,    // trust anchors
    &[PDVCertificate], // chain to verify, leaf first
    TimeOfInterest,    // validation time
) -> Result<()>;

/// `CalculateHash` provides a function signature for implementations that perform hashing
pub type CalculateHash = fn(
    &PipEnvironment,
    &AlgorithmIdentifierOwned, // hash alg
    &[u8],                     // buffer to hash
) -> Result<Vec<u8>>;

/// `VerifySignatureMessage` provides a function signature for implementations that perform signature
/// verification over a message.
pub type VerifySignatureMessage = fn(
    &PipEnvironment,
    &[u8],                      // message to hash and verify
    &[u8],                      // signature
    &AlgorithmIdentifierOwned,  // signature algorithm
    &SubjectPublicKeyInfoOwned, // public key
) -> Result<()>;

/// `ValidateAttributeCertificates` provides a function signature for implementations that locate
/// the attribute certificates carried by a validated chain and return those that verify against
/// the given attribute authority trust material.
pub type ValidateAttributeCertificates = fn(
    &PipEnvironment,
    &TrustMaterial,    // attribute authority certificates
    &[PDVCertificate], // validated chain, leaf first
    TimeOfInterest,    // validation time
) -> Result<Vec<VomsAttributeCertificate>>;
