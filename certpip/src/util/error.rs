//! Error types

use alloc::string::{String, ToString};
use core::fmt;

/// Result type
pub type Result<T> = core::result::Result<T, Error>;

/// Reasons a certificate chain fails verification against trust material
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum PathValidationStatus {
    /// No errors were encountered while validating the certificate chain
    Valid,
    /// NameChainingFailure occurs when the issuer name of a certificate does not match the subject
    /// name of the next certificate in the chain.
    NameChainingFailure,
    /// SignatureVerificationFailure occurs when the public key of an issuer does not verify the
    /// signature of the certificate it issued.
    SignatureVerificationFailure,
    /// InvalidNotBeforeDate occurs when a certificate contains a notBefore date that is after the
    /// time of interest.
    InvalidNotBeforeDate,
    /// InvalidNotAfterDate occurs when a certificate contains a notAfter date that is before the
    /// time of interest.
    InvalidNotAfterDate,
    /// InvalidBasicConstraints occurs when a non-proxy certificate is issued by a certificate whose
    /// basicConstraints extension is absent or has the cA field set to false.
    InvalidBasicConstraints,
    /// InvalidPathLength occurs when a pathLenConstraint asserted by a CA certificate is exceeded.
    InvalidPathLength,
    /// InvalidKeyUsage occurs when a CA certificate with a keyUsage extension lacks keyCertSign.
    InvalidKeyUsage,
    /// UnprocessedCriticalExtension occurs when a certificate features a critical extension that
    /// is not processed by the chain verifier.
    UnprocessedCriticalExtension,
    /// MissingTrustAnchor occurs when no trust anchor issued the topmost certificate in the chain.
    MissingTrustAnchor,
    /// InvalidProxyCertificate occurs when a proxy certificate is not issued by an end entity or
    /// proxy, does not carry a name derived from its issuer, issues a non-proxy certificate, or
    /// is followed by more proxies than its path length constraint permits.
    InvalidProxyCertificate,
    /// EncodingError occurs when an object cannot be parsed (though this is more likely to manifest
    /// as an Asn1Error).
    EncodingError,
    /// MissingCertificate occurs when the chain presented for verification is empty.
    MissingCertificate,
}

/// Error type
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// A subject carries the certificate chain attribute more than once, or the attribute does
    /// not carry exactly one value.
    Structural,
    /// PEM text presented as a certificate chain could not be decoded. The string carries the
    /// underlying reason.
    ChainDecode(String),
    /// PKIX validation failed for the end entity certificate with the given subject DN.
    Validation(String),
    /// More than one valid attribute certificate is bound to the chain whose first certificate has
    /// the given subject DN.
    MultipleAc(String),
    /// No subject of an applicable request yielded attributes.
    NoValidSubject,
    /// A chain contains no certificate that is neither a CA nor a proxy.
    EndEntityNotFound,
    /// PathValidationError encountered
    PathValidation(PathValidationStatus),
    /// A policy information point could not be configured. The string carries the reason.
    Configuration(String),
    /// PEM text contains no private key material.
    NoKeyMaterial,
    /// Encrypted private key material was presented without a password.
    PasswordRequired,
    /// Encrypted private key material could not be decrypted with the presented password.
    KeyDecryption,
    /// Private key material uses an algorithm, curve or cipher that is not supported.
    UnsupportedKeyAlgorithm,
    /// Unrecognized occurs when an error conditions does not match anything else here.
    Unrecognized,
    /// Asn1Error is used to propagate error information from the der crate.
    Asn1Error(der::Error),
    /// PemError is used to propagate error information from the pem-rfc7468 crate.
    PemError(pem_rfc7468::Error),
    /// StdIoError encapsulates an error derived from [std::io::Error]
    StdIoError(String),
    /// SerdeError encapsulates a JSON serialization or deserialization error
    SerdeError(String),
}

impl From<der::Error> for Error {
    fn from(err: der::Error) -> Error {
        Error::Asn1Error(err)
    }
}

impl From<pem_rfc7468::Error> for Error {
    fn from(err: pem_rfc7468::Error) -> Error {
        Error::PemError(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::StdIoError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::SerdeError(err.to_string())
    }
}

impl fmt::Display for PathValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathValidationStatus::Valid => write!(f, "Valid"),
            PathValidationStatus::NameChainingFailure => write!(f, "Name chaining failure"),
            PathValidationStatus::SignatureVerificationFailure => {
                write!(f, "Signature verification failure")
            }
            PathValidationStatus::InvalidNotBeforeDate => write!(f, "InvalidNotBeforeDate"),
            PathValidationStatus::InvalidNotAfterDate => write!(f, "InvalidNotAfterDate"),
            PathValidationStatus::InvalidBasicConstraints => write!(f, "InvalidBasicConstraints"),
            PathValidationStatus::InvalidPathLength => write!(f, "InvalidPathLength"),
            PathValidationStatus::InvalidKeyUsage => write!(f, "InvalidKeyUsage"),
            PathValidationStatus::UnprocessedCriticalExtension => {
                write!(f, "UnprocessedCriticalExtension")
            }
            PathValidationStatus::MissingTrustAnchor => write!(f, "MissingTrustAnchor"),
            PathValidationStatus::InvalidProxyCertificate => write!(f, "InvalidProxyCertificate"),
            PathValidationStatus::EncodingError => write!(f, "EncodingError"),
            PathValidationStatus::MissingCertificate => write!(f, "MissingCertificate"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Structural => write!(f, "Subject contains more than one X509 certificate chain."),
            Error::ChainDecode(reason) => {
                write!(f, "Unable to parse subject cert chain: {}", reason)
            }
            Error::Validation(dn) => {
                write!(f, "Certificate with subject DN {} failed PKIX validation", dn)
            }
            Error::MultipleAc(dn) => write!(
                f,
                "End entity certificate for subject {} contains more than one attribute certificate",
                dn
            ),
            Error::NoValidSubject => {
                write!(f, "Subject did not contain the required subject certificate")
            }
            Error::EndEntityNotFound => {
                write!(f, "Certificate chain does not contain an end entity certificate")
            }
            Error::PathValidation(err) => write!(f, "PathValidationError: {}", err),
            Error::Configuration(reason) => write!(f, "Configuration error: {}", reason),
            Error::NoKeyMaterial => write!(f, "No KeyPair or PrivateKey object found"),
            Error::PasswordRequired => write!(f, "Private key is encrypted and no password was given"),
            Error::KeyDecryption => write!(f, "Unable to decrypt private key"),
            Error::UnsupportedKeyAlgorithm => write!(f, "UnsupportedKeyAlgorithm"),
            Error::Unrecognized => write!(f, "Unrecognized"),
            Error::Asn1Error(err) => write!(f, "Asn1Error: {}", err),
            Error::PemError(err) => write!(f, "PemError: {}", err),
            Error::StdIoError(err) => write!(f, "StdError: {}", err),
            Error::SerdeError(err) => write!(f, "SerdeError: {}", err),
        }
    }
}

impl std::error::Error for Error {}

#[test]
fn error_test() {
    use alloc::format;

    let _s = format!("{}", PathValidationStatus::Valid);
    let _s = format!("{}", PathValidationStatus::NameChainingFailure);
    let _s = format!("{}", PathValidationStatus::SignatureVerificationFailure);
    let _s = format!("{}", PathValidationStatus::InvalidNotBeforeDate);
    let _s = format!("{}", PathValidationStatus::InvalidNotAfterDate);
    let _s = format!("{}", PathValidationStatus::InvalidBasicConstraints);
    let _s = format!("{}", PathValidationStatus::InvalidPathLength);
    let _s = format!("{}", PathValidationStatus::InvalidKeyUsage);
    let _s = format!("{}", PathValidationStatus::UnprocessedCriticalExtension);
    let _s = format!("{}", PathValidationStatus::MissingTrustAnchor);
    let _s = format!("{}", PathValidationStatus::InvalidProxyCertificate);
    let _s = format!("{}", PathValidationStatus::EncodingError);
    let _s = format!("{}", PathValidationStatus::MissingCertificate);

    assert_eq!(
        "Subject contains more than one X509 certificate chain.",
        format!("{}", Error::Structural)
    );
    assert_eq!(
        "Certificate with subject DN CN=Alice,O=Example,C=US failed PKIX validation",
        format!("{}", Error::Validation("CN=Alice,O=Example,C=US".to_string()))
    );
    assert!(format!("{}", Error::MultipleAc("CN=Alice".to_string())).contains("CN=Alice"));
    assert_eq!(
        "Subject did not contain the required subject certificate",
        format!("{}", Error::NoValidSubject)
    );
    assert_eq!(
        "PathValidationError: MissingTrustAnchor",
        format!(
            "{}",
            Error::PathValidation(PathValidationStatus::MissingTrustAnchor)
        )
    );
    let _s = format!("{}", Error::ChainDecode("bad base64".to_string()));
    let _s = format!("{}", Error::EndEntityNotFound);
    let _s = format!("{}", Error::Configuration("missing".to_string()));
    let _s = format!("{}", Error::NoKeyMaterial);
    let _s = format!("{}", Error::PasswordRequired);
    let _s = format!("{}", Error::KeyDecryption);
    let _s = format!("{}", Error::UnsupportedKeyAlgorithm);
    let _s = format!("{}", Error::Unrecognized);
    let _s = format!("{}", Error::PemError(pem_rfc7468::Error::Base64(base64ct::Error::InvalidEncoding)));
    let _s = format!("{}", Error::StdIoError("not found".to_string()));
    let _s = format!("{}", Error::SerdeError("eof".to_string()));
}
