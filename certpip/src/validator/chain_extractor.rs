//! Locates and decodes the certificate chain carried by a request subject and applies version and
//! proxy policy to it.
//!
//! ```
//! use certpip::*;
//!
//! let pe = PipEnvironment::new();
//! let mut subject = Subject::new();
//! let pem = include_str!("../../tests/examples/chain_proxy.pem");
//! subject.attributes.push(Attribute::with_values("cert-chain", [pem]));
//!
//! let chain = extract(&pe, &subject, "cert-chain", true).unwrap().unwrap();
//! assert_eq!(2, chain.len());
//! ```

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use log::{debug, warn};

use crate::{environment::pip_environment::*, util::error::*, PDVCertificate, Subject};

/// `CertificateChain` is an ordered, leaf first sequence of certificates
pub type CertificateChain = Vec<PDVCertificate>;

/// Minimum X.509 version accepted for every certificate in a chain
pub const MINIMUM_CERTIFICATE_VERSION: u8 = 3;

/// Reasons a decoded chain is set aside without raising an error
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PolicyRejection {
    /// The certificate at `index` has a version lower than [`MINIMUM_CERTIFICATE_VERSION`]
    VersionTooLow {
        /// Position of the certificate in the chain
        index: usize,
        /// X.509 version of the certificate
        version: u8,
        /// Subject name of the certificate
        subject: String,
    },
    /// A proxy certificate is required but the chain contains none
    ProxyRequired,
}

impl fmt::Display for PolicyRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyRejection::VersionTooLow {
                index,
                version,
                subject,
            } => write!(
                f,
                "certificate {} ({}) is version {}; only version {} certificates are accepted",
                index, subject, version, MINIMUM_CERTIFICATE_VERSION
            ),
            PolicyRejection::ProxyRequired => {
                write!(f, "proxy certificate required but none was found in the chain")
            }
        }
    }
}

/// Outcome of chain extraction for one subject
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ChainExtraction {
    /// The subject does not carry the certificate chain attribute, or its value is blank
    Absent,
    /// The subject carries a chain that does not satisfy version or proxy policy
    PolicyRejected(PolicyRejection),
    /// The subject carries a chain that satisfies policy
    Chain(CertificateChain),
}

/// `extract_chain` locates the single attribute with identifier `attribute_id` on `subject`,
/// decodes its value into a leaf first certificate chain and applies version and proxy policy.
///
/// A subject carrying the attribute more than once, or carrying it with other than exactly one
/// value, yields [`Error::Structural`]. Decoding failures are returned as errors. Policy failures
/// are not errors and are reported as [`ChainExtraction::PolicyRejected`].
pub fn extract_chain(
    pe: &PipEnvironment,
    subject: &Subject,
    attribute_id: &str,
    require_proxy: bool,
) -> Result<ChainExtraction> {
    let attrs = subject.get_attributes(attribute_id);
    let attr = match attrs.as_slice() {
        [] => return Ok(ChainExtraction::Absent),
        [attr] if attr.values.len() == 1 => attr,
        _ => return Err(Error::Structural),
    };

    let pem = attr.values[0].trim();
    if pem.is_empty() {
        return Ok(ChainExtraction::Absent);
    }

    let chain = pe.decode_certificate_chain(pe, pem.as_bytes())?;

    // the chain is rejected as a whole rather than filtered
    if let Some((index, cert)) = chain
        .iter()
        .enumerate()
        .find(|(_, c)| c.version() < MINIMUM_CERTIFICATE_VERSION)
    {
        return Ok(ChainExtraction::PolicyRejected(
            PolicyRejection::VersionTooLow {
                index,
                version: cert.version(),
                subject: cert.subject_name(),
            },
        ));
    }

    if require_proxy && !chain.iter().any(|c| pe.is_proxy(pe, c)) {
        return Ok(ChainExtraction::PolicyRejected(
            PolicyRejection::ProxyRequired,
        ));
    }

    Ok(ChainExtraction::Chain(chain))
}

/// `extract` is [`extract_chain`] with policy rejections logged and folded into `None`
pub fn extract(
    pe: &PipEnvironment,
    subject: &Subject,
    attribute_id: &str,
    require_proxy: bool,
) -> Result<Option<CertificateChain>> {
    match extract_chain(pe, subject, attribute_id, require_proxy)? {
        ChainExtraction::Chain(chain) => Ok(Some(chain)),
        ChainExtraction::Absent => {
            debug!("Subject does not carry a {} attribute", attribute_id);
            Ok(None)
        }
        ChainExtraction::PolicyRejected(reason) => {
            warn!("Ignoring certificate chain: {}", reason);
            Ok(None)
        }
    }
}

#[test]
fn extract_chain_test() {
    use crate::Attribute;

    let pe = PipEnvironment::new();
    let id = "chain";
    let proxy = include_str!("../../tests/examples/chain_proxy.pem");
    let alice = include_str!("../../tests/examples/chain_alice.pem");

    let mut subject = Subject::new();
    assert_eq!(
        ChainExtraction::Absent,
        extract_chain(&pe, &subject, id, false).unwrap()
    );

    subject.attributes.push(Attribute::with_values(id, ["  \n "]));
    assert_eq!(
        ChainExtraction::Absent,
        extract_chain(&pe, &subject, id, false).unwrap()
    );

    let mut subject = Subject::new();
    subject.attributes.push(Attribute::with_values(id, [alice]));
    assert_eq!(
        ChainExtraction::PolicyRejected(PolicyRejection::ProxyRequired),
        extract_chain(&pe, &subject, id, true).unwrap()
    );
    assert!(extract(&pe, &subject, id, true).unwrap().is_none());
    assert!(extract(&pe, &subject, id, false).unwrap().is_some());

    subject.attributes.push(Attribute::with_values(id, [proxy]));
    assert_eq!(
        Some(Error::Structural),
        extract_chain(&pe, &subject, id, false).err()
    );

    let mut subject = Subject::new();
    subject.attributes.push(Attribute::new(id));
    assert_eq!(
        Some(Error::Structural),
        extract_chain(&pe, &subject, id, false).err()
    );
}
