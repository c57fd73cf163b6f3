//! Proxy certificate structures from RFC 3820 along with the extension identifier used by
//! pre-standard (GSI 3) proxy certificates.

use der::asn1::{ObjectIdentifier, OctetString};
use der::Sequence;

/// id-pe-proxyCertInfo OBJECT IDENTIFIER ::= { id-pe 14 }
pub const ID_PE_PROXY_CERT_INFO: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.1.14");

/// proxyCertInfo extension identifier used by proxy certificates issued prior to RFC 3820
pub const ID_PE_PROXY_CERT_INFO_DRAFT: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.3536.1.222");

/// id-ppl-inheritAll OBJECT IDENTIFIER ::= { id-ppl 1 }
pub const ID_PPL_INHERIT_ALL: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.21.1");

/// id-ppl-independent OBJECT IDENTIFIER ::= { id-ppl 2 }
pub const ID_PPL_INDEPENDENT: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.21.2");

/// id-ppl-limited OBJECT IDENTIFIER used by Globus for limited proxies
pub const ID_PPL_LIMITED: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.3536.1.1.1.9");

/// ProxyCertInfo extension as defined in [RFC 3820 Section 3.8].
///
/// ```text
/// ProxyCertInfoExtension ::= SEQUENCE {
///     pCPathLenConstraint   ProxyCertPathLengthConstraint OPTIONAL,
///     proxyPolicy           ProxyPolicy }
///
/// ProxyCertPathLengthConstraint ::= INTEGER
/// ```
///
/// [RFC 3820 Section 3.8]: https://datatracker.ietf.org/doc/html/rfc3820#section-3.8
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct ProxyCertInfo {
    pub path_len_constraint: Option<u32>,
    pub proxy_policy: ProxyPolicy,
}

/// Pre-standard rendition of ProxyCertInfo, which places the policy ahead of the path length
/// constraint.
///
/// ```text
/// ProxyCertInfo ::= SEQUENCE {
///     proxyPolicy           ProxyPolicy,
///     pCPathLenConstraint   INTEGER (0..MAX) OPTIONAL }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct DraftProxyCertInfo {
    pub proxy_policy: ProxyPolicy,
    pub path_len_constraint: Option<u32>,
}

impl From<DraftProxyCertInfo> for ProxyCertInfo {
    fn from(draft: DraftProxyCertInfo) -> Self {
        ProxyCertInfo {
            path_len_constraint: draft.path_len_constraint,
            proxy_policy: draft.proxy_policy,
        }
    }
}

/// ProxyPolicy structure as defined in [RFC 3820 Section 3.8].
///
/// ```text
/// ProxyPolicy ::= SEQUENCE {
///     policyLanguage        OBJECT IDENTIFIER,
///     policy                OCTET STRING OPTIONAL }
/// ```
///
/// [RFC 3820 Section 3.8]: https://datatracker.ietf.org/doc/html/rfc3820#section-3.8
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct ProxyPolicy {
    pub policy_language: ObjectIdentifier,
    pub policy: Option<OctetString>,
}

#[test]
fn decode_proxy_cert_info_test() {
    use der::{Decode, Encode};
    use hex_literal::hex;

    // inheritAll, no path length constraint
    let enc = hex!("300C300A06082B06010505071501");
    let pci = ProxyCertInfo::from_der(&enc).unwrap();
    assert_eq!(None, pci.path_len_constraint);
    assert_eq!(ID_PPL_INHERIT_ALL, pci.proxy_policy.policy_language);
    assert_eq!(enc.to_vec(), pci.to_der().unwrap());

    // path length constraint of 2 followed by independent
    let enc = hex!("300F020102300A06082B06010505071502");
    let pci = ProxyCertInfo::from_der(&enc).unwrap();
    assert_eq!(Some(2), pci.path_len_constraint);
    assert_eq!(ID_PPL_INDEPENDENT, pci.proxy_policy.policy_language);

    let enc = hex!("300F300A06082B06010505071502020103");
    let pci: ProxyCertInfo = DraftProxyCertInfo::from_der(&enc).unwrap().into();
    assert_eq!(Some(3), pci.path_len_constraint);
}
