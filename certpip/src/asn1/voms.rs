//! Structures used by VOMS to carry attribute certificates in proxy certificates and to express
//! fully qualified attribute names (FQANs) within attribute certificates.

use alloc::string::String;
use alloc::vec::Vec;

use der::asn1::{Any, ObjectIdentifier, OctetString};
use der::{Choice, Sequence};
use x509_cert::ext::pkix::name::GeneralNames;

/// Certificate extension that carries VOMS attribute certificates: 1.3.6.1.4.1.8005.100.100.5
pub const ID_VOMS_AC_SEQUENCE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.8005.100.100.5");

/// Attribute certificate attribute that carries FQANs: 1.3.6.1.4.1.8005.100.100.4
pub const ID_VOMS_FQAN_ATTRIBUTE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.8005.100.100.4");

/// Value of the [`ID_VOMS_AC_SEQUENCE`] extension.
///
/// ```text
/// ACSeqs ::= SEQUENCE OF ACs
/// ACs    ::= SEQUENCE OF AttributeCertificate
/// ```
///
/// Attribute certificates are retained as [`Any`] so their original encoding is available when
/// verifying signatures.
pub type VomsAcSequences = Vec<Vec<Any>>;

/// IetfAttrSyntax structure as defined in [RFC 5755 Section 4.4.1].
///
/// ```text
/// IetfAttrSyntax ::= SEQUENCE {
///     policyAuthority [0] GeneralNames    OPTIONAL,
///     values          SEQUENCE OF CHOICE {
///                     octets    OCTET STRING,
///                     oid       OBJECT IDENTIFIER,
///                     string    UTF8String
///    }
/// }
/// ```
///
/// VOMS places the VO name and issuing server in the policy authority, i.e. `vo://host:port`,
/// and one FQAN per value.
///
/// [RFC 5755 Section 4.4.1]: https://datatracker.ietf.org/doc/html/rfc5755#section-4.4.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
#[allow(missing_docs)]
pub struct IetfAttrSyntax {
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT", optional = "true")]
    pub policy_authority: Option<GeneralNames>,
    pub values: Vec<IetfAttrSyntaxValue>,
}

/// Values of an [`IetfAttrSyntax`]
#[derive(Clone, Debug, Eq, PartialEq, Choice)]
#[allow(missing_docs)]
pub enum IetfAttrSyntaxValue {
    Octets(OctetString),
    Oid(ObjectIdentifier),
    String(String),
}

impl IetfAttrSyntaxValue {
    /// Returns a textual rendition of the value. Octets that are not UTF-8 yield `None`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            IetfAttrSyntaxValue::Octets(o) => {
                core::str::from_utf8(o.as_bytes()).ok().map(String::from)
            }
            IetfAttrSyntaxValue::Oid(oid) => Some(oid.to_string()),
            IetfAttrSyntaxValue::String(s) => Some(s.clone()),
        }
    }
}

#[test]
fn decode_ietf_attr_syntax_test() {
    use der::Decode;
    use hex_literal::hex;
    use x509_cert::ext::pkix::name::GeneralName;

    // policyAuthority uri "vo://h", values: octets "/vo", utf8 "/vo/g"
    let enc = hex!("3018A0088606766F3A2F2F68300C04032F766F0C052F766F2F67");
    let attr = IetfAttrSyntax::from_der(&enc).unwrap();
    let pa = attr.policy_authority.unwrap();
    assert_eq!(1, pa.len());
    match &pa[0] {
        GeneralName::UniformResourceIdentifier(uri) => assert_eq!("vo://h", uri.as_str()),
        _ => panic!("unexpected policy authority"),
    }
    assert_eq!(2, attr.values.len());
    assert_eq!(Some("/vo".to_string()), attr.values[0].as_text());
    assert_eq!(Some("/vo/g".to_string()), attr.values[1].as_text());
}
