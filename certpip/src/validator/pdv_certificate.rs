//! Wrappers around asn.1 encoder/decoder structures to support certificate chain processing

use alloc::collections::BTreeMap;
use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use const_oid::db::rfc5912::{
    ID_CE_AUTHORITY_KEY_IDENTIFIER, ID_CE_BASIC_CONSTRAINTS, ID_CE_EXT_KEY_USAGE, ID_CE_KEY_USAGE,
    ID_CE_SUBJECT_ALT_NAME, ID_CE_SUBJECT_KEY_IDENTIFIER,
};
use der::asn1::BitString;
use der::{asn1::ObjectIdentifier, Decode, Encode};
use log::error;
use spki::AlgorithmIdentifierOwned;
use x509_cert::ext::pkix::*;
use x509_cert::Certificate;

use crate::asn1::{
    DraftProxyCertInfo, ProxyCertInfo, VomsAcSequences, ID_PE_PROXY_CERT_INFO,
    ID_PE_PROXY_CERT_INFO_DRAFT, ID_VOMS_AC_SEQUENCE,
};
use crate::pdv_extension::*;
use crate::util::error::*;
use crate::util::pdv_utilities::name_to_string;
use crate::EXTS_OF_INTEREST;

/// [`Asn1Metadata`] is a typedef of a BTreeMap map that associates types represented by the [`Asn1MetadataTypes`]
/// enum objects with arbitrary string values. At present this is only used to convey filenames.
pub type Asn1Metadata = BTreeMap<String, Asn1MetadataTypes>;

/// [`MD_LOCATOR`] is used to set/get a String value to/from an [`Asn1Metadata`] object. The value
/// may represent a file name or other locator for troubleshooting purposes.
pub static MD_LOCATOR: &str = "mdLocator";

/// Small assortment of types that can be used to save metadata collected during chain processing.
#[derive(PartialEq, Clone, Eq, Debug)]
pub enum Asn1MetadataTypes {
    /// Used for metadata represented as a bool
    Bool(bool),
    /// Used for metadata represented as a u32
    Number(u32),
    /// Used for metadata represented as a String
    String(String),
    /// Used for metadata represented as a `Vec<u8>`
    Buffer(Vec<u8>),
}

/// [`PDVCertificate`] is used to aggregate a binary, DER-encoded Certificate, a parsed Certificate, optional metadata
/// and optional parsed extensions in support of chain extraction and validation operations.
///
/// The parsed extensions are those listed in [`EXTS_OF_INTEREST`](../path_validator/constant.EXTS_OF_INTEREST.html).
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct PDVCertificate {
    /// Binary, encoded Certificate object
    pub encoded_cert: Vec<u8>,
    /// Decoded Certificate object
    pub decoded_cert: Certificate,
    /// Optional metadata about the certificate
    pub metadata: Option<Asn1Metadata>,
    /// Optional parsed extension from the Certificate
    pub parsed_extensions: ParsedExtensions,
}

impl TryFrom<&[u8]> for PDVCertificate {
    type Error = der::Error;

    fn try_from(enc_cert: &[u8]) -> der::Result<Self> {
        let cert = Certificate::from_der(enc_cert)?;
        let mut pdv_cert = PDVCertificate {
            encoded_cert: enc_cert.to_vec(),
            decoded_cert: cert,
            metadata: None,
            parsed_extensions: Default::default(),
        };
        pdv_cert.parse_extensions(EXTS_OF_INTEREST);
        Ok(pdv_cert)
    }
}

impl TryFrom<Certificate> for PDVCertificate {
    type Error = der::Error;

    fn try_from(cert: Certificate) -> der::Result<Self> {
        let enc_cert = cert.to_der()?;
        let mut pdv_cert = PDVCertificate {
            encoded_cert: enc_cert,
            decoded_cert: cert,
            metadata: None,
            parsed_extensions: Default::default(),
        };
        pdv_cert.parse_extensions(EXTS_OF_INTEREST);
        Ok(pdv_cert)
    }
}

impl PDVCertificate {
    /// Returns the X.509 version number of the certificate, i.e., 3 for a v3 certificate
    pub fn version(&self) -> u8 {
        self.decoded_cert.tbs_certificate.version as u8 + 1
    }

    /// Returns the subject name in RFC 4514 string form
    pub fn subject_name(&self) -> String {
        name_to_string(&self.decoded_cert.tbs_certificate.subject)
    }

    /// Returns the issuer name in RFC 4514 string form
    pub fn issuer_name(&self) -> String {
        name_to_string(&self.decoded_cert.tbs_certificate.issuer)
    }

    /// Returns the locator from metadata, or an empty string if none was set
    pub fn locator(&self) -> String {
        match self.metadata.as_ref().and_then(|md| md.get(MD_LOCATOR)) {
            Some(Asn1MetadataTypes::String(s)) => s.clone(),
            _ => String::new(),
        }
    }
}

impl ExtensionProcessing for PDVCertificate {
    /// `get_extension` takes an ObjectIdentifier that identifies an extension type and returns
    /// a previously parsed [`PDVExtension`] instance containing the decoded extension if the extension was present.
    fn get_extension(&self, oid: &ObjectIdentifier) -> Result<Option<&'_ PDVExtension>> {
        Ok(self.parsed_extensions.get(oid))
    }

    /// `parse_extensions` takes a list of ObjectIdentifiers and parses each extension that is present.
    fn parse_extensions(&'_ mut self, oids: &[ObjectIdentifier]) {
        for oid in oids {
            if let Some(e) = self.parse_extension(oid).err() {
                error!(
                    "Failed to parse {} extension in certificate issued to {}: {}",
                    oid,
                    self.subject_name(),
                    e
                );
            }
        }
    }

    fn parse_extension(&mut self, oid: &ObjectIdentifier) -> Result<Option<&PDVExtension>> {
        macro_rules! add_and_return {
            ($pe:ident, $v:ident, $t:ident) => {
                match $t::from_der($v) {
                    Ok(r) => {
                        let ext = PDVExtension::$t(r);
                        $pe.insert(*oid, ext);
                        return Ok($pe.get(oid));
                    }
                    Err(e) => {
                        return Err(Error::Asn1Error(e));
                    }
                }
            };
        }

        let pe = &mut self.parsed_extensions;
        if pe.contains_key(oid) {
            return Ok(pe.get(oid));
        }

        if let Some(exts) = self.decoded_cert.tbs_certificate.extensions.as_ref() {
            if let Some(i) = exts.iter().find(|&ext| ext.extn_id == *oid) {
                let v = i.extn_value.as_bytes();
                match *oid {
                    ID_CE_BASIC_CONSTRAINTS => {
                        add_and_return!(pe, v, BasicConstraints);
                    }
                    ID_CE_SUBJECT_KEY_IDENTIFIER => {
                        add_and_return!(pe, v, SubjectKeyIdentifier);
                    }
                    ID_CE_EXT_KEY_USAGE => {
                        add_and_return!(pe, v, ExtendedKeyUsage);
                    }
                    ID_CE_KEY_USAGE => {
                        add_and_return!(pe, v, KeyUsage);
                    }
                    ID_CE_SUBJECT_ALT_NAME => {
                        add_and_return!(pe, v, SubjectAltName);
                    }
                    ID_CE_AUTHORITY_KEY_IDENTIFIER => {
                        add_and_return!(pe, v, AuthorityKeyIdentifier);
                    }
                    ID_PE_PROXY_CERT_INFO | ID_PE_PROXY_CERT_INFO_DRAFT => {
                        // some pre-RFC proxies place the policy ahead of the path length constraint
                        let pci = match ProxyCertInfo::from_der(v) {
                            Ok(pci) => pci,
                            Err(e) => match DraftProxyCertInfo::from_der(v) {
                                Ok(draft) => draft.into(),
                                Err(_) => return Err(Error::Asn1Error(e)),
                            },
                        };
                        pe.insert(*oid, PDVExtension::ProxyCertInfo(pci));
                        return Ok(pe.get(oid));
                    }
                    ID_VOMS_AC_SEQUENCE => {
                        let acs = VomsAcSequences::from_der(v)?;
                        pe.insert(*oid, PDVExtension::VomsAcSequences(acs));
                        return Ok(pe.get(oid));
                    }
                    _ => {
                        // ignore unrecognized
                    }
                }
            }
        }
        Ok(None)
    }
}

/// [`DeferDecodeSigned`] used to parse only the top-level structure of a signed object, i.e., a
/// Certificate or AttributeCertificate, without parsing the details of the to-be-signed field.
///
/// Deferred decoding is useful when verifying signatures to avoid re-encoding the to-be-signed
/// structure (and potentially encountering problems with structures that were not DER-encoded prior
/// to signing).
pub struct DeferDecodeSigned {
    /// tbsCertificate or acinfo
    pub tbs_field: Vec<u8>,
    /// signatureAlgorithm   AlgorithmIdentifier,
    pub signature_algorithm: AlgorithmIdentifierOwned,
    /// signature            BIT STRING
    pub signature: BitString,
}

impl ::der::FixedTag for DeferDecodeSigned {
    const TAG: ::der::Tag = ::der::Tag::Sequence;
}

impl<'a> ::der::DecodeValue<'a> for DeferDecodeSigned {
    fn decode_value<R: ::der::Reader<'a>>(
        reader: &mut R,
        header: ::der::Header,
    ) -> ::der::Result<Self> {
        use ::der::Reader as _;
        reader.read_nested(header.length, |reader| {
            let tbs_certificate = reader.tlv_bytes()?;
            let signature_algorithm = reader.decode()?;
            let signature = reader.decode()?;
            Ok(Self {
                tbs_field: tbs_certificate.to_vec(),
                signature_algorithm,
                signature,
            })
        })
    }
}

/// `parse_cert` takes a buffer containing a binary DER encoded certificate and returns
/// a [`PDVCertificate`] containing the parsed certificate if parsing was successful.
pub fn parse_cert(buffer: &[u8], filename: &str) -> Result<PDVCertificate> {
    match PDVCertificate::try_from(buffer) {
        Ok(mut pdvcert) => {
            let mut md = Asn1Metadata::new();
            md.insert(
                MD_LOCATOR.to_string(),
                Asn1MetadataTypes::String(filename.to_string()),
            );
            pdvcert.metadata = Some(md);
            Ok(pdvcert)
        }
        Err(e) => {
            error!("Failed to parse certificate from {}: {}", filename, e);
            Err(Error::Asn1Error(e))
        }
    }
}

#[test]
fn parse_proxy_extensions_test() {
    use crate::decode_pem_certificate_chain;
    let chain =
        decode_pem_certificate_chain(include_bytes!("../../tests/examples/chain_proxy.pem"))
            .unwrap();
    assert_eq!(3, chain[0].version());
    assert_eq!(
        "CN=1234567890,CN=Alice Example,O=Example Grid,C=US",
        chain[0].subject_name()
    );
    assert!(matches!(
        chain[0].get_extension(&ID_PE_PROXY_CERT_INFO),
        Ok(Some(PDVExtension::ProxyCertInfo(_)))
    ));
    assert!(matches!(
        chain[1].get_extension(&ID_CE_BASIC_CONSTRAINTS),
        Ok(Some(PDVExtension::BasicConstraints(_)))
    ));
    assert!(chain[1]
        .get_extension(&ID_PE_PROXY_CERT_INFO)
        .unwrap()
        .is_none());

    let chain =
        decode_pem_certificate_chain(include_bytes!("../../tests/examples/chain_draft_proxy.pem"))
            .unwrap();
    assert!(matches!(
        chain[0].get_extension(&ID_PE_PROXY_CERT_INFO_DRAFT),
        Ok(Some(PDVExtension::ProxyCertInfo(_)))
    ));

    let chain =
        decode_pem_certificate_chain(include_bytes!("../../tests/examples/chain_v1.pem")).unwrap();
    assert_eq!(1, chain[0].version());
}
