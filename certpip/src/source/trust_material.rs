//! Provides an in-memory store of trust anchors used when validating certificate chains or the
//! issuers of attribute certificates.
//!
//! ```
//! use certpip::TrustMaterial;
//!
//! let ta_folder = format!("{}/tests/examples/trust", env!("CARGO_MANIFEST_DIR"));
//! let trust = TrustMaterial::new_from_folder(&ta_folder).unwrap();
//! trust.log_trust_anchors();
//! assert_eq!(1, trust.len());
//! ```
//!
//! A [`TrustMaterial`] is built once, when a policy information point is configured, and then shared
//! read-only by every request evaluated by that policy information point.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use std::ffi::OsStr;
use std::path::Path;

use const_oid::db::rfc5912::ID_CE_SUBJECT_KEY_IDENTIFIER;
use log::{error, info};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;
use x509_cert::name::Name;

use crate::{
    pdv_certificate::*,
    pdv_extension::*,
    util::error::*,
    util::pdv_utilities::{compare_names, get_leaf_rdn, name_to_string},
    util::pem_reader::read_certificates,
};

/// File extensions processed by [`TrustMaterial::new_from_folder`]
pub const TRUST_FILE_EXTENSIONS: &[&str] = &["pem", "crt", "cer", "der"];

/// `hex_skid_from_cert` takes a certificate object and returns a string featuring upper case ASCII hex
/// characters representing either the value of the SKID extension or a SHA-256 hash of the public key.
pub fn hex_skid_from_cert(cert: &PDVCertificate) -> String {
    let skid = cert.get_extension(&ID_CE_SUBJECT_KEY_IDENTIFIER);
    if let Ok(Some(PDVExtension::SubjectKeyIdentifier(skid))) = skid {
        hex::encode_upper(skid.0.as_bytes())
    } else {
        let working_spki = &cert.decoded_cert.tbs_certificate.subject_public_key_info;
        hex::encode_upper(Sha256::digest(working_spki.subject_public_key.raw_bytes()))
    }
}

/// [`TrustMaterial`] is a set of trust anchor certificates indexed by subject name.
#[derive(Clone, Debug, Default)]
pub struct TrustMaterial {
    /// Trust anchor certificates
    anchors: Vec<PDVCertificate>,
    /// Maps RFC 4514 subject names to indices into anchors
    name_map: BTreeMap<String, Vec<usize>>,
}

impl TrustMaterial {
    /// instantiates a new, empty TrustMaterial
    pub fn new() -> TrustMaterial {
        TrustMaterial::default()
    }

    /// `new_from_folder` recursively traverses a folder reading certificates from files with the
    /// extensions listed in [`TRUST_FILE_EXTENSIONS`]. Files may contain a single DER-encoded
    /// certificate or any number of PEM-encoded certificates.
    pub fn new_from_folder(folder: &str) -> Result<TrustMaterial> {
        if !Path::is_dir(Path::new(folder)) {
            error!("{} does not exist or is not a directory", folder);
            return Err(Error::Configuration(format!(
                "{} does not exist or is not a directory",
                folder
            )));
        }

        let mut tm = TrustMaterial::new();
        for entry in WalkDir::new(folder).sort_by_file_name() {
            let e = match entry {
                Ok(e) => e,
                Err(e) => {
                    error!("Failed to read entry in {}: {}", folder, e);
                    continue;
                }
            };
            if e.file_type().is_dir() {
                continue;
            }

            let path = e.path();
            match path.extension().and_then(OsStr::to_str) {
                Some(ext) if TRUST_FILE_EXTENSIONS.contains(&ext.to_lowercase().as_str()) => {}
                _ => continue,
            }

            let locator = path.to_str().unwrap_or("");
            let buffer = std::fs::read(path)?;
            for mut cert in read_certificates(&buffer, locator) {
                let mut md = Asn1Metadata::new();
                md.insert(
                    MD_LOCATOR.to_string(),
                    Asn1MetadataTypes::String(locator.to_string()),
                );
                cert.metadata = Some(md);
                tm.push(cert);
            }
        }
        Ok(tm)
    }

    /// `new_from_pem` returns a TrustMaterial containing the certificates read from a buffer of PEM text
    pub fn new_from_pem(pem: &[u8]) -> TrustMaterial {
        let mut tm = TrustMaterial::new();
        for cert in read_certificates(pem, "") {
            tm.push(cert);
        }
        tm
    }

    /// `push` adds a trust anchor, ignoring duplicates
    pub fn push(&mut self, cert: PDVCertificate) {
        if self.anchors.iter().any(|a| a.encoded_cert == cert.encoded_cert) {
            return;
        }
        let index = self.anchors.len();
        self.name_map
            .entry(cert.subject_name())
            .or_default()
            .push(index);
        self.anchors.push(cert);
    }

    /// `add_certificate` parses a DER-encoded certificate and adds it as a trust anchor
    pub fn add_certificate(&mut self, der: &[u8]) -> Result<()> {
        let cert = PDVCertificate::try_from(der)?;
        self.push(cert);
        Ok(())
    }

    /// Returns the number of trust anchors
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Returns true if there are no trust anchors
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Returns references to all trust anchors
    pub fn get_trust_anchors(&self) -> Vec<&PDVCertificate> {
        self.anchors.iter().collect()
    }

    /// `get_anchors_by_name` returns the trust anchors whose subject name matches `name`.
    pub fn get_anchors_by_name(&self, name: &Name) -> Vec<&PDVCertificate> {
        if let Some(indices) = self.name_map.get(&name_to_string(name)) {
            return indices.iter().filter_map(|i| self.anchors.get(*i)).collect();
        }

        // fall back to the more tolerant comparison when the string forms differ
        self.anchors
            .iter()
            .filter(|a| compare_names(&a.decoded_cert.tbs_certificate.subject, name))
            .collect()
    }

    /// `is_trust_anchor` returns true if a trust anchor with the same subject name and public key as
    /// `cert` is present.
    pub fn is_trust_anchor(&self, cert: &PDVCertificate) -> bool {
        let tbs = &cert.decoded_cert.tbs_certificate;
        self.get_anchors_by_name(&tbs.subject).iter().any(|a| {
            a.decoded_cert.tbs_certificate.subject_public_key_info == tbs.subject_public_key_info
        })
    }

    /// `log_trust_anchors` logs the index, key identifier, subject and locator of each trust anchor
    pub fn log_trust_anchors(&self) {
        for (i, ta) in self.anchors.iter().enumerate() {
            info!(
                "Index: {:3}; SKID: {}; Subject: {}; Filename: {}",
                i,
                hex_skid_from_cert(ta),
                get_leaf_rdn(&ta.decoded_cert.tbs_certificate.subject),
                ta.locator()
            );
        }
    }
}

impl From<Vec<PDVCertificate>> for TrustMaterial {
    fn from(certs: Vec<PDVCertificate>) -> Self {
        let mut tm = TrustMaterial::new();
        for cert in certs {
            tm.push(cert);
        }
        tm
    }
}

#[test]
fn trust_material_test() {
    use core::str::FromStr;

    let folder = format!("{}/tests/examples/trust", env!("CARGO_MANIFEST_DIR"));
    let tm = TrustMaterial::new_from_folder(&folder).unwrap();
    assert_eq!(1, tm.len());
    assert!(tm.get_trust_anchors()[0].locator().ends_with("root_ca.pem"));

    let name = Name::from_str("CN=Example Grid Root CA,O=Example Grid,C=US").unwrap();
    assert_eq!(1, tm.get_anchors_by_name(&name).len());
    let name = Name::from_str("CN=example grid root ca,O=Example Grid,C=US").unwrap();
    assert_eq!(1, tm.get_anchors_by_name(&name).len());
    let name = Name::from_str("CN=Rogue Root CA,O=Example Grid,C=US").unwrap();
    assert!(tm.get_anchors_by_name(&name).is_empty());

    let mut tm2 = TrustMaterial::new_from_pem(include_bytes!("../../tests/examples/root_ca.pem"));
    assert!(tm.is_trust_anchor(tm2.get_trust_anchors()[0]));
    let rogue = TrustMaterial::new_from_pem(include_bytes!("../../tests/examples/rogue_root_ca.pem"));
    assert!(!tm.is_trust_anchor(rogue.get_trust_anchors()[0]));

    let dup = tm.get_trust_anchors()[0].encoded_cert.clone();
    tm2.add_certificate(&dup).unwrap();
    assert_eq!(1, tm2.len());

    assert!(TrustMaterial::new_from_folder("/definitely/not/a/folder").is_err());
}
