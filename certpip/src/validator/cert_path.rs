//! Provides structure that represents a certification path including trust anchor and the ordered
//! certificates issued beneath it.

use alloc::vec::Vec;

use crate::PDVCertificate;

/// `CertificationPath` is used to represent the trust anchor and the certificates that comprise a
/// certification path, ordered from the certificate issued by the trust anchor to the leaf.
#[derive(Clone, Debug)]
pub struct CertificationPath<'a> {
    /// `trust_anchor` contains the trust anchor for the certification path
    pub trust_anchor: &'a PDVCertificate,
    /// `certificates` contains the certificate issued by `trust_anchor` followed by each certificate
    /// it (transitively) issued, i.e., `certificates\[0\]` can be used to verify `certificates\[1\]`,
    /// and so on until `certificates[certificates.len() - 1]`, which is the leaf.
    pub certificates: Vec<&'a PDVCertificate>,
}

impl<'a> CertificationPath<'a> {
    /// `new` takes a trust anchor and a leaf first chain whose last element was issued by the
    /// trust anchor and returns a trust anchor first path.
    pub fn new(trust_anchor: &'a PDVCertificate, chain: &'a [PDVCertificate]) -> Self {
        CertificationPath {
            trust_anchor,
            certificates: chain.iter().rev().collect(),
        }
    }

    /// `target` returns the leaf certificate, or the trust anchor for an empty path
    pub fn target(&self) -> &'a PDVCertificate {
        self.certificates
            .last()
            .copied()
            .unwrap_or(self.trust_anchor)
    }

    /// `issuer_of` returns the certificate that issued `certificates[index]`
    pub fn issuer_of(&self, index: usize) -> &'a PDVCertificate {
        match index {
            0 => self.trust_anchor,
            _ => self.certificates[index - 1],
        }
    }
}
