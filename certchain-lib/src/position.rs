//! Chain position classification.
//!
//! Assigns each certificate in a leaf-first chain a structural role. v3
//! certificates are judged by their Basic Constraints, Extended Key Usage and
//! Key Usage extensions; v1 and v2 certificates carry no extensions, so their
//! role comes from the self-signed check and whether they sit in the leaf
//! slot of the chain.
//!
//! <https://tools.ietf.org/html/rfc5280>

use crate::fields::{Certificate, KeyUsage};
use crate::verify::is_self_signed;
use serde::Serialize;
use tracing::trace;

/// Role a certificate occupies in its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainPosition {
    Leaf,
    LeafSelfSigned,
    Intermediate,
    Root,
    Unknown,
}

impl ChainPosition {
    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            ChainPosition::Leaf => "leaf",
            ChainPosition::LeafSelfSigned => "leaf; self-signed",
            ChainPosition::Intermediate => "intermediate",
            ChainPosition::Root => "root",
            ChainPosition::Unknown => "UNKNOWN cert chain position; please submit a bug report",
        }
    }

    /// `Leaf` or `LeafSelfSigned`.
    pub fn is_leaf(self) -> bool {
        matches!(self, ChainPosition::Leaf | ChainPosition::LeafSelfSigned)
    }
}

impl std::fmt::Display for ChainPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify `cert` within `chain`.
///
/// `cert` is in the leaf slot only when it is the very element stored at
/// `chain[0]`; a content-equal copy held elsewhere is not. Use
/// [`classify_at`] when the position is known by index instead.
///
/// An empty chain yields [`ChainPosition::Unknown`].
pub fn classify(cert: &Certificate, chain: &[Certificate]) -> ChainPosition {
    let Some(leaf_slot) = chain.first() else {
        return ChainPosition::Unknown;
    };

    classify_cert(cert, std::ptr::eq(cert, leaf_slot))
}

/// Classify the certificate at `index` in `chain`; index 0 is the leaf slot.
///
/// An out-of-range index yields [`ChainPosition::Unknown`].
pub fn classify_at(chain: &[Certificate], index: usize) -> ChainPosition {
    match chain.get(index) {
        Some(cert) => classify_cert(cert, index == 0),
        None => ChainPosition::Unknown,
    }
}

fn classify_cert(cert: &Certificate, in_leaf_slot: bool) -> ChainPosition {
    let position = match cert.version {
        1 | 2 => position_v1_v2(is_self_signed(cert), in_leaf_slot),
        3 => position_v3(cert, is_self_signed(cert)),
        _ => ChainPosition::Unknown,
    };
    trace!(
        subject = %cert.subject,
        version = cert.version,
        in_leaf_slot,
        %position,
        "classified certificate"
    );
    position
}

fn position_v1_v2(self_signed: bool, in_leaf_slot: bool) -> ChainPosition {
    match (self_signed, in_leaf_slot) {
        (true, true) => ChainPosition::LeafSelfSigned,
        (true, false) => ChainPosition::Root,
        (false, true) => ChainPosition::Leaf,
        (false, false) => ChainPosition::Intermediate,
    }
}

fn position_v3(cert: &Certificate, self_signed: bool) -> ChainPosition {
    // Basic Constraints cA: the key may verify certificate signatures.
    if cert.is_ca {
        return if self_signed {
            ChainPosition::Root
        } else {
            ChainPosition::Intermediate
        };
    }

    // Extended Key Usage generally appears only in end-entity certificates.
    if cert.ext_key_usage.is_some() {
        return if self_signed {
            ChainPosition::LeafSelfSigned
        } else {
            ChainPosition::Leaf
        };
    }

    let cert_sign = cert
        .key_usage
        .is_some_and(|ku| ku.contains(KeyUsage::CERT_SIGN));

    match (self_signed, cert_sign) {
        (true, true) => ChainPosition::Root,
        (true, false) => ChainPosition::LeafSelfSigned,
        (false, true) => ChainPosition::Intermediate,
        (false, false) => ChainPosition::Leaf,
    }
}

/// Positions of every certificate in `chain`, in chain order.
pub fn positions(chain: &[Certificate]) -> Vec<ChainPosition> {
    (0..chain.len()).map(|idx| classify_at(chain, idx)).collect()
}

/// Number of leaf certificates (self-signed or not) in the chain.
pub fn count_leaf(chain: &[Certificate]) -> usize {
    positions(chain).into_iter().filter(|p| p.is_leaf()).count()
}

/// Number of intermediate certificates in the chain.
pub fn count_intermediate(chain: &[Certificate]) -> usize {
    positions(chain)
        .into_iter()
        .filter(|p| *p == ChainPosition::Intermediate)
        .count()
}

/// Leaf certificates (self-signed or not) in chain order.
pub fn leaf_certs(chain: &[Certificate]) -> Vec<&Certificate> {
    select(chain, ChainPosition::is_leaf)
}

/// Every certificate that is not classified as a root.
pub fn non_root_certs(chain: &[Certificate]) -> Vec<&Certificate> {
    select(chain, |p| p != ChainPosition::Root)
}

/// Root certificates in chain order.
pub fn root_certs(chain: &[Certificate]) -> Vec<&Certificate> {
    select(chain, |p| p == ChainPosition::Root)
}

fn select(chain: &[Certificate], keep: impl Fn(ChainPosition) -> bool) -> Vec<&Certificate> {
    chain
        .iter()
        .zip(positions(chain))
        .filter(|(_, p)| keep(*p))
        .map(|(cert, _)| cert)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::SignatureAlgorithm;
    use crate::fields::{DistinguishedName, PublicKey};
    use time::OffsetDateTime;

    // Issuer and subject differ, so none of these are self-signed.
    fn issued_cert(version: u32) -> Certificate {
        Certificate {
            version,
            serial: 7.into(),
            signature_algorithm: SignatureAlgorithm::Sha256WithRsa,
            issuer: DistinguishedName {
                components: vec![("CN".into(), "Issuing CA".into())],
            },
            subject: DistinguishedName {
                components: vec![("CN".into(), "subject".into())],
            },
            not_before: OffsetDateTime::UNIX_EPOCH,
            not_after: OffsetDateTime::UNIX_EPOCH,
            public_key: PublicKey::Other {
                algorithm: "1.2.3".into(),
            },
            signature: Vec::new(),
            raw_tbs: Vec::new(),
            key_usage: None,
            ext_key_usage: None,
            is_ca: false,
        }
    }

    #[test]
    fn empty_chain_is_unknown() {
        let cert = issued_cert(3);
        assert_eq!(classify(&cert, &[]), ChainPosition::Unknown);
        assert_eq!(classify_at(&[], 0), ChainPosition::Unknown);
    }

    #[test]
    fn unsupported_version_is_unknown() {
        let chain = vec![issued_cert(4)];
        assert_eq!(classify(&chain[0], &chain), ChainPosition::Unknown);
    }

    #[test]
    fn v1_position_follows_leaf_slot() {
        let chain = vec![issued_cert(1), issued_cert(1)];
        assert_eq!(classify(&chain[0], &chain), ChainPosition::Leaf);
        assert_eq!(classify(&chain[1], &chain), ChainPosition::Intermediate);
        assert_eq!(classify_at(&chain, 1), ChainPosition::Intermediate);
    }

    #[test]
    fn leaf_slot_is_identity_not_equality() {
        let chain = vec![issued_cert(2)];
        let copy = chain[0].clone();
        assert_eq!(classify(&chain[0], &chain), ChainPosition::Leaf);
        assert_eq!(classify(&copy, &chain), ChainPosition::Intermediate);
    }

    #[test]
    fn v3_ca_flag_wins() {
        let mut cert = issued_cert(3);
        cert.is_ca = true;
        cert.ext_key_usage = Some(vec!["TLS Web Server Authentication".into()]);
        let chain = vec![cert];
        assert_eq!(classify(&chain[0], &chain), ChainPosition::Intermediate);
    }

    #[test]
    fn v3_eku_means_leaf_anywhere_in_chain() {
        let mut cert = issued_cert(3);
        cert.ext_key_usage = Some(Vec::new());
        cert.key_usage = Some(KeyUsage::CERT_SIGN);
        let chain = vec![issued_cert(3), cert];
        assert_eq!(classify_at(&chain, 1), ChainPosition::Leaf);
    }

    #[test]
    fn v3_key_usage_cert_sign_means_intermediate() {
        let mut ca = issued_cert(3);
        ca.key_usage = Some(KeyUsage::CERT_SIGN | KeyUsage::CRL_SIGN);
        let mut signer_only = issued_cert(3);
        signer_only.key_usage = Some(KeyUsage::CERT_SIGN);
        let mut end_entity = issued_cert(3);
        end_entity.key_usage = Some(KeyUsage::DIGITAL_SIGNATURE | KeyUsage::CRL_SIGN);
        let chain = vec![end_entity, ca, signer_only, issued_cert(3)];

        assert_eq!(
            positions(&chain),
            vec![
                ChainPosition::Leaf,
                ChainPosition::Intermediate,
                ChainPosition::Intermediate,
                ChainPosition::Leaf,
            ]
        );
        assert_eq!(count_leaf(&chain), 2);
        assert_eq!(count_intermediate(&chain), 2);
        assert_eq!(non_root_certs(&chain).len(), 4);
        assert!(root_certs(&chain).is_empty());
    }

    #[test]
    fn labels() {
        assert_eq!(ChainPosition::LeafSelfSigned.to_string(), "leaf; self-signed");
        assert_eq!(
            ChainPosition::Unknown.to_string(),
            "UNKNOWN cert chain position; please submit a bug report"
        );
    }
}
