//! Signature verification between an issued certificate and a candidate
//! issuer, and the self-signed predicate built on top of it.
//!
//! Verification is split in two tiers. [`verify_signature`] is fallible and
//! reports why a signature did not verify. [`is_self_signed`] is total: it
//! maps every failure to `false`, so role detection never surfaces a
//! verification error.
//!
//! The standard check refuses the MD2/MD5/SHA-1 family as insecure. When it
//! does, the MD5-with-RSA, SHA1-with-RSA and ECDSA-with-SHA1 signatures are
//! checked again through the [`legacy`] fallback.

mod legacy;
mod standard;

use crate::algorithm::SignatureAlgorithm;
use crate::fields::{Certificate, EcCurve, PublicKey};
use crate::CertchainError;
use digest::const_oid::AssociatedOid;
use digest::Digest;
use ecdsa::signature::hazmat::PrehashVerifier;
use legacy::LegacyAlgorithm;
use rsa::{BigUint, Pkcs1v15Sign, RsaPublicKey};
use standard::{check_signature, StandardCheckError};
use tracing::debug;

/// Reason a signature did not verify.
///
/// Always reported wrapped in [`CertchainError::SignatureVerificationFailed`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureFailure {
    #[error("issuer and subject X.509 distinguished name mismatch")]
    NameMismatch,

    #[error("issuer certificate public key not in {0} format")]
    KeyTypeMismatch(&'static str),

    #[error("malformed issuer public key: {0}")]
    MalformedKey(String),

    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("{0} signature not valid")]
    InvalidSignature(SignatureAlgorithm),

    #[error("signature algorithm {0} not supported")]
    UnsupportedAlgorithm(SignatureAlgorithm),

    #[error("unsupported signature algorithm {0} (please submit bug report)")]
    UnhandledInsecureAlgorithm(SignatureAlgorithm),
}

/// Verify that `issuer` signed `issued`.
///
/// The issued certificate's issuer DN must match the issuer's subject DN.
/// Signatures the standard check refuses as insecure are retried through the
/// legacy fallback for MD5-with-RSA, SHA1-with-RSA and ECDSA-with-SHA1; any
/// other refused algorithm fails with
/// [`SignatureFailure::UnhandledInsecureAlgorithm`].
pub fn verify_signature(issued: &Certificate, issuer: &Certificate) -> Result<(), CertchainError> {
    if issued.issuer_string() != issuer.subject_string() {
        return Err(SignatureFailure::NameMismatch.into());
    }

    let outcome = check_signature(
        &issuer.public_key,
        &issued.signature_algorithm,
        &issued.raw_tbs,
        &issued.signature,
    );

    match outcome {
        Ok(()) => Ok(()),
        Err(StandardCheckError::InsecureAlgorithm(algorithm)) => {
            let fallback = LegacyAlgorithm::from(&algorithm);
            debug!(
                %algorithm,
                ?fallback,
                subject = %issued.subject,
                "standard check refused insecure algorithm, using legacy verification"
            );
            let result = fallback.verify(&issuer.public_key, &issued.raw_tbs, &issued.signature);
            debug!(%algorithm, verified = result.is_ok(), "legacy verification finished");
            Ok(result?)
        }
        Err(StandardCheckError::Failed(failure)) => Err(failure.into()),
    }
}

/// Whether `cert` is self-signed: issuer and subject names match and the
/// signature verifies against the certificate's own key.
///
/// Any verification failure, including unsupported algorithms, is treated as
/// "not self-signed".
pub fn is_self_signed(cert: &Certificate) -> bool {
    if cert.issuer_string() != cert.subject_string() {
        return false;
    }

    verify_signature(cert, cert).is_ok()
}

pub(crate) fn digest_of<D: Digest>(data: &[u8]) -> Vec<u8> {
    D::digest(data).to_vec()
}

/// PKCS#1 v1.5 RSA verification over a `D` digest of `tbs`.
pub(crate) fn verify_rsa_pkcs1v15<D: Digest + AssociatedOid>(
    issuer_key: &PublicKey,
    algorithm: &SignatureAlgorithm,
    tbs: &[u8],
    signature: &[u8],
) -> Result<(), SignatureFailure> {
    let PublicKey::Rsa { modulus, exponent } = issuer_key else {
        return Err(SignatureFailure::KeyTypeMismatch("RSA"));
    };

    let key = RsaPublicKey::new(
        BigUint::from_bytes_be(modulus),
        BigUint::from_bytes_be(exponent),
    )
    .map_err(|e| SignatureFailure::MalformedKey(e.to_string()))?;

    let hashed = digest_of::<D>(tbs);
    key.verify(Pkcs1v15Sign::new::<D>(), &hashed, signature)
        .map_err(|_| SignatureFailure::InvalidSignature(algorithm.clone()))
}

/// ECDSA verification of an ASN.1 DER signature over a precomputed digest.
///
/// Digests shorter than the curve's field are accepted, so SHA-1 works with
/// every supported curve.
pub(crate) fn verify_ecdsa_prehash(
    issuer_key: &PublicKey,
    algorithm: &SignatureAlgorithm,
    prehash: &[u8],
    signature: &[u8],
) -> Result<(), SignatureFailure> {
    let PublicKey::Ec { curve, point } = issuer_key else {
        return Err(SignatureFailure::KeyTypeMismatch("ECDSA"));
    };

    let verified = match curve {
        EcCurve::P256 => {
            let key = p256::ecdsa::VerifyingKey::from_sec1_bytes(point)
                .map_err(|e| SignatureFailure::MalformedKey(e.to_string()))?;
            let sig = p256::ecdsa::Signature::from_der(signature)
                .map_err(|e| SignatureFailure::MalformedSignature(e.to_string()))?;
            key.verify_prehash(&pad_prehash(prehash, 32), &sig).is_ok()
        }
        EcCurve::P384 => {
            let key = p384::ecdsa::VerifyingKey::from_sec1_bytes(point)
                .map_err(|e| SignatureFailure::MalformedKey(e.to_string()))?;
            let sig = p384::ecdsa::Signature::from_der(signature)
                .map_err(|e| SignatureFailure::MalformedSignature(e.to_string()))?;
            key.verify_prehash(&pad_prehash(prehash, 48), &sig).is_ok()
        }
        EcCurve::P521 => {
            let key = p521::ecdsa::VerifyingKey::from_sec1_bytes(point)
                .map_err(|e| SignatureFailure::MalformedKey(e.to_string()))?;
            let sig = p521::ecdsa::Signature::from_der(signature)
                .map_err(|e| SignatureFailure::MalformedSignature(e.to_string()))?;
            key.verify_prehash(&pad_prehash(prehash, 66), &sig).is_ok()
        }
        EcCurve::Other(name) => {
            return Err(SignatureFailure::MalformedKey(format!(
                "unsupported EC curve {}",
                name
            )))
        }
    };

    if verified {
        Ok(())
    } else {
        Err(SignatureFailure::InvalidSignature(algorithm.clone()))
    }
}

/// Left-pad `prehash` with zeros up to `field_len` bytes.
///
/// The padded digest encodes the same integer, which is the value ECDSA
/// signs when the hash is shorter than the curve order. Longer digests are
/// returned unchanged and truncated by the verifier.
pub(crate) fn pad_prehash(prehash: &[u8], field_len: usize) -> Vec<u8> {
    let mut padded = vec![0u8; field_len.saturating_sub(prehash.len())];
    padded.extend_from_slice(prehash);
    padded
}
