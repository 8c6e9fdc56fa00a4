//! Standard signature check.
//!
//! Verifies signatures made with current algorithms and refuses the
//! MD2/MD5/SHA-1 family outright as insecure, the way general purpose X.509
//! stacks do. The refusal is reported as its own outcome so the caller can
//! decide whether to retry through [`super::legacy`].

use super::{digest_of, verify_ecdsa_prehash, verify_rsa_pkcs1v15, SignatureFailure};
use crate::algorithm::SignatureAlgorithm;
use crate::fields::PublicKey;
use ed25519_dalek::Verifier;
use sha2::{Sha256, Sha384, Sha512};

/// Outcome of a failed standard check.
#[derive(Debug)]
pub(crate) enum StandardCheckError {
    /// The algorithm is known but refused as insecure.
    InsecureAlgorithm(SignatureAlgorithm),
    /// Any other verification failure.
    Failed(SignatureFailure),
}

impl From<SignatureFailure> for StandardCheckError {
    fn from(failure: SignatureFailure) -> Self {
        StandardCheckError::Failed(failure)
    }
}

/// Check `signature` over `tbs` with `issuer_key` according to `algorithm`.
pub(crate) fn check_signature(
    issuer_key: &PublicKey,
    algorithm: &SignatureAlgorithm,
    tbs: &[u8],
    signature: &[u8],
) -> Result<(), StandardCheckError> {
    if algorithm.is_weak() {
        return Err(StandardCheckError::InsecureAlgorithm(algorithm.clone()));
    }

    match algorithm {
        SignatureAlgorithm::Sha256WithRsa => {
            verify_rsa_pkcs1v15::<Sha256>(issuer_key, algorithm, tbs, signature)?
        }
        SignatureAlgorithm::Sha384WithRsa => {
            verify_rsa_pkcs1v15::<Sha384>(issuer_key, algorithm, tbs, signature)?
        }
        SignatureAlgorithm::Sha512WithRsa => {
            verify_rsa_pkcs1v15::<Sha512>(issuer_key, algorithm, tbs, signature)?
        }
        SignatureAlgorithm::EcdsaWithSha256 => verify_ecdsa_prehash(
            issuer_key,
            algorithm,
            &digest_of::<Sha256>(tbs),
            signature,
        )?,
        SignatureAlgorithm::EcdsaWithSha384 => verify_ecdsa_prehash(
            issuer_key,
            algorithm,
            &digest_of::<Sha384>(tbs),
            signature,
        )?,
        SignatureAlgorithm::EcdsaWithSha512 => verify_ecdsa_prehash(
            issuer_key,
            algorithm,
            &digest_of::<Sha512>(tbs),
            signature,
        )?,
        SignatureAlgorithm::Ed25519 => verify_ed25519(issuer_key, tbs, signature)?,
        other => {
            return Err(StandardCheckError::Failed(
                SignatureFailure::UnsupportedAlgorithm(other.clone()),
            ))
        }
    }

    Ok(())
}

fn verify_ed25519(
    issuer_key: &PublicKey,
    tbs: &[u8],
    signature: &[u8],
) -> Result<(), SignatureFailure> {
    let PublicKey::Ed25519(raw) = issuer_key else {
        return Err(SignatureFailure::KeyTypeMismatch("Ed25519"));
    };

    let key_bytes: &[u8; 32] = raw
        .as_slice()
        .try_into()
        .map_err(|_| SignatureFailure::MalformedKey(format!("Ed25519 key is {} bytes", raw.len())))?;
    let key = ed25519_dalek::VerifyingKey::from_bytes(key_bytes)
        .map_err(|e| SignatureFailure::MalformedKey(e.to_string()))?;
    let sig = ed25519_dalek::Signature::from_slice(signature)
        .map_err(|e| SignatureFailure::MalformedSignature(e.to_string()))?;

    key.verify(tbs, &sig)
        .map_err(|_| SignatureFailure::InvalidSignature(SignatureAlgorithm::Ed25519))
}
