//! Fallback verification for algorithms the standard check refuses.
//!
//! Results feed chain role detection only and are never used to establish
//! trust in a chain.

use super::{digest_of, verify_ecdsa_prehash, verify_rsa_pkcs1v15, SignatureFailure};
use crate::algorithm::SignatureAlgorithm;
use crate::fields::PublicKey;
use md5::Md5;
use sha1::Sha1;

/// Fallback strategy for an algorithm refused as insecure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LegacyAlgorithm {
    Md5Rsa,
    Sha1Rsa,
    EcdsaSha1,
    /// Refused as insecure but without a fallback implementation.
    Unsupported(SignatureAlgorithm),
}

impl From<&SignatureAlgorithm> for LegacyAlgorithm {
    fn from(algorithm: &SignatureAlgorithm) -> Self {
        match algorithm {
            SignatureAlgorithm::Md5WithRsa => LegacyAlgorithm::Md5Rsa,
            SignatureAlgorithm::Sha1WithRsa => LegacyAlgorithm::Sha1Rsa,
            SignatureAlgorithm::EcdsaWithSha1 => LegacyAlgorithm::EcdsaSha1,
            other => LegacyAlgorithm::Unsupported(other.clone()),
        }
    }
}

impl LegacyAlgorithm {
    /// Verify `signature` over `tbs` with the issuer's key.
    pub(crate) fn verify(
        &self,
        issuer_key: &PublicKey,
        tbs: &[u8],
        signature: &[u8],
    ) -> Result<(), SignatureFailure> {
        match self {
            LegacyAlgorithm::Md5Rsa => verify_rsa_pkcs1v15::<Md5>(
                issuer_key,
                &SignatureAlgorithm::Md5WithRsa,
                tbs,
                signature,
            ),
            LegacyAlgorithm::Sha1Rsa => verify_rsa_pkcs1v15::<Sha1>(
                issuer_key,
                &SignatureAlgorithm::Sha1WithRsa,
                tbs,
                signature,
            ),
            LegacyAlgorithm::EcdsaSha1 => verify_ecdsa_prehash(
                issuer_key,
                &SignatureAlgorithm::EcdsaWithSha1,
                &digest_of::<Sha1>(tbs),
                signature,
            ),
            LegacyAlgorithm::Unsupported(algorithm) => Err(
                SignatureFailure::UnhandledInsecureAlgorithm(algorithm.clone()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::EcCurve;

    #[test]
    fn dispatch_is_closed_over_three_fallbacks() {
        assert_eq!(
            LegacyAlgorithm::from(&SignatureAlgorithm::Md5WithRsa),
            LegacyAlgorithm::Md5Rsa
        );
        assert_eq!(
            LegacyAlgorithm::from(&SignatureAlgorithm::Sha1WithRsa),
            LegacyAlgorithm::Sha1Rsa
        );
        assert_eq!(
            LegacyAlgorithm::from(&SignatureAlgorithm::EcdsaWithSha1),
            LegacyAlgorithm::EcdsaSha1
        );
        assert_eq!(
            LegacyAlgorithm::from(&SignatureAlgorithm::Md2WithRsa),
            LegacyAlgorithm::Unsupported(SignatureAlgorithm::Md2WithRsa)
        );
    }

    #[test]
    fn unsupported_asks_for_a_bug_report() {
        let err = LegacyAlgorithm::Unsupported(SignatureAlgorithm::DsaWithSha1)
            .verify(&PublicKey::Other { algorithm: "1.2.840.10040.4.1".into() }, b"", b"")
            .unwrap_err();
        assert!(err.to_string().contains("please submit bug report"));
        assert!(err.to_string().contains("dsaWithSHA1"));
    }

    #[test]
    fn rsa_fallbacks_reject_ec_keys() {
        let ec_key = PublicKey::Ec {
            curve: EcCurve::P256,
            point: vec![0x04; 65],
        };
        for algorithm in [LegacyAlgorithm::Md5Rsa, LegacyAlgorithm::Sha1Rsa] {
            assert!(matches!(
                algorithm.verify(&ec_key, b"tbs", b"sig"),
                Err(SignatureFailure::KeyTypeMismatch("RSA"))
            ));
        }
    }

    #[test]
    fn ecdsa_fallback_rejects_rsa_keys() {
        let rsa_key = PublicKey::Rsa {
            modulus: vec![0xC5; 128],
            exponent: vec![0x01, 0x00, 0x01],
        };
        assert!(matches!(
            LegacyAlgorithm::EcdsaSha1.verify(&rsa_key, b"tbs", b"sig"),
            Err(SignatureFailure::KeyTypeMismatch("ECDSA"))
        ));
    }
}
