//! Signature algorithm identification.

use crate::oid;
use serde::{Serialize, Serializer};

/// Signature algorithm declared by a certificate.
///
/// Algorithms without a dedicated variant keep their dotted OID in
/// [`SignatureAlgorithm::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    Md2WithRsa,
    Md5WithRsa,
    Sha1WithRsa,
    Sha256WithRsa,
    Sha384WithRsa,
    Sha512WithRsa,
    RsaPss,
    DsaWithSha1,
    DsaWithSha256,
    EcdsaWithSha1,
    EcdsaWithSha256,
    EcdsaWithSha384,
    EcdsaWithSha512,
    Ed25519,
    Ed448,
    Unknown(String),
}

impl SignatureAlgorithm {
    /// Map a dotted OID string to an algorithm.
    pub fn from_oid(oid_str: &str) -> Self {
        match oid_str {
            oid::MD2_WITH_RSA => Self::Md2WithRsa,
            oid::MD5_WITH_RSA => Self::Md5WithRsa,
            oid::SHA1_WITH_RSA => Self::Sha1WithRsa,
            oid::SHA256_WITH_RSA => Self::Sha256WithRsa,
            oid::SHA384_WITH_RSA => Self::Sha384WithRsa,
            oid::SHA512_WITH_RSA => Self::Sha512WithRsa,
            oid::RSASSA_PSS => Self::RsaPss,
            oid::DSA_WITH_SHA1 => Self::DsaWithSha1,
            oid::DSA_WITH_SHA256 => Self::DsaWithSha256,
            oid::ECDSA_WITH_SHA1 => Self::EcdsaWithSha1,
            oid::ECDSA_WITH_SHA256 => Self::EcdsaWithSha256,
            oid::ECDSA_WITH_SHA384 => Self::EcdsaWithSha384,
            oid::ECDSA_WITH_SHA512 => Self::EcdsaWithSha512,
            oid::ED25519 => Self::Ed25519,
            oid::ED448 => Self::Ed448,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// OpenSSL's name for the algorithm.
    pub fn name(&self) -> &str {
        match self {
            Self::Md2WithRsa => "md2WithRSAEncryption",
            Self::Md5WithRsa => "md5WithRSAEncryption",
            Self::Sha1WithRsa => "sha1WithRSAEncryption",
            Self::Sha256WithRsa => "sha256WithRSAEncryption",
            Self::Sha384WithRsa => "sha384WithRSAEncryption",
            Self::Sha512WithRsa => "sha512WithRSAEncryption",
            Self::RsaPss => "rsassaPss",
            Self::DsaWithSha1 => "dsaWithSHA1",
            Self::DsaWithSha256 => "dsa_with_SHA256",
            Self::EcdsaWithSha1 => "ecdsa-with-SHA1",
            Self::EcdsaWithSha256 => "ecdsa-with-SHA256",
            Self::EcdsaWithSha384 => "ecdsa-with-SHA384",
            Self::EcdsaWithSha512 => "ecdsa-with-SHA512",
            Self::Ed25519 => "ED25519",
            Self::Ed448 => "ED448",
            Self::Unknown(oid_str) => oid_str,
        }
    }

    /// MD2, MD5 and SHA-1 based algorithms (RSA, DSA and ECDSA variants).
    ///
    /// These are the algorithms the standard signature check refuses as
    /// insecure and the ones reported by weak-algorithm checks.
    pub fn is_weak(&self) -> bool {
        matches!(
            self,
            Self::Md2WithRsa
                | Self::Md5WithRsa
                | Self::Sha1WithRsa
                | Self::DsaWithSha1
                | Self::EcdsaWithSha1
        )
    }
}

impl std::fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for SignatureAlgorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}
