//! Certificate data model.
//!
//! A [`Certificate`] holds exactly the fields chain classification,
//! signature verification and expiration arithmetic need. It is usually
//! produced by [`crate::parse_der`] or [`crate::parse_pem_chain`], but every
//! field is public so callers with their own decoding layer can build one
//! directly.

use crate::algorithm::SignatureAlgorithm;
use num_bigint::BigInt;
use time::OffsetDateTime;

/// A parsed X.509 certificate.
#[derive(Debug, Clone)]
pub struct Certificate {
    /// Certificate version (1, 2, or 3).
    pub version: u32,
    /// Serial number; DER allows negative values.
    pub serial: BigInt,
    /// Declared signature algorithm (outer `signatureAlgorithm` field).
    pub signature_algorithm: SignatureAlgorithm,
    /// Issuer distinguished name.
    pub issuer: DistinguishedName,
    /// Subject distinguished name.
    pub subject: DistinguishedName,
    /// Start of the validity window.
    pub not_before: OffsetDateTime,
    /// End of the validity window.
    pub not_after: OffsetDateTime,
    /// Subject public key.
    pub public_key: PublicKey,
    /// Raw signature bytes.
    pub signature: Vec<u8>,
    /// DER encoding of the to-be-signed portion of the certificate.
    pub raw_tbs: Vec<u8>,
    /// Key Usage bits; `None` when the extension is absent.
    pub key_usage: Option<KeyUsage>,
    /// Extended Key Usage purposes; `None` when the extension is absent.
    pub ext_key_usage: Option<Vec<String>>,
    /// Basic Constraints `cA` flag.
    pub is_ca: bool,
}

impl Certificate {
    /// Return the subject as a one-line string.
    pub fn subject_string(&self) -> String {
        self.subject.to_oneline()
    }

    /// Return the issuer as a one-line string.
    pub fn issuer_string(&self) -> String {
        self.issuer.to_oneline()
    }

    /// Short human-readable name: CN, then O, then OU, else "Unknown".
    pub fn short_name(&self) -> &str {
        ["CN", "O", "OU"]
            .iter()
            .find_map(|key| self.subject.get(key))
            .unwrap_or("Unknown")
    }
}

/// Distinguished name with ordered components.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    /// Ordered list of (attribute_type, value) pairs.
    /// Attribute types use short names where known (e.g., "CN", "O", "C").
    pub components: Vec<(String, String)>,
}

impl DistinguishedName {
    /// Format as a comma-separated one-line string matching OpenSSL's default format.
    /// Example: "C = US, O = Org, CN = example.com"
    ///
    /// Values containing commas, equals signs, or backslashes are escaped
    /// to prevent ambiguous output.
    pub fn to_oneline(&self) -> String {
        let mut result = String::new();
        for (i, (k, v)) in self.components.iter().enumerate() {
            if i > 0 {
                result.push_str(", ");
            }
            result.push_str(k);
            result.push_str(" = ");
            for ch in v.chars() {
                match ch {
                    '\\' => result.push_str("\\\\"),
                    ',' => result.push_str("\\,"),
                    '=' => result.push_str("\\="),
                    _ => result.push(ch),
                }
            }
        }
        result
    }

    /// First value recorded for the given short attribute name.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.components
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl std::fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_oneline())
    }
}

/// Subject public key material needed for signature verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    /// RSA key as big-endian modulus and public exponent.
    Rsa { modulus: Vec<u8>, exponent: Vec<u8> },
    /// Elliptic-curve key as a SEC1 encoded point.
    Ec { curve: EcCurve, point: Vec<u8> },
    /// Raw 32-byte Ed25519 key.
    Ed25519(Vec<u8>),
    /// Any other key type, identified by its algorithm OID.
    Other { algorithm: String },
}

impl PublicKey {
    /// Short algorithm label ("RSA", "EC", "Ed25519" or the OID).
    pub fn algorithm(&self) -> &str {
        match self {
            Self::Rsa { .. } => "RSA",
            Self::Ec { .. } => "EC",
            Self::Ed25519(_) => "Ed25519",
            Self::Other { algorithm } => algorithm,
        }
    }
}

/// Named curve of an EC public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcCurve {
    P256,
    P384,
    P521,
    Other(String),
}

impl std::fmt::Display for EcCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::P256 => f.write_str("P-256"),
            Self::P384 => f.write_str("P-384"),
            Self::P521 => f.write_str("P-521"),
            Self::Other(oid_str) => f.write_str(oid_str),
        }
    }
}

/// Key Usage extension bits, numbered as in RFC 5280 section 4.2.1.3
/// (bit 0 is `digitalSignature`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyUsage(u16);

impl KeyUsage {
    pub const DIGITAL_SIGNATURE: KeyUsage = KeyUsage(1 << 0);
    pub const CONTENT_COMMITMENT: KeyUsage = KeyUsage(1 << 1);
    pub const KEY_ENCIPHERMENT: KeyUsage = KeyUsage(1 << 2);
    pub const DATA_ENCIPHERMENT: KeyUsage = KeyUsage(1 << 3);
    pub const KEY_AGREEMENT: KeyUsage = KeyUsage(1 << 4);
    pub const CERT_SIGN: KeyUsage = KeyUsage(1 << 5);
    pub const CRL_SIGN: KeyUsage = KeyUsage(1 << 6);
    pub const ENCIPHER_ONLY: KeyUsage = KeyUsage(1 << 7);
    pub const DECIPHER_ONLY: KeyUsage = KeyUsage(1 << 8);

    pub const fn from_bits(bits: u16) -> Self {
        KeyUsage(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    /// True when every bit of `other` is set.
    pub const fn contains(self, other: KeyUsage) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for KeyUsage {
    type Output = KeyUsage;

    fn bitor(self, rhs: KeyUsage) -> KeyUsage {
        KeyUsage(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oneline_escapes_separators() {
        let dn = DistinguishedName {
            components: vec![
                ("O".into(), "Acme, Inc.".into()),
                ("CN".into(), "a=b".into()),
            ],
        };
        assert_eq!(dn.to_oneline(), "O = Acme\\, Inc., CN = a\\=b");
        assert_eq!(dn.get("CN"), Some("a=b"));
        assert_eq!(dn.get("OU"), None);
    }

    #[test]
    fn key_usage_bits() {
        let ku = KeyUsage::CERT_SIGN | KeyUsage::CRL_SIGN;
        assert!(ku.contains(KeyUsage::CERT_SIGN));
        assert!(ku.contains(KeyUsage::CERT_SIGN | KeyUsage::CRL_SIGN));
        assert!(!ku.contains(KeyUsage::DIGITAL_SIGNATURE));
        assert_eq!(ku.bits(), 0x60);
        assert!(KeyUsage::default().is_empty());
    }
}
