//! Certificate parsing from PEM and DER formats.

use crate::algorithm::SignatureAlgorithm;
use crate::fields::{Certificate, DistinguishedName, EcCurve, KeyUsage, PublicKey};
use crate::oid;
use crate::util;
use crate::CertchainError;
use num_bigint::BigInt;
use x509_parser::prelude::*;

/// Parse a certificate from PEM or DER (auto-detected).
///
/// If the input begins with `-----BEGIN` (after stripping whitespace), it is
/// treated as PEM. Otherwise it is treated as DER.
pub fn parse_cert(input: &[u8]) -> Result<Certificate, CertchainError> {
    if input.is_empty() {
        return Err(CertchainError::ParseError("empty input".into()));
    }

    if util::is_pem(input) {
        parse_pem(input)
    } else {
        parse_der(input)
    }
}

/// Parse a single certificate from PEM format.
pub fn parse_pem(input: &[u8]) -> Result<Certificate, CertchainError> {
    let (_, pem) = x509_parser::pem::parse_x509_pem(input)
        .map_err(|e| CertchainError::PemError(format!("{}", e)))?;

    if !is_certificate_label(&pem.label) {
        return Err(CertchainError::PemError(format!(
            "expected CERTIFICATE, got {}",
            pem.label
        )));
    }

    parse_der(&pem.contents)
}

/// Parse a certificate from DER format.
pub fn parse_der(input: &[u8]) -> Result<Certificate, CertchainError> {
    let (_, x509) = X509Certificate::from_der(input)
        .map_err(|e| CertchainError::DerError(format!("{}", e)))?;
    build_certificate(&x509)
}

/// Parse every certificate in a PEM bundle, preserving file order.
///
/// By convention the leaf comes first. Trailing garbage after at least one
/// certificate is ignored; an input with no certificates is an error.
pub fn parse_pem_chain(input: &[u8]) -> Result<Vec<Certificate>, CertchainError> {
    let mut certs = Vec::new();

    for pem_result in Pem::iter_from_buffer(input) {
        match pem_result {
            Ok(pem) => {
                if is_certificate_label(&pem.label) {
                    certs.push(parse_der(&pem.contents)?);
                }
            }
            Err(e) => {
                if !certs.is_empty() {
                    break;
                }
                return Err(CertchainError::PemError(format!(
                    "failed to parse PEM: {}",
                    e
                )));
            }
        }
    }

    if certs.is_empty() {
        return Err(CertchainError::PemError(
            "no certificates found in PEM input".into(),
        ));
    }

    Ok(certs)
}

/// Parse a leaf-first chain from PEM, or a single certificate from DER.
///
/// PEM is detected the same way as in [`parse_cert`].
pub fn parse_chain(input: &[u8]) -> Result<Vec<Certificate>, CertchainError> {
    if input.is_empty() {
        return Err(CertchainError::ParseError("empty input".into()));
    }

    if util::is_pem(input) {
        parse_pem_chain(input)
    } else {
        Ok(vec![parse_der(input)?])
    }
}

fn is_certificate_label(label: &str) -> bool {
    matches!(
        label,
        "CERTIFICATE" | "TRUSTED CERTIFICATE" | "X509 CERTIFICATE"
    )
}

/// Build a Certificate from a parsed X509Certificate.
fn build_certificate(x509: &X509Certificate) -> Result<Certificate, CertchainError> {
    let tbs = &x509.tbs_certificate;

    let raw_version = tbs.version.0;
    if raw_version > 2 {
        return Err(CertchainError::ParseError(format!(
            "unsupported X.509 version {} (expected v1, v2, or v3)",
            raw_version + 1
        )));
    }

    let mut key_usage = None;
    let mut ext_key_usage = None;
    let mut is_ca = false;
    for ext in tbs.extensions() {
        match ext.parsed_extension() {
            ParsedExtension::BasicConstraints(bc) => is_ca = bc.ca,
            ParsedExtension::KeyUsage(ku) => key_usage = Some(KeyUsage::from_bits(ku.flags)),
            ParsedExtension::ExtendedKeyUsage(eku) => ext_key_usage = eku_purposes(eku),
            _ => {}
        }
    }

    Ok(Certificate {
        version: raw_version + 1,
        serial: BigInt::from_signed_bytes_be(tbs.raw_serial()),
        signature_algorithm: SignatureAlgorithm::from_oid(
            &x509.signature_algorithm.algorithm.to_id_string(),
        ),
        issuer: build_dn(&tbs.issuer),
        subject: build_dn(&tbs.subject),
        not_before: tbs.validity.not_before.to_datetime(),
        not_after: tbs.validity.not_after.to_datetime(),
        public_key: build_public_key(&tbs.subject_pki)?,
        signature: x509.signature_value.data.to_vec(),
        raw_tbs: tbs.as_ref().to_vec(),
        key_usage,
        ext_key_usage,
        is_ca,
    })
}

pub(crate) fn build_dn(name: &X509Name) -> DistinguishedName {
    let mut components = Vec::new();
    for rdn in name.iter() {
        for attr in rdn.iter() {
            let key = util::oid_short_name(&attr.attr_type().to_id_string());
            let value = attr.as_str().unwrap_or("<binary>").to_string();
            components.push((key, value));
        }
    }
    DistinguishedName { components }
}

fn build_public_key(spki: &SubjectPublicKeyInfo) -> Result<PublicKey, CertchainError> {
    let oid_str = spki.algorithm.algorithm.to_id_string();

    let key = match oid_str.as_str() {
        oid::RSA_ENCRYPTION => match spki.parsed() {
            Ok(x509_parser::public_key::PublicKey::RSA(rsa)) => PublicKey::Rsa {
                modulus: rsa.modulus.to_vec(),
                exponent: rsa.exponent.to_vec(),
            },
            _ => {
                return Err(CertchainError::ParseError(
                    "malformed RSA public key".into(),
                ))
            }
        },
        oid::EC_PUBLIC_KEY => PublicKey::Ec {
            curve: extract_ec_curve(&spki.algorithm),
            point: spki.subject_public_key.data.to_vec(),
        },
        oid::ED25519 => PublicKey::Ed25519(spki.subject_public_key.data.to_vec()),
        _ => PublicKey::Other { algorithm: oid_str },
    };

    Ok(key)
}

fn extract_ec_curve(algo: &AlgorithmIdentifier) -> EcCurve {
    let curve_oid = algo
        .parameters
        .as_ref()
        .and_then(|params| params.as_oid().ok())
        .map(|oid| oid.to_id_string());

    match curve_oid.as_deref() {
        Some(oid::CURVE_P256) => EcCurve::P256,
        Some(oid::CURVE_P384) => EcCurve::P384,
        Some(oid::CURVE_P521) => EcCurve::P521,
        Some(other) => EcCurve::Other(other.to_string()),
        None => EcCurve::Other("unknown".into()),
    }
}

/// Recognised purposes of an Extended Key Usage extension.
///
/// Unrecognised OIDs are not purposes; an extension holding only those
/// yields `None`, the same as an absent extension.
fn eku_purposes(eku: &ExtendedKeyUsage) -> Option<Vec<String>> {
    let mut usages = Vec::new();
    if eku.any {
        usages.push("Any Extended Key Usage".into());
    }
    if eku.server_auth {
        usages.push("TLS Web Server Authentication".into());
    }
    if eku.client_auth {
        usages.push("TLS Web Client Authentication".into());
    }
    if eku.code_signing {
        usages.push("Code Signing".into());
    }
    if eku.email_protection {
        usages.push("E-mail Protection".into());
    }
    if eku.time_stamping {
        usages.push("Time Stamping".into());
    }
    if eku.ocsp_signing {
        usages.push("OCSP Signing".into());
    }
    usages.extend(
        eku.other
            .iter()
            .filter_map(|oid| named_eku_purpose(&oid.to_id_string())),
    );

    if usages.is_empty() {
        None
    } else {
        Some(usages)
    }
}

fn named_eku_purpose(oid_str: &str) -> Option<String> {
    let name = match oid_str {
        oid::EKU_IPSEC_END_SYSTEM => "IPSec End System",
        oid::EKU_IPSEC_TUNNEL => "IPSec Tunnel",
        oid::EKU_IPSEC_USER => "IPSec User",
        oid::EKU_MS_SERVER_GATED_CRYPTO => "Microsoft Server Gated Crypto",
        oid::EKU_NS_SERVER_GATED_CRYPTO => "Netscape Server Gated Crypto",
        oid::EKU_MS_COMMERCIAL_CODE_SIGNING => "Microsoft Commercial Code Signing",
        oid::EKU_MS_KERNEL_CODE_SIGNING => "Microsoft Kernel Code Signing",
        _ => return None,
    };
    Some(name.into())
}
