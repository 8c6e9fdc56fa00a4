//! certchain-lib: chain position classification and expiration arithmetic
//! for X.509 certificate chains.
//!
//! Given a leaf-first chain, the library decides which certificates are
//! leaves, intermediates and roots, detects self-signed certificates by
//! verifying their signatures (including MD5, SHA-1 and ECDSA-SHA1 signatures
//! that current verifiers refuse), and computes expiration and lifespan
//! figures for monitoring.
//!
//! Signature checks here are used to tell roles apart. They do not validate
//! a chain of trust.

mod algorithm;
mod config;
mod expiry;
mod fields;
mod oid;
mod parser;
mod position;
mod report;
mod util;
pub mod verify;

pub use algorithm::SignatureAlgorithm;
pub use config::{ExpirationThresholds, ReportOptions};
pub use expiry::{
    expiration_label, expiration_status, expires_in_days, expires_in_days_precise,
    format_expiration, format_serial_number, has_expired, has_expiring,
    has_weak_signature_algorithm, is_expired, life_remaining_percent,
    life_remaining_percent_truncated, max_lifespan_days, ExpirationLabel, ServiceState,
};
pub use fields::{Certificate, DistinguishedName, EcCurve, KeyUsage, PublicKey};
pub use parser::{parse_cert, parse_chain, parse_der, parse_pem, parse_pem_chain};
pub use position::{
    classify, classify_at, count_intermediate, count_leaf, leaf_certs, non_root_certs,
    positions, root_certs, ChainPosition,
};
pub use report::{display_text, to_json, CertReport, ChainReport, ChainSummary};
pub use verify::{is_self_signed, verify_signature, SignatureFailure};

/// Errors returned by certchain-lib.
#[derive(Debug, thiserror::Error)]
pub enum CertchainError {
    #[error("missing expected value: {0}")]
    MissingValue(&'static str),

    #[error("signature verification failed: {0}")]
    SignatureVerificationFailed(#[from] SignatureFailure),

    #[error("failed to parse certificate: {0}")]
    ParseError(String),

    #[error("invalid PEM format: {0}")]
    PemError(String),

    #[error("invalid DER format: {0}")]
    DerError(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
