//! Chain report: per-certificate findings plus an overall service state,
//! rendered as text or JSON.

use crate::config::ReportOptions;
use crate::expiry::{
    expiration_status_at, expires_in_days_at, format_serial_number, has_expired_at,
    has_expiring_at, has_weak_signature_algorithm, is_expired_at,
    life_remaining_percent_truncated_at, ServiceState,
};
use crate::fields::{Certificate, PublicKey};
use crate::position::{classify_at, ChainPosition};
use crate::CertchainError;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::debug;

/// Findings for one certificate of a chain.
#[derive(Debug, Clone, Serialize)]
pub struct CertReport {
    pub index: usize,
    pub subject: String,
    pub issuer: String,
    pub serial: String,
    pub position: ChainPosition,
    pub key_type: String,
    pub signature_algorithm: String,
    pub weak_signature: bool,
    pub not_before: String,
    pub not_after: String,
    pub expiration_status: String,
    pub expires_in_days: i64,
    pub life_remaining_percent: i64,
}

/// Chain-wide counts and the resulting service state.
#[derive(Debug, Clone, Serialize)]
pub struct ChainSummary {
    pub total: usize,
    pub leaf_count: usize,
    pub intermediate_count: usize,
    pub root_count: usize,
    pub has_expired: bool,
    pub has_expiring: bool,
    pub state: ServiceState,
}

/// Report over a leaf-first chain.
#[derive(Debug, Clone, Serialize)]
pub struct ChainReport {
    pub certificates: Vec<CertReport>,
    pub summary: ChainSummary,
}

impl ChainReport {
    /// Build a report for `chain`, evaluated against the current time.
    pub fn build(chain: &[Certificate], options: &ReportOptions) -> Result<Self, CertchainError> {
        Self::build_at(chain, options, OffsetDateTime::now_utc())
    }

    pub(crate) fn build_at(
        chain: &[Certificate],
        options: &ReportOptions,
        now: OffsetDateTime,
    ) -> Result<Self, CertchainError> {
        options.thresholds.validate()?;

        let age_critical = options.thresholds.age_critical_from(now);
        let age_warning = options.thresholds.age_warning_from(now);

        let certificates: Vec<CertReport> = chain
            .iter()
            .enumerate()
            .map(|(index, cert)| CertReport {
                index,
                subject: cert.subject_string(),
                issuer: cert.issuer_string(),
                serial: format_serial_number(&cert.serial),
                position: classify_at(chain, index),
                key_type: key_type(&cert.public_key),
                signature_algorithm: cert.signature_algorithm.to_string(),
                weak_signature: has_weak_signature_algorithm(cert, chain, options.eval_root),
                not_before: format_time(cert.not_before),
                not_after: format_time(cert.not_after),
                expiration_status: expiration_status_at(
                    cert,
                    age_critical,
                    age_warning,
                    options.ignore_expiration,
                    now,
                ),
                expires_in_days: expires_in_days_at(cert, now),
                life_remaining_percent: life_remaining_percent_truncated_at(cert, now),
            })
            .collect();

        let count = |keep: fn(&ChainPosition) -> bool| {
            certificates.iter().filter(|c| keep(&c.position)).count()
        };

        let state = if chain.is_empty() {
            ServiceState::Unknown
        } else if options.ignore_expiration {
            ServiceState::Ok
        } else if chain
            .iter()
            .any(|cert| is_expired_at(cert, now) || cert.not_after < age_critical)
        {
            ServiceState::Critical
        } else if chain.iter().any(|cert| cert.not_after < age_warning) {
            ServiceState::Warning
        } else {
            ServiceState::Ok
        };

        let summary = ChainSummary {
            total: chain.len(),
            leaf_count: count(|p| p.is_leaf()),
            intermediate_count: count(|p| *p == ChainPosition::Intermediate),
            root_count: count(|p| *p == ChainPosition::Root),
            has_expired: has_expired_at(chain, now),
            has_expiring: has_expiring_at(chain, age_critical, age_warning, now),
            state,
        };
        debug!(
            total = summary.total,
            leaves = summary.leaf_count,
            intermediates = summary.intermediate_count,
            roots = summary.root_count,
            state = %summary.state,
            "built chain report"
        );

        Ok(ChainReport {
            certificates,
            summary,
        })
    }
}

fn key_type(key: &PublicKey) -> String {
    match key {
        PublicKey::Ec { curve, .. } => format!("{} ({})", key.algorithm(), curve),
        _ => key.algorithm().to_string(),
    }
}

fn format_time(t: OffsetDateTime) -> String {
    t.format(&Rfc3339)
        .unwrap_or_else(|_| t.unix_timestamp().to_string())
}

/// Format a chain report as human-readable text.
pub fn display_text(report: &ChainReport) -> String {
    let summary = &report.summary;
    let mut out = String::new();

    out.push_str(&format!(
        "Chain: {} certificate(s) ({} leaf, {} intermediate, {} root)\n",
        summary.total, summary.leaf_count, summary.intermediate_count, summary.root_count
    ));
    out.push_str(&format!("Status: {}\n", summary.state));

    for cert in &report.certificates {
        out.push('\n');
        out.push_str(&format!("[{}] {}\n", cert.index, cert.position));
        out.push_str(&format!("  Subject: {}\n", cert.subject));
        out.push_str(&format!("  Issuer: {}\n", cert.issuer));
        out.push_str(&format!("  Serial: {}\n", cert.serial));
        out.push_str(&format!("  Public Key: {}\n", cert.key_type));
        out.push_str(&format!("  Signature Algorithm: {}", cert.signature_algorithm));
        if cert.weak_signature {
            out.push_str(" [weak]");
        }
        out.push('\n');
        out.push_str("  Validity:\n");
        out.push_str(&format!("    Not Before: {}\n", cert.not_before));
        out.push_str(&format!("    Not After:  {}\n", cert.not_after));
        out.push_str(&format!("  Expiration: {}\n", cert.expiration_status));
    }

    out
}

/// Serialize a chain report to a pretty-printed JSON string.
pub fn to_json(report: &ChainReport) -> Result<String, CertchainError> {
    serde_json::to_string_pretty(report).map_err(CertchainError::Json)
}
