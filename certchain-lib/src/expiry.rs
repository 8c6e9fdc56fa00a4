//! Expiration and lifespan arithmetic.
//!
//! Every public function samples the current time itself. Day counts are
//! truncated toward zero so that remaining time is never over-reported:
//! a certificate with 1.9 days left is reported as having 1.

use crate::fields::Certificate;
use crate::position::{classify, ChainPosition};
use crate::util;
use crate::CertchainError;
use num_bigint::{BigInt, Sign};
use serde::Serialize;
use time::OffsetDateTime;

/// Monitoring service state labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ServiceState {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "WARNING")]
    Warning,
    #[serde(rename = "CRITICAL")]
    Critical,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl ServiceState {
    pub fn label(self) -> &'static str {
        match self {
            ServiceState::Ok => "OK",
            ServiceState::Warning => "WARNING",
            ServiceState::Critical => "CRITICAL",
            ServiceState::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Bracketed status label that prefixes [`expiration_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpirationLabel {
    ExpiredIgnored,
    Expired,
    ExpiringIgnored,
    Critical,
    Warning,
    Ok,
}

impl ExpirationLabel {
    pub fn label(self) -> &'static str {
        match self {
            ExpirationLabel::ExpiredIgnored => "[EXPIRED, IGNORED]",
            ExpirationLabel::Expired => "[EXPIRED]",
            ExpirationLabel::ExpiringIgnored => "[EXPIRING, IGNORED]",
            ExpirationLabel::Critical => "[CRITICAL]",
            ExpirationLabel::Warning => "[WARNING]",
            ExpirationLabel::Ok => "[OK]",
        }
    }
}

impl std::fmt::Display for ExpirationLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

fn require<'a>(
    cert: Option<&'a Certificate>,
    operation: &'static str,
) -> Result<&'a Certificate, CertchainError> {
    cert.ok_or(CertchainError::MissingValue(operation))
}

/// Whole days between `not_before` and `not_after`, truncated.
///
/// A certificate valid for 36 hours has a maximum lifespan of 1 day.
pub fn max_lifespan_days<'a>(
    cert: impl Into<Option<&'a Certificate>>,
) -> Result<i64, CertchainError> {
    let cert = require(cert.into(), "max_lifespan_days: unable to determine expiration")?;
    Ok(lifespan_days(cert))
}

fn lifespan_days(cert: &Certificate) -> i64 {
    (cert.not_after - cert.not_before).whole_days()
}

/// Whether `not_after` is already in the past.
pub fn is_expired(cert: &Certificate) -> bool {
    is_expired_at(cert, OffsetDateTime::now_utc())
}

pub(crate) fn is_expired_at(cert: &Certificate, now: OffsetDateTime) -> bool {
    cert.not_after < now
}

/// Whole days until expiration, truncated toward zero; negative once expired.
pub fn expires_in_days<'a>(
    cert: impl Into<Option<&'a Certificate>>,
) -> Result<i64, CertchainError> {
    let cert = require(cert.into(), "expires_in_days: unable to determine expiration")?;
    Ok(expires_in_days_at(cert, OffsetDateTime::now_utc()))
}

pub(crate) fn expires_in_days_at(cert: &Certificate, now: OffsetDateTime) -> i64 {
    (cert.not_after - now).whole_days()
}

/// Days until expiration, floored to two decimal places.
pub fn expires_in_days_precise<'a>(
    cert: impl Into<Option<&'a Certificate>>,
) -> Result<f64, CertchainError> {
    let cert = require(
        cert.into(),
        "expires_in_days_precise: unable to determine expiration",
    )?;
    Ok(expires_in_days_precise_at(cert, OffsetDateTime::now_utc()))
}

pub(crate) fn expires_in_days_precise_at(cert: &Certificate, now: OffsetDateTime) -> f64 {
    let days = (cert.not_after - now).as_seconds_f64() / 86_400.0;
    (days * 100.0).floor() / 100.0
}

/// Remaining lifetime as a percentage of the maximum lifespan.
///
/// `0.0` once expired. Not clamped to 100.
pub fn life_remaining_percent<'a>(
    cert: impl Into<Option<&'a Certificate>>,
) -> Result<f64, CertchainError> {
    let cert = require(
        cert.into(),
        "life_remaining_percent: unable to determine expiration",
    )?;
    Ok(life_remaining_percent_at(cert, OffsetDateTime::now_utc()))
}

pub(crate) fn life_remaining_percent_at(cert: &Certificate, now: OffsetDateTime) -> f64 {
    if is_expired_at(cert, now) {
        return 0.0;
    }

    let max_days = lifespan_days(cert);
    // Certificates valid for less than a day have no whole-day lifespan.
    if max_days == 0 {
        return 0.0;
    }

    expires_in_days_at(cert, now) as f64 / max_days as f64 * 100.0
}

/// [`life_remaining_percent`] truncated to an integer.
pub fn life_remaining_percent_truncated<'a>(
    cert: impl Into<Option<&'a Certificate>>,
) -> Result<i64, CertchainError> {
    let cert = require(
        cert.into(),
        "life_remaining_percent_truncated: unable to determine expiration",
    )?;
    Ok(life_remaining_percent_truncated_at(cert, OffsetDateTime::now_utc()))
}

pub(crate) fn life_remaining_percent_truncated_at(cert: &Certificate, now: OffsetDateTime) -> i64 {
    life_remaining_percent_at(cert, now).trunc() as i64
}

/// Time until (or since) `expire_time` in whole days and hours.
///
/// Examples: `"367d 3h remaining"`, `"3h remaining"`, `"3h ago"`.
pub fn format_expiration(expire_time: OffsetDateTime) -> String {
    format_expiration_at(expire_time, OffsetDateTime::now_utc())
}

pub(crate) fn format_expiration_at(expire_time: OffsetDateTime, now: OffsetDateTime) -> String {
    let remaining = expire_time - now;
    let expired = remaining.is_negative();
    let remaining = remaining.abs();

    let days = remaining.whole_days();
    let hours = remaining.whole_hours() - days * 24;

    let span = if days > 0 {
        format!("{}d {}h", days, hours)
    } else {
        format!("{}h", hours)
    };

    if expired {
        format!("{} ago", span)
    } else {
        format!("{} remaining", span)
    }
}

/// Status label for `cert` against the CRITICAL and WARNING thresholds.
///
/// Checked in order: expired, before `age_critical`, before `age_warning`.
/// With `ignore_expiration` the expired and expiring states are marked as
/// ignored instead of raised.
pub fn expiration_label(
    cert: &Certificate,
    age_critical: OffsetDateTime,
    age_warning: OffsetDateTime,
    ignore_expiration: bool,
) -> ExpirationLabel {
    expiration_label_at(
        cert,
        age_critical,
        age_warning,
        ignore_expiration,
        OffsetDateTime::now_utc(),
    )
}

pub(crate) fn expiration_label_at(
    cert: &Certificate,
    age_critical: OffsetDateTime,
    age_warning: OffsetDateTime,
    ignore_expiration: bool,
    now: OffsetDateTime,
) -> ExpirationLabel {
    let not_after = cert.not_after;
    match () {
        _ if not_after < now && ignore_expiration => ExpirationLabel::ExpiredIgnored,
        _ if not_after < now => ExpirationLabel::Expired,
        _ if not_after < age_critical && ignore_expiration => ExpirationLabel::ExpiringIgnored,
        _ if not_after < age_critical => ExpirationLabel::Critical,
        _ if not_after < age_warning && ignore_expiration => ExpirationLabel::ExpiringIgnored,
        _ if not_after < age_warning => ExpirationLabel::Warning,
        _ => ExpirationLabel::Ok,
    }
}

/// Human-readable expiration summary, e.g. `"[WARNING] 20d 4h remaining (5%)"`.
pub fn expiration_status(
    cert: &Certificate,
    age_critical: OffsetDateTime,
    age_warning: OffsetDateTime,
    ignore_expiration: bool,
) -> String {
    expiration_status_at(
        cert,
        age_critical,
        age_warning,
        ignore_expiration,
        OffsetDateTime::now_utc(),
    )
}

pub(crate) fn expiration_status_at(
    cert: &Certificate,
    age_critical: OffsetDateTime,
    age_warning: OffsetDateTime,
    ignore_expiration: bool,
    now: OffsetDateTime,
) -> String {
    let label = expiration_label_at(cert, age_critical, age_warning, ignore_expiration, now);
    format!(
        "{} {} ({}%)",
        label,
        format_expiration_at(cert.not_after, now),
        life_remaining_percent_truncated_at(cert, now)
    )
}

/// Whether any certificate that has not yet expired expires before either
/// threshold.
pub fn has_expiring(
    chain: &[Certificate],
    age_critical: OffsetDateTime,
    age_warning: OffsetDateTime,
) -> bool {
    has_expiring_at(chain, age_critical, age_warning, OffsetDateTime::now_utc())
}

pub(crate) fn has_expiring_at(
    chain: &[Certificate],
    age_critical: OffsetDateTime,
    age_warning: OffsetDateTime,
    now: OffsetDateTime,
) -> bool {
    chain.iter().any(|cert| {
        !is_expired_at(cert, now) && (cert.not_after < age_critical || cert.not_after < age_warning)
    })
}

/// Whether any certificate in the chain has expired.
pub fn has_expired(chain: &[Certificate]) -> bool {
    has_expired_at(chain, OffsetDateTime::now_utc())
}

pub(crate) fn has_expired_at(chain: &[Certificate], now: OffsetDateTime) -> bool {
    chain.iter().any(|cert| is_expired_at(cert, now))
}

/// Whether `cert` is signed with an MD2, MD5 or SHA-1 based algorithm.
///
/// Root certificates are trusted by identity rather than by their signature,
/// so they are only evaluated when `eval_root` is set.
pub fn has_weak_signature_algorithm(
    cert: &Certificate,
    chain: &[Certificate],
    eval_root: bool,
) -> bool {
    if classify(cert, chain) == ChainPosition::Root && !eval_root {
        return false;
    }

    cert.signature_algorithm.is_weak()
}

/// Format a serial number the way OpenSSL prints it: colon-separated
/// uppercase hex bytes, e.g. `DE:FD:50:2B:C5:7F:79:F4`.
///
/// Negative serials are formatted from their magnitude and prefixed with `-`.
/// A zero serial formats as `00` rather than an empty string.
pub fn format_serial_number(serial: &BigInt) -> String {
    let (sign, magnitude) = serial.to_bytes_be();
    let formatted = util::hex_colon_upper(&magnitude);

    if sign == Sign::Minus {
        format!("-{}", formatted)
    } else {
        formatted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::SignatureAlgorithm;
    use crate::fields::{DistinguishedName, PublicKey};
    use time::macros::datetime;
    use time::Duration;

    const NOW: OffsetDateTime = datetime!(2024-06-01 12:00 UTC);

    fn cert_valid(not_before: OffsetDateTime, not_after: OffsetDateTime) -> Certificate {
        Certificate {
            version: 3,
            serial: 1.into(),
            signature_algorithm: SignatureAlgorithm::Sha256WithRsa,
            issuer: DistinguishedName::default(),
            subject: DistinguishedName::default(),
            not_before,
            not_after,
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
    fn lifespan_truncates_down() {
        let cert = cert_valid(NOW, NOW + Duration::hours(36));
        assert_eq!(max_lifespan_days(&cert).unwrap(), 1);

        let cert = cert_valid(NOW, NOW + Duration::hours(47) + Duration::minutes(59));
        assert_eq!(max_lifespan_days(&cert).unwrap(), 1);
    }

    #[test]
    fn absent_certificate_is_missing_value() {
        assert!(matches!(
            max_lifespan_days(None::<&Certificate>),
            Err(CertchainError::MissingValue(_))
        ));
        assert!(matches!(
            expires_in_days(None::<&Certificate>),
            Err(CertchainError::MissingValue(_))
        ));
        assert!(matches!(
            expires_in_days_precise(None::<&Certificate>),
            Err(CertchainError::MissingValue(_))
        ));
        assert!(matches!(
            life_remaining_percent(None::<&Certificate>),
            Err(CertchainError::MissingValue(_))
        ));
        assert!(matches!(
            life_remaining_percent_truncated(None::<&Certificate>),
            Err(CertchainError::MissingValue(_))
        ));
    }

    #[test]
    fn expires_in_days_truncates_toward_zero() {
        let future = cert_valid(NOW, NOW + Duration::hours(60));
        assert_eq!(expires_in_days_at(&future, NOW), 2);

        let past = cert_valid(NOW - Duration::days(10), NOW - Duration::hours(60));
        assert_eq!(expires_in_days_at(&past, NOW), -2);
    }

    #[test]
    fn precise_days_floor_to_two_decimals() {
        let cert = cert_valid(NOW, NOW + Duration::hours(60) + Duration::minutes(7));
        // 60h07m = 2.50486.. days
        assert_eq!(expires_in_days_precise_at(&cert, NOW), 2.50);

        let past = cert_valid(NOW - Duration::days(10), NOW - Duration::hours(12));
        assert_eq!(expires_in_days_precise_at(&past, NOW), -0.5);

        let barely_past = cert_valid(NOW - Duration::days(10), NOW - Duration::minutes(1));
        assert_eq!(expires_in_days_precise_at(&barely_past, NOW), -0.01);
    }

    #[test]
    fn precise_and_whole_days_agree() {
        for hours in [-500_i64, -49, -25, 25, 49, 500] {
            let not_after = NOW + Duration::hours(hours) + Duration::minutes(30);
            let cert = cert_valid(NOW - Duration::days(1000), not_after);
            let whole = expires_in_days_at(&cert, NOW);
            let precise = expires_in_days_precise_at(&cert, NOW);
            assert_eq!(precise.trunc() as i64, whole, "hours = {hours}");
            assert_eq!(precise.is_sign_negative(), whole < 0, "hours = {hours}");
        }
    }

    #[test]
    fn life_remaining() {
        let cert = cert_valid(NOW - Duration::days(75), NOW + Duration::days(25));
        assert_eq!(life_remaining_percent_at(&cert, NOW), 25.0);
        assert_eq!(life_remaining_percent_truncated_at(&cert, NOW), 25);

        let thirds = cert_valid(NOW - Duration::days(2), NOW + Duration::days(1));
        assert_eq!(life_remaining_percent_truncated_at(&thirds, NOW), 33);

        let expired = cert_valid(NOW - Duration::days(75), NOW - Duration::days(1));
        assert_eq!(life_remaining_percent_at(&expired, NOW), 0.0);
        assert_eq!(life_remaining_percent_truncated_at(&expired, NOW), 0);

        let short = cert_valid(NOW - Duration::hours(2), NOW + Duration::hours(2));
        assert_eq!(life_remaining_percent_at(&short, NOW), 0.0);
    }

    #[test]
    fn life_remaining_is_not_clamped() {
        // not_before in the future: remaining exceeds the lifespan
        let cert = cert_valid(NOW + Duration::days(10), NOW + Duration::days(20));
        assert_eq!(life_remaining_percent_at(&cert, NOW), 200.0);
    }

    #[test]
    fn formatted_expiration() {
        assert_eq!(
            format_expiration_at(NOW + Duration::hours(25), NOW),
            "1d 1h remaining"
        );
        assert_eq!(
            format_expiration_at(NOW + Duration::hours(3), NOW),
            "3h remaining"
        );
        assert_eq!(format_expiration_at(NOW - Duration::hours(3), NOW), "3h ago");
        assert_eq!(
            format_expiration_at(NOW + Duration::days(367) + Duration::hours(3), NOW),
            "367d 3h remaining"
        );
        assert_eq!(
            format_expiration_at(NOW - Duration::hours(49) - Duration::minutes(59), NOW),
            "2d 1h ago"
        );
        assert_eq!(format_expiration_at(NOW, NOW), "0h remaining");
    }

    #[test]
    fn label_priority() {
        let age_critical = NOW + Duration::days(15);
        let age_warning = NOW + Duration::days(30);
        let label = |not_after, ignore| {
            let cert = cert_valid(NOW - Duration::days(365), not_after);
            expiration_label_at(&cert, age_critical, age_warning, ignore, NOW)
        };

        let expired = NOW - Duration::days(1);
        let critical = NOW + Duration::days(10);
        let warning = NOW + Duration::days(20);
        let ok = NOW + Duration::days(90);

        assert_eq!(label(expired, true), ExpirationLabel::ExpiredIgnored);
        assert_eq!(label(expired, false), ExpirationLabel::Expired);
        assert_eq!(label(critical, true), ExpirationLabel::ExpiringIgnored);
        assert_eq!(label(critical, false), ExpirationLabel::Critical);
        assert_eq!(label(warning, true), ExpirationLabel::ExpiringIgnored);
        assert_eq!(label(warning, false), ExpirationLabel::Warning);
        assert_eq!(label(ok, true), ExpirationLabel::Ok);
        assert_eq!(label(ok, false), ExpirationLabel::Ok);
    }

    #[test]
    fn status_string() {
        let cert = cert_valid(
            NOW - Duration::days(80),
            NOW + Duration::days(20) + Duration::hours(4),
        );
        let status = expiration_status_at(
            &cert,
            NOW + Duration::days(15),
            NOW + Duration::days(30),
            false,
            NOW,
        );
        assert_eq!(status, "[WARNING] 20d 4h remaining (20%)");

        let ignored = expiration_status_at(
            &cert,
            NOW + Duration::days(15),
            NOW + Duration::days(30),
            true,
            NOW,
        );
        assert!(ignored.starts_with("[EXPIRING, IGNORED] 20d 4h remaining"));

        let expired = cert_valid(NOW - Duration::days(80), NOW - Duration::hours(3));
        let status = expiration_status_at(
            &expired,
            NOW + Duration::days(15),
            NOW + Duration::days(30),
            false,
            NOW,
        );
        assert_eq!(status, "[EXPIRED] 3h ago (0%)");
    }

    #[test]
    fn serial_numbers() {
        let serial = BigInt::from(0xDEFD_502B_C57F_79F4_u64);
        assert_eq!(format_serial_number(&serial), "DE:FD:50:2B:C5:7F:79:F4");
        assert_eq!(format_serial_number(&-serial), "-DE:FD:50:2B:C5:7F:79:F4");
        assert_eq!(format_serial_number(&BigInt::from(0x0102)), "01:02");
        assert_eq!(format_serial_number(&BigInt::from(0)), "00");
    }

    #[test]
    fn expiring_and_expired_chains() {
        let now = OffsetDateTime::now_utc();
        let fresh = cert_valid(now - Duration::days(1), now + Duration::days(365));
        let soon = cert_valid(now - Duration::days(1), now + Duration::days(20));
        let gone = cert_valid(now - Duration::days(30), now - Duration::days(1));
        let age_critical = now + Duration::days(15);
        let age_warning = now + Duration::days(30);

        assert!(!has_expiring(&[fresh.clone()], age_critical, age_warning));
        assert!(has_expiring(&[fresh.clone(), soon], age_critical, age_warning));
        assert!(!has_expiring(&[gone.clone()], age_critical, age_warning));

        assert!(!has_expired(&[fresh.clone()]));
        assert!(has_expired(&[fresh, gone]));
        assert!(!has_expired(&[]));
    }
}
