//! Expiration thresholds and report options.

use crate::CertchainError;
use serde::Serialize;
use time::{Duration, OffsetDateTime};

/// Days before expiration at which a certificate is CRITICAL or WARNING.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExpirationThresholds {
    pub critical_days: i64,
    pub warning_days: i64,
}

impl Default for ExpirationThresholds {
    fn default() -> Self {
        ExpirationThresholds {
            critical_days: 15,
            warning_days: 30,
        }
    }
}

impl ExpirationThresholds {
    pub fn new(critical_days: i64, warning_days: i64) -> Result<Self, CertchainError> {
        let thresholds = ExpirationThresholds {
            critical_days,
            warning_days,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Thresholds must be non-negative and CRITICAL may not exceed WARNING.
    pub fn validate(&self) -> Result<(), CertchainError> {
        if self.critical_days < 0 || self.warning_days < 0 {
            return Err(CertchainError::InvalidConfig(format!(
                "thresholds must not be negative (critical {}, warning {})",
                self.critical_days, self.warning_days
            )));
        }
        if self.critical_days > self.warning_days {
            return Err(CertchainError::InvalidConfig(format!(
                "critical threshold ({} days) is later than warning threshold ({} days)",
                self.critical_days, self.warning_days
            )));
        }
        Ok(())
    }

    /// Point in time that marks the CRITICAL threshold.
    pub fn age_critical(&self) -> OffsetDateTime {
        self.age_critical_from(OffsetDateTime::now_utc())
    }

    /// Point in time that marks the WARNING threshold.
    pub fn age_warning(&self) -> OffsetDateTime {
        self.age_warning_from(OffsetDateTime::now_utc())
    }

    pub(crate) fn age_critical_from(&self, now: OffsetDateTime) -> OffsetDateTime {
        now + Duration::days(self.critical_days)
    }

    pub(crate) fn age_warning_from(&self, now: OffsetDateTime) -> OffsetDateTime {
        now + Duration::days(self.warning_days)
    }
}

/// Options for building a [`crate::ChainReport`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportOptions {
    pub thresholds: ExpirationThresholds,
    /// Report expired and expiring certificates as ignored.
    pub ignore_expiration: bool,
    /// Evaluate root certificates for weak signature algorithms.
    pub eval_root: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn defaults() {
        let thresholds = ExpirationThresholds::default();
        assert_eq!(thresholds.critical_days, 15);
        assert_eq!(thresholds.warning_days, 30);
        assert!(thresholds.validate().is_ok());
    }

    #[test]
    fn critical_after_warning_is_rejected() {
        let err = ExpirationThresholds::new(40, 30).unwrap_err();
        assert!(matches!(err, CertchainError::InvalidConfig(_)));
        assert!(ExpirationThresholds::new(-1, 30).is_err());
        assert!(ExpirationThresholds::new(30, 30).is_ok());
    }

    #[test]
    fn ages_are_relative_to_now() {
        let now = datetime!(2024-01-01 0:00 UTC);
        let thresholds = ExpirationThresholds::default();
        assert_eq!(
            thresholds.age_critical_from(now),
            datetime!(2024-01-16 0:00 UTC)
        );
        assert_eq!(
            thresholds.age_warning_from(now),
            datetime!(2024-01-31 0:00 UTC)
        );
    }
}
