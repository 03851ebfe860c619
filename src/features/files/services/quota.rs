use crate::core::error::{AppError, Result};

/// Usage snapshot for one owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageInfo {
    pub used: i64,
    pub available: i64,
    pub total: i64,
}

/// Fixed per-owner ceiling on stored bytes
#[derive(Debug, Clone, Copy)]
pub struct QuotaPolicy {
    ceiling: i64,
}

impl QuotaPolicy {
    pub fn new(ceiling: i64) -> Self {
        Self { ceiling }
    }

    /// Registering `declared` more bytes on top of `used` must stay within the ceiling.
    pub fn check_registration(&self, used: i64, declared: i64) -> Result<()> {
        self.ensure_within(used.saturating_add(declared))
    }

    /// `used` already counts the row's `declared` size; the upload swaps it for `actual`.
    pub fn check_upload(&self, used: i64, declared: i64, actual: i64) -> Result<()> {
        self.ensure_within(used.saturating_sub(declared).saturating_add(actual))
    }

    pub fn storage_info(&self, used: i64) -> StorageInfo {
        StorageInfo {
            used,
            available: self.ceiling.saturating_sub(used).max(0),
            total: self.ceiling,
        }
    }

    fn ensure_within(&self, projected: i64) -> Result<()> {
        if projected > self.ceiling {
            return Err(AppError::QuotaExceeded(format!(
                "Storage quota exceeded: {} of {} bytes would be used",
                projected, self.ceiling
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_up_to_ceiling_is_allowed() {
        let quota = QuotaPolicy::new(1000);
        assert!(quota.check_registration(0, 1000).is_ok());
        assert!(quota.check_registration(400, 600).is_ok());
        assert!(matches!(
            quota.check_registration(400, 601),
            Err(AppError::QuotaExceeded(_))
        ));
    }

    #[test]
    fn test_upload_swaps_declared_for_actual() {
        let quota = QuotaPolicy::new(1000);
        // 900 used, of which 100 is the declared size of the file being uploaded
        assert!(quota.check_upload(900, 100, 200).is_ok());
        assert!(quota.check_upload(900, 100, 201).is_err());
        // Under-declaring does not get around the ceiling
        assert!(quota.check_upload(1000, 1, 5000).is_err());
    }

    #[test]
    fn test_storage_info_never_reports_negative_availability() {
        let quota = QuotaPolicy::new(1000);
        assert_eq!(
            quota.storage_info(250),
            StorageInfo {
                used: 250,
                available: 750,
                total: 1000
            }
        );
        assert_eq!(quota.storage_info(1500).available, 0);
    }

    #[test]
    fn test_overflow_is_rejected_not_wrapped() {
        let quota = QuotaPolicy::new(1000);
        assert!(quota.check_registration(i64::MAX, 1).is_err());
    }
}
