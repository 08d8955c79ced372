//! Loan renewal date rules

use chrono::{Duration, NaiveDate};
use thiserror::Error;

/// Latest due date a renewal may set, counted from today
pub const MAX_RENEWAL_DAYS: i64 = 28;

/// Due date suggested to the librarian, counted from today
pub const DEFAULT_RENEWAL_DAYS: i64 = 21;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum RenewalError {
    #[error("Invalid date - renewal in past")]
    PastDate,
    #[error("Invalid date - renewal more than 4 weeks ahead")]
    TooFarInFuture,
}

/// Check a proposed due date. Today itself is accepted.
pub fn validate_renewal(proposed: NaiveDate, today: NaiveDate) -> Result<NaiveDate, RenewalError> {
    if proposed < today {
        return Err(RenewalError::PastDate);
    }
    if proposed > today + Duration::days(MAX_RENEWAL_DAYS) {
        return Err(RenewalError::TooFarInFuture);
    }
    Ok(proposed)
}

pub fn default_renewal_date(today: NaiveDate) -> NaiveDate {
    today + Duration::days(DEFAULT_RENEWAL_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()
    }

    #[test]
    fn test_past_date() {
        let t = today();
        assert_eq!(validate_renewal(t - Duration::days(1), t), Err(RenewalError::PastDate));
        assert_eq!(validate_renewal(t - Duration::weeks(1), t), Err(RenewalError::PastDate));
    }

    #[test]
    fn test_today_is_accepted() {
        assert_eq!(validate_renewal(today(), today()), Ok(today()));
    }

    #[test]
    fn test_four_week_bound() {
        let t = today();
        let limit = t + Duration::days(28);
        assert_eq!(validate_renewal(limit, t), Ok(limit));
        assert_eq!(
            validate_renewal(limit + Duration::days(1), t),
            Err(RenewalError::TooFarInFuture)
        );
        assert_eq!(
            validate_renewal(t + Duration::weeks(5), t),
            Err(RenewalError::TooFarInFuture)
        );
    }

    #[test]
    fn test_dates_before_default_are_accepted() {
        let t = today();
        assert!(validate_renewal(t + Duration::days(2), t).is_ok());
        assert!(validate_renewal(t + Duration::weeks(2), t).is_ok());
    }

    #[test]
    fn test_default_is_three_weeks() {
        let t = today();
        assert_eq!(default_renewal_date(t), t + Duration::weeks(3));
        assert!(validate_renewal(default_renewal_date(t), t).is_ok());
    }

    #[test]
    fn test_bounds_across_year_end() {
        let t = NaiveDate::from_ymd_opt(2023, 12, 20).unwrap();
        assert!(validate_renewal(NaiveDate::from_ymd_opt(2024, 1, 17).unwrap(), t).is_ok());
        assert_eq!(
            validate_renewal(NaiveDate::from_ymd_opt(2024, 1, 18).unwrap(), t),
            Err(RenewalError::TooFarInFuture)
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(RenewalError::PastDate.to_string(), "Invalid date - renewal in past");
        assert_eq!(
            RenewalError::TooFarInFuture.to_string(),
            "Invalid date - renewal more than 4 weeks ahead"
        );
    }
}
