//! Business-day SLA targets and compliance classification.
//!
//! Everything here is pure apart from [`classify_compliance`], which reads the
//! wall clock. Callers that need a stable answer pass their own `now` to
//! [`classify_compliance_at`].

use chrono::{Datelike, Duration, NaiveDateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{TrackerError, TrackerResult};

pub const DEFAULT_SLA_WORKDAYS: i32 = 5;
pub const DEFAULT_WARNING_DAYS: i64 = 2;
/// Roughly two years of business days.
pub const MAX_SLA_WORKDAYS: i32 = 520;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlaStatus {
    Safe,
    Warning,
    Breached,
    Completed,
}

/// How raw SLA input is turned into a business-day count and how close to the
/// target a record may get before it is flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlaPolicy {
    pub default_workdays: i32,
    pub warning_days: i64,
    pub max_workdays: i32,
}

impl Default for SlaPolicy {
    fn default() -> Self {
        Self {
            default_workdays: DEFAULT_SLA_WORKDAYS,
            warning_days: DEFAULT_WARNING_DAYS,
            max_workdays: MAX_SLA_WORKDAYS,
        }
    }
}

impl SlaPolicy {
    /// Missing, non-numeric and non-positive values all fall back to
    /// `default_workdays`. A count above `max_workdays` is rejected.
    pub fn resolve_workdays(&self, raw: Option<&str>) -> TrackerResult<i32> {
        let parsed = raw
            .map(str::trim)
            .and_then(|value| value.parse::<i64>().ok());
        self.resolve_workdays_value(parsed)
    }

    /// Same rules as [`SlaPolicy::resolve_workdays`] for already-typed input.
    pub fn resolve_workdays_value(&self, value: Option<i64>) -> TrackerResult<i32> {
        match value.filter(|days| *days > 0) {
            None => Ok(self.default_workdays),
            Some(days) if days > i64::from(self.max_workdays) => {
                Err(TrackerError::validation(format!(
                    "SLA duration must be at most {} business days",
                    self.max_workdays
                )))
            }
            Some(days) => i32::try_from(days).map_err(|_| {
                TrackerError::validation("SLA duration is out of range")
            }),
        }
    }

    pub fn classify(&self, target: NaiveDateTime, is_completed: bool) -> SlaStatus {
        self.classify_at(target, is_completed, Utc::now().naive_utc())
    }

    /// Any target before `now` is Breached, even one less than a day past.
    /// This departs from a `ceil(remaining days) < 0` rule, which would still
    /// report Warning there.
    pub fn classify_at(
        &self,
        target: NaiveDateTime,
        is_completed: bool,
        now: NaiveDateTime,
    ) -> SlaStatus {
        if is_completed {
            return SlaStatus::Completed;
        }
        if target < now {
            return SlaStatus::Breached;
        }

        let remaining_ms = (target - now).num_milliseconds();
        let remaining_days = (remaining_ms + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY;
        if remaining_days <= self.warning_days {
            SlaStatus::Warning
        } else {
            SlaStatus::Safe
        }
    }
}

fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}

/// Walks forward from `start` one calendar day at a time until
/// `business_days` weekdays have been counted. The start day never counts.
///
/// A non-positive count returns `start` unchanged. Running past the end of
/// the representable calendar is a validation error.
pub fn compute_target(start: NaiveDateTime, business_days: i32) -> TrackerResult<NaiveDateTime> {
    if business_days <= 0 {
        warn!(
            business_days,
            start = %start,
            "non-positive SLA duration, target equals start date"
        );
        return Ok(start);
    }

    let mut target = start;
    let mut counted = 0;
    while counted < business_days {
        target = target
            .checked_add_signed(Duration::days(1))
            .ok_or_else(|| TrackerError::validation("SLA target date is out of range"))?;
        if !is_weekend(target.weekday()) {
            counted += 1;
        }
    }
    Ok(target)
}

pub fn classify_compliance(target: NaiveDateTime, is_completed: bool) -> SlaStatus {
    SlaPolicy::default().classify(target, is_completed)
}

pub fn classify_compliance_at(
    target: NaiveDateTime,
    is_completed: bool,
    now: NaiveDateTime,
) -> SlaStatus {
    SlaPolicy::default().classify_at(target, is_completed, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn monday_plus_five_lands_on_next_monday() {
        assert_eq!(compute_target(day(2026, 2, 16), 5).unwrap(), day(2026, 2, 23));
    }

    #[test]
    fn friday_plus_one_skips_weekend() {
        assert_eq!(compute_target(day(2026, 2, 20), 1).unwrap(), day(2026, 2, 23));
    }

    #[test]
    fn weekend_start_is_not_counted() {
        assert_eq!(compute_target(day(2026, 2, 21), 1).unwrap(), day(2026, 2, 23));
        assert_eq!(compute_target(day(2026, 2, 22), 1).unwrap(), day(2026, 2, 23));
    }

    #[test]
    fn keeps_time_of_day() {
        let start = NaiveDate::from_ymd_opt(2026, 2, 16)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        let target = compute_target(start, 2).unwrap();
        assert_eq!(target.date(), NaiveDate::from_ymd_opt(2026, 2, 18).unwrap());
        assert_eq!(target.time(), start.time());
    }

    #[test]
    fn non_positive_duration_returns_start() {
        let start = day(2026, 2, 16);
        assert_eq!(compute_target(start, 0).unwrap(), start);
        assert_eq!(compute_target(start, -4).unwrap(), start);
    }

    #[test]
    fn target_is_after_start_weekday_and_counts_match() {
        let first = day(2026, 1, 1);
        for offset in 0..21 {
            let start = first + Duration::days(offset);
            for n in 1..=15 {
                let target = compute_target(start, n).unwrap();
                assert!(target > start);
                assert!(!is_weekend(target.weekday()), "{start} + {n} -> {target}");

                let mut weekdays = 0;
                let mut cursor = start;
                while cursor < target {
                    cursor += Duration::days(1);
                    if !is_weekend(cursor.weekday()) {
                        weekdays += 1;
                    }
                }
                assert_eq!(weekdays, n);
            }
        }
    }

    #[test]
    fn completed_overrides_dates() {
        let now = day(2026, 2, 16);
        assert_eq!(
            classify_compliance_at(day(2020, 1, 1), true, now),
            SlaStatus::Completed
        );
        assert_eq!(
            classify_compliance_at(day(2030, 1, 1), true, now),
            SlaStatus::Completed
        );
    }

    #[test]
    fn classifies_relative_to_now() {
        let now = day(2026, 2, 16);
        assert_eq!(
            classify_compliance_at(day(2026, 2, 18), false, now),
            SlaStatus::Warning
        );
        assert_eq!(
            classify_compliance_at(day(2026, 2, 10), false, now),
            SlaStatus::Breached
        );
        assert_eq!(
            classify_compliance_at(day(2026, 2, 25), false, now),
            SlaStatus::Safe
        );
    }

    #[test]
    fn boundaries_of_warning_window() {
        let now = day(2026, 2, 16);
        assert_eq!(classify_compliance_at(now, false, now), SlaStatus::Warning);
        assert_eq!(
            classify_compliance_at(now - Duration::seconds(1), false, now),
            SlaStatus::Breached
        );
        assert_eq!(
            classify_compliance_at(now + Duration::days(2), false, now),
            SlaStatus::Warning
        );
        assert_eq!(
            classify_compliance_at(now + Duration::days(2) + Duration::seconds(1), false, now),
            SlaStatus::Safe
        );
    }

    #[test]
    fn policy_falls_back_to_default_workdays() {
        let policy = SlaPolicy::default();
        assert_eq!(policy.resolve_workdays(None).unwrap(), 5);
        assert_eq!(policy.resolve_workdays(Some("")).unwrap(), 5);
        assert_eq!(policy.resolve_workdays(Some("abc")).unwrap(), 5);
        assert_eq!(policy.resolve_workdays(Some("0")).unwrap(), 5);
        assert_eq!(policy.resolve_workdays(Some("-3")).unwrap(), 5);
        assert_eq!(policy.resolve_workdays(Some(" 8 ")).unwrap(), 8);
        assert_eq!(policy.resolve_workdays_value(Some(10)).unwrap(), 10);
        assert_eq!(policy.resolve_workdays_value(None).unwrap(), 5);
    }

    #[test]
    fn durations_above_the_cap_are_rejected() {
        let policy = SlaPolicy::default();
        assert_eq!(
            policy.resolve_workdays_value(Some(i64::from(MAX_SLA_WORKDAYS))).unwrap(),
            MAX_SLA_WORKDAYS
        );
        assert!(matches!(
            policy.resolve_workdays_value(Some(i64::from(MAX_SLA_WORKDAYS) + 1)),
            Err(TrackerError::Validation(_))
        ));
        assert!(matches!(
            policy.resolve_workdays(Some("200000000")),
            Err(TrackerError::Validation(_))
        ));
        assert!(policy.resolve_workdays_value(Some(i64::MAX)).is_err());
    }

    #[test]
    fn target_past_calendar_end_is_an_error() {
        let start = NaiveDate::MAX.and_hms_opt(0, 0, 0).unwrap();
        assert!(matches!(
            compute_target(start, 10),
            Err(TrackerError::Validation(_))
        ));
    }

    #[test]
    fn cap_keeps_targets_within_range() {
        let target = compute_target(day(2026, 2, 16), MAX_SLA_WORKDAYS).unwrap();
        assert_eq!(target.date(), NaiveDate::from_ymd_opt(2028, 2, 14).unwrap());
    }

    #[test]
    fn custom_warning_window() {
        let policy = SlaPolicy {
            default_workdays: 3,
            warning_days: 5,
            ..SlaPolicy::default()
        };
        let now = day(2026, 2, 16);
        assert_eq!(
            policy.classify_at(day(2026, 2, 20), false, now),
            SlaStatus::Warning
        );
        assert_eq!(policy.resolve_workdays(None).unwrap(), 3);
    }
}
