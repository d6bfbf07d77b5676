use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::settings::CreditTerms;
use crate::types::{EntryStatus, LedgerEntry};

/// classification of a debt entry at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// day-based lifecycle status; Paid overrides everything
    pub status: EntryStatus,
    /// reported in parallel whenever 0 < paid_amount < amount; it does
    /// not by itself clear Overdue
    pub partially_paid: bool,
    pub elapsed_days: i64,
    /// grace_period_days - elapsed_days; negative once overdue
    pub grace_remaining: i64,
}

/// derive the current lifecycle state of a Sell entry.
///
/// Elapsed time is measured from the transaction date, not the due date,
/// even when a due date is present. For paid entries the displayed
/// day-count is the span from date to paid_date.
pub fn classify(entry: &LedgerEntry, terms: &CreditTerms, now: DateTime<Utc>) -> Classification {
    let grace = terms.grace_period_days as i64;
    let partially_paid = entry.paid_amount.is_positive() && !entry.is_fully_paid();

    if entry.is_fully_paid() {
        let settled_at = entry.paid_date.unwrap_or(now);
        let elapsed_days = (settled_at - entry.date).num_days();
        return Classification {
            status: EntryStatus::Paid,
            partially_paid: false,
            elapsed_days,
            grace_remaining: grace - elapsed_days,
        };
    }

    let elapsed_days = (now - entry.date).num_days();
    let status = if elapsed_days <= grace {
        EntryStatus::Unpaid
    } else {
        EntryStatus::Overdue
    };

    Classification {
        status,
        partially_paid,
        elapsed_days,
        grace_remaining: grace - elapsed_days,
    }
}

impl Classification {
    /// the status worth persisting on the entry: the day-based status,
    /// except that a partial payment within grace reads as PartiallyPaid
    pub fn persisted_status(&self) -> EntryStatus {
        match self.status {
            EntryStatus::Unpaid if self.partially_paid => EntryStatus::PartiallyPaid,
            other => other,
        }
    }

    pub fn is_overdue(&self) -> bool {
        self.status == EntryStatus::Overdue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use hourglass_rs::{SafeTimeProvider, TimeSource};
    use chrono::TimeZone;
    use uuid::Uuid;

    use crate::decimal::Money;
    use crate::types::{EntryKind, TenantScope};

    fn test_clock() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ))
    }

    fn debt_at(amount: i64, date: DateTime<Utc>) -> LedgerEntry {
        let scope = TenantScope::new(Uuid::new_v4(), Uuid::new_v4());
        LedgerEntry::new(scope, EntryKind::Sell, Money::from_major(amount), "INR", date)
    }

    #[test]
    fn test_unpaid_within_grace() {
        let time = test_clock();
        let control = time.test_control().unwrap();
        let entry = debt_at(1_000, time.now());

        control.advance(Duration::days(10));
        let c = classify(&entry, &CreditTerms::default(), time.now());

        assert_eq!(c.status, EntryStatus::Unpaid);
        assert!(!c.partially_paid);
        assert_eq!(c.elapsed_days, 10);
        assert_eq!(c.grace_remaining, 20);
    }

    #[test]
    fn test_overdue_past_grace() {
        let time = test_clock();
        let control = time.test_control().unwrap();
        let entry = debt_at(1_000, time.now());

        control.advance(Duration::days(40));
        let c = classify(&entry, &CreditTerms::default(), time.now());

        assert_eq!(c.status, EntryStatus::Overdue);
        assert_eq!(c.elapsed_days, 40);
        assert_eq!(c.grace_remaining, -10);
    }

    #[test]
    fn test_boundary_day_is_still_unpaid() {
        // exactly at the grace period boundary interest is not yet due
        let time = test_clock();
        let control = time.test_control().unwrap();
        let entry = debt_at(1_000, time.now());

        control.advance(Duration::days(30));
        let c = classify(&entry, &CreditTerms::default(), time.now());

        assert_eq!(c.status, EntryStatus::Unpaid);
        assert_eq!(c.grace_remaining, 0);
    }

    #[test]
    fn test_partial_flag_reported_alongside_overdue() {
        let time = test_clock();
        let control = time.test_control().unwrap();
        let mut entry = debt_at(1_000, time.now());

        control.advance(Duration::days(45));
        entry.apply_settlement(Money::from_major(300), time.now());
        let c = classify(&entry, &CreditTerms::default(), time.now());

        // overdue and partially paid are not mutually exclusive
        assert_eq!(c.status, EntryStatus::Overdue);
        assert!(c.partially_paid);
        assert_eq!(c.persisted_status(), EntryStatus::Overdue);
    }

    #[test]
    fn test_partial_within_grace_persists_as_partially_paid() {
        let time = test_clock();
        let control = time.test_control().unwrap();
        let mut entry = debt_at(1_000, time.now());

        control.advance(Duration::days(5));
        entry.apply_settlement(Money::from_major(300), time.now());
        let c = classify(&entry, &CreditTerms::default(), time.now());

        assert_eq!(c.status, EntryStatus::Unpaid);
        assert!(c.partially_paid);
        assert_eq!(c.persisted_status(), EntryStatus::PartiallyPaid);
    }

    #[test]
    fn test_paid_entry_reports_settlement_span() {
        let time = test_clock();
        let control = time.test_control().unwrap();
        let mut entry = debt_at(1_000, time.now());

        control.advance(Duration::days(12));
        entry.apply_settlement(Money::from_major(1_000), time.now());

        // classification long after settlement still reports the span
        // from transaction date to paid date
        control.advance(Duration::days(100));
        let c = classify(&entry, &CreditTerms::default(), time.now());

        assert_eq!(c.status, EntryStatus::Paid);
        assert!(!c.partially_paid);
        assert_eq!(c.elapsed_days, 12);
    }

    #[test]
    fn test_due_date_does_not_change_elapsed_basis() {
        // the canonical rule measures from the transaction date even when
        // an explicit due date exists
        let time = test_clock();
        let control = time.test_control().unwrap();
        let mut entry = debt_at(1_000, time.now());
        entry.due_date = Some(time.now() + Duration::days(60));

        control.advance(Duration::days(40));
        let c = classify(&entry, &CreditTerms::default(), time.now());

        assert_eq!(c.status, EntryStatus::Overdue);
        assert_eq!(c.elapsed_days, 40);
    }
}
