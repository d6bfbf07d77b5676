use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LedgerError, Result};
use crate::settings::CreditSettings;
use crate::types::{EntryKind, EntryStatus, LedgerEntry};

/// soft advisory threshold: a proposed debt above this share of the
/// available credit yields a non-fatal warning
fn warning_threshold() -> Rate {
    Rate::from_decimal(dec!(0.8))
}

/// aggregate credit position of one customer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreditStatus {
    pub credit_limit: Money,
    pub credit_used: Money,
    /// raw difference; negative signals over-limit (callers clamp for display)
    pub available_credit: Money,
    pub original_credit_limit: Money,
}

/// outcome of validating a proposed new debt.
///
/// Rejection is a business-rule result, not an error: the caller decides
/// whether to override (admin force-accept) or refuse the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DebtValidation {
    Approved,
    /// above the soft threshold but within the limit; does not block
    Warning { utilization: Rate },
    Rejected {
        available: Money,
        requested: Money,
        shortfall: Money,
    },
}

impl DebtValidation {
    pub fn is_rejected(&self) -> bool {
        matches!(self, DebtValidation::Rejected { .. })
    }
}

/// sum of unsettled debt over the customer's open Sell entries
pub fn credit_used(entries: &[LedgerEntry]) -> Money {
    entries
        .iter()
        .filter(|e| {
            e.kind == EntryKind::Sell && e.status != EntryStatus::Paid && !e.deleted
        })
        .fold(Money::ZERO, |acc, e| acc + e.outstanding())
}

/// derive the customer's credit position from settings plus open entries
pub fn credit_status(settings: &CreditSettings, entries: &[LedgerEntry]) -> CreditStatus {
    let used = credit_used(entries);
    CreditStatus {
        credit_limit: settings.credit_limit,
        credit_used: used,
        available_credit: settings.credit_limit - used,
        original_credit_limit: settings.original_credit_limit,
    }
}

/// validate a proposed new debt against the available credit
pub fn validate_new_debt(status: &CreditStatus, proposed: Money) -> Result<DebtValidation> {
    if !proposed.is_positive() {
        return Err(LedgerError::InvalidAmount { amount: proposed });
    }

    let available = status.available_credit;
    if proposed > available {
        return Ok(DebtValidation::Rejected {
            available,
            requested: proposed,
            shortfall: proposed - available,
        });
    }

    let threshold = available * warning_threshold().as_decimal();
    if proposed > threshold {
        let utilization = Rate::from_decimal(proposed.as_decimal() / available.as_decimal());
        return Ok(DebtValidation::Warning { utilization });
    }

    Ok(DebtValidation::Approved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::settings::CreditTerms;
    use crate::types::TenantScope;

    fn scope() -> TenantScope {
        TenantScope::new(Uuid::new_v4(), Uuid::new_v4())
    }

    fn debt(scope: TenantScope, amount: i64) -> LedgerEntry {
        LedgerEntry::new(scope, EntryKind::Sell, Money::from_major(amount), "INR", Utc::now())
    }

    fn settings_with_limit(scope: TenantScope, limit: i64) -> CreditSettings {
        CreditSettings::new(
            scope.customer_id,
            scope.company_id,
            Money::from_major(limit),
            CreditTerms::default(),
        )
    }

    #[test]
    fn test_credit_used_ignores_paid_and_deleted_and_payments() {
        let s = scope();
        let open = debt(s, 4_000);

        let mut paid = debt(s, 2_000);
        paid.apply_settlement(Money::from_major(2_000), Utc::now());

        let mut removed = debt(s, 1_000);
        removed.deleted = true;

        let payment =
            LedgerEntry::new(s, EntryKind::PaymentIn, Money::from_major(500), "INR", Utc::now());

        let entries = vec![open, paid, removed, payment];
        assert_eq!(credit_used(&entries), Money::from_major(4_000));
    }

    #[test]
    fn test_partial_settlement_reduces_credit_used() {
        let s = scope();
        let mut entry = debt(s, 4_000);
        entry.apply_settlement(Money::from_major(1_500), Utc::now());

        assert_eq!(credit_used(&[entry]), Money::from_major(2_500));
    }

    #[test]
    fn test_available_credit_may_go_negative() {
        let s = scope();
        let mut settings = settings_with_limit(s, 10_000);
        settings.credit_limit = Money::from_major(3_000);
        let entries = vec![debt(s, 4_000)];

        let status = credit_status(&settings, &entries);
        assert_eq!(status.available_credit, Money::from_major(-1_000));
        assert_eq!(status.available_credit.floor_zero(), Money::ZERO);
    }

    #[test]
    fn test_validate_rejects_over_limit_with_shortfall() {
        // limit 10000 with one unpaid 4000: available 6000
        let s = scope();
        let settings = settings_with_limit(s, 10_000);
        let entries = vec![debt(s, 4_000)];
        let status = credit_status(&settings, &entries);

        let result = validate_new_debt(&status, Money::from_major(7_000)).unwrap();
        assert_eq!(
            result,
            DebtValidation::Rejected {
                available: Money::from_major(6_000),
                requested: Money::from_major(7_000),
                shortfall: Money::from_major(1_000),
            }
        );
    }

    #[test]
    fn test_validate_warns_above_soft_threshold() {
        let s = scope();
        let settings = settings_with_limit(s, 10_000);
        let entries = vec![debt(s, 4_000)];
        let status = credit_status(&settings, &entries);

        // 5000 > 0.8 x 6000 = 4800
        match validate_new_debt(&status, Money::from_major(5_000)).unwrap() {
            DebtValidation::Warning { utilization } => {
                assert!(utilization.as_percentage() > dec!(83));
                assert!(utilization.as_percentage() < dec!(84));
            }
            other => panic!("expected warning, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_approves_below_threshold() {
        let s = scope();
        let settings = settings_with_limit(s, 10_000);
        let entries = vec![debt(s, 4_000)];
        let status = credit_status(&settings, &entries);

        let result = validate_new_debt(&status, Money::from_major(4_000)).unwrap();
        assert_eq!(result, DebtValidation::Approved);
    }

    #[test]
    fn test_validate_rejects_zero_and_negative_amounts() {
        let s = scope();
        let settings = settings_with_limit(s, 10_000);
        let status = credit_status(&settings, &[]);

        assert!(validate_new_debt(&status, Money::ZERO).is_err());
        assert!(validate_new_debt(&status, Money::from_major(-5)).is_err());
    }

    #[test]
    fn test_validate_rejects_everything_when_over_limit() {
        // negative available credit rejects any positive proposal before
        // the warning ratio could divide by a non-positive denominator
        let s = scope();
        let mut settings = settings_with_limit(s, 10_000);
        settings.credit_limit = Money::from_major(2_000);
        let entries = vec![debt(s, 4_000)];
        let status = credit_status(&settings, &entries);

        let result = validate_new_debt(&status, Money::from_major(1)).unwrap();
        assert!(result.is_rejected());
    }
}
