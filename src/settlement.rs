use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::types::{EntryKind, EntryStatus, LedgerEntry};

/// outcome of one settlement call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementResult {
    pub target_status: EntryStatus,
    /// outstanding balance left on the debt entry
    pub remaining_on_target: Money,
    /// unallocated balance left on the payment entry; reported to the
    /// caller as available future credit, never auto-applied
    pub remaining_on_payment: Money,
    /// credit limit delta applied by restoration (zero unless the target
    /// reached Paid)
    pub credit_restored: Money,
}

/// check that an entry can be the target of a settlement
pub fn validate_target(target: &LedgerEntry) -> Result<()> {
    if target.kind != EntryKind::Sell {
        return Err(LedgerError::NotADebtEntry {
            entry_id: target.id,
        });
    }
    if target.is_fully_paid() || target.status == EntryStatus::Paid {
        return Err(LedgerError::AlreadySettled {
            entry_id: target.id,
        });
    }
    Ok(())
}

/// check that an entry can fund a settlement
pub fn validate_payment_source(payment: &LedgerEntry) -> Result<()> {
    if payment.kind != EntryKind::PaymentIn {
        return Err(LedgerError::NotAPaymentEntry {
            entry_id: payment.id,
        });
    }
    Ok(())
}

/// check the settlement amount against both remaining bounds:
/// the payment's unallocated balance and the target's outstanding balance
pub fn validate_amount(amount: Money, payment_remaining: Money, outstanding: Money) -> Result<()> {
    if !amount.is_positive() {
        return Err(LedgerError::InvalidAmount { amount });
    }
    let bound = payment_remaining.min(outstanding);
    if amount > bound {
        return Err(LedgerError::OverAllocation {
            bound,
            requested: amount,
            excess: amount - bound,
        });
    }
    Ok(())
}
