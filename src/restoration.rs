use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::settings::CreditSettings;
use crate::types::{EntryKind, EntryStatus, LedgerEntry};

/// how a restoration resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestorationKind {
    /// no open debts remain; limit snapped back to the original ceiling
    Full,
    /// other debts remain; limit raised by the settled entry's amount,
    /// capped at the original ceiling
    Partial,
}

/// result of restoring credit after a debt cleared
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RestorationOutcome {
    pub kind: RestorationKind,
    /// delta actually applied to the credit limit (may be capped below
    /// the settled amount)
    pub credit_delta: Money,
    pub limit_before: Money,
    pub limit_after: Money,
}

/// release the credit reserved by a just-settled debt entry.
///
/// Credit is reserved per outstanding debt and released as each debt
/// clears; restoration is per-entry, not proportional. `open_entries` is
/// the customer's remaining entry set after the settlement was applied.
pub fn restore_credit(
    settings: &mut CreditSettings,
    settled_amount: Money,
    open_entries: &[LedgerEntry],
) -> RestorationOutcome {
    let limit_before = settings.credit_limit;
    let any_open = open_entries.iter().any(|e| {
        e.kind == EntryKind::Sell && e.status != EntryStatus::Paid && !e.deleted
    });

    let (kind, credit_delta) = if any_open {
        (RestorationKind::Partial, settings.restore(settled_amount))
    } else {
        (RestorationKind::Full, settings.restore_full())
    };

    RestorationOutcome {
        kind,
        credit_delta,
        limit_before,
        limit_after: settings.credit_limit,
    }
}
