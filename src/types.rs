use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;

/// unique identifier for a ledger entry
pub type EntryId = Uuid;
/// unique identifier for a customer
pub type CustomerId = Uuid;
/// unique identifier for a company (tenant)
pub type CompanyId = Uuid;
/// unique identifier for an acting user
pub type UserId = Uuid;

/// tenant scoping for every engine operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantScope {
    pub company_id: CompanyId,
    pub customer_id: CustomerId,
}

impl TenantScope {
    pub fn new(company_id: CompanyId, customer_id: CustomerId) -> Self {
        Self {
            company_id,
            customer_id,
        }
    }
}

/// transaction kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// a debt: goods/services sold on credit
    Sell,
    /// customer pays the company
    PaymentIn,
    /// company pays the customer
    PaymentOut,
}

/// derived payment lifecycle status, persisted for query efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    /// no settlement yet, within grace
    Unpaid,
    /// settled in part, balance outstanding
    PartiallyPaid,
    /// past grace period with outstanding balance
    Overdue,
    /// fully settled (terminal)
    Paid,
}

/// interest compounding period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompoundingPeriod {
    Daily,
    Weekly,
    Monthly,
}

impl CompoundingPeriod {
    /// period length in days
    pub fn days(&self) -> u32 {
        match self {
            CompoundingPeriod::Daily => 1,
            CompoundingPeriod::Weekly => 7,
            CompoundingPeriod::Monthly => 30,
        }
    }
}

/// one financial transaction in the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub company_id: CompanyId,
    pub customer_id: CustomerId,
    pub kind: EntryKind,
    pub amount: Money,
    pub currency: String,
    pub date: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    /// cumulative amount settled against this entry (Sell only)
    pub paid_amount: Money,
    /// cumulative amount this payment has been used to pay down (PaymentIn only)
    pub settled_amount: Money,
    pub status: EntryStatus,
    pub paid_date: Option<DateTime<Utc>>,
    /// soft-delete; entries referenced by settlement history are never removed
    pub deleted: bool,
}

impl LedgerEntry {
    pub fn new(
        scope: TenantScope,
        kind: EntryKind,
        amount: Money,
        currency: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            company_id: scope.company_id,
            customer_id: scope.customer_id,
            kind,
            amount,
            currency: currency.into(),
            date,
            due_date: None,
            paid_amount: Money::ZERO,
            settled_amount: Money::ZERO,
            status: EntryStatus::Unpaid,
            paid_date: None,
            deleted: false,
        }
    }

    /// unsettled balance of a debt entry
    pub fn outstanding(&self) -> Money {
        (self.amount - self.paid_amount).floor_zero()
    }

    /// unallocated balance of a payment entry
    pub fn remaining(&self) -> Money {
        (self.amount - self.settled_amount).floor_zero()
    }

    pub fn is_fully_paid(&self) -> bool {
        self.paid_amount >= self.amount
    }

    /// apply a settlement amount, keeping paid_amount monotonic and the
    /// status/paid_date invariants intact
    pub fn apply_settlement(&mut self, amount: Money, now: DateTime<Utc>) {
        self.paid_amount += amount;
        if self.is_fully_paid() {
            self.status = EntryStatus::Paid;
            self.paid_date = Some(now);
        } else {
            self.status = EntryStatus::PartiallyPaid;
        }
    }

    /// record how much of this payment has been allocated to debts
    pub fn record_allocation(&mut self, amount: Money) {
        self.settled_amount += amount;
    }

    pub fn scope(&self) -> TenantScope {
        TenantScope::new(self.company_id, self.customer_id)
    }
}

/// append-only audit record of a status transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChangeRecord {
    pub entry_id: EntryId,
    pub customer_id: CustomerId,
    pub company_id: CompanyId,
    pub user_id: UserId,
    pub from_status: EntryStatus,
    pub to_status: EntryStatus,
    pub reason: String,
    /// settlement amount applied in this transition
    pub amount_delta: Money,
    /// credit limit change caused by this transition
    pub credit_delta: Money,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debt(amount: i64) -> LedgerEntry {
        let scope = TenantScope::new(Uuid::new_v4(), Uuid::new_v4());
        LedgerEntry::new(scope, EntryKind::Sell, Money::from_major(amount), "INR", Utc::now())
    }

    #[test]
    fn test_outstanding_tracks_paid_amount() {
        let mut entry = debt(1_000);
        assert_eq!(entry.outstanding(), Money::from_major(1_000));

        entry.apply_settlement(Money::from_major(400), Utc::now());
        assert_eq!(entry.outstanding(), Money::from_major(600));
        assert_eq!(entry.status, EntryStatus::PartiallyPaid);
        assert!(entry.paid_date.is_none());
    }

    #[test]
    fn test_full_settlement_is_terminal() {
        let mut entry = debt(1_000);
        let now = Utc::now();
        entry.apply_settlement(Money::from_major(1_000), now);

        assert_eq!(entry.status, EntryStatus::Paid);
        assert_eq!(entry.paid_date, Some(now));
        assert!(entry.is_fully_paid());
        assert_eq!(entry.outstanding(), Money::ZERO);
    }

    #[test]
    fn test_payment_remaining() {
        let scope = TenantScope::new(Uuid::new_v4(), Uuid::new_v4());
        let mut payment = LedgerEntry::new(
            scope,
            EntryKind::PaymentIn,
            Money::from_major(2_000),
            "INR",
            Utc::now(),
        );
        payment.record_allocation(Money::from_major(1_500));
        assert_eq!(payment.remaining(), Money::from_major(500));
    }

    #[test]
    fn test_entry_json_round_trip() {
        let mut entry = debt(1_000);
        entry.apply_settlement(Money::from_major(250), Utc::now());

        let json = serde_json::to_string(&entry).unwrap();
        let back: LedgerEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }

    #[test]
    fn test_compounding_period_days() {
        assert_eq!(CompoundingPeriod::Daily.days(), 1);
        assert_eq!(CompoundingPeriod::Weekly.days(), 7);
        assert_eq!(CompoundingPeriod::Monthly.days(), 30);
    }
}
