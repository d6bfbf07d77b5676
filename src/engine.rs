use std::sync::Arc;

use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use uuid::Uuid;

use crate::classify::{classify, Classification};
use crate::credit::{credit_status, validate_new_debt, CreditStatus, DebtValidation};
use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::interest::{accrue, AccrualPolicy, InterestBreakdown};
use crate::restoration::restore_credit;
use crate::settlement::{
    validate_amount, validate_payment_source, validate_target, SettlementResult,
};
use crate::store::{CustomerLocks, IdempotencyKey, LedgerStore};
use crate::types::{
    EntryId, EntryKind, EntryStatus, LedgerEntry, StatusChangeRecord, TenantScope, UserId,
};

/// the credit ledger engine: one facade over classification, interest,
/// credit tracking, settlement, restoration and the audit trail.
///
/// Classification and interest are pure reads and run lock-free;
/// settlement and restoration serialize per customer through
/// `CustomerLocks` so two concurrent settlements can never interleave
/// their read-modify-write of the credit limit.
pub struct LedgerEngine<S: LedgerStore> {
    store: Arc<S>,
    time: SafeTimeProvider,
    locks: CustomerLocks,
}

impl<S: LedgerStore> LedgerEngine<S> {
    pub fn new(store: Arc<S>, time: SafeTimeProvider) -> Self {
        Self {
            store,
            time,
            locks: CustomerLocks::new(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.time.now()
    }

    /// derive the current lifecycle state of a debt entry
    pub fn classify(&self, scope: TenantScope, entry_id: EntryId) -> Result<Classification> {
        let entry = self.debt_entry(&scope, entry_id)?;
        let settings = self.store.credit_settings(&scope)?;
        Ok(classify(&entry, &settings.terms, self.now()))
    }

    /// accrued interest on the entry's outstanding balance under the
    /// selected policy
    pub fn compute_interest(
        &self,
        scope: TenantScope,
        entry_id: EntryId,
        policy: AccrualPolicy,
    ) -> Result<InterestBreakdown> {
        let entry = self.debt_entry(&scope, entry_id)?;
        let settings = self.store.credit_settings(&scope)?;
        let classification = classify(&entry, &settings.terms, self.now());
        Ok(accrue(
            entry.outstanding(),
            classification.elapsed_days,
            &settings.terms,
            policy,
        ))
    }

    /// the customer's current credit position
    pub fn credit_status(&self, scope: TenantScope) -> Result<CreditStatus> {
        let settings = self.store.credit_settings(&scope)?;
        let entries = self.store.customer_entries(&scope)?;
        Ok(credit_status(&settings, &entries))
    }

    /// validate a proposed debt without persisting anything
    pub fn validate_new_debt(&self, scope: TenantScope, amount: Money) -> Result<DebtValidation> {
        let status = self.credit_status(scope)?;
        validate_new_debt(&status, amount)
    }

    /// validate and persist a new Sell entry.
    ///
    /// A rejected validation refuses the write and surfaces as the
    /// CreditLimitExceeded error; an override path (admin force-accept)
    /// writes through the store directly, outside this gate.
    pub fn record_debt(&self, entry: LedgerEntry) -> Result<DebtValidation> {
        if entry.kind != EntryKind::Sell {
            return Err(LedgerError::NotADebtEntry { entry_id: entry.id });
        }
        let scope = entry.scope();
        let _guard = self.locks.acquire(scope)?;

        let validation = self.validate_new_debt(scope, entry.amount)?;
        if let DebtValidation::Rejected {
            available,
            requested,
            shortfall,
        } = validation
        {
            return Err(LedgerError::CreditLimitExceeded {
                available,
                requested,
                shortfall,
            });
        }

        tracing::info!(
            entry_id = %entry.id,
            customer_id = %scope.customer_id,
            amount = %entry.amount,
            "debt entry accepted"
        );
        self.store.put_entry(entry)?;
        Ok(validation)
    }

    /// persist a payment entry, incoming or outgoing; only incoming
    /// payments can later fund settlements
    pub fn record_payment(&self, entry: LedgerEntry) -> Result<()> {
        if entry.kind == EntryKind::Sell {
            return Err(LedgerError::NotAPaymentEntry { entry_id: entry.id });
        }
        if !entry.amount.is_positive() {
            return Err(LedgerError::InvalidAmount {
                amount: entry.amount,
            });
        }
        self.store.put_entry(entry)
    }

    /// apply part of a payment entry against an outstanding debt entry.
    ///
    /// Atomic per call: every check runs before any write, under the
    /// customer lock. Repeating a call with the same idempotency key
    /// replays the recorded result without touching state.
    pub fn settle(
        &self,
        scope: TenantScope,
        payment_entry_id: EntryId,
        target_entry_id: EntryId,
        amount: Money,
        actor: UserId,
        key: IdempotencyKey,
    ) -> Result<SettlementResult> {
        let _guard = self.locks.acquire(scope)?;

        if let Some(result) = self.store.settlement_by_key(&scope, key)? {
            tracing::debug!(%key, "settlement replayed from idempotency record");
            return Ok(result);
        }

        let mut payment = self.store.entry(&scope, payment_entry_id)?;
        validate_payment_source(&payment)?;
        let target = self.store.entry(&scope, target_entry_id)?;
        validate_target(&target)?;
        validate_amount(amount, payment.remaining(), target.outstanding())?;

        payment.record_allocation(amount);
        let result = self.apply_settlement(scope, target, amount, actor, "settlement", |store| {
            store.put_entry(payment.clone())?;
            Ok(payment.remaining())
        })?;

        self.store.record_settlement(&scope, key, result.clone())?;
        Ok(result)
    }

    /// settle an entry's full outstanding balance in one call, without a
    /// funding payment entry
    pub fn mark_fully_paid(
        &self,
        scope: TenantScope,
        entry_id: EntryId,
        actor: UserId,
    ) -> Result<SettlementResult> {
        let _guard = self.locks.acquire(scope)?;

        let target = self.store.entry(&scope, entry_id)?;
        validate_target(&target)?;
        let outstanding = target.outstanding();
        if !outstanding.is_positive() {
            return Err(LedgerError::AlreadySettled { entry_id });
        }

        self.apply_settlement(scope, target, outstanding, actor, "marked fully paid", |_| {
            Ok(Money::ZERO)
        })
    }

    /// reclassify an entry and persist the derived status, appending an
    /// audit record when the persisted status actually changes.
    ///
    /// Takes the customer lock: the read-modify-write of the entry must
    /// not interleave with a settlement, or the stale snapshot read here
    /// would overwrite the settlement's paid_amount when written back.
    pub fn refresh_status(&self, scope: TenantScope, entry_id: EntryId) -> Result<Classification> {
        let _guard = self.locks.acquire(scope)?;

        let mut entry = self.debt_entry(&scope, entry_id)?;
        let settings = self.store.credit_settings(&scope)?;
        let classification = classify(&entry, &settings.terms, self.now());

        let derived = classification.persisted_status();
        if derived != entry.status {
            let from = entry.status;
            entry.status = derived;
            tracing::debug!(
                %entry_id,
                ?from,
                to = ?derived,
                "persisted status recomputed"
            );
            self.store.put_entry(entry)?;
            self.store.append_status_change(StatusChangeRecord {
                entry_id,
                customer_id: scope.customer_id,
                company_id: scope.company_id,
                user_id: Uuid::nil(),
                from_status: from,
                to_status: derived,
                reason: "status recomputation".to_string(),
                amount_delta: Money::ZERO,
                credit_delta: Money::ZERO,
                timestamp: self.now(),
            })?;
        }
        Ok(classification)
    }

    /// core settlement path shared by settle and mark_fully_paid.
    ///
    /// `persist_source` runs inside the write phase and persists the
    /// funding side (the payment entry), returning its remaining balance.
    fn apply_settlement(
        &self,
        scope: TenantScope,
        mut target: LedgerEntry,
        amount: Money,
        actor: UserId,
        reason: &str,
        persist_source: impl FnOnce(&S) -> Result<Money>,
    ) -> Result<SettlementResult> {
        validate_target(&target)?;

        let now = self.now();
        let from_status = target.status;
        target.apply_settlement(amount, now);
        let fully_settled = target.status == EntryStatus::Paid;

        // restoration runs on the entry set as it stands after this
        // settlement, so the just-settled target is excluded
        let mut credit_restored = Money::ZERO;
        let mut updated_settings = None;
        if fully_settled {
            let mut settings = self.store.credit_settings(&scope)?;
            let open: Vec<LedgerEntry> = self
                .store
                .customer_entries(&scope)?
                .into_iter()
                .filter(|e| e.id != target.id)
                .collect();
            let outcome = restore_credit(&mut settings, target.amount, &open);
            tracing::info!(
                customer_id = %scope.customer_id,
                kind = ?outcome.kind,
                credit_delta = %outcome.credit_delta,
                "credit restored"
            );
            credit_restored = outcome.credit_delta;
            updated_settings = Some(settings);
        }

        // write phase: all checks have passed, nothing can reject below
        let result = SettlementResult {
            target_status: target.status,
            remaining_on_target: target.outstanding(),
            remaining_on_payment: persist_source(&self.store)?,
            credit_restored,
        };
        self.store.put_entry(target.clone())?;
        if let Some(settings) = updated_settings {
            self.store.put_credit_settings(settings)?;
        }
        self.store.append_status_change(StatusChangeRecord {
            entry_id: target.id,
            customer_id: scope.customer_id,
            company_id: scope.company_id,
            user_id: actor,
            from_status,
            to_status: target.status,
            reason: reason.to_string(),
            amount_delta: amount,
            credit_delta: credit_restored,
            timestamp: now,
        })?;

        tracing::info!(
            entry_id = %target.id,
            customer_id = %scope.customer_id,
            amount = %amount,
            status = ?target.status,
            "settlement applied"
        );
        Ok(result)
    }

    fn debt_entry(&self, scope: &TenantScope, entry_id: EntryId) -> Result<LedgerEntry> {
        let entry = self.store.entry(scope, entry_id)?;
        if entry.kind != EntryKind::Sell {
            return Err(LedgerError::NotADebtEntry { entry_id });
        }
        Ok(entry)
    }
}
