use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};

use uuid::Uuid;

use crate::errors::{LedgerError, Result};
use crate::settlement::SettlementResult;
use crate::settings::{CompanySettings, CreditSettings};
use crate::types::{CompanyId, CustomerId, EntryId, LedgerEntry, StatusChangeRecord, TenantScope};

/// caller-supplied key making a settlement call safe to repeat
pub type IdempotencyKey = Uuid;

/// interface to the external record store.
///
/// All reads are tenant-scoped: an entry reachable only under a different
/// company or customer must surface as NotFound, never a permission
/// error, so existence does not leak across tenants.
///
/// Implementations backed by a real database are expected to make the
/// writes of one settlement call a single transaction; the engine
/// additionally serializes settlements per customer, so a store with
/// atomic single-record writes (like the in-memory mirror below) is
/// sufficient for correctness.
pub trait LedgerStore: Send + Sync {
    /// fetch a live (non-deleted) entry within the scope
    fn entry(&self, scope: &TenantScope, id: EntryId) -> Result<LedgerEntry>;

    /// insert or replace an entry
    fn put_entry(&self, entry: LedgerEntry) -> Result<()>;

    /// soft-delete; the record stays for settlement history
    fn soft_delete_entry(&self, scope: &TenantScope, id: EntryId) -> Result<()>;

    /// all live entries for the scoped customer
    fn customer_entries(&self, scope: &TenantScope) -> Result<Vec<LedgerEntry>>;

    /// customer settings, falling back to the company defaults
    fn credit_settings(&self, scope: &TenantScope) -> Result<CreditSettings>;

    fn put_credit_settings(&self, settings: CreditSettings) -> Result<()>;

    fn put_company_settings(&self, settings: CompanySettings) -> Result<()>;

    /// append-only audit trail; never read back by the engine
    fn append_status_change(&self, record: StatusChangeRecord) -> Result<()>;

    /// previously recorded result for an idempotency key, if any.
    /// Records are scoped: a key recorded under one tenant must never
    /// replay for another, or the stored result leaks across tenants.
    fn settlement_by_key(
        &self,
        scope: &TenantScope,
        key: IdempotencyKey,
    ) -> Result<Option<SettlementResult>>;

    fn record_settlement(
        &self,
        scope: &TenantScope,
        key: IdempotencyKey,
        result: SettlementResult,
    ) -> Result<()>;
}

/// in-memory store: the reference implementation and test double
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<EntryId, LedgerEntry>>,
    customer_settings: RwLock<HashMap<(CompanyId, CustomerId), CreditSettings>>,
    company_settings: RwLock<HashMap<CompanyId, CompanySettings>>,
    status_changes: RwLock<Vec<StatusChangeRecord>>,
    settlements: RwLock<HashMap<(TenantScope, IdempotencyKey), SettlementResult>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// audit records accumulated so far (test/inspection hook; the engine
    /// itself never reads these)
    pub fn status_changes(&self) -> Vec<StatusChangeRecord> {
        read_lock(&self.status_changes).clone()
    }
}

// a poisoned lock only means another thread panicked mid-write of a
// HashMap entry; the data itself is still a consistent snapshot
fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

impl LedgerStore for MemoryStore {
    fn entry(&self, scope: &TenantScope, id: EntryId) -> Result<LedgerEntry> {
        let entries = read_lock(&self.entries);
        match entries.get(&id) {
            Some(e) if e.scope() == *scope && !e.deleted => Ok(e.clone()),
            _ => Err(LedgerError::NotFound {
                what: "ledger entry",
                id,
            }),
        }
    }

    fn put_entry(&self, entry: LedgerEntry) -> Result<()> {
        write_lock(&self.entries).insert(entry.id, entry);
        Ok(())
    }

    fn soft_delete_entry(&self, scope: &TenantScope, id: EntryId) -> Result<()> {
        let mut entries = write_lock(&self.entries);
        match entries.get_mut(&id) {
            Some(e) if e.scope() == *scope && !e.deleted => {
                e.deleted = true;
                Ok(())
            }
            _ => Err(LedgerError::NotFound {
                what: "ledger entry",
                id,
            }),
        }
    }

    fn customer_entries(&self, scope: &TenantScope) -> Result<Vec<LedgerEntry>> {
        let entries = read_lock(&self.entries);
        Ok(entries
            .values()
            .filter(|e| e.scope() == *scope && !e.deleted)
            .cloned()
            .collect())
    }

    fn credit_settings(&self, scope: &TenantScope) -> Result<CreditSettings> {
        let key = (scope.company_id, scope.customer_id);
        if let Some(settings) = read_lock(&self.customer_settings).get(&key) {
            return Ok(settings.clone());
        }
        if let Some(company) = read_lock(&self.company_settings).get(&scope.company_id) {
            return Ok(company.settings_for(scope.customer_id));
        }
        Err(LedgerError::NotFound {
            what: "credit settings",
            id: scope.customer_id,
        })
    }

    fn put_credit_settings(&self, settings: CreditSettings) -> Result<()> {
        let key = (settings.company_id, settings.customer_id);
        write_lock(&self.customer_settings).insert(key, settings);
        Ok(())
    }

    fn put_company_settings(&self, settings: CompanySettings) -> Result<()> {
        write_lock(&self.company_settings).insert(settings.company_id, settings);
        Ok(())
    }

    fn append_status_change(&self, record: StatusChangeRecord) -> Result<()> {
        write_lock(&self.status_changes).push(record);
        Ok(())
    }

    fn settlement_by_key(
        &self,
        scope: &TenantScope,
        key: IdempotencyKey,
    ) -> Result<Option<SettlementResult>> {
        Ok(read_lock(&self.settlements).get(&(*scope, key)).cloned())
    }

    fn record_settlement(
        &self,
        scope: &TenantScope,
        key: IdempotencyKey,
        result: SettlementResult,
    ) -> Result<()> {
        write_lock(&self.settlements).insert((*scope, key), result);
        Ok(())
    }
}

/// per-customer serialization for settlement and restoration.
///
/// Settlements mutate the customer's aggregate credit state and must not
/// interleave their read-modify-write; contended acquisition surfaces as
/// a retryable ConcurrencyConflict rather than blocking, since each call
/// is a short bounded unit of work.
#[derive(Debug, Default)]
pub struct CustomerLocks {
    busy: Mutex<HashSet<TenantScope>>,
}

impl CustomerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, scope: TenantScope) -> Result<CustomerGuard<'_>> {
        let mut busy = self.busy.lock().unwrap_or_else(|e| e.into_inner());
        if !busy.insert(scope) {
            return Err(LedgerError::ConcurrencyConflict {
                company_id: scope.company_id,
                customer_id: scope.customer_id,
            });
        }
        Ok(CustomerGuard { locks: self, scope })
    }
}

/// releases the customer slot on drop
#[derive(Debug)]
pub struct CustomerGuard<'a> {
    locks: &'a CustomerLocks,
    scope: TenantScope,
}

impl Drop for CustomerGuard<'_> {
    fn drop(&mut self) {
        let mut busy = self
            .locks
            .busy
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        busy.remove(&self.scope);
    }
}
