pub mod classify;
pub mod credit;
pub mod decimal;
pub mod engine;
pub mod errors;
pub mod interest;
pub mod restoration;
pub mod settings;
pub mod settlement;
pub mod store;
pub mod types;

// re-export key types
pub use classify::{classify, Classification};
pub use credit::{credit_status, credit_used, validate_new_debt, CreditStatus, DebtValidation};
pub use decimal::{Money, Rate};
pub use engine::LedgerEngine;
pub use errors::{LedgerError, Result};
pub use interest::{accrue, AccrualPolicy, InterestBreakdown};
pub use restoration::{restore_credit, RestorationKind, RestorationOutcome};
pub use settings::{CompanySettings, CreditSettings, CreditTerms};
pub use settlement::SettlementResult;
pub use store::{CustomerLocks, IdempotencyKey, LedgerStore, MemoryStore};
pub use types::{
    CompanyId, CompoundingPeriod, CustomerId, EntryId, EntryKind, EntryStatus, LedgerEntry,
    StatusChangeRecord, TenantScope, UserId,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
