use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Money;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// covers entries, customers and settings; cross-tenant references
    /// surface as NotFound so existence never leaks across companies
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: Uuid },

    #[error("exceeds available credit by {shortfall}: available {available}, requested {requested}")]
    CreditLimitExceeded {
        available: Money,
        requested: Money,
        shortfall: Money,
    },

    #[error("settlement exceeds remaining bound by {excess}: bound {bound}, requested {requested}")]
    OverAllocation {
        bound: Money,
        requested: Money,
        excess: Money,
    },

    #[error("entry already fully settled: {entry_id}")]
    AlreadySettled { entry_id: Uuid },

    #[error("invalid amount: {amount}")]
    InvalidAmount { amount: Money },

    #[error("concurrent settlement in progress for customer {customer_id} (company {company_id}); retry with backoff")]
    ConcurrencyConflict {
        company_id: Uuid,
        customer_id: Uuid,
    },

    #[error("entry {entry_id} is not a debt entry and cannot be settled or classified")]
    NotADebtEntry { entry_id: Uuid },

    #[error("entry {entry_id} is not a payment entry")]
    NotAPaymentEntry { entry_id: Uuid },
}

impl LedgerError {
    /// retryable errors may be repeated by the caller with backoff;
    /// the engine never retries internally to avoid double-application
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::ConcurrencyConflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
