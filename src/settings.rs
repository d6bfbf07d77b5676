use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::{CompanyId, CompoundingPeriod, CustomerId};

/// interest and grace terms shared by customer and company settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreditTerms {
    /// days after the transaction date before interest starts accruing
    pub grace_period_days: u32,
    /// annual interest rate
    pub interest_rate: Rate,
    pub compounding_period: CompoundingPeriod,
    /// floor applied to any non-zero interest charge
    pub minimum_fee: Money,
}

impl Default for CreditTerms {
    fn default() -> Self {
        Self {
            grace_period_days: 30,
            interest_rate: Rate::from_percentage(dec!(18)),
            compounding_period: CompoundingPeriod::Monthly,
            minimum_fee: Money::ZERO,
        }
    }
}

/// per-customer credit configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditSettings {
    pub customer_id: CustomerId,
    pub company_id: CompanyId,
    /// current usable ceiling, reduced as debts accumulate
    pub credit_limit: Money,
    /// the ceiling restoration works toward; never below credit_limit
    pub original_credit_limit: Money,
    pub terms: CreditTerms,
}

impl CreditSettings {
    pub fn new(
        customer_id: CustomerId,
        company_id: CompanyId,
        credit_limit: Money,
        terms: CreditTerms,
    ) -> Self {
        Self {
            customer_id,
            company_id,
            credit_limit,
            original_credit_limit: credit_limit,
            terms,
        }
    }

    /// raise the usable limit toward the original ceiling, returning the
    /// delta actually applied
    pub fn restore(&mut self, amount: Money) -> Money {
        let before = self.credit_limit;
        self.credit_limit = (self.credit_limit + amount).min(self.original_credit_limit);
        self.credit_limit - before
    }

    /// restore the limit all the way to the original ceiling
    pub fn restore_full(&mut self) -> Money {
        let before = self.credit_limit;
        self.credit_limit = self.original_credit_limit;
        self.credit_limit - before
    }
}

/// company-wide defaults, used when a customer has no override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySettings {
    pub company_id: CompanyId,
    pub default_credit_limit: Money,
    pub terms: CreditTerms,
}

impl CompanySettings {
    pub fn new(company_id: CompanyId, default_credit_limit: Money, terms: CreditTerms) -> Self {
        Self {
            company_id,
            default_credit_limit,
            terms,
        }
    }

    /// materialize customer settings from the company defaults
    pub fn settings_for(&self, customer_id: CustomerId) -> CreditSettings {
        CreditSettings::new(
            customer_id,
            self.company_id,
            self.default_credit_limit,
            self.terms,
        )
    }
}
