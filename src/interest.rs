use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::settings::CreditTerms;

/// interest accrual policy.
///
/// Both policies are live in production call sites; callers select one per
/// report context rather than the engine hard-coding a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccrualPolicy {
    /// flat daily rate on the outstanding balance
    Simple,
    /// per-period compounding at the configured frequency, with a simple
    /// stub for the remainder days
    Compound,
}

/// interest calculation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestBreakdown {
    /// accrued interest, never negative
    pub interest: Money,
    pub daily_rate: Rate,
    /// days past the grace period actually charged
    pub days_charged: u32,
    pub principal_base: Money,
    pub policy: AccrualPolicy,
    /// true when the minimum fee floor displaced the computed amount
    pub minimum_fee_applied: bool,
}

impl InterestBreakdown {
    fn zero(principal: Money, daily_rate: Rate, policy: AccrualPolicy) -> Self {
        Self {
            interest: Money::ZERO,
            daily_rate,
            days_charged: 0,
            principal_base: principal,
            policy,
            minimum_fee_applied: false,
        }
    }
}

/// compute accrued interest on an overdue balance.
///
/// `outstanding` is the unsettled principal (amount - paid_amount);
/// interest is never persisted back into principal. Within the grace
/// period the result is zero and the minimum fee does not apply.
pub fn accrue(
    outstanding: Money,
    elapsed_days: i64,
    terms: &CreditTerms,
    policy: AccrualPolicy,
) -> InterestBreakdown {
    let daily_rate = terms.interest_rate.daily_rate();
    let days_over_grace = elapsed_days - terms.grace_period_days as i64;

    if days_over_grace <= 0 || !outstanding.is_positive() {
        return InterestBreakdown::zero(outstanding, daily_rate, policy);
    }
    let days_charged = days_over_grace as u32;

    let raw = match policy {
        AccrualPolicy::Simple => simple_interest(outstanding, daily_rate, days_charged),
        AccrualPolicy::Compound => compound_interest(
            outstanding,
            daily_rate,
            days_charged,
            terms.compounding_period.days(),
        ),
    };

    let interest = raw.max(terms.minimum_fee);
    InterestBreakdown {
        interest,
        daily_rate,
        days_charged,
        principal_base: outstanding,
        policy,
        minimum_fee_applied: interest > raw,
    }
}

/// outstanding x daily_rate x days
fn simple_interest(outstanding: Money, daily_rate: Rate, days: u32) -> Money {
    let interest = outstanding.as_decimal() * daily_rate.as_decimal() * Decimal::from(days);
    Money::from_decimal(interest)
}

/// outstanding x ((1 + period_rate)^full_periods x (1 + daily x remainder) - 1)
fn compound_interest(outstanding: Money, daily_rate: Rate, days: u32, period_days: u32) -> Money {
    let daily = daily_rate.as_decimal();
    let period_rate = daily * Decimal::from(period_days);
    let full_periods = days / period_days;
    let remainder_days = days % period_days;

    // (1 + r)^n by iterated multiplication; no float pow
    let mut factor = Decimal::ONE;
    let base = Decimal::ONE + period_rate;
    for _ in 0..full_periods {
        factor *= base;
    }
    factor *= Decimal::ONE + daily * Decimal::from(remainder_days);

    Money::from_decimal(outstanding.as_decimal() * (factor - Decimal::ONE))
}
