//! Credit underwriting pipeline.
//!
//! `debt` resolves the canonical debt picture, `stats` extracts coverage
//! statistics from the projection, and every later stage reads the same
//! [`UnderwritingContext`] snapshot.

pub mod assessment;
pub mod conditions;
pub mod debt;
pub mod headroom;
pub mod rationale;
pub mod sanity;
pub mod score;
pub mod stats;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::UnderwritingThresholds;
use crate::inputs::{FinancialParameters, Projection};
use crate::numeric::{safe_divide, safe_mul};
use crate::types::*;

use self::debt::{aggregate_debt, has_debt, DebtInfo};
use self::stats::{extract_credit_stats, CreditStats};

/// Everything the downstream stages evaluate against.
#[derive(Debug, Clone)]
pub struct UnderwritingContext<'a> {
    pub parameters: &'a FinancialParameters,
    pub projection: &'a Projection,
    pub thresholds: &'a UnderwritingThresholds,
    pub debt: DebtInfo,
    pub debt_present: bool,
    pub stats: CreditStats,
}

impl<'a> UnderwritingContext<'a> {
    pub fn new(
        parameters: &'a FinancialParameters,
        projection: &'a Projection,
        thresholds: &'a UnderwritingThresholds,
    ) -> Self {
        let debt = aggregate_debt(parameters, projection);
        let debt_present = has_debt(&debt, parameters, projection);
        let stats = extract_credit_stats(projection, debt_present);
        Self {
            parameters,
            projection,
            thresholds,
            debt,
            debt_present,
            stats,
        }
    }

    /// Loan-to-value in percent; `None` without collateral.
    pub fn ltv_pct(&self) -> Option<Percent> {
        let collateral = self.parameters.collateral_value;
        (collateral > Decimal::ZERO).then(|| {
            safe_mul(
                safe_divide(self.debt.total_debt, collateral, Decimal::ZERO),
                dec!(100),
            )
        })
    }
}

/// Whole currency units with thousands separators.
pub(crate) fn fmt_money(amount: Money) -> String {
    let rounded = amount.round().abs().to_string();
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, ch) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount.round().is_sign_negative() && !amount.round().is_zero() {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_money() {
        assert_eq!(fmt_money(dec!(1500000)), "1,500,000");
        assert_eq!(fmt_money(dec!(999.6)), "1,000");
        assert_eq!(fmt_money(dec!(12)), "12");
        assert_eq!(fmt_money(dec!(-45000)), "-45,000");
        assert_eq!(fmt_money(Decimal::ZERO), "0");
    }
}
