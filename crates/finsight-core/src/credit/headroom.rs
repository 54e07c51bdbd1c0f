use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::UnderwritingContext;
use crate::numeric::{safe_divide, safe_sub};
use crate::types::*;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CovenantMetric {
    Dscr,
    InterestCoverage,
    NetDebtToEbitda,
    LoanToValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CovenantDirection {
    /// Actual must not exceed threshold.
    MaxOf,
    /// Actual must not fall below threshold.
    MinOf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovenantHeadroom {
    pub covenant: String,
    pub metric: CovenantMetric,
    pub direction: CovenantDirection,
    pub threshold: Decimal,
    pub actual: Decimal,
    pub passing: bool,
    pub headroom: Decimal,
    pub headroom_pct: Rate,
}

impl CovenantHeadroom {
    fn test(
        covenant: &str,
        metric: CovenantMetric,
        direction: CovenantDirection,
        actual: Decimal,
        threshold: Decimal,
    ) -> Self {
        let (passing, headroom) = match direction {
            CovenantDirection::MaxOf => (actual <= threshold, safe_sub(threshold, actual)),
            CovenantDirection::MinOf => (actual >= threshold, safe_sub(actual, threshold)),
        };
        let headroom_pct = safe_divide(headroom, threshold, Decimal::ZERO);
        Self {
            covenant: covenant.to_string(),
            metric,
            direction,
            threshold,
            actual,
            passing,
            headroom,
            headroom_pct,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Headroom against each financial covenant; empty when there is no debt.
pub fn covenant_headroom(ctx: &UnderwritingContext<'_>) -> Vec<CovenantHeadroom> {
    if !ctx.debt_present {
        return Vec::new();
    }

    let stats = &ctx.stats;
    let t = ctx.thresholds;
    let mut results = vec![
        CovenantHeadroom::test(
            "Minimum DSCR",
            CovenantMetric::Dscr,
            CovenantDirection::MinOf,
            stats.min_dscr,
            t.min_dscr,
        ),
        CovenantHeadroom::test(
            "Minimum Interest Coverage",
            CovenantMetric::InterestCoverage,
            CovenantDirection::MinOf,
            stats.min_icr,
            t.target_icr,
        ),
        CovenantHeadroom::test(
            "Maximum Net Debt/EBITDA",
            CovenantMetric::NetDebtToEbitda,
            CovenantDirection::MaxOf,
            stats.max_leverage,
            t.max_leverage,
        ),
    ];

    if let Some(ltv) = ctx.ltv_pct() {
        results.push(CovenantHeadroom::test(
            "Maximum LTV",
            CovenantMetric::LoanToValue,
            CovenantDirection::MaxOf,
            ltv,
            t.max_ltv_pct,
        ));
    }

    results
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
