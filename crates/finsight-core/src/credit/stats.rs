use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::inputs::projection::{Projection, ProjectionRow};
use crate::numeric::{safe_divide, safe_mean};
use crate::types::*;

/// Upstream sentinel for an undefined or infinite coverage ratio.
const COVERAGE_SENTINEL: Decimal = dec!(999);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatsSource {
    /// Taken unchanged from the projection engine
    Projection,
    /// Computed here from the projection rows
    Computed,
    /// No debt; every statistic is zero
    NoDebt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditStats {
    pub min_dscr: Multiple,
    pub max_dscr: Multiple,
    pub avg_dscr: Multiple,
    pub min_icr: Multiple,
    pub max_icr: Multiple,
    pub avg_icr: Multiple,
    pub min_leverage: Multiple,
    pub max_leverage: Multiple,
    pub avg_leverage: Multiple,
    pub source: StatsSource,
}

impl CreditStats {
    pub fn zero() -> Self {
        Self {
            min_dscr: Decimal::ZERO,
            max_dscr: Decimal::ZERO,
            avg_dscr: Decimal::ZERO,
            min_icr: Decimal::ZERO,
            max_icr: Decimal::ZERO,
            avg_icr: Decimal::ZERO,
            min_leverage: Decimal::ZERO,
            max_leverage: Decimal::ZERO,
            avg_leverage: Decimal::ZERO,
            source: StatsSource::NoDebt,
        }
    }
}

/// Min / max / mean of one ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spread {
    min: Decimal,
    max: Decimal,
    avg: Decimal,
}

impl Spread {
    fn of(values: &[Decimal]) -> Self {
        let (Some(min), Some(max)) = (values.iter().min(), values.iter().max()) else {
            return Self {
                min: Decimal::ZERO,
                max: Decimal::ZERO,
                avg: Decimal::ZERO,
            };
        };
        Self {
            min: *min,
            max: *max,
            avg: safe_mean(values),
        }
    }
}

/// Extract coverage statistics.
///
/// A zero-debt deal reads as "not applicable" (all zeros) rather than as a
/// perfect ratio. Precomputed projection statistics are used unchanged so
/// the dashboard never drifts from the projection engine.
pub fn extract_credit_stats(projection: &Projection, debt_present: bool) -> CreditStats {
    if !debt_present {
        debug!("No debt present; credit stats are zero");
        return CreditStats::zero();
    }
    if let Some(stats) = &projection.credit_stats {
        debug!("Using precomputed credit stats from projection");
        return stats.clone();
    }

    let dscr: Vec<Decimal> = projection
        .rows
        .iter()
        .filter_map(row_dscr)
        .filter(|v| is_meaningful_coverage(*v))
        .collect();
    let icr: Vec<Decimal> = projection
        .rows
        .iter()
        .filter_map(row_icr)
        .filter(|v| is_meaningful_coverage(*v))
        .collect();
    let leverage: Vec<Decimal> = projection.rows.iter().filter_map(row_leverage).collect();

    debug!(
        rows = projection.rows.len(),
        dscr_years = dscr.len(),
        icr_years = icr.len(),
        leverage_years = leverage.len(),
        "Computed credit stats from projection rows"
    );

    let (d, i, l) = (Spread::of(&dscr), Spread::of(&icr), Spread::of(&leverage));
    CreditStats {
        min_dscr: d.min,
        max_dscr: d.max,
        avg_dscr: d.avg,
        min_icr: i.min,
        max_icr: i.max,
        avg_icr: i.avg,
        min_leverage: l.min,
        max_leverage: l.max,
        avg_leverage: l.avg,
        source: StatsSource::Computed,
    }
}

fn is_meaningful_coverage(value: Decimal) -> bool {
    value > Decimal::ZERO && value < COVERAGE_SENTINEL
}

/// Precomputed DSCR, else EBITDA over principal plus interest.
fn row_dscr(row: &ProjectionRow) -> Option<Multiple> {
    row.dscr.or_else(|| {
        let service = row.debt_service();
        (service > Decimal::ZERO).then(|| safe_divide(row.ebitda, service, Decimal::ZERO))
    })
}

/// Precomputed ICR, else EBITDA over interest.
fn row_icr(row: &ProjectionRow) -> Option<Multiple> {
    row.icr.or_else(|| {
        (row.interest_expense > Decimal::ZERO)
            .then(|| safe_divide(row.ebitda, row.interest_expense, Decimal::ZERO))
    })
}

/// Precomputed net debt / EBITDA, else debt balance over positive EBITDA.
fn row_leverage(row: &ProjectionRow) -> Option<Multiple> {
    row.nd_to_ebitda.or_else(|| {
        (row.ebitda > Decimal::ZERO)
            .then(|| safe_divide(row.debt_balance, row.ebitda, Decimal::ZERO))
    })
}
