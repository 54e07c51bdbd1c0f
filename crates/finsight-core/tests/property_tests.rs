//! Property-based tests for the underwriting pipeline.

use finsight_core::credit::debt::aggregate_debt;
use finsight_core::credit::score::{score_credit, RatingBand};
use finsight_core::credit::stats::{extract_credit_stats, CreditStats, StatsSource};
use finsight_core::inputs::projection::{Projection, ProjectionRow};
use finsight_core::inputs::{FinancialParameters, RawFinancialParameters};
use finsight_core::numeric::{clamp, safe_add, safe_divide, safe_mul};
use finsight_core::UnderwritingThresholds;
use proptest::prelude::*;
use rust_decimal::Decimal;

fn decimal(range: std::ops::Range<i64>, scale: u32) -> impl Strategy<Value = Decimal> {
    range.prop_map(move |n| Decimal::new(n, scale))
}

/// Any `Decimal`, from `Decimal::MIN` to `Decimal::MAX` at every scale.
fn wide_decimal() -> impl Strategy<Value = Decimal> {
    (any::<u32>(), any::<u32>(), any::<u32>(), any::<bool>(), 0u32..=28)
        .prop_map(|(lo, mid, hi, negative, scale)| Decimal::from_parts(lo, mid, hi, negative, scale))
}

fn wide_row_strategy() -> impl Strategy<Value = ProjectionRow> {
    (
        1i32..30,
        wide_decimal(),
        proptest::option::of(wide_decimal()),
        proptest::option::of(wide_decimal()),
        proptest::option::of(wide_decimal()),
        wide_decimal(),
        wide_decimal(),
        wide_decimal(),
    )
        .prop_map(
            |(year, ebitda, dscr, icr, nd, principal, interest, balance)| ProjectionRow {
                year,
                ebitda,
                dscr,
                icr,
                nd_to_ebitda: nd,
                principal_payment: principal,
                interest_expense: interest,
                debt_balance: balance,
                ..Default::default()
            },
        )
}

fn row_strategy() -> impl Strategy<Value = ProjectionRow> {
    (
        1i32..30,
        decimal(-100_000..5_000_000, 0),
        proptest::option::of(decimal(-500..150_000, 2)),
        proptest::option::of(decimal(-500..150_000, 2)),
        proptest::option::of(decimal(-2_000..2_000, 2)),
        decimal(0..1_000_000, 0),
        decimal(0..500_000, 0),
        decimal(0..10_000_000, 0),
    )
        .prop_map(
            |(year, ebitda, dscr, icr, nd, principal, interest, balance)| ProjectionRow {
                year,
                ebitda,
                dscr,
                icr,
                nd_to_ebitda: nd,
                principal_payment: principal,
                interest_expense: interest,
                debt_balance: balance,
                ..Default::default()
            },
        )
}

fn stats_strategy() -> impl Strategy<Value = CreditStats> {
    (
        decimal(-1_000..100_000, 2),
        decimal(-1_000..100_000, 2),
        decimal(-2_000..5_000, 2),
    )
        .prop_map(|(min_dscr, min_icr, max_leverage)| CreditStats {
            min_dscr,
            min_icr,
            max_leverage,
            source: StatsSource::Computed,
            ..CreditStats::zero()
        })
}

proptest! {
    // ========================
    // Numeric helpers
    // ========================

    #[test]
    fn safe_divide_by_zero_returns_default(x in decimal(-1_000_000..1_000_000, 3), d in decimal(-1_000..1_000, 2)) {
        prop_assert_eq!(safe_divide(x, Decimal::ZERO, d), d);
    }

    #[test]
    fn saturating_add_and_mul_never_panic(a in wide_decimal(), b in wide_decimal()) {
        let sum = safe_add(a, b);
        match a.checked_add(b) {
            Some(exact) => prop_assert_eq!(sum, exact),
            None => prop_assert!(sum == Decimal::MAX || sum == Decimal::MIN),
        }
        let product = safe_mul(a, b);
        if a.checked_mul(b).is_none() {
            prop_assert!(product == Decimal::MAX || product == Decimal::MIN);
        }
    }

    #[test]
    fn clamp_stays_in_bounds(v in decimal(-1_000_000..1_000_000, 2), lo in decimal(-1_000..0, 0), hi in decimal(0..1_000, 0)) {
        let c = clamp(v, lo, hi);
        prop_assert!(c >= lo && c <= hi);
    }

    // ========================
    // Credit stats
    // ========================

    #[test]
    fn min_avg_max_ordered(rows in proptest::collection::vec(row_strategy(), 0..12)) {
        let s = extract_credit_stats(&Projection::from_rows(rows), true);
        prop_assert!(s.min_dscr <= s.avg_dscr && s.avg_dscr <= s.max_dscr);
        prop_assert!(s.min_icr <= s.avg_icr && s.avg_icr <= s.max_icr);
        prop_assert!(s.min_leverage <= s.avg_leverage && s.avg_leverage <= s.max_leverage);
    }

    #[test]
    fn min_avg_max_ordered_at_any_magnitude(rows in proptest::collection::vec(wide_row_strategy(), 0..12)) {
        let s = extract_credit_stats(&Projection::from_rows(rows), true);
        prop_assert!(s.min_dscr <= s.avg_dscr && s.avg_dscr <= s.max_dscr);
        prop_assert!(s.min_icr <= s.avg_icr && s.avg_icr <= s.max_icr);
        prop_assert!(s.min_leverage <= s.avg_leverage && s.avg_leverage <= s.max_leverage);
        prop_assert!(s.max_dscr < Decimal::from(999));
    }

    #[test]
    fn coverage_stats_exclude_sentinels(rows in proptest::collection::vec(row_strategy(), 1..12)) {
        let s = extract_credit_stats(&Projection::from_rows(rows), true);
        prop_assert!(s.max_dscr < Decimal::from(999));
        prop_assert!(s.max_icr < Decimal::from(999));
        prop_assert!(s.min_dscr >= Decimal::ZERO);
        prop_assert!(s.min_icr >= Decimal::ZERO);
    }

    #[test]
    fn no_debt_stats_are_zero(rows in proptest::collection::vec(row_strategy(), 0..8)) {
        let s = extract_credit_stats(&Projection::from_rows(rows), false);
        prop_assert_eq!(s, CreditStats::zero());
    }

    // ========================
    // Debt aggregation
    // ========================

    #[test]
    fn toggle_off_means_no_existing_debt(opening in 0u32..50_000_000, requested in 0u32..10_000_000) {
        let raw: RawFinancialParameters = serde_json::from_value(serde_json::json!({
            "hasExistingDebt": false,
            "openingDebt": opening,
            "existingDebtAmount": opening,
            "requestedLoanAmount": requested,
        })).unwrap();
        let params = FinancialParameters::normalize(&raw, &mut Vec::new());
        let debt = aggregate_debt(&params, &Projection::default());
        prop_assert_eq!(debt.existing_debt, Decimal::ZERO);
        prop_assert_eq!(debt.total_debt, Decimal::from(requested));
    }

    #[test]
    fn total_is_existing_plus_new(
        toggle in any::<bool>(),
        opening in 0u32..50_000_000,
        requested in 0u32..10_000_000,
        rate in 0u32..20,
    ) {
        let raw: RawFinancialParameters = serde_json::from_value(serde_json::json!({
            "hasExistingDebt": toggle,
            "openingDebt": opening,
            "existingDebtRate": rate,
            "requestedLoanAmount": requested,
            "proposedPricing": rate,
        })).unwrap();
        let params = FinancialParameters::normalize(&raw, &mut Vec::new());
        let debt = aggregate_debt(&params, &Projection::default());
        prop_assert_eq!(debt.total_debt, debt.existing_debt + debt.new_facility);
        prop_assert!(debt.blended_rate >= Decimal::ZERO);
    }

    #[test]
    fn huge_amounts_saturate_totals(opening in 0f64..7.9e28, requested in 0f64..7.9e28, rate in 0f64..1e20) {
        let raw: RawFinancialParameters = serde_json::from_value(serde_json::json!({
            "hasExistingDebt": true,
            "openingDebt": opening,
            "existingDebtRate": rate,
            "requestedLoanAmount": requested,
            "proposedPricing": rate,
        })).unwrap();
        let params = FinancialParameters::normalize(&raw, &mut Vec::new());
        let debt = aggregate_debt(&params, &Projection::default());
        prop_assert_eq!(debt.total_debt, safe_add(debt.existing_debt, debt.new_facility));
        prop_assert!(debt.total_debt >= debt.existing_debt.max(debt.new_facility));
        prop_assert!(debt.blended_rate >= Decimal::ZERO);
    }

    // ========================
    // Score
    // ========================

    #[test]
    fn score_in_range(stats in stats_strategy()) {
        let s = score_credit(&stats, &UnderwritingThresholds::default());
        prop_assert!(s.score <= 100);
        prop_assert_eq!(s.band, RatingBand::from_score(s.score));
    }

    #[test]
    fn score_in_range_at_any_magnitude(
        min_dscr in wide_decimal(),
        min_icr in wide_decimal(),
        max_leverage in wide_decimal(),
    ) {
        let stats = CreditStats { min_dscr, min_icr, max_leverage, ..CreditStats::zero() };
        let s = score_credit(&stats, &UnderwritingThresholds::default());
        prop_assert!(s.score <= 100);
        prop_assert_eq!(s.band, RatingBand::from_score(s.score));
    }

    #[test]
    fn band_is_monotonic(a in 0u8..=100, b in 0u8..=100) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(RatingBand::from_score(lo) <= RatingBand::from_score(hi));
    }

    #[test]
    fn better_coverage_never_scores_lower(stats in stats_strategy(), bump in decimal(0..500, 2)) {
        let t = UnderwritingThresholds::default();
        let improved = CreditStats {
            min_dscr: stats.min_dscr + bump,
            min_icr: stats.min_icr + bump,
            ..stats.clone()
        };
        prop_assert!(score_credit(&improved, &t).score >= score_credit(&stats, &t).score);
    }
}
