use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::parameters::{parse_date, AmortizationType, DebtTranche, RawDebtTranche, Seniority};
use crate::credit::stats::{CreditStats, StatsSource};
use crate::numeric::{finite, lenient, normalize_rate, safe_add, safe_number, safe_sum};
use crate::types::*;

// ---------------------------------------------------------------------------
// Raw boundary shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawProjectionRow {
    #[serde(deserialize_with = "lenient::number")]
    pub year: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub ebitda: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub dscr: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub icr: Option<f64>,
    #[serde(alias = "ndToEBITDA", alias = "netDebtToEbitda", deserialize_with = "lenient::number")]
    pub nd_to_ebitda: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub fcf_to_equity: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub principal_payment: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub interest_expense: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub debt_balance: Option<f64>,
}

/// Statistics precomputed by the projection engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCreditStats {
    #[serde(rename = "minDSCR", alias = "minDscr", deserialize_with = "lenient::number")]
    pub min_dscr: Option<f64>,
    #[serde(rename = "maxDSCR", alias = "maxDscr", deserialize_with = "lenient::number")]
    pub max_dscr: Option<f64>,
    #[serde(rename = "avgDSCR", alias = "avgDscr", deserialize_with = "lenient::number")]
    pub avg_dscr: Option<f64>,
    #[serde(rename = "minICR", alias = "minIcr", deserialize_with = "lenient::number")]
    pub min_icr: Option<f64>,
    #[serde(rename = "maxICR", alias = "maxIcr", deserialize_with = "lenient::number")]
    pub max_icr: Option<f64>,
    #[serde(rename = "avgICR", alias = "avgIcr", deserialize_with = "lenient::number")]
    pub avg_icr: Option<f64>,
    #[serde(rename = "minLeverage", deserialize_with = "lenient::number")]
    pub min_leverage: Option<f64>,
    #[serde(rename = "maxLeverage", deserialize_with = "lenient::number")]
    pub max_leverage: Option<f64>,
    #[serde(rename = "avgLeverage", deserialize_with = "lenient::number")]
    pub avg_leverage: Option<f64>,
}

/// Multi-tranche debt summary produced by the amortisation engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawMultiTrancheInfo {
    #[serde(deserialize_with = "lenient::number")]
    pub total_debt: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub existing_debt: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub new_facility: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub blended_rate: Option<f64>,
    #[serde(deserialize_with = "lenient::list")]
    pub tranches: Vec<RawDebtTranche>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawProjectionDetail {
    #[serde(alias = "projections", alias = "years", deserialize_with = "lenient::list")]
    pub rows: Vec<RawProjectionRow>,
    pub credit_stats: Option<RawCreditStats>,
    pub multi_tranche_info: Option<RawMultiTrancheInfo>,
    #[serde(deserialize_with = "lenient::number")]
    pub total_debt: Option<f64>,
}

/// A projection arrives either as a bare array of rows or as an object that
/// also carries precomputed summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawProjection {
    Rows(Vec<RawProjectionRow>),
    Detailed(RawProjectionDetail),
}

impl Default for RawProjection {
    fn default() -> Self {
        RawProjection::Rows(Vec::new())
    }
}

// ---------------------------------------------------------------------------
// Canonical types
// ---------------------------------------------------------------------------

/// One projected year. Ratios are `None` when upstream had no finite value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRow {
    pub year: i32,
    pub ebitda: Money,
    pub dscr: Option<Multiple>,
    pub icr: Option<Multiple>,
    pub nd_to_ebitda: Option<Multiple>,
    pub fcf_to_equity: Money,
    pub principal_payment: Money,
    pub interest_expense: Money,
    pub debt_balance: Money,
}

impl ProjectionRow {
    pub fn debt_service(&self) -> Money {
        safe_add(self.principal_payment, self.interest_expense)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiTrancheSummary {
    pub total_debt: Money,
    pub existing_debt: Money,
    pub new_facility: Money,
    pub blended_rate: Option<Rate>,
    pub tranches: Vec<DebtTranche>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub rows: Vec<ProjectionRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_stats: Option<CreditStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_tranche: Option<MultiTrancheSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_debt: Option<Money>,
}

impl Projection {
    pub fn from_rows(rows: Vec<ProjectionRow>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    pub fn normalize(raw: &RawProjection, warnings: &mut Vec<String>) -> Self {
        let empty = RawProjectionDetail::default();
        let (raw_rows, detail) = match raw {
            RawProjection::Rows(rows) => (rows.as_slice(), &empty),
            RawProjection::Detailed(detail) => (detail.rows.as_slice(), detail),
        };

        let mut dropped = 0usize;
        let rows: Vec<ProjectionRow> = raw_rows
            .iter()
            .enumerate()
            .map(|(i, r)| normalize_row(i, r, &mut dropped))
            .collect();
        if dropped > 0 {
            warnings.push(format!(
                "{dropped} non-finite ratio value(s) in the projection were treated as missing."
            ));
        }

        let credit_stats = detail.credit_stats.as_ref().map(normalize_stats);
        let multi_tranche = detail
            .multi_tranche_info
            .as_ref()
            .map(|m| normalize_multi_tranche(m, warnings));
        let total_debt = finite(detail.total_debt).filter(|d| *d >= Decimal::ZERO);

        debug!(
            rows = rows.len(),
            precomputed_stats = credit_stats.is_some(),
            multi_tranche = multi_tranche.is_some(),
            "Normalised projection"
        );

        Self {
            rows,
            credit_stats,
            multi_tranche,
            total_debt,
        }
    }

    pub fn last_year(&self) -> Option<i32> {
        self.rows.iter().map(|r| r.year).max()
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn normalize_row(index: usize, raw: &RawProjectionRow, dropped: &mut usize) -> ProjectionRow {
    let default_year = Decimal::from(index as i64 + 1);
    let year = safe_number(raw.year, default_year)
        .round()
        .to_i32()
        .unwrap_or(index as i32 + 1);

    let mut ratio = |value: Option<f64>, name: &str| {
        let parsed = finite(value);
        if value.is_some() && parsed.is_none() {
            trace!(year, ratio = name, "Dropping non-finite ratio");
            *dropped += 1;
        }
        parsed
    };

    ProjectionRow {
        year,
        ebitda: safe_number(raw.ebitda, Decimal::ZERO),
        dscr: ratio(raw.dscr, "dscr"),
        icr: ratio(raw.icr, "icr"),
        nd_to_ebitda: ratio(raw.nd_to_ebitda, "nd_to_ebitda"),
        fcf_to_equity: safe_number(raw.fcf_to_equity, Decimal::ZERO),
        principal_payment: safe_number(raw.principal_payment, Decimal::ZERO),
        interest_expense: safe_number(raw.interest_expense, Decimal::ZERO),
        debt_balance: safe_number(raw.debt_balance, Decimal::ZERO),
    }
}

fn normalize_stats(raw: &RawCreditStats) -> CreditStats {
    let n = |v| safe_number(v, Decimal::ZERO);
    CreditStats {
        min_dscr: n(raw.min_dscr),
        max_dscr: n(raw.max_dscr),
        avg_dscr: n(raw.avg_dscr),
        min_icr: n(raw.min_icr),
        max_icr: n(raw.max_icr),
        avg_icr: n(raw.avg_icr),
        min_leverage: n(raw.min_leverage),
        max_leverage: n(raw.max_leverage),
        avg_leverage: n(raw.avg_leverage),
        source: StatsSource::Projection,
    }
}

/// A summary carrying only a total is read as existing debt; the total is
/// always re-derived from its parts.
fn normalize_multi_tranche(
    raw: &RawMultiTrancheInfo,
    warnings: &mut Vec<String>,
) -> MultiTrancheSummary {
    let zero = Decimal::ZERO;
    let mut existing_debt = safe_number(raw.existing_debt, zero).max(zero);
    let new_facility = safe_number(raw.new_facility, zero).max(zero);
    let reported_total = safe_number(raw.total_debt, zero).max(zero);

    let tranches: Vec<DebtTranche> = raw
        .tranches
        .iter()
        .enumerate()
        .filter_map(|(i, t)| {
            let amount = safe_number(t.amount, zero);
            (amount > zero).then(|| DebtTranche {
                name: t.name.clone().unwrap_or_else(|| format!("Tranche {}", i + 1)),
                amount,
                rate: normalize_rate(safe_number(t.rate, zero).max(zero)),
                seniority: t
                    .seniority
                    .as_deref()
                    .and_then(Seniority::parse)
                    .unwrap_or_default(),
                maturity_date: t.maturity_date.as_deref().and_then(parse_date),
                amortization: t
                    .amortization_type
                    .as_deref()
                    .and_then(AmortizationType::parse)
                    .unwrap_or_default(),
            })
        })
        .collect();

    if existing_debt.is_zero() && new_facility.is_zero() {
        let tranche_total = safe_sum(tranches.iter().map(|t| t.amount));
        existing_debt = if reported_total > zero { reported_total } else { tranche_total };
    }

    let total_debt = safe_add(existing_debt, new_facility);
    if reported_total > zero && reported_total != total_debt {
        warnings.push(format!(
            "Multi-tranche total of {reported_total} differs from existing + new ({total_debt}); using the sum."
        ));
    }

    MultiTrancheSummary {
        total_debt,
        existing_debt,
        new_facility,
        blended_rate: finite(raw.blended_rate)
            .filter(|r| *r > zero)
            .map(normalize_rate),
        tranches,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn parse(json: &str) -> (Projection, Vec<String>) {
        let raw: RawProjection = serde_json::from_str(json).unwrap();
        let mut warnings = Vec::new();
        (Projection::normalize(&raw, &mut warnings), warnings)
    }

    #[test]
    fn test_bare_row_array() {
        let (p, _) = parse(
            r#"[{"year": 2025, "ebitda": 500000, "dscr": 1.4, "icr": 3.1, "ndToEbitda": 2.2}]"#,
        );
        assert_eq!(p.rows.len(), 1);
        assert_eq!(p.rows[0].year, 2025);
        assert_eq!(p.rows[0].dscr, Some(dec!(1.4)));
        assert!(p.credit_stats.is_none());
    }

    #[test]
    fn test_detailed_object_with_precomputed_fields() {
        let (p, _) = parse(
            r#"{
                "projections": [{"ebitda": 100}, {"ebitda": 120}],
                "creditStats": {"minDSCR": 1.3, "maxDSCR": 1.9, "avgDSCR": 1.6},
                "totalDebt": 750000
            }"#,
        );
        assert_eq!(p.rows.len(), 2);
        assert_eq!(p.rows[1].year, 2);
        let stats = p.credit_stats.unwrap();
        assert_eq!(stats.min_dscr, dec!(1.3));
        assert_eq!(stats.min_icr, Decimal::ZERO);
        assert_eq!(stats.source, StatsSource::Projection);
        assert_eq!(p.total_debt, Some(dec!(750000)));
    }

    #[test]
    fn test_non_finite_ratios_become_missing() {
        let (p, warnings) = parse(r#"[{"year": 1, "dscr": "Infinity", "icr": "NaN", "ndToEbitda": 3}]"#);
        assert_eq!(p.rows[0].dscr, None);
        assert_eq!(p.rows[0].icr, None);
        assert_eq!(p.rows[0].nd_to_ebitda, Some(dec!(3)));
        assert!(warnings.iter().any(|w| w.starts_with("2 non-finite")));
    }

    #[test]
    fn test_multi_tranche_total_only_reads_as_existing() {
        let (p, _) = parse(r#"{"rows": [], "multiTrancheInfo": {"totalDebt": 2000000}}"#);
        let mt = p.multi_tranche.unwrap();
        assert_eq!(mt.existing_debt, dec!(2000000));
        assert_eq!(mt.new_facility, Decimal::ZERO);
        assert_eq!(mt.total_debt, dec!(2000000));
    }

    #[test]
    fn test_multi_tranche_inconsistent_total_warns() {
        let (p, warnings) = parse(
            r#"{"multiTrancheInfo": {"totalDebt": 10, "existingDebt": 6, "newFacility": 5, "blendedRate": 7.5}}"#,
        );
        let mt = p.multi_tranche.unwrap();
        assert_eq!(mt.total_debt, dec!(11));
        assert_eq!(mt.blended_rate, Some(dec!(0.075)));
        assert!(warnings.iter().any(|w| w.contains("differs")));
    }

    #[test]
    fn test_last_year() {
        let (p, _) = parse(r#"[{"year": 2026}, {"year": 2029}, {"year": 2027}]"#);
        assert_eq!(p.last_year(), Some(2029));
        assert_eq!(Projection::default().last_year(), None);
    }
}
