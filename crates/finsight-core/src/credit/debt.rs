use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::inputs::parameters::{AmortizationType, DebtTranche, FinancialParameters, Seniority};
use crate::inputs::projection::{MultiTrancheSummary, Projection};
use crate::numeric::{safe_add, safe_divide, safe_mul, safe_sum};
use crate::types::*;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Where the debt totals were taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebtSource {
    #[serde(rename = "Multi-Tranche (From Projection)")]
    MultiTrancheProjection,
    #[serde(rename = "From Parameters")]
    Parameters,
}

impl std::fmt::Display for DebtSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::MultiTrancheProjection => "Multi-Tranche (From Projection)",
            Self::Parameters => "From Parameters",
        };
        write!(f, "{}", s)
    }
}

/// Provenance of a single component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    #[serde(rename = "From Parameters")]
    Parameters,
    #[serde(rename = "From Projection")]
    Projection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtComponent {
    pub name: String,
    pub amount: Money,
    pub rate: Rate,
    pub seniority: Seniority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maturity_date: Option<NaiveDate>,
    pub amortization: AmortizationType,
    pub provenance: Provenance,
}

impl DebtComponent {
    fn from_tranche(tranche: &DebtTranche, provenance: Provenance) -> Self {
        Self {
            name: tranche.name.clone(),
            amount: tranche.amount,
            rate: tranche.rate,
            seniority: tranche.seniority,
            maturity_date: tranche.maturity_date,
            amortization: tranche.amortization,
            provenance,
        }
    }
}

/// Canonical debt picture. `total_debt == existing_debt + new_facility`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtInfo {
    pub total_debt: Money,
    pub existing_debt: Money,
    pub new_facility: Money,
    pub components: Vec<DebtComponent>,
    pub blended_rate: Rate,
    pub source: DebtSource,
}

impl DebtInfo {
    pub fn is_existing_only(&self) -> bool {
        self.existing_debt > Decimal::ZERO && self.new_facility.is_zero()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Resolve the debt picture.
///
/// A projection-level multi-tranche summary is authoritative only when the
/// existing-debt toggle is on; otherwise totals come from the parameters.
pub fn aggregate_debt(params: &FinancialParameters, projection: &Projection) -> DebtInfo {
    let info = match projection.multi_tranche.as_ref() {
        Some(summary) if params.has_existing_debt => from_projection_summary(summary),
        _ => from_parameters(params),
    };

    debug!(
        source = %info.source,
        total_debt = %info.total_debt,
        existing_debt = %info.existing_debt,
        new_facility = %info.new_facility,
        blended_rate = %info.blended_rate,
        components = info.components.len(),
        "Aggregated debt"
    );

    info
}

/// Weighted-average rate over the components; 0 when there is no debt.
pub fn blended_rate(components: &[DebtComponent], total_debt: Money) -> Rate {
    let weighted = safe_sum(components.iter().map(|c| safe_mul(c.amount, c.rate)));
    safe_divide(weighted, total_debt, Decimal::ZERO)
}

/// Whether the deal carries any debt at all.
///
/// Upstream projection data may know about debt the parameters do not, so
/// the toggle-respecting totals, the tranche lists and the projection's
/// precomputed total are OR'd together.
pub fn has_debt(debt: &DebtInfo, params: &FinancialParameters, projection: &Projection) -> bool {
    debt.total_debt > Decimal::ZERO
        || !debt.components.is_empty()
        || !params.existing_tranches.is_empty()
        || projection.total_debt.is_some_and(|t| t > Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn from_parameters(params: &FinancialParameters) -> DebtInfo {
    let mut components: Vec<DebtComponent> = params
        .existing_tranches
        .iter()
        .filter(|t| t.amount > Decimal::ZERO)
        .map(|t| DebtComponent::from_tranche(t, Provenance::Parameters))
        .collect();

    if let Some(facility) = params.new_facility.as_ref().filter(|f| f.amount > Decimal::ZERO) {
        components.push(DebtComponent {
            name: "New Facility".into(),
            amount: facility.amount,
            rate: facility.rate,
            seniority: Seniority::Senior,
            maturity_date: None,
            amortization: facility.amortization,
            provenance: Provenance::Parameters,
        });
    }

    let existing_debt = params.existing_debt();
    let new_facility = params.new_facility_amount();
    let total_debt = safe_add(existing_debt, new_facility);

    DebtInfo {
        total_debt,
        existing_debt,
        new_facility,
        blended_rate: blended_rate(&components, total_debt),
        components,
        source: DebtSource::Parameters,
    }
}

fn from_projection_summary(summary: &MultiTrancheSummary) -> DebtInfo {
    let total_debt = safe_add(summary.existing_debt, summary.new_facility);

    let mut components: Vec<DebtComponent> = summary
        .tranches
        .iter()
        .map(|t| DebtComponent::from_tranche(t, Provenance::Projection))
        .collect();

    let fallback_rate = summary.blended_rate.unwrap_or(Decimal::ZERO);
    if components.is_empty() {
        for (name, amount) in [
            ("Existing Debt", summary.existing_debt),
            ("New Facility", summary.new_facility),
        ] {
            if amount > Decimal::ZERO {
                components.push(DebtComponent {
                    name: name.into(),
                    amount,
                    rate: fallback_rate,
                    seniority: Seniority::Senior,
                    maturity_date: None,
                    amortization: AmortizationType::default(),
                    provenance: Provenance::Projection,
                });
            }
        }
    }

    let blended = summary
        .blended_rate
        .filter(|r| *r > Decimal::ZERO)
        .unwrap_or_else(|| blended_rate(&components, total_debt));

    DebtInfo {
        total_debt,
        existing_debt: summary.existing_debt,
        new_facility: summary.new_facility,
        components,
        blended_rate: blended,
        source: DebtSource::MultiTrancheProjection,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::parameters::NewFacility;
    use rust_decimal_macros::dec;

    fn tranche(name: &str, amount: Decimal, rate: Decimal) -> DebtTranche {
        DebtTranche {
            name: name.into(),
            amount,
            rate,
            seniority: Seniority::Senior,
            maturity_date: None,
            amortization: AmortizationType::Amortizing,
        }
    }

    fn facility(amount: Decimal, rate: Decimal) -> NewFacility {
        NewFacility {
            amount,
            rate,
            tenor_years: Some(5),
            amortization: AmortizationType::Amortizing,
            balloon: None,
        }
    }

    #[test]
    fn test_existing_plus_new_blended_rate() {
        let params = FinancialParameters {
            has_existing_debt: true,
            existing_tranches: vec![tranche("Existing Debt", dec!(1_000_000), dec!(0.08))],
            new_facility: Some(facility(dec!(500_000), dec!(0.10))),
            ..Default::default()
        };
        let info = aggregate_debt(&params, &Projection::default());
        assert_eq!(info.total_debt, dec!(1_500_000));
        assert_eq!(info.existing_debt, dec!(1_000_000));
        assert_eq!(info.new_facility, dec!(500_000));
        // (80k + 50k) / 1.5M
        assert_eq!(info.blended_rate, dec!(130_000) / dec!(1_500_000));
        assert_eq!(info.source, DebtSource::Parameters);
        assert_eq!(info.components.len(), 2);
        assert!(info
            .components
            .iter()
            .all(|c| c.provenance == Provenance::Parameters));
    }

    #[test]
    fn test_no_debt_yields_zero_rate_and_no_components() {
        let info = aggregate_debt(&FinancialParameters::default(), &Projection::default());
        assert_eq!(info.total_debt, Decimal::ZERO);
        assert_eq!(info.blended_rate, Decimal::ZERO);
        assert!(info.components.is_empty());
    }

    #[test]
    fn test_projection_summary_requires_toggle() {
        let projection = Projection {
            multi_tranche: Some(MultiTrancheSummary {
                total_debt: dec!(900_000),
                existing_debt: dec!(900_000),
                new_facility: Decimal::ZERO,
                blended_rate: Some(dec!(0.07)),
                tranches: vec![],
            }),
            ..Default::default()
        };
        let params = FinancialParameters {
            has_existing_debt: false,
            new_facility: Some(facility(dec!(200_000), dec!(0.09))),
            ..Default::default()
        };
        let info = aggregate_debt(&params, &projection);
        assert_eq!(info.source, DebtSource::Parameters);
        assert_eq!(info.total_debt, dec!(200_000));

        let params = FinancialParameters {
            has_existing_debt: true,
            ..params
        };
        let info = aggregate_debt(&params, &projection);
        assert_eq!(info.source, DebtSource::MultiTrancheProjection);
        assert_eq!(info.total_debt, dec!(900_000));
        assert_eq!(info.blended_rate, dec!(0.07));
        assert_eq!(info.components.len(), 1);
        assert_eq!(info.components[0].provenance, Provenance::Projection);
    }

    #[test]
    fn test_projection_summary_computes_missing_blended_rate() {
        let projection = Projection {
            multi_tranche: Some(MultiTrancheSummary {
                total_debt: dec!(1_000),
                existing_debt: dec!(600),
                new_facility: dec!(400),
                blended_rate: None,
                tranches: vec![
                    tranche("A", dec!(600), dec!(0.05)),
                    tranche("B", dec!(400), dec!(0.10)),
                ],
            }),
            ..Default::default()
        };
        let params = FinancialParameters {
            has_existing_debt: true,
            ..Default::default()
        };
        let info = aggregate_debt(&params, &projection);
        // (30 + 40) / 1000
        assert_eq!(info.blended_rate, dec!(0.07));
        assert_eq!(info.total_debt, info.existing_debt + info.new_facility);
    }

    #[test]
    fn test_has_debt_or_conditions() {
        let params = FinancialParameters::default();
        let empty = aggregate_debt(&params, &Projection::default());
        assert!(!has_debt(&empty, &params, &Projection::default()));

        let projection = Projection {
            total_debt: Some(dec!(10)),
            ..Default::default()
        };
        assert!(has_debt(&empty, &params, &projection));

        let with_tranche = FinancialParameters {
            has_existing_debt: true,
            existing_tranches: vec![tranche("T", dec!(5), dec!(0.05))],
            ..Default::default()
        };
        assert!(has_debt(&empty, &with_tranche, &Projection::default()));
    }
}
