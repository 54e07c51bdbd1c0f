use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::numeric::{finite, lenient, normalize_rate, safe_mul, safe_number, safe_sum};
use crate::types::*;

// ---------------------------------------------------------------------------
// Raw boundary shape
// ---------------------------------------------------------------------------

/// Financial parameters as the dashboard's deal editor sends them.
///
/// Every field is optional and leniently parsed; [`FinancialParameters::normalize`]
/// turns this into the canonical typed record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawFinancialParameters {
    #[serde(deserialize_with = "lenient::text")]
    pub company_name: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub has_existing_debt: Option<bool>,
    #[serde(deserialize_with = "lenient::number")]
    pub opening_debt: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub existing_debt_amount: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub existing_debt_rate: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub requested_loan_amount: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub proposed_pricing: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub proposed_tenor: Option<f64>,
    #[serde(deserialize_with = "lenient::text")]
    pub amortization_type: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub balloon_percentage: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub balloon_year: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub collateral_value: Option<f64>,
    #[serde(rename = "minDSCR", alias = "minDscr", deserialize_with = "lenient::number")]
    pub min_dscr: Option<f64>,
    #[serde(rename = "targetICR", alias = "targetIcr", deserialize_with = "lenient::number")]
    pub target_icr: Option<f64>,
    #[serde(
        rename = "maxNDToEBITDA",
        alias = "maxNdToEbitda",
        deserialize_with = "lenient::number"
    )]
    pub max_nd_to_ebitda: Option<f64>,
    #[serde(rename = "maxLTV", alias = "maxLtv", deserialize_with = "lenient::number")]
    pub max_ltv: Option<f64>,
    #[serde(deserialize_with = "lenient::text")]
    pub credit_history: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub management_experience: Option<String>,
    #[serde(deserialize_with = "lenient::list")]
    pub debt_tranches: Vec<RawDebtTranche>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDebtTranche {
    #[serde(deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub amount: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub rate: Option<f64>,
    #[serde(deserialize_with = "lenient::text")]
    pub seniority: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub maturity_date: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub amortization_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Canonical types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmortizationType {
    /// Level principal repayment over the tenor
    #[default]
    Amortizing,
    /// Interest only, principal at maturity
    InterestOnly,
    /// Single repayment at maturity
    Bullet,
    /// Partial amortisation with a final balloon
    Balloon,
}

impl AmortizationType {
    pub fn parse(label: &str) -> Option<Self> {
        let key: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "amortizing" | "amortising" | "amortization" | "amortisation" | "straightline"
            | "linear" | "equal" | "equalprincipal" | "annuity" => Some(Self::Amortizing),
            "interestonly" | "io" => Some(Self::InterestOnly),
            "bullet" => Some(Self::Bullet),
            "balloon" => Some(Self::Balloon),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Seniority {
    #[default]
    Senior,
    Mezzanine,
    Subordinated,
}

impl Seniority {
    pub fn parse(label: &str) -> Option<Self> {
        let key = label.trim().to_ascii_lowercase();
        match key.as_str() {
            "senior" | "senior secured" | "first lien" | "1st lien" | "1" => Some(Self::Senior),
            "mezzanine" | "mezz" | "second lien" | "2nd lien" | "2" => Some(Self::Mezzanine),
            "subordinated" | "sub" | "junior" | "unsecured" | "3" => Some(Self::Subordinated),
            _ => None,
        }
    }
}

/// One slice of existing debt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtTranche {
    pub name: String,
    pub amount: Money,
    pub rate: Rate,
    pub seniority: Seniority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maturity_date: Option<NaiveDate>,
    pub amortization: AmortizationType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balloon {
    /// Share of the facility repaid at maturity, in percent.
    pub percentage: Percent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
}

/// The facility being requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFacility {
    pub amount: Money,
    pub rate: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenor_years: Option<u32>,
    pub amortization: AmortizationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balloon: Option<Balloon>,
}

impl NewFacility {
    pub fn balloon_amount(&self) -> Money {
        self.balloon
            .as_ref()
            .map(|b| safe_mul(self.amount, b.percentage) / dec!(100))
            .unwrap_or(Decimal::ZERO)
    }
}

/// Per-deal threshold overrides. `None` defers to the configured thresholds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdOverrides {
    pub min_dscr: Option<Multiple>,
    pub target_icr: Option<Multiple>,
    pub max_leverage: Option<Multiple>,
    pub max_ltv_pct: Option<Percent>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditHistory {
    Excellent,
    Good,
    Fair,
    Poor,
    #[default]
    Unknown,
}

impl CreditHistory {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "excellent" | "strong" | "clean" => Self::Excellent,
            "good" | "satisfactory" => Self::Good,
            "fair" | "average" | "limited" => Self::Fair,
            "poor" | "weak" | "adverse" | "default" => Self::Poor,
            _ => Self::Unknown,
        }
    }

    pub fn is_satisfactory(self) -> bool {
        matches!(self, Self::Excellent | Self::Good)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManagementExperience {
    Extensive,
    Adequate,
    Limited,
    #[default]
    Unknown,
}

impl ManagementExperience {
    /// Accepts a descriptive label or a number of years.
    pub fn parse(label: &str) -> Self {
        let key = label.trim().to_ascii_lowercase();
        if let Ok(years) = key.trim_end_matches("years").trim().parse::<f64>() {
            return match years {
                y if y >= 10.0 => Self::Extensive,
                y if y >= 5.0 => Self::Adequate,
                y if y >= 0.0 => Self::Limited,
                _ => Self::Unknown,
            };
        }
        match key.as_str() {
            "extensive" | "strong" | "excellent" | "seasoned" | "high" => Self::Extensive,
            "adequate" | "moderate" | "good" | "medium" => Self::Adequate,
            "limited" | "weak" | "low" | "none" | "new" => Self::Limited,
            _ => Self::Unknown,
        }
    }

    pub fn is_satisfactory(self) -> bool {
        matches!(self, Self::Extensive | Self::Adequate)
    }
}

/// Canonical financial parameters.
///
/// Existing debt always lives in `existing_tranches`, whichever legacy shape
/// it arrived in, and the list is empty whenever `has_existing_debt` is off.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    pub has_existing_debt: bool,
    pub existing_tranches: Vec<DebtTranche>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_facility: Option<NewFacility>,
    pub collateral_value: Money,
    pub thresholds: ThresholdOverrides,
    pub credit_history: CreditHistory,
    pub management_experience: ManagementExperience,
}

impl FinancialParameters {
    /// Resolve the raw parameter bag into the canonical record, appending a
    /// note to `warnings` for every value that was ignored or reinterpreted.
    pub fn normalize(raw: &RawFinancialParameters, warnings: &mut Vec<String>) -> Self {
        let has_existing_debt = raw.has_existing_debt.unwrap_or(false);

        let existing_tranches = if has_existing_debt {
            resolve_existing_tranches(raw, warnings)
        } else {
            let ignored = safe_number(raw.opening_debt, Decimal::ZERO)
                .max(safe_number(raw.existing_debt_amount, Decimal::ZERO))
                .max(
                    safe_sum(
                        raw.debt_tranches
                            .iter()
                            .map(|t| safe_number(t.amount, Decimal::ZERO).max(Decimal::ZERO)),
                    ),
                );
            if ignored > Decimal::ZERO {
                warnings.push(format!(
                    "hasExistingDebt is off; existing debt of {ignored} excluded from all totals."
                ));
            }
            Vec::new()
        };

        let new_facility = resolve_new_facility(raw, warnings);

        let collateral_value = safe_number(raw.collateral_value, Decimal::ZERO).max(Decimal::ZERO);

        let thresholds = ThresholdOverrides {
            min_dscr: positive(raw.min_dscr),
            target_icr: positive(raw.target_icr),
            max_leverage: positive(raw.max_nd_to_ebitda),
            max_ltv_pct: positive(raw.max_ltv).map(as_percent),
        };

        let params = Self {
            company_name: raw.company_name.clone(),
            has_existing_debt,
            existing_tranches,
            new_facility,
            collateral_value,
            thresholds,
            credit_history: raw
                .credit_history
                .as_deref()
                .map(CreditHistory::parse)
                .unwrap_or_default(),
            management_experience: raw
                .management_experience
                .as_deref()
                .map(ManagementExperience::parse)
                .unwrap_or_default(),
        };

        debug!(
            has_existing_debt,
            existing_tranches = params.existing_tranches.len(),
            existing_debt = %params.existing_debt(),
            new_facility = %params.new_facility_amount(),
            "Normalised financial parameters"
        );

        params
    }

    /// Toggle-respecting existing debt.
    pub fn existing_debt(&self) -> Money {
        safe_sum(self.existing_tranches.iter().map(|t| t.amount))
    }

    pub fn new_facility_amount(&self) -> Money {
        self.new_facility
            .as_ref()
            .map(|f| f.amount)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn balloon(&self) -> Option<&Balloon> {
        self.new_facility.as_ref().and_then(|f| f.balloon.as_ref())
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn positive(value: Option<f64>) -> Option<Decimal> {
    finite(value).filter(|v| *v > Decimal::ZERO)
}

/// Fractions up to 1 are scaled to percent (`0.75` means 75%).
fn as_percent(value: Decimal) -> Decimal {
    if value <= Decimal::ONE {
        value * dec!(100)
    } else {
        value
    }
}

fn rate_from(value: Option<f64>, field: &str, warnings: &mut Vec<String>) -> Rate {
    let raw = safe_number(value, Decimal::ZERO).max(Decimal::ZERO);
    let rate = normalize_rate(raw);
    if rate != raw {
        warnings.push(format!("{field} of {raw} read as a percentage ({rate})."));
    }
    rate
}

/// A supplied tranche list wins over the single opening-debt fields; the
/// latter fall back in order `openingDebt`, then `existingDebtAmount`.
fn resolve_existing_tranches(
    raw: &RawFinancialParameters,
    warnings: &mut Vec<String>,
) -> Vec<DebtTranche> {
    let tranches: Vec<DebtTranche> = raw
        .debt_tranches
        .iter()
        .enumerate()
        .filter_map(|(i, t)| normalize_tranche(i, t, warnings))
        .collect();
    if !tranches.is_empty() {
        return tranches;
    }

    let opening = safe_number(raw.opening_debt, Decimal::ZERO);
    let amount = if opening > Decimal::ZERO {
        opening
    } else {
        safe_number(raw.existing_debt_amount, Decimal::ZERO)
    };
    if amount <= Decimal::ZERO {
        return Vec::new();
    }

    vec![DebtTranche {
        name: "Existing Debt".into(),
        amount,
        rate: rate_from(raw.existing_debt_rate, "existingDebtRate", warnings),
        seniority: Seniority::Senior,
        maturity_date: None,
        amortization: AmortizationType::Amortizing,
    }]
}

fn normalize_tranche(
    index: usize,
    raw: &RawDebtTranche,
    warnings: &mut Vec<String>,
) -> Option<DebtTranche> {
    let amount = safe_number(raw.amount, Decimal::ZERO);
    if amount <= Decimal::ZERO {
        return None;
    }
    let name = raw
        .name
        .clone()
        .unwrap_or_else(|| format!("Tranche {}", index + 1));
    let maturity_date = raw.maturity_date.as_deref().and_then(|s| {
        let parsed = parse_date(s);
        if parsed.is_none() {
            warnings.push(format!("{name}: unreadable maturity date '{s}' ignored."));
        }
        parsed
    });
    Some(DebtTranche {
        rate: rate_from(raw.rate, &format!("{name} rate"), warnings),
        seniority: raw
            .seniority
            .as_deref()
            .and_then(Seniority::parse)
            .unwrap_or_default(),
        amortization: raw
            .amortization_type
            .as_deref()
            .and_then(AmortizationType::parse)
            .unwrap_or_default(),
        name,
        amount,
        maturity_date,
    })
}

/// Accepts `YYYY-MM-DD` and ISO timestamps.
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let head = value.trim().get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn resolve_new_facility(
    raw: &RawFinancialParameters,
    warnings: &mut Vec<String>,
) -> Option<NewFacility> {
    let amount = safe_number(raw.requested_loan_amount, Decimal::ZERO);
    if amount <= Decimal::ZERO {
        return None;
    }

    let amortization = raw
        .amortization_type
        .as_deref()
        .and_then(AmortizationType::parse)
        .unwrap_or_default();

    let balloon = positive(raw.balloon_percentage).map(|pct| Balloon {
        percentage: as_percent(pct).min(dec!(100)),
        year: positive(raw.balloon_year).and_then(|y| y.round().to_u32()),
    });

    Some(NewFacility {
        amount,
        rate: rate_from(raw.proposed_pricing, "proposedPricing", warnings),
        tenor_years: positive(raw.proposed_tenor).and_then(|t| t.round().to_u32()),
        amortization,
        balloon,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> (FinancialParameters, Vec<String>) {
        let raw: RawFinancialParameters = serde_json::from_str(json).unwrap();
        let mut warnings = Vec::new();
        let params = FinancialParameters::normalize(&raw, &mut warnings);
        (params, warnings)
    }

    #[test]
    fn test_toggle_off_ignores_opening_debt() {
        let (p, warnings) = parse(r#"{"hasExistingDebt": false, "openingDebt": 2000000}"#);
        assert!(p.existing_tranches.is_empty());
        assert_eq!(p.existing_debt(), Decimal::ZERO);
        assert!(warnings.iter().any(|w| w.contains("hasExistingDebt is off")));
    }

    #[test]
    fn test_missing_toggle_is_off() {
        let (p, _) = parse(r#"{"openingDebt": 500000}"#);
        assert!(!p.has_existing_debt);
        assert_eq!(p.existing_debt(), Decimal::ZERO);
    }

    #[test]
    fn test_opening_debt_falls_back_to_existing_amount() {
        let (p, _) = parse(
            r#"{"hasExistingDebt": true, "openingDebt": 0, "existingDebtAmount": 750000, "existingDebtRate": 0.07}"#,
        );
        assert_eq!(p.existing_debt(), dec!(750000));
        assert_eq!(p.existing_tranches[0].rate, dec!(0.07));
    }

    #[test]
    fn test_tranche_list_wins_over_opening_debt() {
        let (p, _) = parse(
            r#"{
                "hasExistingDebt": true,
                "openingDebt": 999,
                "debtTranches": [
                    {"name": "Term Loan A", "amount": 600000, "rate": 6.5, "seniority": "senior", "maturityDate": "2028-06-30"},
                    {"amount": 400000, "rate": 0.11, "seniority": "mezz", "amortizationType": "bullet"},
                    {"name": "Empty", "amount": 0}
                ]
            }"#,
        );
        assert_eq!(p.existing_tranches.len(), 2);
        assert_eq!(p.existing_debt(), dec!(1000000));
        assert_eq!(p.existing_tranches[0].rate, dec!(0.065));
        assert_eq!(
            p.existing_tranches[0].maturity_date,
            NaiveDate::from_ymd_opt(2028, 6, 30)
        );
        assert_eq!(p.existing_tranches[1].name, "Tranche 2");
        assert_eq!(p.existing_tranches[1].seniority, Seniority::Mezzanine);
        assert_eq!(p.existing_tranches[1].amortization, AmortizationType::Bullet);
    }

    #[test]
    fn test_new_facility_with_balloon() {
        let (p, warnings) = parse(
            r#"{"requestedLoanAmount": "500,000", "proposedPricing": 9, "proposedTenor": 7,
                "amortizationType": "balloon", "balloonPercentage": 0.3, "balloonYear": 7}"#,
        );
        let facility = p.new_facility.as_ref().unwrap();
        assert_eq!(facility.amount, dec!(500000));
        assert_eq!(facility.rate, dec!(0.09));
        assert_eq!(facility.tenor_years, Some(7));
        assert_eq!(facility.amortization, AmortizationType::Balloon);
        assert_eq!(facility.balloon_amount(), dec!(150000));
        assert!(warnings.iter().any(|w| w.contains("proposedPricing")));
    }

    #[test]
    fn test_zero_request_has_no_facility() {
        let (p, _) = parse(r#"{"requestedLoanAmount": 0}"#);
        assert!(p.new_facility.is_none());
        assert_eq!(p.new_facility_amount(), Decimal::ZERO);
    }

    #[test]
    fn test_threshold_overrides_read_spec_field_names() {
        let (p, _) = parse(r#"{"minDSCR": 1.2, "targetICR": "2.5", "maxNDToEBITDA": null, "maxLTV": 0.75}"#);
        assert_eq!(p.thresholds.min_dscr, Some(dec!(1.2)));
        assert_eq!(p.thresholds.target_icr, Some(dec!(2.5)));
        assert_eq!(p.thresholds.max_leverage, None);
        assert_eq!(p.thresholds.max_ltv_pct, Some(dec!(75)));
    }

    #[test]
    fn test_qualitative_fields() {
        let (p, _) = parse(r#"{"creditHistory": "Good", "managementExperience": "12 years"}"#);
        assert_eq!(p.credit_history, CreditHistory::Good);
        assert_eq!(p.management_experience, ManagementExperience::Extensive);
        assert_eq!(ManagementExperience::parse("3"), ManagementExperience::Limited);
        assert_eq!(CreditHistory::parse("???"), CreditHistory::Unknown);
    }

    #[test]
    fn test_bad_maturity_date_is_noted() {
        let (p, warnings) = parse(
            r#"{"hasExistingDebt": true, "debtTranches": [{"name": "TLB", "amount": 1, "maturityDate": "soon"}]}"#,
        );
        assert_eq!(p.existing_tranches[0].maturity_date, None);
        assert!(warnings.iter().any(|w| w.contains("TLB")));
    }
}
