use chrono::Datelike;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{fmt_money, UnderwritingContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckCode {
    DscrBreach,
    DscrTight,
    IcrBreach,
    LeverageBreach,
    HighLtv,
    ExistingDebtOnly,
    NegativeEbitda,
    TrancheMaturesInHorizon,
    NoProjectionData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanityCheck {
    #[serde(rename = "type")]
    pub severity: Severity,
    pub code: CheckCode,
    pub title: String,
    pub message: String,
}

impl SanityCheck {
    fn new(severity: Severity, code: CheckCode, title: &str, message: String) -> Self {
        Self {
            severity,
            code,
            title: title.into(),
            message,
        }
    }
}

/// Compare the snapshot against the thresholds.
///
/// Every check runs independently; none suppresses another. A deal with no
/// debt produces no findings.
pub fn run_sanity_checks(ctx: &UnderwritingContext<'_>) -> Vec<SanityCheck> {
    let mut checks = Vec::new();
    if !ctx.debt_present {
        return checks;
    }

    let stats = &ctx.stats;
    let t = ctx.thresholds;

    if stats.min_dscr < t.min_dscr {
        checks.push(SanityCheck::new(
            Severity::Critical,
            CheckCode::DscrBreach,
            "DSCR covenant breach",
            format!(
                "Minimum DSCR of {:.2}x is below the {:.2}x requirement.",
                stats.min_dscr, t.min_dscr
            ),
        ));
    } else if stats.min_dscr < t.dscr_warning_level() {
        checks.push(SanityCheck::new(
            Severity::Warning,
            CheckCode::DscrTight,
            "Tight DSCR headroom",
            format!(
                "Minimum DSCR of {:.2}x is within {:.0}% of the {:.2}x requirement.",
                stats.min_dscr,
                t.dscr_warning_buffer * Decimal::ONE_HUNDRED,
                t.min_dscr
            ),
        ));
    }

    if stats.min_icr < t.target_icr {
        checks.push(SanityCheck::new(
            Severity::Critical,
            CheckCode::IcrBreach,
            "Interest coverage below target",
            format!(
                "Minimum ICR of {:.2}x is below the {:.2}x target.",
                stats.min_icr, t.target_icr
            ),
        ));
    }

    if stats.max_leverage > t.max_leverage {
        checks.push(SanityCheck::new(
            Severity::Critical,
            CheckCode::LeverageBreach,
            "Leverage above maximum",
            format!(
                "Peak Net Debt/EBITDA of {:.2}x exceeds the {:.2}x maximum.",
                stats.max_leverage, t.max_leverage
            ),
        ));
    }

    if let Some(ltv) = ctx.ltv_pct() {
        if ltv > t.max_ltv_pct {
            checks.push(SanityCheck::new(
                Severity::Warning,
                CheckCode::HighLtv,
                "High loan-to-value",
                format!(
                    "LTV of {:.1}% exceeds {:.0}% (debt {} against collateral {}).",
                    ltv,
                    t.max_ltv_pct,
                    fmt_money(ctx.debt.total_debt),
                    fmt_money(ctx.parameters.collateral_value)
                ),
            ));
        }
    }

    if ctx.debt.is_existing_only() {
        checks.push(SanityCheck::new(
            Severity::Info,
            CheckCode::ExistingDebtOnly,
            "Existing debt only",
            format!(
                "No new facility requested; the analysis reflects existing debt of {} only.",
                fmt_money(ctx.debt.existing_debt)
            ),
        ));
    }

    let loss_years: Vec<String> = ctx
        .projection
        .rows
        .iter()
        .filter(|r| r.ebitda <= Decimal::ZERO)
        .map(|r| r.year.to_string())
        .collect();
    if !loss_years.is_empty() {
        checks.push(SanityCheck::new(
            Severity::Warning,
            CheckCode::NegativeEbitda,
            "Non-positive EBITDA",
            format!(
                "EBITDA is zero or negative in year(s) {}; coverage ratios for those years are not meaningful.",
                loss_years.join(", ")
            ),
        ));
    }

    if let Some(last_year) = ctx.projection.last_year() {
        for tranche in &ctx.parameters.existing_tranches {
            if let Some(maturity) = tranche.maturity_date.filter(|d| d.year() <= last_year) {
                checks.push(SanityCheck::new(
                    Severity::Info,
                    CheckCode::TrancheMaturesInHorizon,
                    "Tranche matures within projection",
                    format!(
                        "{} ({}) matures on {maturity}, inside the projection horizon; refinancing must be assumed.",
                        tranche.name,
                        fmt_money(tranche.amount)
                    ),
                ));
            }
        }
    }

    if ctx.projection.rows.is_empty() && ctx.projection.credit_stats.is_none() {
        checks.push(SanityCheck::new(
            Severity::Info,
            CheckCode::NoProjectionData,
            "No projection data",
            "Debt is present but no projection was supplied; coverage ratios read as zero.".into(),
        ));
    }

    debug!(
        critical = checks.iter().filter(|c| c.severity == Severity::Critical).count(),
        warning = checks.iter().filter(|c| c.severity == Severity::Warning).count(),
        info = checks.iter().filter(|c| c.severity == Severity::Info).count(),
        "Sanity checks complete"
    );

    checks
}
