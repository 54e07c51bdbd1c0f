use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{fmt_money, UnderwritingContext};
use crate::inputs::parameters::{CreditHistory, ManagementExperience};
use crate::numeric::safe_mul;

pub const PENDING_RATIONALE: &str = "Credit metrics pending facility disbursement";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
    Pending,
}

impl Outcome {
    fn from_pass(pass: bool) -> Self {
        if pass {
            Self::Pass
        } else {
            Self::Fail
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RationaleBullet {
    pub criterion: String,
    pub detail: String,
    pub outcome: Outcome,
}

struct Candidate {
    show: bool,
    pass: bool,
    criterion: &'static str,
    detail: String,
}

/// Underwriting rationale bullets for the shown criteria.
pub fn build_rationale(ctx: &UnderwritingContext<'_>) -> Vec<RationaleBullet> {
    if !ctx.debt_present {
        return vec![RationaleBullet {
            criterion: "Debt Service".into(),
            detail: PENDING_RATIONALE.into(),
            outcome: Outcome::Pending,
        }];
    }

    let stats = &ctx.stats;
    let t = ctx.thresholds;
    let params = ctx.parameters;
    let ltv = ctx.ltv_pct();
    let facility = params.new_facility.as_ref();
    let balloon = params.balloon();

    let candidates = [
        Candidate {
            show: true,
            pass: stats.min_dscr >= t.min_dscr,
            criterion: "Debt Service Coverage",
            detail: format!(
                "Minimum DSCR {:.2}x (average {:.2}x) against a {:.2}x requirement",
                stats.min_dscr, stats.avg_dscr, t.min_dscr
            ),
        },
        Candidate {
            show: true,
            pass: stats.min_icr >= t.target_icr,
            criterion: "Interest Coverage",
            detail: format!(
                "Minimum ICR {:.2}x against a {:.2}x target",
                stats.min_icr, t.target_icr
            ),
        },
        Candidate {
            show: true,
            pass: stats.max_leverage <= t.max_leverage,
            criterion: "Leverage",
            detail: format!(
                "Peak Net Debt/EBITDA {:.2}x against a {:.2}x maximum",
                stats.max_leverage, t.max_leverage
            ),
        },
        Candidate {
            show: ltv.is_some(),
            pass: ltv.is_some_and(|v| v <= t.max_ltv_pct),
            criterion: "Collateral Coverage",
            detail: format!(
                "LTV {:.1}% against a {:.0}% maximum (collateral {})",
                ltv.unwrap_or(Decimal::ZERO),
                t.max_ltv_pct,
                fmt_money(params.collateral_value)
            ),
        },
        Candidate {
            show: balloon.is_some(),
            pass: balloon.is_some_and(|b| b.percentage <= t.max_balloon_pct)
                && stats.min_dscr >= t.dscr_warning_level(),
            criterion: "Balloon Refinancing",
            detail: match (balloon, facility) {
                (Some(b), Some(f)) => format!(
                    "Balloon of {:.0}% ({}) due {}; refinancing risk assessed against coverage headroom",
                    b.percentage,
                    fmt_money(f.balloon_amount()),
                    b.year
                        .or(f.tenor_years)
                        .map(|y| format!("in year {y}"))
                        .unwrap_or_else(|| "at maturity".into())
                ),
                _ => String::new(),
            },
        },
        Candidate {
            show: params.credit_history != CreditHistory::Unknown,
            pass: params.credit_history.is_satisfactory(),
            criterion: "Credit History",
            detail: format!("Credit history rated {:?}", params.credit_history),
        },
        Candidate {
            show: params.management_experience != ManagementExperience::Unknown,
            pass: params.management_experience.is_satisfactory(),
            criterion: "Management Experience",
            detail: format!(
                "Management experience assessed as {:?}",
                params.management_experience
            ),
        },
        Candidate {
            show: ctx.debt.existing_debt > Decimal::ZERO,
            pass: stats.min_dscr >= t.min_dscr,
            criterion: "Existing Obligations",
            detail: format!(
                "Existing debt of {} serviced alongside {} of new facility at a blended {:.2}%",
                fmt_money(ctx.debt.existing_debt),
                fmt_money(ctx.debt.new_facility),
                safe_mul(ctx.debt.blended_rate, Decimal::ONE_HUNDRED)
            ),
        },
    ];

    candidates
        .into_iter()
        .filter(|c| c.show)
        .map(|c| RationaleBullet {
            criterion: c.criterion.into(),
            detail: c.detail,
            outcome: Outcome::from_pass(c.pass),
        })
        .collect()
}
