use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{fmt_money, UnderwritingContext};
use crate::config::UnderwritingThresholds;
use crate::numeric::safe_mul;
use crate::types::*;

pub const PENDING_CONDITIONS: &str = "Financial covenants will be established upon disbursement";

/// DSRA is sized in months of debt service, scaling down as coverage improves.
pub fn dsra_months(min_dscr: Multiple, thresholds: &UnderwritingThresholds) -> u32 {
    if min_dscr < thresholds.min_dscr {
        12
    } else if min_dscr < safe_mul(thresholds.min_dscr, dec!(1.25)) {
        6
    } else {
        3
    }
}

/// Ordered covenant and condition statements for the term sheet.
pub fn build_conditions(ctx: &UnderwritingContext<'_>) -> Vec<String> {
    if !ctx.debt_present {
        return vec![PENDING_CONDITIONS.to_string()];
    }

    let stats = &ctx.stats;
    let t = ctx.thresholds;
    let mut conditions = Vec::new();

    conditions.push(format!(
        "Maintain a minimum DSCR of {:.2}x, tested annually",
        t.min_dscr
    ));

    conditions.push(format!(
        "Fund a Debt Service Reserve Account equal to {} months of debt service",
        dsra_months(stats.min_dscr, t)
    ));

    if stats.min_icr < t.target_icr {
        conditions.push(format!(
            "Maintain interest coverage of at least {:.2}x, tested quarterly until two consecutive passes",
            t.target_icr
        ));
    } else {
        conditions.push(format!(
            "Maintain interest coverage of at least {:.2}x",
            t.target_icr
        ));
    }

    let leverage_cap = format!("Net Debt/EBITDA not to exceed {:.2}x", t.max_leverage);
    if stats.max_leverage > t.max_leverage {
        conditions.push(format!(
            "{leverage_cap}; 75% excess cash flow sweep until leverage is back within the cap"
        ));
    } else if stats.max_leverage > safe_mul(t.max_leverage, dec!(0.8)) {
        conditions.push(format!(
            "{leverage_cap}; 50% excess cash flow sweep while leverage is within 20% of the cap"
        ));
    } else {
        conditions.push(leverage_cap);
    }

    if stats.min_dscr < t.dscr_warning_level() {
        conditions.push(format!(
            "Distribution lock-up while DSCR is below {:.2}x",
            t.dscr_warning_level()
        ));
    }

    if let Some(ltv) = ctx.ltv_pct() {
        if ltv > t.max_ltv_pct {
            conditions.push(format!(
                "Collateral top-up within 90 days to restore LTV to {:.0}% (currently {:.1}%)",
                t.max_ltv_pct, ltv
            ));
        } else {
            conditions.push(format!(
                "Maintain LTV at or below {:.0}%, with annual collateral revaluation",
                t.max_ltv_pct
            ));
        }
    }

    if let Some(facility) = ctx
        .parameters
        .new_facility
        .as_ref()
        .filter(|f| f.balloon.is_some())
    {
        conditions.push(format!(
            "Deliver a refinancing plan for the {} balloon no later than 12 months before maturity",
            fmt_money(facility.balloon_amount())
        ));
    }

    if ctx.debt.existing_debt > Decimal::ZERO && ctx.debt.new_facility > Decimal::ZERO {
        conditions.push("Intercreditor agreement with existing lenders".to_string());
    }

    conditions.push(
        "Quarterly management accounts and audited annual financial statements with a compliance certificate"
            .to_string(),
    );

    conditions
}
