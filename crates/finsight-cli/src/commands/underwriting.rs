use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Instant;

use finsight_core::credit::assessment::{self, CreditAssessmentInput};
use finsight_core::credit::score::score_credit;
use finsight_core::credit::stats::{CreditStats, StatsSource};
use finsight_core::{with_metadata, UnderwritingThresholds};

use crate::{config, input};

/// Threshold overrides shared by every underwriting subcommand. These sit on
/// top of `--config`; per-deal values in the parameters still win.
#[derive(Args, Debug, Default)]
pub struct ThresholdFlags {
    /// Minimum DSCR
    #[arg(long)]
    pub threshold_dscr: Option<Decimal>,

    /// Target interest coverage
    #[arg(long)]
    pub threshold_icr: Option<Decimal>,

    /// Maximum Net Debt / EBITDA
    #[arg(long)]
    pub threshold_leverage: Option<Decimal>,

    /// Maximum LTV, in percent
    #[arg(long)]
    pub threshold_ltv: Option<Decimal>,

    /// Fraction above minimum DSCR that is flagged as tight
    #[arg(long)]
    pub dscr_buffer: Option<Decimal>,

    /// Largest acceptable balloon, in percent of the facility
    #[arg(long)]
    pub max_balloon: Option<Decimal>,
}

impl ThresholdFlags {
    fn apply(&self, base: UnderwritingThresholds) -> UnderwritingThresholds {
        UnderwritingThresholds {
            min_dscr: self.threshold_dscr.unwrap_or(base.min_dscr),
            target_icr: self.threshold_icr.unwrap_or(base.target_icr),
            max_leverage: self.threshold_leverage.unwrap_or(base.max_leverage),
            max_ltv_pct: self.threshold_ltv.unwrap_or(base.max_ltv_pct),
            dscr_warning_buffer: self.dscr_buffer.unwrap_or(base.dscr_warning_buffer),
            max_balloon_pct: self.max_balloon.unwrap_or(base.max_balloon_pct),
        }
    }
}

/// Arguments for every subcommand that reads a deal
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct UnderwritingArgs {
    /// Path to deal JSON ({parameters, projection, thresholds}); stdin when omitted
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub thresholds: ThresholdFlags,
}

/// Arguments for scoring credit statistics directly
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ScoreArgs {
    /// Minimum DSCR across the projection
    #[arg(long)]
    pub dscr: Decimal,

    /// Minimum interest coverage across the projection
    #[arg(long)]
    pub icr: Decimal,

    /// Peak Net Debt / EBITDA across the projection
    #[arg(long)]
    pub leverage: Decimal,

    #[command(flatten)]
    pub thresholds: ThresholdFlags,
}

#[derive(Debug, Clone, Copy)]
pub enum Stage {
    Assess,
    Debt,
    CreditStats,
    SanityCheck,
    Rationale,
}

pub fn run(
    args: UnderwritingArgs,
    config_path: Option<&str>,
    stage: Stage,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut deal: CreditAssessmentInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("Provide a deal with --input <file> or pipe JSON on stdin".into());
    };

    if let Some(path) = config_path {
        deal.thresholds = config::load_thresholds(path)?;
    }
    deal.thresholds = args.thresholds.apply(deal.thresholds);

    let value = match stage {
        Stage::Assess => serde_json::to_value(assessment::assess_credit(&deal)?)?,
        Stage::Debt => serde_json::to_value(assessment::aggregate(&deal)?)?,
        Stage::CreditStats => serde_json::to_value(assessment::credit_stats(&deal)?)?,
        Stage::SanityCheck => serde_json::to_value(assessment::sanity_check(&deal)?)?,
        Stage::Rationale => serde_json::to_value(assessment::rationale(&deal)?)?,
    };
    Ok(value)
}

pub fn run_score(
    args: ScoreArgs,
    config_path: Option<&str>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let base = match config_path {
        Some(path) => config::load_thresholds(path)?,
        None => UnderwritingThresholds::default(),
    };
    let thresholds = args.thresholds.apply(base);
    thresholds.validate()?;

    let stats = CreditStats {
        min_dscr: args.dscr,
        min_icr: args.icr,
        max_leverage: args.leverage,
        source: StatsSource::Computed,
        ..CreditStats::zero()
    };
    let score = score_credit(&stats, &thresholds);

    let assumptions = serde_json::json!({ "thresholds": thresholds });
    let elapsed = start.elapsed().as_micros() as u64;
    let output = with_metadata(
        "Composite Credit Score (DSCR 40 / ICR 30 / Leverage 20)",
        &assumptions,
        Vec::new(),
        elapsed,
        score,
    );
    Ok(serde_json::to_value(output)?)
}
