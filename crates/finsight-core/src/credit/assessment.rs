use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::conditions::build_conditions;
use super::debt::DebtInfo;
use super::headroom::{covenant_headroom, CovenantHeadroom};
use super::rationale::{build_rationale, RationaleBullet};
use super::sanity::{run_sanity_checks, SanityCheck, Severity};
use super::score::{score_credit, CreditScore};
use super::stats::{CreditStats, StatsSource};
use super::UnderwritingContext;
use crate::config::UnderwritingThresholds;
use crate::inputs::{FinancialParameters, Projection, RawFinancialParameters, RawProjection};
use crate::numeric::lenient;
use crate::{types::*, FinSightResult};

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Everything one underwriting run needs, exactly as the dashboard sends it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditAssessmentInput {
    #[serde(deserialize_with = "lenient::or_default")]
    pub parameters: RawFinancialParameters,
    #[serde(deserialize_with = "lenient::or_default")]
    pub projection: RawProjection,
    #[serde(deserialize_with = "lenient::or_default")]
    pub thresholds: UnderwritingThresholds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    Approve,
    ApproveWithConditions,
    Decline,
    /// No debt to underwrite yet
    Pending,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Approve => "Approve",
            Self::ApproveWithConditions => "Approve with Conditions",
            Self::Decline => "Decline",
            Self::Pending => "Pending",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RationaleOutput {
    pub rationale: Vec<RationaleBullet>,
    pub conditions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditAssessment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    pub debt: DebtInfo,
    pub debt_present: bool,
    pub credit_stats: CreditStats,
    /// Thresholds after per-deal overrides
    pub thresholds: UnderwritingThresholds,
    pub sanity_checks: Vec<SanityCheck>,
    pub rationale: Vec<RationaleBullet>,
    pub conditions: Vec<String>,
    pub headroom: Vec<CovenantHeadroom>,
    /// `None` when there is no debt to score.
    pub score: Option<CreditScore>,
    pub recommendation: Recommendation,
}

/// Normalised inputs with the effective thresholds resolved.
#[derive(Debug, Clone)]
pub struct PreparedInputs {
    pub parameters: FinancialParameters,
    pub projection: Projection,
    pub thresholds: UnderwritingThresholds,
    pub warnings: Vec<String>,
}

impl PreparedInputs {
    pub fn context(&self) -> UnderwritingContext<'_> {
        UnderwritingContext::new(&self.parameters, &self.projection, &self.thresholds)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Validate the configured thresholds and normalise the raw inputs.
///
/// Malformed deal data never fails here; it is coerced and reported through
/// `warnings`. Only an invalid threshold configuration is an error.
pub fn prepare(input: &CreditAssessmentInput) -> FinSightResult<PreparedInputs> {
    input.thresholds.validate()?;

    let mut warnings: Vec<String> = Vec::new();
    let parameters = FinancialParameters::normalize(&input.parameters, &mut warnings);
    let projection = Projection::normalize(&input.projection, &mut warnings);
    let thresholds = input.thresholds.with_overrides(&parameters.thresholds);

    Ok(PreparedInputs {
        parameters,
        projection,
        thresholds,
        warnings,
    })
}

/// Resolve the deal's debt picture.
pub fn aggregate(input: &CreditAssessmentInput) -> FinSightResult<ComputationOutput<DebtInfo>> {
    run_stage(input, "Debt Aggregation", |ctx| ctx.debt.clone())
}

/// Coverage statistics over the projection.
pub fn credit_stats(
    input: &CreditAssessmentInput,
) -> FinSightResult<ComputationOutput<CreditStats>> {
    run_stage(input, "Credit Ratio Extraction", |ctx| ctx.stats.clone())
}

pub fn sanity_check(
    input: &CreditAssessmentInput,
) -> FinSightResult<ComputationOutput<Vec<SanityCheck>>> {
    run_stage(input, "Covenant Sanity Checks", run_sanity_checks)
}

pub fn rationale(
    input: &CreditAssessmentInput,
) -> FinSightResult<ComputationOutput<RationaleOutput>> {
    run_stage(input, "Underwriting Rationale and Covenant Conditions", |ctx| {
        RationaleOutput {
            rationale: build_rationale(ctx),
            conditions: build_conditions(ctx),
        }
    })
}

/// Run the full underwriting pipeline.
pub fn assess_credit(
    input: &CreditAssessmentInput,
) -> FinSightResult<ComputationOutput<CreditAssessment>> {
    run_stage(input, "Credit Underwriting Assessment", |ctx| {
        let sanity_checks = run_sanity_checks(ctx);
        let score = ctx
            .debt_present
            .then(|| score_credit(&ctx.stats, ctx.thresholds));
        let recommendation = recommend(ctx.debt_present, &sanity_checks, score.as_ref());

        debug!(
            score = score.as_ref().map(|s| s.score),
            findings = sanity_checks.len(),
            recommendation = %recommendation,
            "Assessment complete"
        );

        CreditAssessment {
            company_name: ctx.parameters.company_name.clone(),
            debt: ctx.debt.clone(),
            debt_present: ctx.debt_present,
            credit_stats: ctx.stats.clone(),
            thresholds: ctx.thresholds.clone(),
            rationale: build_rationale(ctx),
            conditions: build_conditions(ctx),
            headroom: covenant_headroom(ctx),
            sanity_checks,
            score,
            recommendation,
        }
    })
}

/// Decline needs a critical finding and a sub-BB score; any finding short of
/// that earns conditions.
pub fn recommend(
    debt_present: bool,
    findings: &[SanityCheck],
    score: Option<&CreditScore>,
) -> Recommendation {
    if !debt_present {
        return Recommendation::Pending;
    }
    let critical = findings.iter().any(|f| f.severity == Severity::Critical);
    let warning = findings.iter().any(|f| f.severity == Severity::Warning);
    let score = score.map(|s| s.score).unwrap_or(0);

    if critical && score < 60 {
        Recommendation::Decline
    } else if critical || warning {
        Recommendation::ApproveWithConditions
    } else {
        Recommendation::Approve
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn run_stage<T, F>(
    input: &CreditAssessmentInput,
    methodology: &str,
    stage: F,
) -> FinSightResult<ComputationOutput<T>>
where
    T: Serialize,
    F: FnOnce(&UnderwritingContext<'_>) -> T,
{
    let start = Instant::now();
    let prepared = prepare(input)?;
    let ctx = prepared.context();
    let mut warnings = prepared.warnings.clone();

    if ctx.stats.source == StatsSource::Projection {
        warnings.push("Precomputed credit statistics from the projection were used unchanged.".into());
    }

    let result = stage(&ctx);

    let assumptions = serde_json::json!({
        "thresholds": ctx.thresholds,
        "has_existing_debt": ctx.parameters.has_existing_debt,
        "debt_source": ctx.debt.source,
        "stats_source": ctx.stats.source,
        "projection_years": ctx.projection.rows.len(),
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(methodology, &assumptions, warnings, elapsed, result))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
