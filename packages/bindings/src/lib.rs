use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Instant;

use finsight_core::credit::assessment::{self, CreditAssessmentInput};
use finsight_core::credit::score::score_credit;
use finsight_core::credit::stats::{CreditStats, StatsSource};
use finsight_core::{with_metadata, UnderwritingThresholds};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_deal(input_json: &str) -> NapiResult<CreditAssessmentInput> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Underwriting pipeline
// ---------------------------------------------------------------------------

#[napi]
pub fn assess_credit(input_json: String) -> NapiResult<String> {
    let input = parse_deal(&input_json)?;
    let output = assessment::assess_credit(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn aggregate_debt(input_json: String) -> NapiResult<String> {
    let input = parse_deal(&input_json)?;
    let output = assessment::aggregate(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn credit_stats(input_json: String) -> NapiResult<String> {
    let input = parse_deal(&input_json)?;
    let output = assessment::credit_stats(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn sanity_check(input_json: String) -> NapiResult<String> {
    let input = parse_deal(&input_json)?;
    let output = assessment::sanity_check(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn underwriting_rationale(input_json: String) -> NapiResult<String> {
    let input = parse_deal(&input_json)?;
    let output = assessment::rationale(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ScoreInput {
    min_dscr: Decimal,
    min_icr: Decimal,
    max_leverage: Decimal,
    #[serde(default)]
    thresholds: UnderwritingThresholds,
}

#[napi]
pub fn credit_score(input_json: String) -> NapiResult<String> {
    let start = Instant::now();
    let input: ScoreInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    input.thresholds.validate().map_err(to_napi_error)?;

    let stats = CreditStats {
        min_dscr: input.min_dscr,
        min_icr: input.min_icr,
        max_leverage: input.max_leverage,
        source: StatsSource::Computed,
        ..CreditStats::zero()
    };
    let score = score_credit(&stats, &input.thresholds);
    let assumptions = serde_json::json!({ "thresholds": input.thresholds });
    let output = with_metadata(
        "Composite Credit Score (DSCR 40 / ICR 30 / Leverage 20)",
        &assumptions,
        Vec::new(),
        start.elapsed().as_micros() as u64,
        score,
    );
    serde_json::to_string(&output).map_err(to_napi_error)
}
