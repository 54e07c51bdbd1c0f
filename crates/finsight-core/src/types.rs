use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency amounts: debt balances, facility sizes, collateral.
pub type Money = Decimal;

/// Interest rates as decimals (0.08 = 8%). Percent-style input is rescaled
/// at the boundary.
pub type Rate = Decimal;

/// Coverage and leverage multiples (e.g., 1.35x DSCR)
pub type Multiple = Decimal;

/// Percentages on a 0-100 scale (LTV, balloon share).
pub type Percent = Decimal;

/// Envelope returned by every pipeline entry point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    /// Normalisation notes: ignored fields, rescaled rates, dropped values
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Wrap a stage result in the standard envelope.
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
