use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::inputs::parameters::ThresholdOverrides;
use crate::numeric::safe_mul;
use crate::{types::*, FinSightError, FinSightResult};

/// Underwriting thresholds applied when a deal does not set its own.
///
/// Every field has a default, so a partial configuration file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnderwritingThresholds {
    /// Minimum debt-service coverage ratio.
    pub min_dscr: Multiple,
    /// Minimum interest coverage ratio.
    pub target_icr: Multiple,
    /// Maximum net debt / EBITDA.
    pub max_leverage: Multiple,
    /// Maximum loan-to-value, in percent.
    pub max_ltv_pct: Percent,
    /// A DSCR within this fraction above the minimum is flagged as tight.
    pub dscr_warning_buffer: Rate,
    /// Largest balloon, as a percent of the facility, that passes without
    /// a refinancing concern.
    pub max_balloon_pct: Percent,
}

impl Default for UnderwritingThresholds {
    fn default() -> Self {
        Self {
            min_dscr: dec!(1.25),
            target_icr: dec!(2.0),
            max_leverage: dec!(3.5),
            max_ltv_pct: dec!(80),
            dscr_warning_buffer: dec!(0.10),
            max_balloon_pct: dec!(50),
        }
    }
}

impl UnderwritingThresholds {
    pub fn validate(&self) -> FinSightResult<()> {
        let positive = [
            ("min_dscr", self.min_dscr),
            ("target_icr", self.target_icr),
            ("max_leverage", self.max_leverage),
        ];
        for (field, value) in positive {
            if value <= Decimal::ZERO {
                return Err(FinSightError::InvalidInput {
                    field: field.into(),
                    reason: "Threshold must be positive.".into(),
                });
            }
        }
        for (field, value) in [
            ("max_ltv_pct", self.max_ltv_pct),
            ("max_balloon_pct", self.max_balloon_pct),
        ] {
            if value <= Decimal::ZERO || value > dec!(100) {
                return Err(FinSightError::InvalidInput {
                    field: field.into(),
                    reason: "Percentage must be in (0, 100].".into(),
                });
            }
        }
        if self.dscr_warning_buffer < Decimal::ZERO || self.dscr_warning_buffer >= Decimal::ONE {
            return Err(FinSightError::InvalidInput {
                field: "dscr_warning_buffer".into(),
                reason: "Buffer must be in [0, 1).".into(),
            });
        }
        Ok(())
    }

    /// Apply per-deal overrides on top of these thresholds.
    pub fn with_overrides(&self, overrides: &ThresholdOverrides) -> Self {
        let pick = |o: Option<Decimal>, base: Decimal| {
            o.filter(|v| *v > Decimal::ZERO).unwrap_or(base)
        };
        Self {
            min_dscr: pick(overrides.min_dscr, self.min_dscr),
            target_icr: pick(overrides.target_icr, self.target_icr),
            max_leverage: pick(overrides.max_leverage, self.max_leverage),
            max_ltv_pct: pick(overrides.max_ltv_pct, self.max_ltv_pct),
            ..self.clone()
        }
    }

    /// DSCR below this level (but above the minimum) is tight.
    pub fn dscr_warning_level(&self) -> Multiple {
        safe_mul(self.min_dscr, Decimal::ONE + self.dscr_warning_buffer)
    }
}
