use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::stats::CreditStats;
use crate::config::UnderwritingThresholds;
use crate::numeric::{clamp, safe_divide, safe_mul, safe_sub};

const DSCR_WEIGHT: Decimal = dec!(40);
const ICR_WEIGHT: Decimal = dec!(30);
const LEVERAGE_WEIGHT: Decimal = dec!(0.2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RatingBand {
    B,
    BB,
    BBB,
    A,
    AA,
}

impl RatingBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => Self::AA,
            80..=89 => Self::A,
            70..=79 => Self::BBB,
            60..=69 => Self::BB,
            _ => Self::B,
        }
    }
}

impl std::fmt::Display for RatingBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AA => "AA",
            Self::A => "A",
            Self::BBB => "BBB",
            Self::BB => "BB",
            Self::B => "B",
        };
        write!(f, "{}", s)
    }
}

/// Points contributed by each ratio before the total is clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub dscr_points: Decimal,
    pub icr_points: Decimal,
    pub leverage_points: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditScore {
    pub score: u8,
    pub band: RatingBand,
    pub breakdown: ScoreBreakdown,
}

/// Composite 0-100 credit score.
///
/// DSCR is worth up to 40 points and ICR up to 30, each scaled by the ratio
/// to its threshold. Leverage headroom below the cap is worth up to 20.
pub fn score_credit(stats: &CreditStats, thresholds: &UnderwritingThresholds) -> CreditScore {
    let dscr_points = clamp(
        safe_mul(safe_divide(stats.min_dscr, thresholds.min_dscr, Decimal::ZERO), DSCR_WEIGHT),
        Decimal::ZERO,
        DSCR_WEIGHT,
    );
    let icr_points = clamp(
        safe_mul(safe_divide(stats.min_icr, thresholds.target_icr, Decimal::ZERO), ICR_WEIGHT),
        Decimal::ZERO,
        ICR_WEIGHT,
    );
    let leverage_points = if thresholds.max_leverage.is_zero() {
        Decimal::ZERO
    } else {
        let headroom = safe_sub(
            Decimal::ONE,
            safe_divide(stats.max_leverage, thresholds.max_leverage, Decimal::ONE),
        );
        clamp(safe_mul(headroom, dec!(100)), Decimal::ZERO, dec!(100)) * LEVERAGE_WEIGHT
    };

    let total = clamp(
        dscr_points + icr_points + leverage_points,
        Decimal::ZERO,
        dec!(100),
    );
    let score = total
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u8()
        .unwrap_or(0);

    CreditScore {
        score,
        band: RatingBand::from_score(score),
        breakdown: ScoreBreakdown {
            dscr_points,
            icr_points,
            leverage_points,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credit::stats::StatsSource;

    fn stats(min_dscr: Decimal, min_icr: Decimal, max_leverage: Decimal) -> CreditStats {
        CreditStats {
            min_dscr,
            min_icr,
            max_leverage,
            source: StatsSource::Computed,
            ..CreditStats::zero()
        }
    }

    #[test]
    fn test_full_marks_at_zero_leverage() {
        let s = score_credit(
            &stats(dec!(2.5), dec!(4.0), Decimal::ZERO),
            &UnderwritingThresholds::default(),
        );
        assert_eq!(s.score, 90);
        assert_eq!(s.band, RatingBand::AA);
        assert_eq!(s.breakdown.dscr_points, dec!(40));
        assert_eq!(s.breakdown.icr_points, dec!(30));
        assert_eq!(s.breakdown.leverage_points, dec!(20));
    }

    #[test]
    fn test_partial_scores() {
        // DSCR 1.0/1.25*40 = 32, ICR 1.5/2*30 = 22.5, leverage (1 - 1.75/3.5)*100*0.2 = 10
        let s = score_credit(
            &stats(dec!(1.0), dec!(1.5), dec!(1.75)),
            &UnderwritingThresholds::default(),
        );
        assert_eq!(s.breakdown.dscr_points, dec!(32));
        assert_eq!(s.breakdown.icr_points, dec!(22.5));
        assert_eq!(s.breakdown.leverage_points, dec!(10));
        assert_eq!(s.score, 65);
        assert_eq!(s.band, RatingBand::BB);
    }

    #[test]
    fn test_breached_leverage_scores_zero_points() {
        let s = score_credit(
            &stats(dec!(1.25), dec!(2.0), dec!(7.0)),
            &UnderwritingThresholds::default(),
        );
        assert_eq!(s.breakdown.leverage_points, Decimal::ZERO);
        assert_eq!(s.score, 70);
        assert_eq!(s.band, RatingBand::BBB);
    }

    #[test]
    fn test_zero_thresholds_do_not_panic() {
        let t = UnderwritingThresholds {
            min_dscr: Decimal::ZERO,
            target_icr: Decimal::ZERO,
            max_leverage: Decimal::ZERO,
            ..Default::default()
        };
        let s = score_credit(&stats(dec!(2), dec!(3), dec!(1)), &t);
        assert_eq!(s.score, 0);
        assert_eq!(s.band, RatingBand::B);
    }

    #[test]
    fn test_band_cutoffs() {
        assert_eq!(RatingBand::from_score(100), RatingBand::AA);
        assert_eq!(RatingBand::from_score(90), RatingBand::AA);
        assert_eq!(RatingBand::from_score(89), RatingBand::A);
        assert_eq!(RatingBand::from_score(80), RatingBand::A);
        assert_eq!(RatingBand::from_score(70), RatingBand::BBB);
        assert_eq!(RatingBand::from_score(60), RatingBand::BB);
        assert_eq!(RatingBand::from_score(59), RatingBand::B);
        assert_eq!(RatingBand::from_score(0), RatingBand::B);
    }

    #[test]
    fn test_half_point_rounds_up() {
        // 32 + 22.5 + 0 = 54.5
        let s = score_credit(
            &stats(dec!(1.0), dec!(1.5), dec!(3.5)),
            &UnderwritingThresholds::default(),
        );
        assert_eq!(s.score, 55);
    }
}
