//! Certainty equivalent and risk attitude of a completed choice list.

use crate::{
    amounts::{AmountSet, Bracket},
    choice::{self, ChoiceVector},
    error::{SurveyError, SurveyResult},
    monotonicity,
    types::{round_cents, Money, ROWS},
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskAttitude {
    #[serde(rename = "Risk Averse")]
    RiskAverse,
    #[serde(rename = "Risk Seeking")]
    RiskSeeking,
    #[serde(rename = "Risk Neutral")]
    RiskNeutral,
}

impl fmt::Display for RiskAttitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RiskAverse => f.write_str("Risk Averse"),
            Self::RiskSeeking => f.write_str("Risk Seeking"),
            Self::RiskNeutral => f.write_str("Risk Neutral"),
        }
    }
}

/// CE of a fully answered, monotonic phase:
///   - switch inside the list: midpoint of lowest accepted and highest rejected
///   - every row Sure:   the largest amount
///   - every row Gamble: the smallest amount
///
/// Partial or inconsistent vectors are an error, never a number.
pub fn compute_ce(choices: &ChoiceVector, amounts: &AmountSet) -> SurveyResult<Money> {
    let answered = choice::answered(choices);
    if answered < ROWS {
        return Err(SurveyError::IncompletePhase { answered, required: ROWS });
    }
    monotonicity::check_consistency(choices, amounts)?;

    let bracket = Bracket::scan(choices, amounts);
    match (bracket.lowest_accepted, bracket.highest_rejected) {
        (Some(accepted), Some(rejected)) => Ok(round_cents((accepted + rejected) / 2.0)),
        (Some(_), None) => Ok(amounts.max()),
        (None, Some(_)) => Ok(amounts.min()),
        (None, None) => Err(SurveyError::IncompletePhase { answered: 0, required: ROWS }),
    }
}

/// Below EV is averse, above is seeking. `tolerance` widens the neutral
/// band to |ce - ev| <= tolerance; 0.0 means exact equality.
pub fn classify(ce: Money, ev: Money, tolerance: f64) -> RiskAttitude {
    if (ce - ev).abs() <= tolerance {
        RiskAttitude::RiskNeutral
    } else if ce < ev {
        RiskAttitude::RiskAverse
    } else {
        RiskAttitude::RiskSeeking
    }
}
