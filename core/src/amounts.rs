//! Sure-amount generation for both phases of a choice list.
//!
//! Phase 1 spreads 7 amounts across the whole outcome range.
//! Phase 2 zooms in on the switch point the participant revealed
//! in phase 1 and spreads 7 amounts linearly around it.
//!
//! RULE: every AmountSet is strictly descending. Row order encodes
//! amount order everywhere downstream (validation, CE).

use crate::{
    choice::{Choice, ChoiceVector},
    error::{SurveyError, SurveyResult},
    prospect::{Domain, Prospect},
    types::{round_cents, Money, Phase, ROWS},
};
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Seven distinct amounts, largest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Money>", into = "Vec<Money>")]
pub struct AmountSet([Money; ROWS]);

impl AmountSet {
    pub fn from_descending(values: Vec<Money>) -> SurveyResult<Self> {
        let values: [Money; ROWS] = values.try_into().map_err(|v: Vec<Money>| {
            SurveyError::InvalidProspect {
                reason: format!("expected {ROWS} amounts, got {}", v.len()),
            }
        })?;
        if values.iter().any(|v| !v.is_finite()) {
            return Err(SurveyError::InvalidProspect {
                reason: format!("non-finite amount in {values:?}"),
            });
        }
        if !is_strictly_descending(&values) {
            return Err(SurveyError::InvalidProspect {
                reason: format!("amounts are not strictly descending: {values:?}"),
            });
        }
        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[Money] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Money> {
        self.0.iter()
    }

    /// The first (largest) amount.
    pub fn max(&self) -> Money {
        self.0[0]
    }

    /// The last (smallest) amount.
    pub fn min(&self) -> Money {
        self.0[ROWS - 1]
    }
}

impl Index<usize> for AmountSet {
    type Output = Money;

    fn index(&self, row: usize) -> &Money {
        &self.0[row]
    }
}

impl TryFrom<Vec<Money>> for AmountSet {
    type Error = SurveyError;

    fn try_from(values: Vec<Money>) -> SurveyResult<Self> {
        Self::from_descending(values)
    }
}

impl From<AmountSet> for Vec<Money> {
    fn from(set: AmountSet) -> Self {
        set.0.to_vec()
    }
}

fn is_strictly_descending(values: &[Money]) -> bool {
    values.windows(2).all(|w| w[0] > w[1])
}

/// The switch point revealed by a (possibly partial) choice vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bracket {
    /// Smallest amount the participant took over the gamble.
    pub lowest_accepted:  Option<Money>,
    /// Largest amount the participant gave up for the gamble.
    pub highest_rejected: Option<Money>,
}

impl Bracket {
    pub fn scan(choices: &ChoiceVector, amounts: &AmountSet) -> Self {
        let mut bracket = Self::default();
        for (&amount, choice) in amounts.iter().zip(choices) {
            match choice {
                Some(Choice::Sure) => {
                    bracket.lowest_accepted =
                        Some(bracket.lowest_accepted.map_or(amount, |a| a.min(amount)));
                }
                Some(Choice::Gamble) => {
                    bracket.highest_rejected =
                        Some(bracket.highest_rejected.map_or(amount, |r| r.max(amount)));
                }
                None => {}
            }
        }
        bracket
    }
}

/// How phase-1 amounts are spread over a prospect's outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountPolicy {
    /// Concave blend from the best to the worst outcome; denser near the extremes.
    #[default]
    Concave,
    /// Even steps from 90% down to 10% of the largest absolute outcome,
    /// sign-matched to the prospect's domain.
    Linear,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AmountGenerator {
    pub policy: AmountPolicy,
}

impl AmountGenerator {
    pub fn new(policy: AmountPolicy) -> Self {
        Self { policy }
    }

    pub fn generate(
        &self,
        prospect: &Prospect,
        phase: Phase,
        phase1_choices: Option<&ChoiceVector>,
    ) -> SurveyResult<AmountSet> {
        match phase {
            Phase::One => self.phase1(prospect),
            Phase::Two => self.phase2(prospect, phase1_choices),
        }
    }

    pub fn phase1(&self, prospect: &Prospect) -> SurveyResult<AmountSet> {
        prospect.validate()?;
        let values = match self.policy {
            AmountPolicy::Concave => concave_spread(prospect.lo(), prospect.hi()),
            AmountPolicy::Linear => {
                let max_abs = prospect.outcomes[0].abs().max(prospect.outcomes[1].abs());
                let mut values = linear_desc(0.9 * max_abs, 0.1 * max_abs);
                if prospect.domain() == Domain::Loss {
                    values = values.into_iter().rev().map(|v| -v).collect();
                }
                values
            }
        };
        let set = AmountSet::from_descending(values)?;
        log::debug!("phase 1 amounts for {:?}: {:?}", prospect.outcomes, set.as_slice());
        Ok(set)
    }

    /// Zoom in on the phase-1 switch point. Without phase-1 choices the
    /// whole outcome range is spread linearly instead.
    pub fn phase2(
        &self,
        prospect: &Prospect,
        phase1_choices: Option<&ChoiceVector>,
    ) -> SurveyResult<AmountSet> {
        prospect.validate()?;
        let (lo, hi) = (prospect.lo(), prospect.hi());

        let Some(choices) = phase1_choices else {
            log::warn!("phase 2 requested without phase 1 choices; using full range");
            return AmountSet::from_descending(linear_desc(hi, lo));
        };

        let phase1 = self.phase1(prospect)?;
        let bracket = Bracket::scan(choices, &phase1);
        let (lower, upper) = match (bracket.lowest_accepted, bracket.highest_rejected) {
            (Some(a), Some(r)) => (a - 0.25 * a.abs(), r + 0.25 * r.abs()),
            (Some(a), None) => (a - 0.5 * a.abs(), a + 0.25 * a.abs()),
            (None, Some(r)) => (r - 0.25 * r.abs(), r + 0.5 * r.abs()),
            (None, None) => (lo, hi),
        };

        let mut values = linear_desc(lower.max(upper), lower.min(upper));
        if !is_strictly_descending(&values) {
            // Zoom collapsed to fewer than 7 distinct cents, e.g. around $0.
            log::debug!(
                "phase 2 window [{lower:.2}, {upper:.2}] too narrow for {:?}; using full range",
                prospect.outcomes
            );
            values = linear_desc(hi, lo);
        }
        let set = AmountSet::from_descending(values)?;
        log::debug!("phase 2 amounts for {:?}: {:?}", prospect.outcomes, set.as_slice());
        Ok(set)
    }
}

/// `hi*(1 - t^1.5) + lo*t^1.5` for t = 0, 1/6, .., 1, on an interval
/// shifted to be strictly positive and shifted back afterwards.
fn concave_spread(lo: Money, hi: Money) -> Vec<Money> {
    let shift = (1.0 - lo).max(0.0);
    let (adj_lo, adj_hi) = (lo + shift, hi + shift);
    let mut values: Vec<Money> = (0..ROWS)
        .map(|i| {
            let w = (i as f64 / (ROWS - 1) as f64).powf(1.5);
            round_cents(adj_hi * (1.0 - w) + adj_lo * w - shift)
        })
        .collect();
    values.sort_by(|a, b| b.total_cmp(a));
    values
}

/// 7 evenly spaced amounts from `high` down to `low`, rounded to cents.
fn linear_desc(high: Money, low: Money) -> Vec<Money> {
    let step = (high - low) / (ROWS - 1) as f64;
    (0..ROWS)
        .map(|k| round_cents(high - k as f64 * step))
        .collect()
}
