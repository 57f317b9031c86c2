//! Two-outcome gambles and how they read to a participant.

use crate::{
    error::{SurveyError, SurveyResult},
    types::Money,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Probabilities must sum to 1 within this tolerance.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Narrowest outcome range that still yields 7 distinct cent amounts.
pub const MIN_OUTCOME_SPREAD: Money = 1.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Domain {
    Gain,
    Loss,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gain => f.write_str("Gain"),
            Self::Loss => f.write_str("Loss"),
        }
    }
}

/// A two-outcome gamble. `probabilities[k]` belongs to `outcomes[k]`.
/// Immutable once drawn from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prospect {
    pub outcomes:      [Money; 2],
    pub probabilities: [f64; 2],
}

impl Prospect {
    /// Build a prospect, rejecting malformed outcome/probability pairs.
    pub fn new(outcomes: [Money; 2], probabilities: [f64; 2]) -> SurveyResult<Self> {
        let prospect = Self { outcomes, probabilities };
        prospect.validate()?;
        Ok(prospect)
    }

    pub fn validate(&self) -> SurveyResult<()> {
        let invalid = |reason: String| Err(SurveyError::InvalidProspect { reason });

        if self.outcomes.iter().any(|o| !o.is_finite()) {
            return invalid(format!("non-finite outcome in {:?}", self.outcomes));
        }
        if (self.outcomes[0] - self.outcomes[1]).abs() < MIN_OUTCOME_SPREAD {
            return invalid(format!(
                "outcomes must differ by at least {MIN_OUTCOME_SPREAD}, got {:?}",
                self.outcomes
            ));
        }
        if self
            .probabilities
            .iter()
            .any(|p| !p.is_finite() || *p < 0.0 || *p > 1.0)
        {
            return invalid(format!(
                "probabilities must lie in [0, 1], got {:?}",
                self.probabilities
            ));
        }
        let total = self.probabilities[0] + self.probabilities[1];
        if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
            return invalid(format!("probabilities sum to {total}, expected 1"));
        }
        Ok(())
    }

    pub fn lo(&self) -> Money {
        self.outcomes[0].min(self.outcomes[1])
    }

    pub fn hi(&self) -> Money {
        self.outcomes[0].max(self.outcomes[1])
    }

    /// Gain if any outcome is positive, otherwise loss.
    pub fn domain(&self) -> Domain {
        if self.hi() > 0.0 {
            Domain::Gain
        } else {
            Domain::Loss
        }
    }

    /// Plain dot product of outcomes and their probabilities.
    pub fn expected_value(&self) -> Money {
        self.outcomes[0] * self.probabilities[0] + self.outcomes[1] * self.probabilities[1]
    }

    /// e.g. "25% chance to win $100, 75% chance to win nothing".
    /// The second outcome is listed first.
    pub fn describe(&self) -> String {
        let nothing = match self.domain() {
            Domain::Gain => "win nothing",
            Domain::Loss => "lose nothing",
        };
        let phrase = |p: f64, x: Money| {
            let pct = (p * 100.0).round() as i64;
            if x == 0.0 {
                format!("{pct}% chance to {nothing}")
            } else {
                let verb = if x > 0.0 { "win" } else { "lose" };
                format!("{pct}% chance to {verb} {}", format_dollars(x.abs(), 0))
            }
        };
        format!(
            "{}, {}",
            phrase(self.probabilities[1], self.outcomes[1]),
            phrase(self.probabilities[0], self.outcomes[0])
        )
    }
}

/// `$1,234.56`, or `-$50.00` for negative amounts.
pub fn format_money(x: Money) -> String {
    format_dollars(x, 2)
}

fn format_dollars(x: Money, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, x.abs());
    let (whole, frac) = match formatted.split_once('.') {
        Some((whole, frac)) => (whole, Some(frac)),
        None => (formatted.as_str(), None),
    };
    // -0.001 renders as $0.00, not -$0.00
    let negative = x < 0.0 && formatted.bytes().any(|b| matches!(b, b'1'..=b'9'));

    let mut out = String::with_capacity(formatted.len() + 4);
    if negative {
        out.push('-');
    }
    out.push('$');
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac) = frac {
        out.push('.');
        out.push_str(frac);
    }
    out
}
