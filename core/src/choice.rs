//! A participant's answer on one row of a choice list.

use crate::types::ROWS;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    /// Take the sure amount on this row.
    Sure,
    /// Take the gamble instead of this row's sure amount.
    Gamble,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sure => f.write_str("sure"),
            Self::Gamble => f.write_str("gamble"),
        }
    }
}

/// One slot per row, aligned with a descending AmountSet.
/// `None` is an unanswered row.
pub type ChoiceVector = [Option<Choice>; ROWS];

pub const EMPTY_CHOICES: ChoiceVector = [None; ROWS];

pub fn answered(choices: &ChoiceVector) -> usize {
    choices.iter().filter(|c| c.is_some()).count()
}

pub fn is_complete(choices: &ChoiceVector) -> bool {
    answered(choices) == ROWS
}
