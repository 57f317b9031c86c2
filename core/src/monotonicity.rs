//! Monotonicity of a choice list (Tversky & Kahneman, 1992).
//!
//! Amounts are descending, so:
//!   - Gamble at row i commits to Gamble at every row j > i.
//!   - Sure at row i commits to Sure at every row j < i.
//!
//! A vector is consistent iff no Gamble row sits above a Sure row.
//! `check_edit` (live, per row) and `check_consistency` (phase gate)
//! share one predicate, so they cannot disagree.

use crate::{
    amounts::AmountSet,
    choice::{Choice, ChoiceVector},
    error::{SurveyError, SurveyResult},
    prospect::format_money,
    types::{Money, ROWS},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Two rows that contradict each other. Row fields are 0-based
/// indices; the rendered explanation numbers rows from 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub gamble_row:    usize,
    pub gamble_amount: Money,
    pub sure_row:      usize,
    pub sure_amount:   Money,
    /// The row whose edit was rejected, if this came from a live edit.
    pub edited_row:    Option<usize>,
}

impl Violation {
    /// The conflicting rows, upper row first.
    pub fn rows(&self) -> (usize, usize) {
        (self.gamble_row, self.sure_row)
    }

    pub fn explanation(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.edited_row == Some(self.sure_row) {
            write!(
                f,
                "Monotonicity violation: you chose the sure amount of {} (row {}), \
                 but chose the gamble over a larger sure amount of {} (row {}). \
                 If a certain amount is better than the gamble, any larger amount should also be better.",
                format_money(self.sure_amount),
                self.sure_row + 1,
                format_money(self.gamble_amount),
                self.gamble_row + 1,
            )
        } else {
            write!(
                f,
                "Monotonicity violation: you chose the gamble instead of {} (row {}), \
                 but chose the sure amount of {} (row {}) on a lower row. \
                 If a gamble is better than some amount of money, it should be better than any smaller amount.",
                format_money(self.gamble_amount),
                self.gamble_row + 1,
                format_money(self.sure_amount),
                self.sure_row + 1,
            )
        }
    }
}

/// The first (gamble_row, sure_row) pair with gamble_row < sure_row,
/// scanning rows top to bottom. Unset rows never conflict.
pub fn first_conflict(choices: &ChoiceVector) -> Option<(usize, usize)> {
    for (i, choice) in choices.iter().enumerate() {
        if *choice != Some(Choice::Gamble) {
            continue;
        }
        if let Some(j) = (i + 1..ROWS).find(|&j| choices[j] == Some(Choice::Sure)) {
            return Some((i, j));
        }
    }
    None
}

/// Would setting row `idx` to `new_choice` break monotonicity?
/// The check runs on a scratch copy; `choices` is never modified.
pub fn check_edit(
    choices: &ChoiceVector,
    amounts: &AmountSet,
    new_choice: Choice,
    idx: usize,
) -> SurveyResult<()> {
    if idx >= ROWS {
        return Err(SurveyError::RowOutOfRange { row: idx });
    }
    let mut scratch = *choices;
    scratch[idx] = Some(new_choice);
    match first_conflict(&scratch) {
        None => Ok(()),
        Some((g, s)) => Err(SurveyError::MonotonicityViolation(violation(
            amounts,
            g,
            s,
            Some(idx),
        ))),
    }
}

/// Whole-vector gate run before a phase may advance.
pub fn check_consistency(choices: &ChoiceVector, amounts: &AmountSet) -> SurveyResult<()> {
    match first_conflict(choices) {
        None => Ok(()),
        Some((g, s)) => Err(SurveyError::MonotonicityViolation(violation(
            amounts, g, s, None,
        ))),
    }
}

fn violation(amounts: &AmountSet, gamble_row: usize, sure_row: usize, edited_row: Option<usize>) -> Violation {
    Violation {
        gamble_row,
        gamble_amount: amounts[gamble_row],
        sure_row,
        sure_amount: amounts[sure_row],
        edited_row,
    }
}
