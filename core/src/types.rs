//! Shared primitive types used across the survey engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A monetary amount in dollars. Negative values are losses.
pub type Money = f64;

/// Stable identifier of one participant session.
pub type SessionId = uuid::Uuid;

/// Number of sure-amount rows in every choice list.
pub const ROWS: usize = 7;

/// Round to whole cents.
pub fn round_cents(x: Money) -> Money {
    (x * 100.0).round() / 100.0
}

/// The broad bracketing pass and the zoomed-in refinement pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    One,
    Two,
}

impl Phase {
    pub fn number(&self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "phase {}", self.number())
    }
}
