//! Certainty-equivalent elicitation for two-outcome gambles.
//!
//! A participant answers two 7-row choice lists per prospect: a broad
//! first pass and a zoomed-in second pass. Each row offers a sure
//! amount against the gamble. The switch point in the second list
//! gives the certainty equivalent, which is then compared with the
//! expected value.
//!
//! Entry point is [`session::Session`], driven directly or through
//! [`command::dispatch`].

pub mod amounts;
pub mod catalog;
pub mod choice;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod export;
pub mod monotonicity;
pub mod prospect;
pub mod rng;
pub mod session;
pub mod types;
pub mod valuation;
