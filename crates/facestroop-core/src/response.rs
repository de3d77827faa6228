//! Scoring of classification responses and per-block tallies.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::block::TrialItem;
use crate::catalog::ResponseKey;
use crate::config::ResponseConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOutcome {
    Correct,
    Incorrect,
    TooEarly,
    TooLate,
}

impl ResponseOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
            Self::TooEarly => "too_early",
            Self::TooLate => "too_late",
        }
    }
}

impl fmt::Display for ResponseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key press recorded by the presentation layer for one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialResponse {
    /// `None` when the window elapsed without a key.
    pub key: Option<ResponseKey>,
    pub rt_ms: Option<u64>,
}

impl TrialResponse {
    #[must_use]
    pub const fn timeout() -> Self {
        Self {
            key: None,
            rt_ms: None,
        }
    }

    #[must_use]
    pub const fn pressed(key: ResponseKey, rt_ms: u64) -> Self {
        Self {
            key: Some(key),
            rt_ms: Some(rt_ms),
        }
    }
}

/// Score one response against the trial's correct key.
///
/// Missing keys and presses past the response window are too late; presses
/// faster than `too_early_ms` are anticipations regardless of the key.
#[must_use]
pub fn classify_response(
    trial: &TrialItem,
    response: TrialResponse,
    config: &ResponseConfig,
) -> ResponseOutcome {
    let Some(key) = response.key else {
        return ResponseOutcome::TooLate;
    };
    match response.rt_ms {
        Some(rt) if rt < config.too_early_ms => ResponseOutcome::TooEarly,
        Some(rt) if rt > config.response_window_ms => ResponseOutcome::TooLate,
        _ if trial.is_correct(key) => ResponseOutcome::Correct,
        _ => ResponseOutcome::Incorrect,
    }
}

/// Outcome counts for one block, shown during the break that follows it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub correct: usize,
    pub incorrect: usize,
    pub too_early: usize,
    pub too_late: usize,
}

impl BlockSummary {
    pub fn record(&mut self, outcome: ResponseOutcome) {
        match outcome {
            ResponseOutcome::Correct => self.correct += 1,
            ResponseOutcome::Incorrect => self.incorrect += 1,
            ResponseOutcome::TooEarly => self.too_early += 1,
            ResponseOutcome::TooLate => self.too_late += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.correct + self.incorrect + self.too_early + self.too_late
    }

    /// Share of correct responses; 0 for an empty block.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.correct as f64 / total as f64,
        }
    }
}

impl FromIterator<ResponseOutcome> for BlockSummary {
    fn from_iter<I: IntoIterator<Item = ResponseOutcome>>(iter: I) -> Self {
        let mut summary = Self::default();
        for outcome in iter {
            summary.record(outcome);
        }
        summary
    }
}

impl std::iter::Sum for BlockSummary {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |total, block| Self {
            correct: total.correct + block.correct,
            incorrect: total.incorrect + block.incorrect,
            too_early: total.too_early + block.too_early,
            too_late: total.too_late + block.too_late,
        })
    }
}

impl fmt::Display for BlockSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} correct, {} incorrect, {} too early, {} too late",
            self.correct, self.incorrect, self.too_early, self.too_late
        )
    }
}
