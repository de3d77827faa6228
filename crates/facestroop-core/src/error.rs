use thiserror::Error;

use crate::catalog::{Gender, StimulusId};
use crate::rating::RatingPhase;
use crate::session::SessionPhase;

pub type Result<T> = std::result::Result<T, StroopError>;

#[derive(Debug, Error)]
pub enum StroopError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error("invalid configuration: {}", errors.join("; "))]
    InvalidConfig { errors: Vec<String> },

    #[error("unknown stimulus: {id}")]
    UnknownStimulus { id: StimulusId },

    #[error("stimulus {id} already has a {phase}")]
    AlreadyRated { id: StimulusId, phase: RatingPhase },

    #[error("rating {value} outside [{min}, {max}]")]
    RatingOutOfRange { value: i32, min: i32, max: i32 },

    #[error("stimulus {id} has no {phase}")]
    MissingRating { id: StimulusId, phase: RatingPhase },

    #[error("{gender} pool has {available} stimuli, quota needs {quota}")]
    InsufficientStimuli {
        gender: Gender,
        available: usize,
        quota: usize,
    },

    #[error("{phase} pass incomplete: {missing} stimuli unrated")]
    IncompleteRatingPass { phase: RatingPhase, missing: usize },

    #[error("session is in phase {actual}, expected {expected}")]
    PhaseOrder {
        expected: SessionPhase,
        actual: SessionPhase,
    },
}

impl StroopError {
    #[must_use]
    pub fn invalid_config(errors: Vec<String>) -> Self {
        Self::InvalidConfig { errors }
    }
}
