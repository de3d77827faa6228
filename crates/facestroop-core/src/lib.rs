#![forbid(unsafe_code)]

//! Trial generation for the face-rating Stroop experiment.
//!
//! Participants rate the pleasantness of face photographs, classify the
//! gender of each face while a gender word is superimposed on it, and then
//! rate a subset of the faces again. This crate owns everything between the
//! ratings and the presented trials: the stimulus catalog, key-mapping
//! counterbalancing, practice/main selection by rating extremity,
//! proportion-congruency tagging and the block builder that rotates
//! congruency markers between blocks.
//!
//! # How it fits in the system
//! A presenter (window, terminal, or the `facestroop simulate` command)
//! drives a [`Session`]: it collects ratings for the pass the session hands
//! out, shows the generated [`TrialSequence`]s, and scores each key press
//! with [`classify_response`]. All shuffles draw from the session's single
//! seeded random source, so a recorded seed replays the whole session.

pub mod block;
pub mod catalog;
pub mod config;
pub mod congruency;
pub mod error;
pub mod export;
pub mod rating;
pub mod response;
pub mod rotating_index;
pub mod selection;
pub mod sequence;
pub mod session;

pub use block::{BlockBuilder, BlockKind, Position, TrialItem, get_block};
pub use catalog::{
    Catalog, Gender, KeyMapping, KeySide, ResponseKey, StimulusId, StimulusItem, stimulus_id,
};
pub use config::{
    BlockConfig, CatalogConfig, CongruencyConfig, DistractorConfig, ExperimentConfig, RatingOrder,
    RatingScale, RatioSeed, ResponseConfig, SelectionConfig,
};
pub use congruency::{
    Congruency, ProportionCongruency, StroopItem, assign_proportion_congruency, group_members,
};
pub use error::{Result, StroopError};
pub use export::{CSV_HEADER, TrialRecord, to_csv_string, write_csv, write_jsonl};
pub use rating::{RatingPass, RatingPhase, RatingResponder, UniformResponder};
pub use response::{BlockSummary, ResponseOutcome, TrialResponse, classify_response};
pub use rotating_index::{Marker, RotatingIndex};
pub use selection::{FaceSelection, select_faces};
pub use sequence::TrialSequence;
pub use session::{GeneratedSequences, Session, SessionPhase, SessionSummary, generate_sequences};
