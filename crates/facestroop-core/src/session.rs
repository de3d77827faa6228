#![forbid(unsafe_code)]

//! One participant session from pre-rating to post-rating.
//!
//! The session owns the single random source every shuffle draws from. Trial
//! generation runs exactly once, from the completion of the pre-rating pass;
//! the post-rating pass covers the main faces only.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::block::{BlockBuilder, BlockKind};
use crate::catalog::{Catalog, KeyMapping, StimulusId};
use crate::config::ExperimentConfig;
use crate::congruency::{StroopItem, assign_proportion_congruency};
use crate::error::{Result, StroopError};
use crate::export::TrialRecord;
use crate::rating::{RatingPass, RatingPhase, RatingResponder};
use crate::selection::select_faces;
use crate::sequence::TrialSequence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    PreRating,
    Task,
    PostRating,
    Complete,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PreRating => "pre_rating",
            Self::Task => "task",
            Self::PostRating => "post_rating",
            Self::Complete => "complete",
        })
    }
}

/// Tagged face pools and the sequences generated from them.
#[derive(Debug, Clone)]
pub struct GeneratedSequences {
    pub practice_pool: Vec<StroopItem>,
    pub main_pool: Vec<StroopItem>,
    pub practice: TrialSequence,
    pub main: TrialSequence,
}

impl GeneratedSequences {
    /// Identifiers of the main faces, the ones rated again afterwards.
    #[must_use]
    pub fn main_ids(&self) -> Vec<StimulusId> {
        self.main_pool
            .iter()
            .map(|item| item.stimulus.id.clone())
            .collect()
    }
}

/// Split the rated catalog, tag both sets and build both passes.
pub fn generate_sequences<R: Rng + ?Sized>(
    catalog: &Catalog,
    config: &ExperimentConfig,
    rng: &mut R,
) -> Result<GeneratedSequences> {
    let selection = select_faces(catalog.all_items(), &config.selection, rng)?;
    let practice_pool = assign_proportion_congruency(&selection.practice, rng);
    let main_pool = assign_proportion_congruency(&selection.selected, rng);

    let builder = BlockBuilder::new(config, catalog.key_mapping());
    let practice = builder.build(&practice_pool, BlockKind::Practice, rng);
    let main = builder.build(&main_pool, BlockKind::Main, rng);

    Ok(GeneratedSequences {
        practice_pool,
        main_pool,
        practice,
        main,
    })
}

/// Serializable overview of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub seed: u64,
    pub key_group: u8,
    pub key_mapping: KeyMapping,
    pub phase: SessionPhase,
    pub stimuli: usize,
    pub practice_faces: usize,
    pub main_faces: usize,
    pub practice_trials: usize,
    pub main_trials: usize,
    pub main_blocks: usize,
}

#[derive(Debug)]
pub struct Session {
    config: ExperimentConfig,
    seed: u64,
    rng: StdRng,
    catalog: Catalog,
    phase: SessionPhase,
    open_pass: Option<RatingPass>,
    sequences: Option<GeneratedSequences>,
}

impl Session {
    /// Start a session. Without a seed one is drawn from OS entropy and
    /// recorded, so every session can be replayed.
    pub fn new(config: ExperimentConfig, seed: Option<u64>) -> Result<Self> {
        let config = config.validated()?;
        let seed = seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = StdRng::seed_from_u64(seed);
        let catalog = Catalog::generate(&config.catalog, &mut rng);
        tracing::info!(
            seed,
            key_group = catalog.key_mapping().group(),
            stimuli = catalog.len(),
            "session started"
        );
        Ok(Self {
            config,
            seed,
            rng,
            catalog,
            phase: SessionPhase::PreRating,
            open_pass: None,
            sequences: None,
        })
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn key_mapping(&self) -> KeyMapping {
        self.catalog.key_mapping()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn sequences(&self) -> Option<&GeneratedSequences> {
        self.sequences.as_ref()
    }

    fn expect_phase(&self, expected: SessionPhase) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(StroopError::PhaseOrder {
                expected,
                actual: self.phase,
            })
        }
    }

    fn enter(&mut self, phase: SessionPhase) {
        tracing::debug!(from = %self.phase, to = %phase, "session phase");
        self.phase = phase;
    }

    /// Shuffled pass over every face in the catalog.
    ///
    /// The order is drawn once; later calls before completion return the
    /// same pass.
    pub fn pre_rating_pass(&mut self) -> Result<RatingPass> {
        self.expect_phase(SessionPhase::PreRating)?;
        let catalog = &self.catalog;
        let rng = &mut self.rng;
        let pass = self.open_pass.get_or_insert_with(|| {
            let ids = catalog.items().map(|item| item.id.clone()).collect();
            RatingPass::new(RatingPhase::Pre, ids, rng)
        });
        Ok(pass.clone())
    }

    /// Write one slider response collected during `pass`.
    pub fn record_rating(&mut self, pass: &RatingPass, id: &StimulusId, value: i32) -> Result<()> {
        pass.record(&mut self.catalog, id, value, &self.config.rating)
    }

    /// Close the pre-rating pass and generate both trial sequences.
    pub fn complete_pre_rating(&mut self, pass: RatingPass) -> Result<&GeneratedSequences> {
        self.expect_phase(SessionPhase::PreRating)?;
        let config = &self.config;
        let rng = &mut self.rng;
        let generated = pass.finish(&self.catalog, |catalog| generate_sequences(catalog, config, rng))?;
        self.open_pass = None;
        self.enter(SessionPhase::Task);
        Ok(self.sequences.insert(generated))
    }

    /// Drive `responder` through the pre-rating pass. A failed run leaves
    /// the session in [`SessionPhase::PreRating`] and may be retried.
    pub fn run_pre_rating(
        &mut self,
        responder: &mut impl RatingResponder,
    ) -> Result<&GeneratedSequences> {
        let pass = self.pre_rating_pass()?;
        let config = &self.config;
        let rng = &mut self.rng;
        let generated = pass.run(&mut self.catalog, &config.rating, responder, |catalog| {
            generate_sequences(catalog, config, rng)
        })?;
        self.open_pass = None;
        self.enter(SessionPhase::Task);
        Ok(self.sequences.insert(generated))
    }

    /// End the classification task and open the post-rating pass over the
    /// main faces. While that pass is open, calls return it again.
    pub fn post_rating_pass(&mut self) -> Result<RatingPass> {
        match self.phase {
            SessionPhase::Task => {
                let ids = self
                    .sequences
                    .as_ref()
                    .map(GeneratedSequences::main_ids)
                    .unwrap_or_default();
                self.open_pass = Some(RatingPass::new(RatingPhase::Post, ids, &mut self.rng));
                self.enter(SessionPhase::PostRating);
            }
            SessionPhase::PostRating => {}
            actual => {
                return Err(StroopError::PhaseOrder {
                    expected: SessionPhase::Task,
                    actual,
                });
            }
        }
        self.open_pass.clone().ok_or(StroopError::PhaseOrder {
            expected: SessionPhase::Task,
            actual: self.phase,
        })
    }

    pub fn complete_post_rating(&mut self, pass: RatingPass) -> Result<()> {
        self.expect_phase(SessionPhase::PostRating)?;
        pass.finish(&self.catalog, |_| Ok(()))?;
        self.open_pass = None;
        self.enter(SessionPhase::Complete);
        Ok(())
    }

    /// Drive `responder` through the post-rating pass. A failed run leaves
    /// the pass open for a retry.
    pub fn run_post_rating(&mut self, responder: &mut impl RatingResponder) -> Result<()> {
        let pass = self.post_rating_pass()?;
        pass.run(&mut self.catalog, &self.config.rating, responder, |_| Ok(()))?;
        self.open_pass = None;
        self.enter(SessionPhase::Complete);
        Ok(())
    }

    /// Practice then main trials as flat rows, with current ratings.
    #[must_use]
    pub fn records(&self) -> Vec<TrialRecord> {
        let Some(sequences) = &self.sequences else {
            return Vec::new();
        };
        sequences
            .practice
            .trials()
            .chain(sequences.main.trials())
            .map(|trial| {
                let mut record = TrialRecord::from_trial(trial);
                record.refresh_ratings(&self.catalog);
                record
            })
            .collect()
    }

    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        let keys = self.key_mapping();
        let (practice_faces, main_faces, practice_trials, main_trials, main_blocks) =
            match &self.sequences {
                Some(s) => (
                    s.practice_pool.len(),
                    s.main_pool.len(),
                    s.practice.len(),
                    s.main.len(),
                    s.main.block_count(),
                ),
                None => (0, 0, 0, 0, 0),
            };
        SessionSummary {
            seed: self.seed,
            key_group: keys.group(),
            key_mapping: keys,
            phase: self.phase,
            stimuli: self.catalog.len(),
            practice_faces,
            main_faces,
            practice_trials,
            main_trials,
            main_blocks,
        }
    }
}
