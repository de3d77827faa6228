#![forbid(unsafe_code)]

//! Rotating-index block builder.
//!
//! For every proportion-congruency group a [`RotatingIndex`] is built from
//! the group's seed ratio. The group's faces are shuffled once; each block
//! then clones that order and pairs face `i` with marker `i`, and the marker
//! sequence is rotated by `rotation_step` before the next block. Each block
//! therefore reproduces the seed ratio exactly while the face-to-condition
//! pairing differs from block to block.
//!
//! Per trial the aligned marker decides:
//!
//! - congruency: 0 marker is congruent, 1 marker is incongruent;
//! - distractor: the word naming the face's own gender when congruent, the
//!   other gender's word when incongruent;
//! - position: see [`Position::for_marker`].
//!
//! Blocks are shuffled internally, the block list is shuffled, and the
//! result is numbered by [`TrialSequence::numbered`].

use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::catalog::{Gender, KeyMapping, KeySide, ResponseKey, StimulusItem};
use crate::config::{DistractorConfig, ExperimentConfig};
use crate::congruency::{Congruency, ProportionCongruency, StroopItem, group_members};
use crate::rotating_index::{Marker, RotatingIndex};
use crate::sequence::TrialSequence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    #[serde(rename = "practice")]
    Practice,
    #[serde(rename = "trial")]
    Main,
}

impl BlockKind {
    /// Block type recorded with each trial.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Practice => "practice",
            Self::Main => "trial",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vertical placement of the target face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Upper,
    Lower,
}

impl Position {
    /// Position from the aligned marker and the side of the face's key.
    ///
    /// Congruent trials of left-key faces and incongruent trials of
    /// right-key faces go up; the other two combinations go down. Since the
    /// two genders sit on opposite keys, each congruency level appears in
    /// both positions, split in proportion to the gender balance.
    #[must_use]
    pub const fn for_marker(marker: Marker, key: ResponseKey) -> Self {
        match (marker, key.side()) {
            (Marker::Congruent, KeySide::Left) | (Marker::Incongruent, KeySide::Right) => {
                Self::Upper
            }
            (Marker::Congruent, KeySide::Right) | (Marker::Incongruent, KeySide::Left) => {
                Self::Lower
            }
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upper => "upper",
            Self::Lower => "lower",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One presentation of a face with its full condition assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialItem {
    pub stimulus: StimulusItem,
    pub proportion_congruency: ProportionCongruency,
    pub congruency: Congruency,
    pub position: Position,
    pub distractor: String,
    pub block_type: BlockKind,
    pub block_nr: Option<usize>,
    pub trial_nr: usize,
}

impl TrialItem {
    #[must_use]
    pub fn correct_key(&self) -> ResponseKey {
        self.stimulus.correct_key
    }

    /// Whether `response` is the face's correct key.
    #[must_use]
    pub fn is_correct(&self, response: ResponseKey) -> bool {
        response == self.stimulus.correct_key
    }
}

fn distractor_word(words: &DistractorConfig, gender: Gender) -> &str {
    match gender {
        Gender::Male => &words.male_word,
        Gender::Female => &words.female_word,
    }
}

/// Builds annotated blocks from a tagged face pool.
#[derive(Debug, Clone, Copy)]
pub struct BlockBuilder<'a> {
    config: &'a ExperimentConfig,
    keys: KeyMapping,
}

impl<'a> BlockBuilder<'a> {
    #[must_use]
    pub fn new(config: &'a ExperimentConfig, keys: KeyMapping) -> Self {
        Self { config, keys }
    }

    /// Number of blocks a pass of `kind` produces.
    #[must_use]
    pub fn block_count(&self, kind: BlockKind) -> usize {
        match kind {
            BlockKind::Practice => self.config.blocks.practice_blocks,
            BlockKind::Main => self.config.blocks.main_blocks,
        }
    }

    fn annotate(&self, item: StroopItem, marker: Marker, kind: BlockKind) -> TrialItem {
        let StroopItem {
            mut stimulus,
            proportion_congruency,
        } = item;
        stimulus.correct_key = self.keys.key_for(stimulus.gender);
        let congruency = marker.congruency();
        let distractor = distractor_word(
            &self.config.distractors,
            congruency.distractor_gender(stimulus.gender),
        )
        .to_string();
        TrialItem {
            position: Position::for_marker(marker, stimulus.correct_key),
            stimulus,
            proportion_congruency,
            congruency,
            distractor,
            block_type: kind,
            block_nr: None,
            trial_nr: 0,
        }
    }

    /// Pair each face of `faces` with the marker at the same position.
    fn assign(
        &self,
        faces: &[StroopItem],
        markers: &RotatingIndex,
        kind: BlockKind,
    ) -> Vec<TrialItem> {
        faces
            .iter()
            .cloned()
            .zip(markers.markers().iter().copied())
            .map(|(face, marker)| self.annotate(face, marker, kind))
            .collect()
    }

    /// Full pass over `pool`: one block per configured repetition.
    pub fn build<R: Rng + ?Sized>(
        &self,
        pool: &[StroopItem],
        kind: BlockKind,
        rng: &mut R,
    ) -> TrialSequence {
        let block_count = self.block_count(kind);
        let step = self.config.blocks.rotation_step;
        let mut blocks: Vec<Vec<TrialItem>> = vec![Vec::new(); block_count];

        for group in ProportionCongruency::ALL {
            let mut faces = group_members(pool, group);
            let mut markers = RotatingIndex::new(group.seed(&self.config.congruency), faces.len());
            faces.shuffle(rng);
            tracing::debug!(
                %group,
                %kind,
                faces = faces.len(),
                congruent = markers.count(Marker::Congruent),
                incongruent = markers.count(Marker::Incongruent),
                "building group blocks"
            );

            for block in &mut blocks {
                let mut trials = self.assign(&faces, &markers, kind);
                trials.shuffle(rng);
                block.extend(trials);
                markers.forward(step);
            }
        }

        for block in &mut blocks {
            block.shuffle(rng);
        }
        blocks.shuffle(rng);

        let sequence = TrialSequence::numbered(kind, blocks);
        tracing::info!(
            %kind,
            blocks = sequence.block_count(),
            trials = sequence.len(),
            "generated trial sequence"
        );
        sequence
    }

    /// One standalone block, numbered from 1.
    ///
    /// Markers are rotated `(block_number - 1) * rotation_step` positions
    /// and each group is freshly shuffled, so repeated calls stay balanced
    /// but are not staggered against each other the way [`Self::build`]
    /// staggers its blocks. Trial numbers restart at 0.
    pub fn block<R: Rng + ?Sized>(
        &self,
        pool: &[StroopItem],
        kind: BlockKind,
        block_number: usize,
        rng: &mut R,
    ) -> Vec<TrialItem> {
        let offset = block_number
            .saturating_sub(1)
            .saturating_mul(self.config.blocks.rotation_step);
        let mut block = Vec::with_capacity(pool.len());
        for group in ProportionCongruency::ALL {
            let mut faces = group_members(pool, group);
            faces.shuffle(rng);
            let markers = RotatingIndex::new(group.seed(&self.config.congruency), faces.len())
                .rotated(offset);
            block.extend(self.assign(&faces, &markers, kind));
        }
        block.shuffle(rng);

        let block_nr = match kind {
            BlockKind::Main => Some(block_number),
            BlockKind::Practice => None,
        };
        for (trial_nr, trial) in block.iter_mut().enumerate() {
            trial.block_nr = block_nr;
            trial.trial_nr = trial_nr;
        }
        block
    }
}

/// One ordered block of `pool`; see [`BlockBuilder::block`].
pub fn get_block<R: Rng + ?Sized>(
    pool: &[StroopItem],
    block_number: usize,
    is_practice: bool,
    config: &ExperimentConfig,
    keys: KeyMapping,
    rng: &mut R,
) -> Vec<TrialItem> {
    let kind = if is_practice {
        BlockKind::Practice
    } else {
        BlockKind::Main
    };
    BlockBuilder::new(config, keys).block(pool, kind, block_number, rng)
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::catalog::StimulusId;
    use crate::congruency::assign_proportion_congruency;

    fn pool(per_gender: usize, keys: KeyMapping, seed: u64) -> Vec<StroopItem> {
        let faces: Vec<StimulusItem> = (0..per_gender)
            .map(|i| (format!("faces/HM{i:02}.bmp"), Gender::Male))
            .chain((0..per_gender).map(|i| (format!("faces/HW{i:02}.bmp"), Gender::Female)))
            .map(|(id, gender)| StimulusItem::new(StimulusId::new(id), gender, keys))
            .collect();
        assign_proportion_congruency(&faces, &mut StdRng::seed_from_u64(seed))
    }

    fn config(main_blocks: usize, rotation_step: usize) -> ExperimentConfig {
        let mut config = ExperimentConfig::default();
        config.blocks.main_blocks = main_blocks;
        config.blocks.rotation_step = rotation_step;
        config
    }

    fn congruent_count(trials: &[&TrialItem], group: ProportionCongruency) -> usize {
        trials
            .iter()
            .filter(|t| t.proportion_congruency == group && t.congruency == Congruency::Congruent)
            .count()
    }

    #[test]
    fn position_policy_table() {
        assert_eq!(Position::for_marker(Marker::Congruent, ResponseKey::D), Position::Upper);
        assert_eq!(Position::for_marker(Marker::Congruent, ResponseKey::L), Position::Lower);
        assert_eq!(Position::for_marker(Marker::Incongruent, ResponseKey::D), Position::Lower);
        assert_eq!(Position::for_marker(Marker::Incongruent, ResponseKey::L), Position::Upper);
    }

    #[test]
    fn main_pass_has_k_blocks_of_the_whole_pool() {
        let config = config(4, 3);
        let keys = KeyMapping::MALE_LEFT;
        let pool = pool(10, keys, 1);
        let sequence = BlockBuilder::new(&config, keys).build(&pool, BlockKind::Main, &mut StdRng::seed_from_u64(2));

        assert_eq!(sequence.block_count(), 4);
        assert_eq!(sequence.len(), 80);
        for block in sequence.blocks() {
            let ids: BTreeSet<_> = block.iter().map(|t| t.stimulus.id.clone()).collect();
            assert_eq!(ids.len(), 20, "no face repeats inside a block");
        }
        let numbers: Vec<usize> = sequence.trials().map(|t| t.trial_nr).collect();
        assert_eq!(numbers, (0..80).collect::<Vec<_>>());
        let block_numbers: Vec<usize> = sequence
            .blocks()
            .iter()
            .map(|block| block[0].block_nr.expect("main trials carry a block number"))
            .collect();
        assert_eq!(block_numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn every_block_reproduces_the_seed_ratio() {
        let config = config(5, 3);
        let keys = KeyMapping::MALE_RIGHT;
        let pool = pool(15, keys, 3);
        let sequence = BlockBuilder::new(&config, keys).build(&pool, BlockKind::Main, &mut StdRng::seed_from_u64(4));

        let mc = group_members(&pool, ProportionCongruency::MostlyCongruent).len();
        let mi = group_members(&pool, ProportionCongruency::MostlyIncongruent).len();
        let expected_mc = config.congruency.mostly_congruent.congruent_count(mc);
        let expected_mi = config.congruency.mostly_incongruent.congruent_count(mi);

        for block in sequence.blocks() {
            let trials: Vec<&TrialItem> = block.iter().collect();
            assert_eq!(congruent_count(&trials, ProportionCongruency::MostlyCongruent), expected_mc);
            assert_eq!(congruent_count(&trials, ProportionCongruency::MostlyIncongruent), expected_mi);
        }
    }

    #[test]
    fn distractor_and_key_follow_gender_and_congruency() {
        let config = config(2, 3);
        let keys = KeyMapping::MALE_LEFT;
        let pool = pool(6, keys, 5);
        let sequence = BlockBuilder::new(&config, keys).build(&pool, BlockKind::Main, &mut StdRng::seed_from_u64(6));

        for trial in sequence.trials() {
            let own = match trial.stimulus.gender {
                Gender::Male => "MAN",
                Gender::Female => "WOMAN",
            };
            match trial.congruency {
                Congruency::Congruent => assert_eq!(trial.distractor, own),
                Congruency::Incongruent => assert_ne!(trial.distractor, own),
            }
            assert_eq!(trial.correct_key(), keys.key_for(trial.stimulus.gender));
            assert!(trial.is_correct(trial.correct_key()));
        }
    }

    #[test]
    fn rotation_staggers_conditions_across_blocks() {
        let config = config(5, 3);
        let keys = KeyMapping::MALE_LEFT;
        let pool = pool(15, keys, 7);
        let sequence = BlockBuilder::new(&config, keys).build(&pool, BlockKind::Main, &mut StdRng::seed_from_u64(8));

        let mut per_face: BTreeMap<StimulusId, BTreeSet<&str>> = BTreeMap::new();
        for trial in sequence.trials() {
            per_face
                .entry(trial.stimulus.id.clone())
                .or_default()
                .insert(trial.congruency.as_str());
        }
        assert_eq!(per_face.len(), 30);
        assert!(per_face.values().any(|seen| seen.len() == 2));
    }

    #[test]
    fn practice_pass_is_a_single_unnumbered_block() {
        let config = ExperimentConfig::default();
        let keys = KeyMapping::MALE_LEFT;
        let pool = pool(32, keys, 9);
        let sequence = BlockBuilder::new(&config, keys).build(&pool, BlockKind::Practice, &mut StdRng::seed_from_u64(1));

        assert_eq!(sequence.block_count(), 1);
        assert_eq!(sequence.len(), 64);
        assert!(sequence.trials().all(|t| t.block_nr.is_none() && t.block_type == BlockKind::Practice));
    }

    #[test]
    fn get_block_numbers_within_the_block() {
        let config = config(4, 3);
        let keys = KeyMapping::MALE_LEFT;
        let pool = pool(5, keys, 2);
        let block = get_block(&pool, 3, false, &config, keys, &mut StdRng::seed_from_u64(3));

        assert_eq!(block.len(), 10);
        assert!(block.iter().all(|t| t.block_nr == Some(3) && t.block_type == BlockKind::Main));
        let numbers: Vec<usize> = block.iter().map(|t| t.trial_nr).collect();
        assert_eq!(numbers, (0..10).collect::<Vec<_>>());

        let practice = get_block(&pool, 1, true, &config, keys, &mut StdRng::seed_from_u64(3));
        assert!(practice.iter().all(|t| t.block_nr.is_none()));
    }

    #[test]
    fn building_never_touches_the_pool() {
        let config = config(3, 3);
        let keys = KeyMapping::MALE_LEFT;
        let pool = pool(4, keys, 2);
        let before = pool.clone();
        let _ = BlockBuilder::new(&config, keys).build(&pool, BlockKind::Main, &mut StdRng::seed_from_u64(5));
        assert_eq!(pool, before);
    }

    #[test]
    fn same_seed_same_sequence() {
        let config = config(3, 3);
        let keys = KeyMapping::MALE_LEFT;
        let pool = pool(8, keys, 2);
        let builder = BlockBuilder::new(&config, keys);
        let a = builder.build(&pool, BlockKind::Main, &mut StdRng::seed_from_u64(42));
        let b = builder.build(&pool, BlockKind::Main, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
