//! Ordered trial blocks as handed to the presentation layer.

use serde::{Deserialize, Serialize};

use crate::block::{BlockKind, TrialItem};

/// Blocks in presentation order; each block is already shuffled and every
/// trial carries its final block and trial numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialSequence {
    kind: BlockKind,
    blocks: Vec<Vec<TrialItem>>,
}

impl TrialSequence {
    /// Number `blocks` in the given order.
    ///
    /// Trial numbers run 0-based across the whole sequence. Main blocks are
    /// numbered from 1 in presentation order; practice trials carry no
    /// block number.
    #[must_use]
    pub fn numbered(kind: BlockKind, mut blocks: Vec<Vec<TrialItem>>) -> Self {
        let mut trial_nr = 0;
        for (index, block) in blocks.iter_mut().enumerate() {
            let block_nr = match kind {
                BlockKind::Main => Some(index + 1),
                BlockKind::Practice => None,
            };
            for trial in block.iter_mut() {
                trial.block_nr = block_nr;
                trial.trial_nr = trial_nr;
                trial_nr += 1;
            }
        }
        Self { kind, blocks }
    }

    #[must_use]
    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    #[must_use]
    pub fn blocks(&self) -> &[Vec<TrialItem>] {
        &self.blocks
    }

    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Total trial count across all blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Trials in presentation order.
    pub fn trials(&self) -> impl Iterator<Item = &TrialItem> {
        self.blocks.iter().flatten()
    }

    /// Flatten into presentation order.
    #[must_use]
    pub fn into_trials(self) -> Vec<TrialItem> {
        self.blocks.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Position;
    use crate::catalog::{Gender, KeyMapping, StimulusId, StimulusItem};
    use crate::congruency::{Congruency, ProportionCongruency};

    fn trial(id: &str) -> TrialItem {
        TrialItem {
            stimulus: StimulusItem::new(StimulusId::new(id), Gender::Male, KeyMapping::MALE_LEFT),
            proportion_congruency: ProportionCongruency::MostlyCongruent,
            congruency: Congruency::Congruent,
            position: Position::Upper,
            distractor: "MAN".into(),
            block_type: BlockKind::Main,
            block_nr: None,
            trial_nr: 99,
        }
    }

    #[test]
    fn main_blocks_number_from_one_and_trials_run_on() {
        let blocks = vec![vec![trial("a"), trial("b")], vec![trial("c")], vec![trial("d"), trial("e")]];
        let sequence = TrialSequence::numbered(BlockKind::Main, blocks);
        let numbered: Vec<(Option<usize>, usize)> =
            sequence.trials().map(|t| (t.block_nr, t.trial_nr)).collect();
        assert_eq!(
            numbered,
            [(Some(1), 0), (Some(1), 1), (Some(2), 2), (Some(3), 3), (Some(3), 4)]
        );
        assert_eq!(sequence.len(), 5);
        assert_eq!(sequence.block_count(), 3);
    }

    #[test]
    fn practice_trials_have_no_block_number() {
        let sequence = TrialSequence::numbered(BlockKind::Practice, vec![vec![trial("a"), trial("b")]]);
        assert!(sequence.trials().all(|t| t.block_nr.is_none()));
        let ids: Vec<String> = sequence
            .into_trials()
            .into_iter()
            .map(|t| t.stimulus.id.to_string())
            .collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn empty_sequence() {
        let sequence = TrialSequence::numbered(BlockKind::Main, Vec::new());
        assert!(sequence.is_empty());
        assert_eq!(sequence.kind(), BlockKind::Main);
    }
}
