//! Fixed-ratio marker sequence with cyclic rotation.
//!
//! The sequence holds `round(a / (a + b) * len)` congruent markers followed
//! by the remaining incongruent ones. Rotating between blocks changes which
//! face position meets which marker, while the marker multiset (and thus
//! the congruent:incongruent ratio of every block) never changes.

use crate::config::RatioSeed;
use crate::congruency::Congruency;

/// Binary marker. `Congruent` is the 0 marker, `Incongruent` the 1 marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    Congruent,
    Incongruent,
}

impl Marker {
    #[must_use]
    pub const fn congruency(self) -> Congruency {
        match self {
            Self::Congruent => Congruency::Congruent,
            Self::Incongruent => Congruency::Incongruent,
        }
    }

    #[must_use]
    pub const fn bit(self) -> u8 {
        match self {
            Self::Congruent => 0,
            Self::Incongruent => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotatingIndex {
    markers: Vec<Marker>,
}

impl RotatingIndex {
    /// Sequence of exactly `length` markers split by `seed`.
    ///
    /// Small groups may round one marker kind away entirely.
    #[must_use]
    pub fn new(seed: RatioSeed, length: usize) -> Self {
        let congruent = seed.congruent_count(length);
        let mut markers = vec![Marker::Congruent; congruent];
        markers.resize(length, Marker::Incongruent);
        Self { markers }
    }

    /// Cyclic left shift by `step`, reduced modulo the length.
    pub fn forward(&mut self, step: usize) {
        if self.markers.is_empty() {
            return;
        }
        let step = step % self.markers.len();
        self.markers.rotate_left(step);
    }

    /// Copy rotated `step` positions left.
    #[must_use]
    pub fn rotated(&self, step: usize) -> Self {
        let mut copy = self.clone();
        copy.forward(step);
        copy
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Marker> {
        self.markers.get(index).copied()
    }

    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    #[must_use]
    pub fn count(&self, marker: Marker) -> usize {
        self.markers.iter().filter(|&&m| m == marker).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(index: &RotatingIndex) -> Vec<u8> {
        index.markers().iter().map(|m| m.bit()).collect()
    }

    #[test]
    fn four_to_one_over_ten() {
        let index = RotatingIndex::new(RatioSeed::new(4, 1), 10);
        assert_eq!(index.len(), 10);
        assert_eq!(index.count(Marker::Congruent), 8);
        assert_eq!(index.count(Marker::Incongruent), 2);
        assert_eq!(bits(&index), vec![0, 0, 0, 0, 0, 0, 0, 0, 1, 1]);
    }

    #[test]
    fn rotation_by_three_preserves_multiset_and_shifts_alignment() {
        let original = RotatingIndex::new(RatioSeed::new(4, 1), 10);
        let rotated = original.rotated(3);
        assert_eq!(rotated.count(Marker::Congruent), 8);
        assert_eq!(rotated.count(Marker::Incongruent), 2);
        assert_eq!(bits(&rotated), vec![0, 0, 0, 0, 0, 1, 1, 0, 0, 0]);
        for i in 0..10 {
            assert_eq!(rotated.get(i), original.get((i + 3) % 10));
        }
    }

    #[test]
    fn step_at_or_above_length_wraps() {
        let original = RotatingIndex::new(RatioSeed::new(1, 4), 5);
        assert_eq!(original.rotated(5), original);
        assert_eq!(original.rotated(7), original.rotated(2));
    }

    #[test]
    fn tiny_groups_degenerate_without_error() {
        let index = RotatingIndex::new(RatioSeed::new(1, 4), 2);
        assert_eq!(index.count(Marker::Congruent), 0);
        assert_eq!(index.count(Marker::Incongruent), 2);

        let mut empty = RotatingIndex::new(RatioSeed::new(4, 1), 0);
        empty.forward(3);
        assert!(empty.is_empty());
    }

    #[test]
    fn length_is_exact_when_both_shares_round_up() {
        let index = RotatingIndex::new(RatioSeed::new(1, 1), 3);
        assert_eq!(index.len(), 3);
        assert_eq!(index.count(Marker::Congruent), 2);
    }
}
