//! Proportion-congruency tags.
//!
//! Each gender's faces are split in half by index after a shuffle: the first
//! half becomes "mostly congruent", the rest "mostly incongruent". The tag
//! later decides which seed ratio the face's trials are drawn from.

use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::catalog::{Gender, StimulusItem};
use crate::config::{CongruencyConfig, RatioSeed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProportionCongruency {
    #[serde(rename = "Mostly Congruent")]
    MostlyCongruent,
    #[serde(rename = "Mostly Incongruent")]
    MostlyIncongruent,
}

impl ProportionCongruency {
    pub const ALL: [Self; 2] = [Self::MostlyCongruent, Self::MostlyIncongruent];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MostlyCongruent => "Mostly Congruent",
            Self::MostlyIncongruent => "Mostly Incongruent",
        }
    }

    /// Seed ratio configured for this group.
    #[must_use]
    pub fn seed(self, config: &CongruencyConfig) -> RatioSeed {
        match self {
            Self::MostlyCongruent => config.mostly_congruent,
            Self::MostlyIncongruent => config.mostly_incongruent,
        }
    }
}

impl fmt::Display for ProportionCongruency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the distractor word names the face's own gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Congruency {
    Congruent,
    Incongruent,
}

impl Congruency {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Congruent => "Congruent",
            Self::Incongruent => "Incongruent",
        }
    }

    /// Gender named by the distractor shown on a face of `gender`.
    #[must_use]
    pub const fn distractor_gender(self, gender: Gender) -> Gender {
        match self {
            Self::Congruent => gender,
            Self::Incongruent => gender.other(),
        }
    }
}

impl fmt::Display for Congruency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A face carrying its proportion-congruency tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StroopItem {
    #[serde(flatten)]
    pub stimulus: StimulusItem,
    pub proportion_congruency: ProportionCongruency,
}

/// Tag half of each gender's faces as mostly congruent, the rest as mostly
/// incongruent.
///
/// With an odd count the congruent half gets the extra face. The result is
/// shuffled per gender and again after merging.
pub fn assign_proportion_congruency<R: Rng + ?Sized>(
    items: &[StimulusItem],
    rng: &mut R,
) -> Vec<StroopItem> {
    let mut merged = Vec::with_capacity(items.len());
    for gender in Gender::ALL {
        let mut faces: Vec<StimulusItem> = items
            .iter()
            .filter(|item| item.gender == gender)
            .cloned()
            .collect();
        faces.shuffle(rng);

        let midpoint = faces.len().div_ceil(2);
        let mut tagged: Vec<StroopItem> = faces
            .into_iter()
            .enumerate()
            .map(|(index, stimulus)| StroopItem {
                stimulus,
                proportion_congruency: if index < midpoint {
                    ProportionCongruency::MostlyCongruent
                } else {
                    ProportionCongruency::MostlyIncongruent
                },
            })
            .collect();
        tagged.shuffle(rng);

        tracing::debug!(
            %gender,
            mostly_congruent = midpoint,
            mostly_incongruent = tagged.len() - midpoint,
            "assigned proportion congruency"
        );
        merged.extend(tagged);
    }
    merged.shuffle(rng);
    merged
}

/// Faces of `pool` carrying tag `group`, in pool order.
#[must_use]
pub fn group_members(pool: &[StroopItem], group: ProportionCongruency) -> Vec<StroopItem> {
    pool.iter()
        .filter(|item| item.proportion_congruency == group)
        .cloned()
        .collect()
}
