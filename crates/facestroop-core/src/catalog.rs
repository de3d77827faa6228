#![forbid(unsafe_code)]

//! Stimulus catalog and per-subject key mapping.
//!
//! The catalog is the fixed face set: every configured prefix crossed with a
//! zero-padded index range. Items are keyed by [`StimulusId`] so rating
//! write-back is a map lookup, never a search by field.

use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{CatalogConfig, RatingScale};
use crate::error::{Result, StroopError};
use crate::rating::RatingPhase;

/// Binary stimulus category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Self; 2] = [Self::Male, Self::Female];

    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Male => Self::Female,
            Self::Female => Self::Male,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the keyboard a response key sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySide {
    Left,
    Right,
}

/// The two classification keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKey {
    D,
    L,
}

impl ResponseKey {
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::D => 'd',
            Self::L => 'l',
        }
    }

    #[must_use]
    pub const fn side(self) -> KeySide {
        match self {
            Self::D => KeySide::Left,
            Self::L => KeySide::Right,
        }
    }

    /// Case-insensitive parse of a single key name.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "d" | "D" => Some(Self::D),
            "l" | "L" => Some(Self::L),
            _ => None,
        }
    }
}

impl fmt::Display for ResponseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Per-subject assignment of response keys to genders.
///
/// Drawn once per session and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMapping {
    pub male: ResponseKey,
    pub female: ResponseKey,
}

impl KeyMapping {
    /// Counterbalancing group 0: male faces on [D].
    pub const MALE_LEFT: Self = Self {
        male: ResponseKey::D,
        female: ResponseKey::L,
    };

    /// Counterbalancing group 1: male faces on [L].
    pub const MALE_RIGHT: Self = Self {
        male: ResponseKey::L,
        female: ResponseKey::D,
    };

    /// Unbiased binary draw between the two orderings.
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mapping = if rng.random_bool(0.5) {
            Self::MALE_RIGHT
        } else {
            Self::MALE_LEFT
        };
        tracing::debug!(group = mapping.group(), "drew key mapping");
        mapping
    }

    #[must_use]
    pub const fn from_group(group: u8) -> Self {
        if group == 0 {
            Self::MALE_LEFT
        } else {
            Self::MALE_RIGHT
        }
    }

    #[must_use]
    pub const fn group(self) -> u8 {
        match self.male {
            ResponseKey::D => 0,
            ResponseKey::L => 1,
        }
    }

    #[must_use]
    pub const fn key_for(self, gender: Gender) -> ResponseKey {
        match gender {
            Gender::Male => self.male,
            Gender::Female => self.female,
        }
    }

    #[must_use]
    pub fn gender_for(self, key: ResponseKey) -> Gender {
        if key == self.male {
            Gender::Male
        } else {
            Gender::Female
        }
    }

    /// Instruction line telling the subject which key belongs to which gender.
    #[must_use]
    pub fn instruction(self) -> String {
        format!(
            "You should respond to {} faces with [D] and to {} faces with [L]",
            self.gender_for(ResponseKey::D),
            self.gender_for(ResponseKey::L)
        )
    }
}

/// Stable stimulus identifier: the image path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StimulusId(String);

impl StimulusId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StimulusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One face with its two rating slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StimulusItem {
    pub id: StimulusId,
    pub gender: Gender,
    pub prerating: Option<i32>,
    pub postrating: Option<i32>,
    pub correct_key: ResponseKey,
}

impl StimulusItem {
    #[must_use]
    pub fn new(id: StimulusId, gender: Gender, keys: KeyMapping) -> Self {
        Self {
            id,
            gender,
            prerating: None,
            postrating: None,
            correct_key: keys.key_for(gender),
        }
    }

    #[must_use]
    pub fn rating(&self, phase: RatingPhase) -> Option<i32> {
        match phase {
            RatingPhase::Pre => self.prerating,
            RatingPhase::Post => self.postrating,
        }
    }

    fn rating_slot(&mut self, phase: RatingPhase) -> &mut Option<i32> {
        match phase {
            RatingPhase::Pre => &mut self.prerating,
            RatingPhase::Post => &mut self.postrating,
        }
    }
}

/// Builds the identifier of one stimulus image.
#[must_use]
pub fn stimulus_id(config: &CatalogConfig, prefix: &str, index: u32) -> StimulusId {
    let width = config.index_width;
    let file = format!("{prefix}{index:0width$}");
    let file = if config.extension.is_empty() {
        file
    } else {
        format!("{file}.{}", config.extension)
    };
    if config.image_dir.is_empty() {
        StimulusId(file)
    } else {
        StimulusId(format!("{}/{file}", config.image_dir.trim_end_matches('/')))
    }
}

/// The fixed stimulus set of a session.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: BTreeMap<StimulusId, StimulusItem>,
    keys: KeyMapping,
}

impl Catalog {
    /// Build the catalog under an already chosen key mapping.
    #[must_use]
    pub fn build(config: &CatalogConfig, keys: KeyMapping) -> Self {
        let mut items = BTreeMap::new();
        for (gender, prefix) in [
            (Gender::Male, config.male_prefix.as_str()),
            (Gender::Female, config.female_prefix.as_str()),
        ] {
            for index in config.first_index..=config.last_index {
                let id = stimulus_id(config, prefix, index);
                items.insert(id.clone(), StimulusItem::new(id, gender, keys));
            }
        }
        tracing::debug!(
            stimuli = items.len(),
            group = keys.group(),
            "built stimulus catalog"
        );
        Self { items, keys }
    }

    /// Draw the key mapping, then build the catalog under it.
    pub fn generate<R: Rng + ?Sized>(config: &CatalogConfig, rng: &mut R) -> Self {
        let keys = KeyMapping::draw(rng);
        Self::build(config, keys)
    }

    /// Owned snapshot of every item, in identifier order.
    #[must_use]
    pub fn all_items(&self) -> Vec<StimulusItem> {
        self.items.values().cloned().collect()
    }

    pub fn items(&self) -> impl Iterator<Item = &StimulusItem> {
        self.items.values()
    }

    #[must_use]
    pub fn key_mapping(&self) -> KeyMapping {
        self.keys
    }

    #[must_use]
    pub fn get(&self, id: &StimulusId) -> Option<&StimulusItem> {
        self.items.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items of `ids`, cloned from the catalog so later ratings are visible.
    pub fn snapshot(&self, ids: &[StimulusId]) -> Result<Vec<StimulusItem>> {
        ids.iter()
            .map(|id| {
                self.items
                    .get(id)
                    .cloned()
                    .ok_or_else(|| StroopError::UnknownStimulus { id: id.clone() })
            })
            .collect()
    }

    /// Write one rating into its slot. Each slot is written exactly once.
    pub fn record_rating(
        &mut self,
        id: &StimulusId,
        phase: RatingPhase,
        value: i32,
        scale: &RatingScale,
    ) -> Result<()> {
        if !scale.contains(value) {
            return Err(StroopError::RatingOutOfRange {
                value,
                min: scale.min,
                max: scale.max,
            });
        }
        let item = self
            .items
            .get_mut(id)
            .ok_or_else(|| StroopError::UnknownStimulus { id: id.clone() })?;
        let slot = item.rating_slot(phase);
        if slot.is_some() {
            return Err(StroopError::AlreadyRated {
                id: id.clone(),
                phase,
            });
        }
        *slot = Some(value);
        Ok(())
    }

    /// Identifiers among `ids` still missing a rating for `phase`.
    #[must_use]
    pub fn unrated<'a>(&self, ids: &'a [StimulusId], phase: RatingPhase) -> Vec<&'a StimulusId> {
        ids.iter()
            .filter(|id| {
                self.items
                    .get(id)
                    .is_none_or(|item| item.rating(phase).is_none())
            })
            .collect()
    }
}
