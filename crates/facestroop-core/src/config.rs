#![forbid(unsafe_code)]

//! Experiment configuration.
//!
//! Every tunable constant of a session lives in [`ExperimentConfig`], which
//! can be loaded from TOML or JSON at startup. Each section is
//! `serde(default)`, so a partial file only overrides what it names.
//!
//! ```toml
//! [selection]
//! quota_per_gender = 20
//! rating_order = "signed"
//!
//! [blocks]
//! main_blocks = 4
//! rotation_step = 4
//! ```
//!
//! `ExperimentConfig::default()` reproduces the face-rating Stroop study as
//! it was run: 47 faces per gender, 15 selected per gender, five main blocks
//! rotated by three between blocks, 4:1 and 1:4 seed ratios.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StroopError};

/// Top-level configuration for one experiment session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Stimulus naming and index range.
    pub catalog: CatalogConfig,
    /// Practice/main split.
    pub selection: SelectionConfig,
    /// Block counts and marker rotation.
    pub blocks: BlockConfig,
    /// Seed ratios per proportion-congruency group.
    pub congruency: CongruencyConfig,
    /// Distractor words superimposed on the faces.
    pub distractors: DistractorConfig,
    /// Slider range for the pleasantness ratings.
    pub rating: RatingScale,
    /// Thresholds for scoring classification responses.
    pub response: ResponseConfig,
}

impl ExperimentConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Load from disk, picking the format from the file extension.
    ///
    /// `.json` is parsed as JSON; anything else as TOML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_file(path)
        } else {
            Self::from_toml_file(path)
        }
    }

    /// Render as pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let catalog = &self.catalog;
        if catalog.male_prefix.trim().is_empty() {
            errors.push("catalog.male_prefix must not be empty".into());
        }
        if catalog.female_prefix.trim().is_empty() {
            errors.push("catalog.female_prefix must not be empty".into());
        }
        if catalog.male_prefix == catalog.female_prefix {
            errors.push(format!(
                "catalog prefixes must differ, both are {:?}",
                catalog.male_prefix
            ));
        }
        if catalog.first_index > catalog.last_index {
            errors.push(format!(
                "catalog.first_index ({}) must be <= catalog.last_index ({})",
                catalog.first_index, catalog.last_index
            ));
        }

        if self.selection.quota_per_gender == 0 {
            errors.push("selection.quota_per_gender must be > 0".into());
        } else if self.selection.quota_per_gender > catalog.per_gender() {
            errors.push(format!(
                "selection.quota_per_gender ({}) exceeds the {} stimuli per gender",
                self.selection.quota_per_gender,
                catalog.per_gender()
            ));
        }

        if self.blocks.main_blocks == 0 {
            errors.push("blocks.main_blocks must be > 0".into());
        }
        if self.blocks.practice_blocks == 0 {
            errors.push("blocks.practice_blocks must be > 0".into());
        }

        for (name, seed) in [
            ("mostly_congruent", self.congruency.mostly_congruent),
            ("mostly_incongruent", self.congruency.mostly_incongruent),
        ] {
            if seed.sum() == 0 {
                errors.push(format!("congruency.{name} seed must not sum to 0"));
            }
        }

        let words = &self.distractors;
        if words.male_word.trim().is_empty() || words.female_word.trim().is_empty() {
            errors.push("distractor words must not be empty".into());
        }
        if words.male_word == words.female_word {
            errors.push(format!(
                "distractor words must differ, both are {:?}",
                words.male_word
            ));
        }

        let scale = &self.rating;
        if scale.min >= scale.max {
            errors.push(format!(
                "rating.min ({}) must be < rating.max ({})",
                scale.min, scale.max
            ));
        } else if !scale.contains(scale.neutral) {
            errors.push(format!(
                "rating.neutral ({}) must lie in [{}, {}]",
                scale.neutral, scale.min, scale.max
            ));
        }

        if self.response.response_window_ms <= self.response.too_early_ms {
            errors.push(format!(
                "response.response_window_ms ({}) must exceed response.too_early_ms ({})",
                self.response.response_window_ms, self.response.too_early_ms
            ));
        }

        errors
    }

    /// Consume the config, failing fast on the first invalid parameter set.
    pub fn validated(self) -> Result<Self> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(StroopError::invalid_config(errors))
        }
    }
}

/// Stimulus identifiers are `{image_dir}/{prefix}{index:0width}.{extension}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub male_prefix: String,
    pub female_prefix: String,
    pub first_index: u32,
    pub last_index: u32,
    pub index_width: usize,
    pub image_dir: String,
    pub extension: String,
}

impl CatalogConfig {
    /// Number of stimuli generated for each gender.
    #[must_use]
    pub fn per_gender(&self) -> usize {
        if self.first_index > self.last_index {
            0
        } else {
            (self.last_index - self.first_index + 1) as usize
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            male_prefix: "HM".into(),
            female_prefix: "HW".into(),
            first_index: 1,
            last_index: 47,
            index_width: 2,
            image_dir: "faces".into(),
            extension: "bmp".into(),
        }
    }
}

/// Ordering applied to the pre-ratings before quotas are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingOrder {
    /// Ascending `|pre-rating|`: the most neutral faces are selected first.
    #[default]
    Magnitude,
    /// Ascending raw pre-rating: the least pleasant faces are selected first.
    Signed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Faces per gender routed to the main set. Default: 15.
    pub quota_per_gender: usize,
    /// Default: [`RatingOrder::Magnitude`].
    pub rating_order: RatingOrder,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            quota_per_gender: 15,
            rating_order: RatingOrder::Magnitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    /// Repetitions of the main set (K). Default: 5.
    pub main_blocks: usize,
    /// Repetitions of the practice set. Default: 1.
    pub practice_blocks: usize,
    /// Cyclic left-shift applied to the marker sequence between blocks.
    /// Reduced modulo the sequence length. Default: 3.
    pub rotation_step: usize,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            main_blocks: 5,
            practice_blocks: 1,
            rotation_step: 3,
        }
    }
}

/// Congruent:incongruent seed ratio, e.g. `[4, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatioSeed(pub [u32; 2]);

impl RatioSeed {
    #[must_use]
    pub const fn new(congruent: u32, incongruent: u32) -> Self {
        Self([congruent, incongruent])
    }

    #[must_use]
    pub const fn congruent(self) -> u32 {
        self.0[0]
    }

    #[must_use]
    pub const fn incongruent(self) -> u32 {
        self.0[1]
    }

    #[must_use]
    pub const fn sum(self) -> u32 {
        self.0[0] + self.0[1]
    }

    /// Congruent share of `length` items, rounded half away from zero.
    #[must_use]
    pub fn congruent_count(self, length: usize) -> usize {
        if self.sum() == 0 {
            return 0;
        }
        let share = f64::from(self.congruent()) / f64::from(self.sum());
        ((share * length as f64).round() as usize).min(length)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CongruencyConfig {
    /// Default: 4:1.
    pub mostly_congruent: RatioSeed,
    /// Default: 1:4.
    pub mostly_incongruent: RatioSeed,
}

impl Default for CongruencyConfig {
    fn default() -> Self {
        Self {
            mostly_congruent: RatioSeed::new(4, 1),
            mostly_incongruent: RatioSeed::new(1, 4),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistractorConfig {
    pub male_word: String,
    pub female_word: String,
}

impl Default for DistractorConfig {
    fn default() -> Self {
        Self {
            male_word: "MAN".into(),
            female_word: "WOMAN".into(),
        }
    }
}

/// Slider range of the pleasantness ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingScale {
    pub min: i32,
    pub max: i32,
    /// Slider start position.
    pub neutral: i32,
}

impl RatingScale {
    #[must_use]
    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

impl Default for RatingScale {
    fn default() -> Self {
        Self {
            min: -100,
            max: 100,
            neutral: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Responses faster than this are scored as anticipations. Default: 100.
    pub too_early_ms: u64,
    /// Target display window; no key within it means "too late". Default: 1500.
    pub response_window_ms: u64,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            too_early_ms: 100,
            response_window_ms: 1500,
        }
    }
}
