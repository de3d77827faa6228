//! Flat per-trial records for tabular export.
//!
//! One [`TrialRecord`] per presented trial, written as CSV with a fixed
//! header or as JSON lines.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::block::{BlockKind, Position, TrialItem};
use crate::catalog::{Catalog, Gender, ResponseKey, StimulusId};
use crate::congruency::{Congruency, ProportionCongruency};
use crate::error::Result;
use crate::response::{ResponseOutcome, TrialResponse};

pub const CSV_HEADER: [&str; 16] = [
    "image",
    "prerating",
    "postrating",
    "gender",
    "congruency",
    "proportion_congruency",
    "position",
    "distractor",
    "block_type",
    "block_nr",
    "trial_nr",
    "correct_key",
    "response",
    "rt",
    "outcome",
    "correct",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub image: String,
    pub prerating: Option<i32>,
    pub postrating: Option<i32>,
    pub gender: Gender,
    pub congruency: Congruency,
    pub proportion_congruency: ProportionCongruency,
    pub position: Position,
    pub distractor: String,
    pub block_type: BlockKind,
    pub block_nr: Option<usize>,
    pub trial_nr: usize,
    pub correct_key: ResponseKey,
    pub response: Option<ResponseKey>,
    pub rt: Option<u64>,
    pub outcome: Option<ResponseOutcome>,
    pub correct: Option<bool>,
}

impl TrialRecord {
    #[must_use]
    pub fn from_trial(trial: &TrialItem) -> Self {
        Self {
            image: trial.stimulus.id.to_string(),
            prerating: trial.stimulus.prerating,
            postrating: trial.stimulus.postrating,
            gender: trial.stimulus.gender,
            congruency: trial.congruency,
            proportion_congruency: trial.proportion_congruency,
            position: trial.position,
            distractor: trial.distractor.clone(),
            block_type: trial.block_type,
            block_nr: trial.block_nr,
            trial_nr: trial.trial_nr,
            correct_key: trial.correct_key(),
            response: None,
            rt: None,
            outcome: None,
            correct: None,
        }
    }

    /// Attach the recorded response and its score.
    #[must_use]
    pub fn with_response(mut self, response: TrialResponse, outcome: ResponseOutcome) -> Self {
        self.response = response.key;
        self.rt = response.rt_ms;
        self.outcome = Some(outcome);
        self.correct = Some(response.key == Some(self.correct_key));
        self
    }

    /// Pull the latest ratings for this face from the catalog.
    ///
    /// Trials are cloned before the post-rating pass runs, so their rating
    /// slots go stale; the catalog is the single source of truth.
    pub fn refresh_ratings(&mut self, catalog: &Catalog) {
        if let Some(item) = catalog.get(&StimulusId::new(self.image.clone())) {
            self.prerating = item.prerating;
            self.postrating = item.postrating;
        }
    }

    fn csv_fields(&self) -> [String; 16] {
        fn opt<T: ToString>(value: Option<T>) -> String {
            value.map(|v| v.to_string()).unwrap_or_default()
        }
        [
            self.image.clone(),
            opt(self.prerating),
            opt(self.postrating),
            self.gender.to_string(),
            self.congruency.to_string(),
            self.proportion_congruency.to_string(),
            self.position.to_string(),
            self.distractor.clone(),
            self.block_type.to_string(),
            opt(self.block_nr),
            self.trial_nr.to_string(),
            self.correct_key.to_string(),
            opt(self.response),
            opt(self.rt),
            opt(self.outcome),
            opt(self.correct),
        ]
    }
}

fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn write_csv_row<W: Write>(writer: &mut W, fields: &[impl AsRef<str>]) -> Result<()> {
    let line = fields
        .iter()
        .map(|field| escape_csv(field.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    writeln!(writer, "{line}")?;
    Ok(())
}

/// Header plus one row per record.
pub fn write_csv<W: Write>(records: &[TrialRecord], mut writer: W) -> Result<()> {
    write_csv_row(&mut writer, &CSV_HEADER)?;
    for record in records {
        write_csv_row(&mut writer, &record.csv_fields())?;
    }
    writer.flush()?;
    Ok(())
}

/// One JSON object per line.
pub fn write_jsonl<W: Write>(records: &[TrialRecord], mut writer: W) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// [`write_csv`] into memory.
pub fn to_csv_string(records: &[TrialRecord]) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(records, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
