//! Headless run of a full session with a simulated participant.
//!
//! Ratings come from a uniform responder, key presses from
//! [`SimulatedParticipant`]. Both draw from generators derived from the
//! session seed, so `--seed` reproduces the exported file byte for byte.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use facestroop_core::{
    BlockSummary, ExperimentConfig, ResponseConfig, ResponseKey, ResponseOutcome, Session,
    SessionSummary, TrialItem, TrialRecord, TrialResponse, TrialSequence, UniformResponder,
    classify_response, write_csv, write_jsonl,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};
use crate::util::{ensure_dir, load_config, now_utc_iso, write_string};

const RATING_STREAM: u64 = 0x5241_5449_4e47;
const RESPONSE_STREAM: u64 = 0x4b45_5953;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Jsonl,
}

#[derive(Debug, Clone, Args)]
pub struct SimulateArgs {
    /// TOML or JSON experiment config; built-in defaults when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Session seed. Drawn from OS entropy and reported when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Trial table destination.
    #[arg(long, short)]
    pub output: PathBuf,

    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    pub format: ExportFormat,

    /// Run summary JSON destination.
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Probability of pressing the wrong key.
    #[arg(long, default_value_t = 0.1)]
    pub error_rate: f64,

    /// Probability of not responding at all.
    #[arg(long, default_value_t = 0.02)]
    pub miss_rate: f64,

    #[arg(long, default_value_t = 350)]
    pub rt_min_ms: u64,

    #[arg(long, default_value_t = 900)]
    pub rt_max_ms: u64,
}

impl SimulateArgs {
    fn validate(&self) -> Result<()> {
        for (name, rate) in [("error-rate", self.error_rate), ("miss-rate", self.miss_rate)] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(CliError::invalid(format!("--{name} must lie in [0, 1], got {rate}")));
            }
        }
        if self.rt_min_ms > self.rt_max_ms {
            return Err(CliError::invalid(format!(
                "--rt-min-ms ({}) must be <= --rt-max-ms ({})",
                self.rt_min_ms, self.rt_max_ms
            )));
        }
        Ok(())
    }
}

/// Key presses with configurable error and miss rates.
#[derive(Debug, Clone)]
pub struct SimulatedParticipant {
    rng: StdRng,
    error_rate: f64,
    miss_rate: f64,
    rt_min_ms: u64,
    rt_max_ms: u64,
}

impl SimulatedParticipant {
    #[must_use]
    pub fn new(seed: u64, error_rate: f64, miss_rate: f64, rt_min_ms: u64, rt_max_ms: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            error_rate,
            miss_rate,
            rt_min_ms,
            rt_max_ms: rt_max_ms.max(rt_min_ms),
        }
    }

    pub fn respond(&mut self, trial: &TrialItem) -> TrialResponse {
        if self.rng.random_bool(self.miss_rate) {
            return TrialResponse::timeout();
        }
        let correct = trial.correct_key();
        let key = if self.rng.random_bool(self.error_rate) {
            other_key(correct)
        } else {
            correct
        };
        let rt = self.rng.random_range(self.rt_min_ms..=self.rt_max_ms);
        TrialResponse::pressed(key, rt)
    }
}

fn other_key(key: ResponseKey) -> ResponseKey {
    match key {
        ResponseKey::D => ResponseKey::L,
        ResponseKey::L => ResponseKey::D,
    }
}

/// Press a key for every trial of `sequence`, tallying each block.
fn respond_all(
    sequence: &TrialSequence,
    participant: &mut SimulatedParticipant,
    config: &ResponseConfig,
    summaries: &mut Vec<BlockSummary>,
) -> Vec<(TrialResponse, ResponseOutcome)> {
    let mut scored = Vec::with_capacity(sequence.len());
    for block in sequence.blocks() {
        let mut summary = BlockSummary::default();
        for trial in block {
            let response = participant.respond(trial);
            let outcome = classify_response(trial, response, config);
            summary.record(outcome);
            scored.push((response, outcome));
        }
        summaries.push(summary);
    }
    scored
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub status: String,
    pub started_at: String,
    pub finished_at: String,
    pub session: SessionSummary,
    pub instruction: String,
    pub output: String,
    pub format: ExportFormat,
    pub records: usize,
    pub practice: BlockSummary,
    pub blocks: Vec<BlockSummary>,
    pub accuracy: f64,
}

impl RunSummary {
    pub fn write_to_path(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        write_string(path, &content)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str::<Self>(&content)?)
    }
}

/// A finished simulated session and everything it produced.
#[derive(Debug)]
pub struct SimulatedRun {
    pub session: Session,
    pub records: Vec<TrialRecord>,
    pub practice: Vec<BlockSummary>,
    pub blocks: Vec<BlockSummary>,
}

/// Run a complete session and return the rows that would be exported.
pub fn simulate_session(config: ExperimentConfig, args: &SimulateArgs) -> Result<SimulatedRun> {
    args.validate()?;
    let mut session = Session::new(config, args.seed)?;
    let seed = session.seed();
    let scale = session.config().rating;
    let mut rater = UniformResponder::new(StdRng::seed_from_u64(seed ^ RATING_STREAM), scale);
    session.run_pre_rating(&mut rater)?;

    let mut participant = SimulatedParticipant::new(
        seed ^ RESPONSE_STREAM,
        args.error_rate,
        args.miss_rate,
        args.rt_min_ms,
        args.rt_max_ms,
    );
    let response_config = session.config().response;
    let mut practice = Vec::new();
    let mut blocks = Vec::new();
    let mut scored = Vec::new();
    if let Some(sequences) = session.sequences() {
        scored.extend(respond_all(
            &sequences.practice,
            &mut participant,
            &response_config,
            &mut practice,
        ));
        scored.extend(respond_all(
            &sequences.main,
            &mut participant,
            &response_config,
            &mut blocks,
        ));
    }
    for (index, summary) in blocks.iter().enumerate() {
        tracing::info!(block = index + 1, %summary, "block finished");
    }

    session.run_post_rating(&mut rater)?;

    let records = session
        .records()
        .into_iter()
        .zip(scored)
        .map(|(record, (response, outcome))| record.with_response(response, outcome))
        .collect();
    Ok(SimulatedRun {
        session,
        records,
        practice,
        blocks,
    })
}

pub fn run_simulate(args: SimulateArgs) -> Result<()> {
    let started_at = now_utc_iso();
    let config = load_config(args.config.as_deref())?;
    let SimulatedRun {
        session,
        records,
        practice,
        blocks,
    } = simulate_session(config, &args)?;

    if let Some(parent) = args.output.parent() {
        ensure_dir(parent)?;
    }
    let writer = BufWriter::new(File::create(&args.output)?);
    match args.format {
        ExportFormat::Csv => write_csv(&records, writer)?,
        ExportFormat::Jsonl => write_jsonl(&records, writer)?,
    }

    let main_total: BlockSummary = blocks.iter().copied().sum();
    let summary = RunSummary {
        status: "ok".to_string(),
        started_at,
        finished_at: now_utc_iso(),
        session: session.summary(),
        instruction: session.key_mapping().instruction(),
        output: args.output.display().to_string(),
        format: args.format,
        records: records.len(),
        practice: practice.into_iter().sum(),
        blocks,
        accuracy: main_total.accuracy(),
    };
    if let Some(path) = &args.summary {
        summary.write_to_path(path)?;
    }

    println!(
        "seed {} | {} records -> {} | main accuracy {:.1}%",
        summary.session.seed,
        summary.records,
        summary.output,
        summary.accuracy * 100.0
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use facestroop_core::{BlockKind, KeyMapping};

    use super::*;

    fn args(output: PathBuf) -> SimulateArgs {
        SimulateArgs {
            config: None,
            seed: Some(17),
            output,
            format: ExportFormat::Csv,
            summary: None,
            error_rate: 0.0,
            miss_rate: 0.0,
            rt_min_ms: 400,
            rt_max_ms: 800,
        }
    }

    fn small_config() -> ExperimentConfig {
        let mut config = ExperimentConfig::default();
        config.catalog.last_index = 10;
        config.selection.quota_per_gender = 6;
        config.blocks.main_blocks = 3;
        config
    }

    #[test]
    fn perfect_participant_scores_every_trial_correct() {
        let SimulatedRun {
            session,
            records,
            practice,
            blocks,
        } = simulate_session(small_config(), &args(PathBuf::from("unused.csv"))).expect("simulate");
        assert_eq!(records.len(), 8 + 36);
        assert!(records.iter().all(|r| r.outcome == Some(ResponseOutcome::Correct)));
        assert_eq!(practice.len(), 1);
        assert_eq!(blocks.len(), 3);
        assert!(blocks.iter().all(|b| b.correct == 12 && b.total() == 12));
        assert_eq!(session.summary().main_trials, 36);
    }

    #[test]
    fn every_practice_block_gets_its_own_summary() {
        let mut config = small_config();
        config.blocks.practice_blocks = 3;
        let run = simulate_session(config, &args(PathBuf::from("unused.csv"))).expect("simulate");
        let sequences = run.session.sequences().expect("generated");
        assert_eq!(sequences.practice.block_count(), 3);
        assert_eq!(run.practice.len(), 3);
        for (summary, block) in run.practice.iter().zip(sequences.practice.blocks()) {
            assert_eq!(summary.total(), block.len());
        }
        assert_eq!(run.records.len(), 3 * 8 + 36);
    }

    #[test]
    fn main_rows_carry_both_ratings() {
        let records = simulate_session(small_config(), &args(PathBuf::from("unused.csv")))
            .expect("simulate")
            .records;
        let main: Vec<_> = records.iter().filter(|r| r.block_type == BlockKind::Main).collect();
        assert_eq!(main.len(), 36);
        assert!(main.iter().all(|r| r.prerating.is_some() && r.postrating.is_some()));
        assert!(
            records
                .iter()
                .filter(|r| r.block_type == BlockKind::Practice)
                .all(|r| r.postrating.is_none())
        );
    }

    #[test]
    fn always_wrong_participant_presses_the_other_key() {
        let mut participant = SimulatedParticipant::new(3, 1.0, 0.0, 500, 500);
        let session = simulate_session(small_config(), &args(PathBuf::from("unused.csv")))
            .expect("simulate")
            .session;
        let keys: KeyMapping = session.key_mapping();
        let sequences = session.sequences().expect("generated");
        for trial in sequences.main.trials() {
            let response = participant.respond(trial);
            assert_eq!(response.rt_ms, Some(500));
            assert_ne!(response.key, Some(keys.key_for(trial.stimulus.gender)));
        }
    }

    #[test]
    fn out_of_range_rates_are_rejected() {
        let mut bad = args(PathBuf::from("unused.csv"));
        bad.error_rate = 1.5;
        assert!(matches!(bad.validate(), Err(CliError::InvalidArgument { .. })));
        let mut bad = args(PathBuf::from("unused.csv"));
        bad.rt_min_ms = 900;
        bad.rt_max_ms = 100;
        assert!(matches!(bad.validate(), Err(CliError::InvalidArgument { .. })));
    }
}
