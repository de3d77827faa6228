use std::fs;
use std::path::Path;

use facestroop::simulate::{ExportFormat, RunSummary, SimulateArgs};
use facestroop::{Cli, Commands, run};
use facestroop_core::{CSV_HEADER, SessionPhase, TrialRecord};
use tempfile::tempdir;

fn simulate(output: &Path, summary: &Path, format: ExportFormat, seed: u64) {
    run(Cli {
        verbose: 0,
        log_json: false,
        command: Commands::Simulate(SimulateArgs {
            config: None,
            seed: Some(seed),
            output: output.to_path_buf(),
            format,
            summary: Some(summary.to_path_buf()),
            error_rate: 0.1,
            miss_rate: 0.02,
            rt_min_ms: 350,
            rt_max_ms: 900,
        }),
    })
    .expect("simulate");
}

#[test]
fn default_study_exports_practice_and_main_rows() {
    let temp = tempdir().expect("tempdir");
    let output = temp.path().join("run/trials.csv");
    let summary_path = temp.path().join("run/summary.json");
    simulate(&output, &summary_path, ExportFormat::Csv, 2024);

    let csv = fs::read_to_string(&output).expect("csv");
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some(CSV_HEADER.join(",").as_str()));
    // 64 practice faces once, 30 main faces in five blocks.
    assert_eq!(lines.count(), 64 + 150);

    let summary = RunSummary::from_path(&summary_path).expect("summary");
    assert_eq!(summary.status, "ok");
    assert_eq!(summary.session.seed, 2024);
    assert_eq!(summary.session.phase, SessionPhase::Complete);
    assert_eq!(summary.session.main_faces, 30);
    assert_eq!(summary.records, 214);
    assert_eq!(summary.blocks.len(), 5);
    assert!(summary.blocks.iter().all(|block| block.total() == 30));
    assert_eq!(summary.practice.total(), 64);
    assert!((0.0..=1.0).contains(&summary.accuracy));
}

#[test]
fn same_seed_exports_identical_files() {
    let temp = tempdir().expect("tempdir");
    let first = temp.path().join("a.jsonl");
    let second = temp.path().join("b.jsonl");
    simulate(&first, &temp.path().join("a.json"), ExportFormat::Jsonl, 77);
    simulate(&second, &temp.path().join("b.json"), ExportFormat::Jsonl, 77);
    assert_eq!(
        fs::read_to_string(&first).expect("first"),
        fs::read_to_string(&second).expect("second")
    );
}

#[test]
fn jsonl_rows_parse_and_number_main_trials_globally() {
    let temp = tempdir().expect("tempdir");
    let output = temp.path().join("trials.jsonl");
    simulate(&output, &temp.path().join("summary.json"), ExportFormat::Jsonl, 5);

    let records: Vec<TrialRecord> = fs::read_to_string(&output)
        .expect("jsonl")
        .lines()
        .map(|line| serde_json::from_str(line).expect("record"))
        .collect();
    let main: Vec<&TrialRecord> = records.iter().filter(|r| r.block_nr.is_some()).collect();
    let numbers: Vec<usize> = main.iter().map(|r| r.trial_nr).collect();
    assert_eq!(numbers, (0..150).collect::<Vec<_>>());
    assert!(main.iter().all(|r| r.outcome.is_some() && r.postrating.is_some()));
}
