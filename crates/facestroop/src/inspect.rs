//! Read-only commands: catalog listing and config handling.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use facestroop_core::{Catalog, ExperimentConfig, KeyMapping};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::{CliError, Result};
use crate::util::{load_config, write_string};

#[derive(Debug, Clone, Args)]
pub struct CatalogArgs {
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Counterbalancing group (0: male on D, 1: male on L).
    #[arg(long, conflicts_with = "seed")]
    pub group: Option<u8>,

    /// Draw the group from this seed, as a session would.
    #[arg(long)]
    pub seed: Option<u64>,

    /// One JSON object per stimulus instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct CheckConfigArgs {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct DefaultConfigArgs {
    /// Write here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

fn catalog_for(args: &CatalogArgs) -> Result<Catalog> {
    let config = load_config(args.config.as_deref())?.validated()?;
    let catalog = match (args.group, args.seed) {
        (Some(group @ (0 | 1)), _) => Catalog::build(&config.catalog, KeyMapping::from_group(group)),
        (Some(group), _) => {
            return Err(CliError::invalid(format!("--group must be 0 or 1, got {group}")));
        }
        (None, Some(seed)) => Catalog::generate(&config.catalog, &mut StdRng::seed_from_u64(seed)),
        (None, None) => Catalog::build(&config.catalog, KeyMapping::MALE_LEFT),
    };
    Ok(catalog)
}

pub fn write_catalog<W: Write>(catalog: &Catalog, json: bool, mut writer: W) -> Result<()> {
    if json {
        for item in catalog.items() {
            serde_json::to_writer(&mut writer, item)?;
            writeln!(writer)?;
        }
    } else {
        writeln!(writer, "{}", catalog.key_mapping().instruction())?;
        for item in catalog.items() {
            writeln!(writer, "{}\t{}\t{}", item.id, item.gender, item.correct_key)?;
        }
    }
    writer.flush()?;
    Ok(())
}

pub fn run_catalog(args: CatalogArgs) -> Result<()> {
    let catalog = catalog_for(&args)?;
    write_catalog(&catalog, args.json, std::io::stdout().lock())
}

/// Problems found in the config at `path`, empty when it is usable.
pub fn config_problems(path: &std::path::Path) -> Result<Vec<String>> {
    Ok(load_config(Some(path))?.validate())
}

pub fn run_check_config(args: CheckConfigArgs) -> Result<()> {
    let problems = config_problems(&args.path)?;
    if problems.is_empty() {
        println!("{}: ok", args.path.display());
        return Ok(());
    }
    for problem in &problems {
        eprintln!("  - {problem}");
    }
    Err(facestroop_core::StroopError::invalid_config(problems).into())
}

pub fn run_default_config(args: DefaultConfigArgs) -> Result<()> {
    let rendered = ExperimentConfig::default().to_toml_string()?;
    match args.output {
        Some(path) => write_string(&path, &rendered),
        None => {
            print!("{rendered}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use facestroop_core::{Gender, ResponseKey};
    use tempfile::tempdir;

    use super::*;

    fn args() -> CatalogArgs {
        CatalogArgs {
            config: None,
            group: None,
            seed: None,
            json: false,
        }
    }

    #[test]
    fn group_one_puts_male_faces_on_l() {
        let catalog = catalog_for(&CatalogArgs {
            group: Some(1),
            ..args()
        })
        .expect("catalog");
        assert_eq!(catalog.len(), 94);
        assert!(
            catalog
                .items()
                .all(|item| (item.gender == Gender::Male) == (item.correct_key == ResponseKey::L))
        );
    }

    #[test]
    fn unknown_group_is_rejected() {
        let error = catalog_for(&CatalogArgs {
            group: Some(2),
            ..args()
        })
        .expect_err("group 2");
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn table_starts_with_instruction() {
        let catalog = catalog_for(&args()).expect("catalog");
        let mut out = Vec::new();
        write_catalog(&catalog, false, &mut out).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("You should respond to male faces with [D] and to female faces with [L]")
        );
        assert_eq!(lines.next(), Some("faces/HM01.bmp\tmale\td"));
        assert_eq!(text.lines().count(), 95);
    }

    #[test]
    fn json_lines_cover_every_stimulus() {
        let catalog = catalog_for(&args()).expect("catalog");
        let mut out = Vec::new();
        write_catalog(&catalog, true, &mut out).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text.lines().count(), 94);
        let first: serde_json::Value =
            serde_json::from_str(text.lines().next().expect("line")).expect("json");
        assert_eq!(first["gender"], "male");
    }

    #[test]
    fn default_config_round_trips_through_file() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("conf/default.toml");
        run_default_config(DefaultConfigArgs {
            output: Some(path.clone()),
        })
        .expect("write default");
        assert!(config_problems(&path).expect("load").is_empty());
        let loaded = ExperimentConfig::from_path(&path).expect("parse");
        assert_eq!(loaded, ExperimentConfig::default());
    }

    #[test]
    fn check_config_reports_every_problem() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("broken.toml");
        fs::write(&path, "[blocks]\nmain_blocks = 0\n[rating]\nmin = 5\nmax = 5\n").expect("write");
        let problems = config_problems(&path).expect("load");
        assert_eq!(problems.len(), 2, "{problems:?}");
        let error = run_check_config(CheckConfigArgs { path }).expect_err("invalid");
        assert_eq!(error.exit_code(), 2);
    }
}
