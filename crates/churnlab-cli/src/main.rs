mod config;
mod registry;

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use churnlab_clean::{CLEANING_SUMMARY_FILE, CleanError, CleaningEngine};
use churnlab_core::DATASET_VERSION;
use churnlab_generate::{GenerationEngine, GenerationError};
use churnlab_report::{ReportEngine, ReportError};
use config::{PipelineConfig, schema_json};
use registry::{RunContext, init_logging, start_run};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("cleaning error: {0}")]
    Clean(#[from] CleanError),
    #[error("report error: {0}")]
    Report(#[from] ReportError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Parser, Debug)]
#[command(name = "churnlab", version, about = "Synthetic churn dataset generator and cleaner")]
struct Cli {
    /// TOML configuration file; defaults apply to anything it omits.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the raw customer dataset.
    Generate(GenerateArgs),
    /// Clean a raw customer dataset.
    Clean(CleanArgs),
    /// Compute churn metrics and the findings report from a clean dataset.
    Report(ReportArgs),
    /// Generate, clean and report inside a registered run directory.
    Run(RunArgs),
    /// Print the resolved configuration as TOML.
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[arg(long, default_value = "data")]
    out_dir: PathBuf,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, allow_negative_numbers = true)]
    customers: Option<i64>,
}

#[derive(Args, Debug)]
struct CleanArgs {
    #[arg(long, default_value = "data/customers_raw.csv")]
    input: PathBuf,
    #[arg(long, default_value = "data")]
    out_dir: PathBuf,
}

#[derive(Args, Debug)]
struct ReportArgs {
    #[arg(long, default_value = "data/customers_clean.csv")]
    input: PathBuf,
    /// Cleaning summary to include; defaults to the one next to the input, if present.
    #[arg(long)]
    summary: Option<PathBuf>,
    #[arg(long, default_value = "outputs")]
    out_dir: PathBuf,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Output directory for runs.
    #[arg(long, default_value = "runs")]
    run_dir: PathBuf,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, allow_negative_numbers = true)]
    customers: Option<i64>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Print the JSON Schema instead.
    #[arg(long, default_value_t = false)]
    schema: bool,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let config = PipelineConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Generate(args) => {
            init_logging(&cli.log_level, None)?;
            run_generate(config, args)
        }
        Command::Clean(args) => {
            init_logging(&cli.log_level, None)?;
            run_clean(config, args)
        }
        Command::Report(args) => {
            init_logging(&cli.log_level, None)?;
            run_report(config, args)
        }
        Command::Run(args) => run_pipeline(&cli.log_level, config, args),
        Command::Config(args) => print_config(&config, args.schema),
    }
}

fn apply_overrides(config: &mut PipelineConfig, seed: Option<u64>, customers: Option<i64>) {
    if let Some(seed) = seed {
        config.generator.seed = Some(seed);
    }
    if let Some(customers) = customers {
        config.generator.customers = customers;
    }
}

fn run_generate(mut config: PipelineConfig, args: GenerateArgs) -> Result<(), CliError> {
    apply_overrides(&mut config, args.seed, args.customers);
    let result = GenerationEngine::new(config.generator).run(&args.out_dir)?;
    println!("raw customers: {}", result.raw_path.display());
    println!("plans: {}", result.plans_path.display());
    println!("generation report: {}", result.report_path.display());
    Ok(())
}

fn run_clean(config: PipelineConfig, args: CleanArgs) -> Result<(), CliError> {
    let result = CleaningEngine::new(config.cleaner).run(&args.input, &args.out_dir)?;
    println!("clean customers: {}", result.clean_path.display());
    println!("cleaning summary: {}", result.summary_path.display());
    println!("data issues: {}", result.issues_path.display());
    if let Some(tables) = &result.tables_dir {
        println!("load tables: {}", tables.display());
    }
    Ok(())
}

fn run_report(config: PipelineConfig, args: ReportArgs) -> Result<(), CliError> {
    let summary = args.summary.or_else(|| sibling_summary(&args.input));
    let result =
        ReportEngine::new(config.report).run(&args.input, summary.as_deref(), &args.out_dir)?;
    print!("{}", result.report);
    println!("churn metrics: {}", result.metrics_path.display());
    Ok(())
}

fn sibling_summary(input: &Path) -> Option<PathBuf> {
    let candidate = input.parent()?.join(CLEANING_SUMMARY_FILE);
    candidate.is_file().then_some(candidate)
}

fn run_pipeline(log_level: &str, mut config: PipelineConfig, args: RunArgs) -> Result<(), CliError> {
    let start = Instant::now();
    apply_overrides(&mut config, args.seed, args.customers);

    let ctx = RunContext {
        run_id: Uuid::new_v4().to_string(),
        started_at: Utc::now(),
        dataset_version: DATASET_VERSION.to_string(),
        run_dir: args.run_dir,
        config,
    };
    let paths = start_run(&ctx)?;
    init_logging(log_level, Some(&paths.logs_path))?;
    info!(event = "run_started", run_id = %ctx.run_id, root = %paths.root.display());

    let config = ctx.config;
    let generated = GenerationEngine::new(config.generator).run(&paths.data_dir)?;
    info!(event = "raw_written", path = %generated.raw_path.display());

    let cleaned = CleaningEngine::new(config.cleaner).run(&generated.raw_path, &paths.data_dir)?;
    info!(event = "clean_written", path = %cleaned.clean_path.display());

    let reported = ReportEngine::new(config.report).run(
        &cleaned.clean_path,
        Some(&cleaned.summary_path),
        &paths.outputs_dir,
    )?;
    info!(event = "report_written", path = %reported.report_path.display());

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(event = "run_finished", status = "success", duration_ms);
    println!("run: {}", paths.root.display());
    Ok(())
}

fn print_config(config: &PipelineConfig, schema: bool) -> Result<(), CliError> {
    let text = if schema {
        schema_json()?
    } else {
        config.to_toml()?
    };
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from([
            "churnlab",
            "generate",
            "--seed",
            "7",
            "--customers",
            "100",
            "--config",
            "churnlab.toml",
        ])
        .expect("parse");
        assert_eq!(cli.config, Some(PathBuf::from("churnlab.toml")));
        assert_eq!(cli.log_level, "info");
        match cli.command {
            Command::Generate(args) => {
                assert_eq!(args.seed, Some(7));
                assert_eq!(args.customers, Some(100));
                assert_eq!(args.out_dir, PathBuf::from("data"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn overrides_replace_only_given_knobs() {
        let mut config = PipelineConfig::default();
        apply_overrides(&mut config, None, Some(50));
        assert_eq!(config.generator.seed, Some(42));
        assert_eq!(config.generator.customers, 50);
        apply_overrides(&mut config, Some(9), None);
        assert_eq!(config.generator.seed, Some(9));
    }

    #[test]
    fn report_defaults_read_from_data_dir() {
        let cli = Cli::try_parse_from(["churnlab", "report"]).expect("parse");
        match cli.command {
            Command::Report(args) => {
                assert_eq!(args.input, PathBuf::from("data/customers_clean.csv"));
                assert_eq!(args.summary, None);
                assert_eq!(args.out_dir, PathBuf::from("outputs"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["churnlab", "train"]).is_err());
    }

    #[test]
    fn sibling_summary_is_found_next_to_input() {
        let mut dir = std::env::temp_dir();
        dir.push(format!("churnlab_cli_sibling_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let input = dir.join("customers_clean.csv");
        assert_eq!(sibling_summary(&input), None);

        std::fs::write(dir.join(CLEANING_SUMMARY_FILE), "{}").expect("write summary");
        assert_eq!(sibling_summary(&input), Some(dir.join(CLEANING_SUMMARY_FILE)));
    }
}
