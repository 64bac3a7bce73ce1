//! AMF Simulator batch driver
//!
//! Runs every dataset of a directory in forecast mode, then one model group
//! in ideal mode.

use amf_simulator_cli::batch::DEFAULT_WORKERS;
use amf_simulator_cli::{
    cluster_by_model, discover_datasets, init_logging, load_config, run_batch, BatchPlan,
    CliError, JobStatus,
};
use amf_simulator_core::SimulationConfig;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, warn};

#[derive(Parser, Debug)]
#[command(name = "amf-batch")]
#[command(about = "Run AMF simulations over a directory of datasets", long_about = None)]
struct Args {
    /// Directory holding {model}_{n}.csv datasets
    #[arg(short, long, default_value = "input")]
    input_dir: PathBuf,

    /// Worker pool size
    #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Directory for result files
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Model group to run in ideal mode (default: first model key)
    #[arg(long)]
    ideal_model: Option<String>,

    /// JSON file overriding simulation parameters
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// More logging (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Warnings and errors only
    #[arg(short, long)]
    quiet: bool,
}

fn run(args: &Args) -> Result<(), CliError> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => SimulationConfig::default(),
    };

    let datasets = discover_datasets(&args.input_dir)?;
    if datasets.is_empty() {
        return Err(CliError::NoDatasets(args.input_dir.clone()));
    }

    println!("Models found:");
    for (model, files) in cluster_by_model(&datasets) {
        let names: Vec<String> = files
            .iter()
            .filter_map(|f| f.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        println!("  - {}: {}", model, names.join(", "));
    }

    let plan = BatchPlan::new(&datasets, args.ideal_model.as_deref());
    if let (Some(requested), Some(chosen)) = (&args.ideal_model, &plan.ideal_model) {
        if requested != chosen {
            warn!(
                requested = %requested,
                chosen = %chosen,
                "unknown ideal model, using first model"
            );
        }
    }

    for outcome in run_batch(&plan, args.workers, &config, &args.output_dir)? {
        let mode = if outcome.job.mode.is_ideal() { "Ideal" } else { "Forecast" };
        match &outcome.status {
            JobStatus::Completed { .. } => {
                println!("Execution completed for {} ({})", outcome.job.file_name(), mode)
            }
            JobStatus::Failed(reason) | JobStatus::Panicked(reason) => {
                println!("Error executing {} ({}): {}", outcome.job.file_name(), mode, reason)
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(if args.quiet { -1 } else { args.verbose.min(2) as i8 });

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "batch aborted");
            ExitCode::FAILURE
        }
    }
}
