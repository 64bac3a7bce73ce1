//! AMF Simulator CLI
//!
//! Runs one dataset and writes its result files.

use amf_simulator_cli::{init_logging, load_config, run_dataset};
use amf_simulator_core::{ProvisioningMode, SimulationConfig};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "amf-sim")]
#[command(about = "Simulate an AMF fleet over one load dataset", long_about = None)]
struct Args {
    /// Dataset CSV with Predicted_Requests and Real_Requests columns
    dataset: PathBuf,

    /// Plan capacity from the real load instead of the forecast
    #[arg(long, action = ArgAction::Set, default_value_t = false)]
    ideal: bool,

    /// Directory for result files
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

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

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(if args.quiet { -1 } else { args.verbose.min(2) as i8 });

    let config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(err) => {
                error!(error = %err, "configuration rejected");
                return ExitCode::FAILURE;
            }
        },
        None => SimulationConfig::default(),
    };

    let mode = ProvisioningMode::from_ideal_flag(args.ideal);
    match run_dataset(&args.dataset, mode, &config, &args.output_dir) {
        Ok(output) => {
            let summary = &output.summary;
            println!(
                "{}: {} ticks, {} requests, {} unallocated ({:.2}%), \
                 mean utilization {:.2}%, {} instances created",
                output.prefix,
                summary.ticks,
                summary.total_requests,
                summary.total_unallocated,
                summary.overall_loss_pct,
                summary.mean_utilization_pct,
                summary.instances_created
            );
            for file in &output.files {
                println!("  {}", file.display());
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(dataset = %args.dataset.display(), error = %err, "run failed");
            ExitCode::FAILURE
        }
    }
}
