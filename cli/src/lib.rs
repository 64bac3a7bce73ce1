//! AMF Simulator CLI support
//!
//! Shared pieces of the `amf-sim` and `amf-batch` binaries:
//! - **logging**: tracing subscriber setup
//! - **runner**: load config and dataset, run, write the output files
//! - **batch**: dataset discovery, model grouping and the worker pool

pub mod batch;
pub mod logging;
pub mod runner;

pub use batch::{
    cluster_by_model, discover_datasets, ideal_run_order, model_key, run_batch, BatchJob,
    BatchPlan, JobOutcome, JobStatus,
};
pub use logging::init_logging;
pub use runner::{load_config, run_dataset, RunOutput};

use amf_simulator_core::io::{ExportError, InputError};
use amf_simulator_core::SimulationError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the binaries
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Failed to read input directory {path}: {source}")]
    InputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No .csv datasets found in {0}")]
    NoDatasets(PathBuf),

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}
