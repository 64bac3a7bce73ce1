//! Single dataset run
//!
//! Load → simulate → export. Both binaries go through [`run_dataset`].

use crate::CliError;
use amf_simulator_core::io::{output_prefix, Dataset, ReportWriter};
use amf_simulator_core::{run_simulation, ProvisioningMode, RunSummary, SimulationConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// What a finished run left behind
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Prefix shared by every written file
    pub prefix: String,
    pub files: Vec<PathBuf>,
    pub summary: RunSummary,
}

/// Read a JSON config; absent fields keep their defaults
pub fn load_config(path: &Path) -> Result<SimulationConfig, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let config: SimulationConfig =
        serde_json::from_str(&text).map_err(|source| CliError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate()?;
    Ok(config)
}

/// Simulate one dataset and write its output files into `output_dir`
pub fn run_dataset(
    dataset_path: &Path,
    mode: ProvisioningMode,
    config: &SimulationConfig,
    output_dir: &Path,
) -> Result<RunOutput, CliError> {
    let dataset = Dataset::from_path(dataset_path)?;
    info!(dataset = dataset.name(), rows = dataset.len(), %mode, "dataset loaded");

    let report = run_simulation(config.clone(), mode, dataset.into_samples())?;

    let prefix = output_prefix(dataset_path, mode);
    let files = ReportWriter::new(output_dir, prefix.as_str()).write_all(&report)?;
    info!(prefix = %prefix, files = files.len(), "results written");

    Ok(RunOutput {
        prefix,
        files,
        summary: report.summary(),
    })
}
