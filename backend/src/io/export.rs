//! Result export
//!
//! Writes a run report as a set of files sharing one prefix:
//! - `{prefix}_unallocated_requests.csv` - dropped requests per tick
//! - `{prefix}_amf_utilization.csv` - fleet utilization per tick
//! - `{prefix}_active_amfs_log.csv` - instances ON or draining per tick
//! - `{prefix}_ON_amfs_log.csv` - instances strictly ON per tick
//! - `{prefix}_states_log.txt` - human-readable per-instance state log
//! - `{prefix}_summary.json` - headline numbers, config hash and digest

use crate::metrics::TickRecord;
use crate::orchestrator::report::RunReport;
use crate::orchestrator::snapshot::StateLog;
use crate::policy::ProvisioningMode;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while writing results
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize summary: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// File prefix for a dataset run
///
/// The dataset's file stem in forecast mode; `Ideal_{suffix}` in ideal mode,
/// where `suffix` follows the stem's last `_`.
///
/// # Example
/// ```
/// use amf_simulator_core::io::output_prefix;
/// use amf_simulator_core::policy::ProvisioningMode;
/// use std::path::Path;
///
/// let path = Path::new("input/BLR_3.csv");
/// assert_eq!(output_prefix(path, ProvisioningMode::Forecast), "BLR_3");
/// assert_eq!(output_prefix(path, ProvisioningMode::Ideal), "Ideal_3");
/// ```
pub fn output_prefix(dataset_path: &Path, mode: ProvisioningMode) -> String {
    let stem = dataset_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset");
    match mode {
        ProvisioningMode::Forecast => stem.to_string(),
        ProvisioningMode::Ideal => {
            let suffix = stem.rsplit('_').next().unwrap_or(stem);
            format!("Ideal_{}", suffix)
        }
    }
}

/// Writes every output file of one run into a directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
    prefix: String,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Path of the output file with the given suffix
    pub fn path_for(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}_{}", self.prefix, suffix))
    }

    /// Write all files; returns their paths
    pub fn write_all(&self, report: &RunReport) -> Result<Vec<PathBuf>, ExportError> {
        fs::create_dir_all(&self.dir).map_err(|source| ExportError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let records = report.metrics.records();
        let written = vec![
            self.write_series(
                "unallocated_requests.csv",
                "Unallocated Requests",
                records,
                |r| r.unallocated.to_string(),
            )?,
            self.write_series(
                "amf_utilization.csv",
                "AMF Utilization (%)",
                records,
                |r| r.utilization_pct.to_string(),
            )?,
            self.write_series("active_amfs_log.csv", "Active AMFs", records, |r| {
                r.active_instances.to_string()
            })?,
            self.write_series("ON_amfs_log.csv", "ON AMFs", records, |r| {
                r.on_instances.to_string()
            })?,
            self.write_with("states_log.txt", |out| {
                write_state_log(out, &report.state_log)
            })?,
            self.write_with("summary.json", |out| {
                serde_json::to_writer_pretty(&mut *out, &report.summary())
                    .map_err(std::io::Error::from)?;
                writeln!(out)
            })?,
        ];
        Ok(written)
    }

    fn write_series<F>(
        &self,
        suffix: &str,
        column: &str,
        records: &[TickRecord],
        value: F,
    ) -> Result<PathBuf, ExportError>
    where
        F: Fn(&TickRecord) -> String,
    {
        self.write_with(suffix, |out| {
            writeln!(out, "Time,{}", column)?;
            for record in records {
                writeln!(out, "{},{}", record.time, value(record))?;
            }
            Ok(())
        })
    }

    fn write_with<F>(&self, suffix: &str, body: F) -> Result<PathBuf, ExportError>
    where
        F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
    {
        let path = self.path_for(suffix);
        let io_error = |source| ExportError::Io {
            path: path.clone(),
            source,
        };
        let mut out = BufWriter::new(File::create(&path).map_err(io_error)?);
        body(&mut out).map_err(io_error)?;
        out.flush().map_err(io_error)?;
        Ok(path)
    }
}

/// Render the state log as text, one block per tick
pub fn write_state_log<W: Write>(out: &mut W, state_log: &StateLog) -> std::io::Result<()> {
    writeln!(out, "Log of AMF states over time")?;
    for snapshot in state_log.snapshots() {
        writeln!(
            out,
            "Time {}, Total Requests: {}, Predicted: {}, Unallocated: {} #######################",
            snapshot.time, snapshot.total_load, snapshot.planning_load, snapshot.unallocated
        )?;
        for instance in &snapshot.instances {
            let phase = instance
                .shutdown_phase
                .map(|p| format!("Shutdown State: {}", p))
                .unwrap_or_else(|| " ".to_string());
            writeln!(
                out,
                "AMF ID: {}, State: {}, Life: {}, Reqs: {} (Max Capacity: {}), {}",
                instance.id,
                instance.state,
                instance.life,
                instance.active_requests,
                instance.effective_capacity,
                phase
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}
