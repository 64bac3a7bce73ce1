//! Batch driver
//!
//! Runs every dataset of an input directory in forecast mode, then one model
//! group in ideal mode, on a fixed-size worker pool.
//!
//! Dataset files are named `{model}_{n}.csv`. The model key groups files that
//! come from the same forecasting model; `n` orders the ideal runs.
//!
//! # Critical Invariants
//!
//! - **Isolation**: a run that fails or panics is reported in its
//!   [`JobOutcome`] and never stops its siblings
//! - **Phases**: every forecast run finishes before the first ideal run starts

use crate::runner::run_dataset;
use crate::CliError;
use amf_simulator_core::{ProvisioningMode, RunSummary, SimulationConfig};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{error, info, info_span};
use uuid::Uuid;

/// Default worker pool size
pub const DEFAULT_WORKERS: usize = 5;

// ============================================================================
// Discovery
// ============================================================================

/// All `*.csv` files directly inside `dir`, sorted by file name
pub fn discover_datasets(dir: &Path) -> Result<Vec<PathBuf>, CliError> {
    let read_error = |source| CliError::InputDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut datasets = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        let is_csv = path.extension().and_then(|e| e.to_str()) == Some("csv");
        if is_csv && path.is_file() {
            datasets.push(path);
        }
    }
    datasets.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(datasets)
}

/// Model key of a dataset: its file name up to the first `_`
///
/// ```
/// use amf_simulator_cli::model_key;
/// use std::path::Path;
///
/// assert_eq!(model_key(Path::new("input/LSTM_12.csv")), "LSTM");
/// assert_eq!(model_key(Path::new("plain.csv")), "plain.csv");
/// ```
pub fn model_key(path: &Path) -> String {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    name.split('_').next().unwrap_or(name).to_string()
}

/// Group datasets by model key
pub fn cluster_by_model(datasets: &[PathBuf]) -> BTreeMap<String, Vec<PathBuf>> {
    let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for path in datasets {
        groups.entry(model_key(path)).or_default().push(path.clone());
    }
    groups
}

/// Numeric suffix of `{model}_{n}.csv`
fn numeric_suffix(path: &Path) -> Option<u64> {
    let stem = path.file_stem()?.to_str()?;
    let (_, suffix) = stem.split_once('_')?;
    suffix.split('_').next()?.parse().ok()
}

/// Order a model group for ideal runs: by numeric suffix
///
/// Files without a numeric suffix go last, by name.
pub fn ideal_run_order(group: &[PathBuf]) -> Vec<PathBuf> {
    let mut ordered = group.to_vec();
    ordered.sort_by(|a, b| {
        let key = |p: &Path| (numeric_suffix(p).is_none(), numeric_suffix(p), p.to_path_buf());
        key(a).cmp(&key(b))
    });
    ordered
}

// ============================================================================
// Plan
// ============================================================================

/// One simulation to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    pub dataset: PathBuf,
    pub mode: ProvisioningMode,
}

impl BatchJob {
    pub fn file_name(&self) -> String {
        self.dataset
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Ordered jobs of a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPlan {
    /// Every dataset, forecast mode
    pub forecast: Vec<BatchJob>,

    /// Model group run in ideal mode
    pub ideal_model: Option<String>,

    /// That group's datasets, ideal mode, in run order
    pub ideal: Vec<BatchJob>,
}

impl BatchPlan {
    /// Plan a batch over `datasets`
    ///
    /// The ideal group is `ideal_model` when given and present, otherwise the
    /// lexicographically first model key.
    pub fn new(datasets: &[PathBuf], ideal_model: Option<&str>) -> Self {
        let groups = cluster_by_model(datasets);
        let chosen = ideal_model
            .filter(|key| groups.contains_key(*key))
            .map(str::to_string)
            .or_else(|| groups.keys().next().cloned());

        let forecast = datasets
            .iter()
            .map(|dataset| BatchJob {
                dataset: dataset.clone(),
                mode: ProvisioningMode::Forecast,
            })
            .collect();

        let ideal = chosen
            .as_ref()
            .and_then(|key| groups.get(key))
            .map(|group| {
                ideal_run_order(group)
                    .into_iter()
                    .map(|dataset| BatchJob {
                        dataset,
                        mode: ProvisioningMode::Ideal,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            forecast,
            ideal_model: chosen,
            ideal,
        }
    }

    pub fn len(&self) -> usize {
        self.forecast.len() + self.ideal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All jobs in run order
    pub fn jobs(&self) -> impl Iterator<Item = &BatchJob> {
        self.forecast.iter().chain(self.ideal.iter())
    }
}

// ============================================================================
// Execution
// ============================================================================

/// How a job ended
#[derive(Debug, Clone)]
pub enum JobStatus {
    Completed {
        summary: RunSummary,
        files: Vec<PathBuf>,
    },
    Failed(String),
    Panicked(String),
}

/// Result of one job
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job: BatchJob,
    pub run_id: Uuid,
    pub status: JobStatus,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, JobStatus::Completed { .. })
    }
}

/// Run a plan on a pool of `workers` threads
///
/// Outcomes come back in plan order, forecast phase first.
pub fn run_batch(
    plan: &BatchPlan,
    workers: usize,
    config: &SimulationConfig,
    output_dir: &Path,
) -> Result<Vec<JobOutcome>, CliError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|index| format!("amf-worker-{}", index))
        .build()?;

    info!(
        jobs = plan.len(),
        workers = workers.max(1),
        ideal_model = plan.ideal_model.as_deref().unwrap_or("-"),
        "batch started"
    );

    let mut outcomes = Vec::with_capacity(plan.len());
    for phase in [&plan.forecast, &plan.ideal] {
        let results: Vec<JobOutcome> = pool.install(|| {
            phase
                .par_iter()
                .map(|job| run_job(job, config, output_dir))
                .collect()
        });
        outcomes.extend(results);
    }

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    info!(completed = outcomes.len() - failed, failed, "batch finished");
    Ok(outcomes)
}

fn run_job(job: &BatchJob, config: &SimulationConfig, output_dir: &Path) -> JobOutcome {
    let run_id = Uuid::new_v4();
    let dataset = job.file_name();
    let span = info_span!("run", %run_id, dataset = %dataset, mode = %job.mode);
    let _guard = span.enter();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        run_dataset(&job.dataset, job.mode, config, output_dir)
    }));

    let status = match result {
        Ok(Ok(output)) => JobStatus::Completed {
            summary: output.summary,
            files: output.files,
        },
        Ok(Err(err)) => {
            error!(dataset = %dataset, error = %err, "run failed");
            JobStatus::Failed(err.to_string())
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(dataset = %dataset, panic = %message, "run panicked");
            JobStatus::Panicked(message)
        }
    };

    JobOutcome {
        job: job.clone(),
        run_id,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from("input").join(n)).collect()
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_cluster_by_model_prefix() {
        let groups = cluster_by_model(&paths(&["GRU_1.csv", "LSTM_1.csv", "GRU_2.csv"]));

        assert_eq!(groups.len(), 2);
        assert_eq!(names(&groups["GRU"]), vec!["GRU_1.csv", "GRU_2.csv"]);
        assert_eq!(names(&groups["LSTM"]), vec!["LSTM_1.csv"]);
    }

    #[test]
    fn test_ideal_order_is_numeric() {
        let group = paths(&["GRU_10.csv", "GRU_2.csv", "GRU_x.csv", "GRU_1.csv"]);
        let ordered = ideal_run_order(&group);
        assert_eq!(
            names(&ordered),
            vec!["GRU_1.csv", "GRU_2.csv", "GRU_10.csv", "GRU_x.csv"]
        );
    }

    #[test]
    fn test_plan_defaults_to_first_model() {
        let datasets = paths(&["LSTM_2.csv", "GRU_3.csv", "LSTM_1.csv"]);
        let plan = BatchPlan::new(&datasets, None);

        assert_eq!(plan.forecast.len(), 3);
        assert_eq!(plan.ideal_model.as_deref(), Some("GRU"));
        assert_eq!(plan.ideal.len(), 1);
        assert!(plan.ideal.iter().all(|j| j.mode == ProvisioningMode::Ideal));
        assert_eq!(plan.len(), 4);
    }

    #[test]
    fn test_plan_honors_ideal_model_override() {
        let datasets = paths(&["LSTM_2.csv", "GRU_3.csv", "LSTM_1.csv"]);
        let plan = BatchPlan::new(&datasets, Some("LSTM"));

        let ideal: Vec<PathBuf> = plan.ideal.iter().map(|j| j.dataset.clone()).collect();
        assert_eq!(names(&ideal), vec!["LSTM_1.csv", "LSTM_2.csv"]);
    }

    #[test]
    fn test_plan_unknown_override_falls_back() {
        let plan = BatchPlan::new(&paths(&["GRU_1.csv"]), Some("ARIMA"));
        assert_eq!(plan.ideal_model.as_deref(), Some("GRU"));
    }

    #[test]
    fn test_empty_plan() {
        let plan = BatchPlan::new(&[], None);
        assert!(plan.is_empty());
        assert!(plan.ideal_model.is_none());
    }

    #[test]
    fn test_discover_only_csv_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b_1.csv", "a_1.csv", "notes.txt"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let found = discover_datasets(dir.path()).unwrap();

        assert_eq!(names(&found), vec!["a_1.csv", "b_1.csv"]);
    }

    #[test]
    fn test_discover_missing_directory_fails() {
        let result = discover_datasets(Path::new("no/such/input/dir"));
        assert!(matches!(result, Err(CliError::InputDir { .. })));
    }

    #[test]
    fn test_failing_run_does_not_stop_siblings() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(
            input.path().join("GRU_1.csv"),
            "Predicted_Requests,Real_Requests\n100,100\n",
        )
        .unwrap();
        fs::write(input.path().join("GRU_2.csv"), "Predicted_Requests\n100\n").unwrap();

        let datasets = discover_datasets(input.path()).unwrap();
        let plan = BatchPlan::new(&datasets, None);
        let outcomes =
            run_batch(&plan, 2, &SimulationConfig::default(), output.path()).unwrap();

        assert_eq!(outcomes.len(), 4);
        let ok: Vec<bool> = outcomes.iter().map(JobOutcome::is_success).collect();
        assert_eq!(ok, vec![true, false, true, false]);
        assert!(output.path().join("GRU_1_summary.json").exists());
        assert!(output.path().join("Ideal_1_summary.json").exists());
    }
}
