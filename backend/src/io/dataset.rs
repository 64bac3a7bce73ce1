//! Dataset loading
//!
//! A dataset is a CSV table with one row per tick. Two columns are required,
//! in any position: `Predicted_Requests` (forecast, may be fractional) and
//! `Real_Requests` (observed count). Other columns are ignored, which lets
//! files exported with an index column load unchanged.

use crate::models::LoadSample;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Forecast column name
pub const PREDICTED_COLUMN: &str = "Predicted_Requests";

/// Observed load column name
pub const REAL_COLUMN: &str = "Real_Requests";

/// Errors that make a dataset unusable
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Dataset has no header row")]
    MissingHeader,

    #[error("Dataset is missing required column '{column}'")]
    MissingColumn { column: &'static str },

    #[error("Dataset has no data rows")]
    EmptyDataset,

    #[error("Row {row}, column '{column}': invalid value '{value}'")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },
}

/// Load samples of one dataset file
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    name: String,
    samples: Vec<LoadSample>,
}

impl Dataset {
    /// Read and parse a CSV file
    pub fn from_path(path: &Path) -> Result<Self, InputError> {
        let io_error = |source| InputError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(io_error)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("dataset")
            .to_string();
        Self::from_reader(name, BufReader::new(file)).map_err(|e| match e {
            InputError::Io { source, .. } => io_error(source),
            other => other,
        })
    }

    /// Parse CSV text
    ///
    /// # Example
    /// ```
    /// use amf_simulator_core::io::Dataset;
    ///
    /// let csv = "Predicted_Requests,Real_Requests\n5000.5,4800\n6000,6100\n";
    /// let dataset = Dataset::parse_str("BLR_1", csv).unwrap();
    ///
    /// assert_eq!(dataset.len(), 2);
    /// assert_eq!(dataset.samples()[0].predicted, 5000.5);
    /// assert_eq!(dataset.samples()[1].real, 6100);
    /// ```
    pub fn parse_str(name: &str, text: &str) -> Result<Self, InputError> {
        Self::from_reader(name.to_string(), text.as_bytes())
    }

    /// Parse CSV from any buffered reader
    pub fn from_reader<R: BufRead>(name: String, reader: R) -> Result<Self, InputError> {
        let io_error = |source| InputError::Io {
            path: PathBuf::from(&name),
            source,
        };
        let mut lines = reader.lines();

        let header = loop {
            match lines.next() {
                Some(line) => {
                    let line = line.map_err(io_error)?;
                    if !line.trim().is_empty() {
                        break line;
                    }
                }
                None => return Err(InputError::MissingHeader),
            }
        };
        let columns = split_record(header.trim_start_matches('\u{feff}'));
        let find = |column: &'static str| {
            columns
                .iter()
                .position(|c| c == column)
                .ok_or(InputError::MissingColumn { column })
        };
        let predicted_idx = find(PREDICTED_COLUMN)?;
        let real_idx = find(REAL_COLUMN)?;

        let mut samples = Vec::new();
        for line in lines {
            let line = line.map_err(io_error)?;
            if line.trim().is_empty() {
                continue;
            }
            let row = samples.len();
            let fields = split_record(&line);
            let predicted = parse_number(&fields, predicted_idx, row, PREDICTED_COLUMN)?;
            let real = parse_number(&fields, real_idx, row, REAL_COLUMN)?;
            samples.push(LoadSample::new(predicted, real.trunc() as u64));
        }

        if samples.is_empty() {
            return Err(InputError::EmptyDataset);
        }
        Ok(Self { name, samples })
    }

    /// File stem the dataset was loaded from
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn samples(&self) -> &[LoadSample] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<LoadSample> {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

fn parse_number(
    fields: &[String],
    index: usize,
    row: usize,
    column: &'static str,
) -> Result<f64, InputError> {
    let raw = fields.get(index).map(String::as_str).unwrap_or("");
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| InputError::InvalidValue {
            row,
            column,
            value: raw.to_string(),
        })
}

/// Split one CSV record, honoring double-quoted fields
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.trim_end_matches('\r').chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}
