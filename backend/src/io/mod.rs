//! Dataset input and result output

pub mod dataset;
pub mod export;

pub use dataset::{Dataset, InputError, PREDICTED_COLUMN, REAL_COLUMN};
pub use export::{output_prefix, write_state_log, ExportError, ReportWriter};
