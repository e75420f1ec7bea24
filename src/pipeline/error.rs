//! Errors shared across pipeline stages.
//!
//! Stage-local failures (one page, one file, one matrix cell) are logged and
//! contained by the stage itself. Only the variants of [`PipelineError`]
//! abort a run.

use thiserror::Error;

use super::cohort::CohortError;
use super::gateway::ExtractionError;
use super::structuring::InferenceError;

/// A trial page or cohort file could not be obtained.
#[derive(Error, Debug)]
pub enum SourceFetchError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Request to {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("Trial registry returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Undecodable trial page: {0}")]
    Decode(String),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failures that abort the whole run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Trial source setup failed: {0}")]
    Source(#[from] SourceFetchError),

    #[error("Inference client setup failed: {0}")]
    Inference(#[from] InferenceError),

    #[error("Cohort ingestion failed: {0}")]
    Cohort(#[from] CohortError),

    #[error("Feature extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
}
