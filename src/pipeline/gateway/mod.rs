//! Extraction Gateway: raw bundles and registry studies in, typed records out.
//!
//! Each direction is one bulk request to the inference capability. Both are
//! pipeline-fatal on failure: everything downstream depends on them.

pub mod prompt;
pub mod extractor;

pub use extractor::{accumulate_studies, ExtractionGateway};

use thiserror::Error;

use super::structuring::InferenceError;

/// Bulk extraction failure (the run's `ExtractionParseError`).
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Cannot encode extraction input: {0}")]
    PromptEncoding(#[from] serde_json::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("Response has no `{key}` record list")]
    MissingKey { key: &'static str },

    #[error("None of the {received} `{key}` records in the response could be normalized")]
    NoRecords { key: &'static str, received: usize },
}
