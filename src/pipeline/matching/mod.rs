//! Matching Engine: one eligibility classification per (patient, trial) pair.
//!
//! A failed cell is recorded as unknown and never aborts the other cells.

pub mod prompt;
pub mod matrix;
pub mod engine;

pub use engine::MatchingEngine;
pub use matrix::{CellOutcome, MatchCell, MatchMatrix, MatchSummary, PatientMatches};

use thiserror::Error;

use super::structuring::InferenceError;

/// Per-cell classification failure.
#[derive(Error, Debug)]
pub enum MatchError {
    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Cannot encode match input: {0}")]
    PromptEncoding(#[from] serde_json::Error),

    #[error("Classification timed out after {0}s")]
    Timeout(u64),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("Invalid verdict: {0}")]
    InvalidVerdict(String),
}
