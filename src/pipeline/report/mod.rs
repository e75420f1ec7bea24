//! Report Assembler: projections of the finished match matrix.

pub mod assembler;
pub mod artifacts;

pub use artifacts::{write_artifacts, ArtifactKind, ArtifactReport};
pub use assembler::{assemble, EligibilityReport, EligibleTrial, PatientEligibility};

use thiserror::Error;

/// One artifact could not be produced.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Cannot serialize artifact: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Cannot write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Cannot write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
