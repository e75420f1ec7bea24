//! Cohort Ingestor: one raw patient bundle per FHIR document in a directory.

pub mod ingestor;

pub use ingestor::{bundle_from_document, ingest_cohort};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CohortError {
    #[error("Cannot list cohort directory {path}: {source}")]
    ReadDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cohort file {file} is not valid JSON: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },
}
