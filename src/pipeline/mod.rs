pub mod error;
pub mod structuring; // Inference capability client
pub mod acquisition; // Trial registry pagination
pub mod cohort; // FHIR bundle ingestion
pub mod gateway; // Patient / trial feature extraction
pub mod matching; // Patient × trial cross product
pub mod report; // Eligibility report + output artifacts
pub mod runner;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{PipelineError, SourceFetchError};
