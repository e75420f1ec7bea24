//! Trial Acquirer: bounded, cursor-driven pagination over the trial registry.
//!
//! The request budget is a cost cap, not a completeness guarantee: a run
//! only ever sees the first pages the registry hands out.

pub mod acquirer;
pub mod clinical_trials;

pub use acquirer::{acquire_trials, AcquisitionOutcome};
pub use clinical_trials::ClinicalTrialsGovClient;

use async_trait::async_trait;

use crate::models::RawTrialPage;
use super::SourceFetchError;

/// A paginated, read-only source of trial records.
#[async_trait]
pub trait TrialSource: Send + Sync {
    /// Fetch one page. `cursor` is the previous page's continuation token,
    /// `None` for the first page.
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<RawTrialPage, SourceFetchError>;
}
