use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::config::DEFAULT_TRIAL_STUDY_THRESHOLD;
use crate::models::{PatientRecord, RawPatientBundle, RawStudy, RawTrialPage, TrialRecord};
use crate::pipeline::structuring::{parse_array_lenient, parse_json_object, InferenceRequest, LlmClient};

use super::prompt::{
    build_patient_prompt, build_trial_prompt, PATIENTS_KEY, PATIENT_SYSTEM_PROMPT, TRIALS_KEY,
    TRIAL_SYSTEM_PROMPT,
};
use super::ExtractionError;

/// Packages raw records into bulk extraction requests and parses the answers.
pub struct ExtractionGateway<'a> {
    llm: &'a dyn LlmClient,
    reference_date: NaiveDate,
    trial_study_threshold: usize,
}

impl<'a> ExtractionGateway<'a> {
    /// `reference_date` is the "today" ages are computed against.
    pub fn new(llm: &'a dyn LlmClient, reference_date: NaiveDate) -> Self {
        Self {
            llm,
            reference_date,
            trial_study_threshold: DEFAULT_TRIAL_STUDY_THRESHOLD,
        }
    }

    pub fn with_trial_study_threshold(mut self, threshold: usize) -> Self {
        self.trial_study_threshold = threshold;
        self
    }

    /// Normalize the first `limit` bundles into patient records.
    pub async fn extract_patient_features(
        &self,
        bundles: &[RawPatientBundle],
        limit: usize,
    ) -> Result<Vec<PatientRecord>, ExtractionError> {
        let selected = &bundles[..bundles.len().min(limit)];
        if selected.is_empty() {
            tracing::info!("No patient bundles to extract");
            return Ok(Vec::new());
        }
        if selected.len() < bundles.len() {
            tracing::info!(
                selected = selected.len(),
                available = bundles.len(),
                "Patient extraction capped"
            );
        }

        let prompt = build_patient_prompt(selected, self.reference_date)?;
        let request = InferenceRequest::json(PATIENT_SYSTEM_PROMPT, prompt);
        let response = self.llm.complete(&request).await?;

        let (records, received) = parse_records::<PatientRecord>(&response, PATIENTS_KEY)?;
        let records: Vec<PatientRecord> = records
            .into_iter()
            .filter(|r| {
                let keep = !r.patient_id.is_empty();
                if !keep {
                    tracing::warn!(name = %r.name, "Dropping patient record without an id");
                }
                keep
            })
            .collect();
        ensure_some(&records, PATIENTS_KEY, received)?;

        if records.len() != selected.len() {
            tracing::warn!(
                sent = selected.len(),
                returned = records.len(),
                "Patient extraction returned a different record count"
            );
        }
        tracing::info!(patients = records.len(), model = self.llm.model_name(), "Patient features extracted");

        Ok(records)
    }

    /// Normalize the bounded study prefix of `pages` into trial records.
    pub async fn extract_trial_features(
        &self,
        pages: &[RawTrialPage],
        page_cap: usize,
    ) -> Result<Vec<TrialRecord>, ExtractionError> {
        let accumulated = accumulate_studies(pages, page_cap, self.trial_study_threshold);
        let studies: Vec<&RawStudy> = accumulated
            .into_iter()
            .filter(|s| {
                let keep = s.nct_id().is_some_and(|id| !id.is_empty());
                if !keep {
                    tracing::warn!(title = s.brief_title().unwrap_or_default(), "Skipping study without an NCT id");
                }
                keep
            })
            .collect();

        if studies.is_empty() {
            tracing::info!("No trial studies to extract");
            return Ok(Vec::new());
        }

        let prompt = build_trial_prompt(&studies);
        let request = InferenceRequest::json(TRIAL_SYSTEM_PROMPT, prompt);
        let response = self.llm.complete(&request).await?;

        let (records, received) = parse_records::<TrialRecord>(&response, TRIALS_KEY)?;
        let records: Vec<TrialRecord> = records
            .into_iter()
            .filter(|r| {
                let keep = !r.trial_id.is_empty();
                if !keep {
                    tracing::warn!(trial_name = %r.trial_name, "Dropping trial record without an id");
                }
                keep
            })
            .collect();
        ensure_some(&records, TRIALS_KEY, received)?;

        tracing::info!(
            studies = studies.len(),
            trials = records.len(),
            model = self.llm.model_name(),
            "Trial features extracted"
        );

        Ok(records)
    }
}

/// Studies from the first `page_cap` pages, stopping after the page that
/// brings the total above `threshold`.
///
/// With the default threshold of 1 this is the first non-trivial page, so
/// only a small prefix of the registry is ever matched.
pub fn accumulate_studies(pages: &[RawTrialPage], page_cap: usize, threshold: usize) -> Vec<&RawStudy> {
    let mut studies = Vec::new();
    for page in pages.iter().take(page_cap) {
        studies.extend(page.studies.iter());
        if studies.len() > threshold {
            break;
        }
    }
    studies
}

/// Parse `{key: [record, ...]}` out of a model answer. Records that do not
/// fit the schema are skipped, never filled in. Also returns how many
/// records the answer carried.
fn parse_records<T: for<'de> Deserialize<'de>>(
    response: &str,
    key: &'static str,
) -> Result<(Vec<T>, usize), ExtractionError> {
    let value = parse_json_object(response).map_err(ExtractionError::JsonParsing)?;

    let items = value
        .get(key)
        .and_then(Value::as_array)
        .ok_or(ExtractionError::MissingKey { key })?;

    let (records, skipped) = parse_array_lenient(items);
    if skipped > 0 {
        tracing::warn!(key, skipped, "Skipped malformed records in extraction response");
    }
    Ok((records, items.len()))
}

/// An answer that carried records but yielded none is a failed extraction,
/// not an empty corpus.
fn ensure_some<T>(records: &[T], key: &'static str, received: usize) -> Result<(), ExtractionError> {
    if records.is_empty() && received > 0 {
        return Err(ExtractionError::NoRecords { key, received });
    }
    Ok(())
}
