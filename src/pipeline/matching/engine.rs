use std::collections::HashSet;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};

use crate::models::{MatchVerdict, PatientRecord, TrialRecord};
use crate::pipeline::structuring::{parse_json_object, InferenceRequest, LlmClient};

use super::matrix::{CellOutcome, MatchCell, MatchMatrix};
use super::prompt::{build_match_prompt, MATCH_SYSTEM_PROMPT};
use super::MatchError;

const DEFAULT_CONCURRENCY: usize = 4;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Classifies every (patient, trial) pair against the inference capability.
pub struct MatchingEngine<'a> {
    llm: &'a dyn LlmClient,
    concurrency: usize,
    timeout: Duration,
}

impl<'a> MatchingEngine<'a> {
    pub fn new(llm: &'a dyn LlmClient) -> Self {
        Self {
            llm,
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Requests in flight at once. Clamped to at least 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Upper bound for a single classification call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the full matrix. Never fails: a cell whose classification fails
    /// is recorded as [`CellOutcome::Unknown`].
    ///
    /// Cells are evaluated with bounded concurrency but folded into the
    /// matrix in cross-product order (patients, then trials).
    pub async fn match_all(&self, patients: &[PatientRecord], trials: &[TrialRecord]) -> MatchMatrix {
        let patients = first_by_id(patients, |p: &PatientRecord| p.patient_id.as_str(), "patient");
        let trials = first_by_id(trials, |t: &TrialRecord| t.trial_id.as_str(), "trial");

        tracing::info!(
            patients = patients.len(),
            trials = trials.len(),
            cells = patients.len() * trials.len(),
            concurrency = self.concurrency,
            "Matching started"
        );

        let seeded = MatchMatrix::seeded(patients.iter().map(|p| (p.patient_id.clone(), p.name.clone())));
        let pairs: Vec<(&PatientRecord, &TrialRecord)> = patients
            .iter()
            .flat_map(|p| trials.iter().map(move |t| (*p, *t)))
            .collect();

        let matrix = stream::iter(pairs)
            .map(|(patient, trial)| async move {
                let outcome = self.evaluate(patient, trial).await;
                (patient, trial, outcome)
            })
            .buffered(self.concurrency)
            .fold(seeded, |mut matrix, (patient, trial, outcome)| async move {
                matrix.record(
                    &patient.patient_id,
                    &patient.name,
                    &trial.trial_id,
                    MatchCell {
                        trial_name: trial.trial_name.clone(),
                        outcome,
                    },
                );
                matrix
            })
            .await;

        let summary = matrix.summary();
        tracing::info!(
            evaluated = summary.evaluated,
            matched = summary.matched,
            unknown = summary.unknown,
            "Matching finished"
        );

        matrix
    }

    async fn evaluate(&self, patient: &PatientRecord, trial: &TrialRecord) -> CellOutcome {
        match self.classify(patient, trial).await {
            Ok(verdict) => {
                tracing::debug!(
                    patient_id = %patient.patient_id,
                    trial_id = %trial.trial_id,
                    matched = verdict.matched,
                    "Cell evaluated"
                );
                CellOutcome::Evaluated { verdict }
            }
            Err(e) => {
                tracing::warn!(
                    patient_id = %patient.patient_id,
                    trial_id = %trial.trial_id,
                    error = %e,
                    "Match classification failed, cell marked unknown"
                );
                CellOutcome::Unknown { reason: e.to_string() }
            }
        }
    }

    async fn classify(&self, patient: &PatientRecord, trial: &TrialRecord) -> Result<MatchVerdict, MatchError> {
        let prompt = build_match_prompt(patient, trial)?;
        let request = InferenceRequest::json(MATCH_SYSTEM_PROMPT, prompt);

        let response = tokio::time::timeout(self.timeout, self.llm.complete(&request))
            .await
            .map_err(|_| MatchError::Timeout(self.timeout.as_secs()))??;

        let value = parse_json_object(&response).map_err(MatchError::JsonParsing)?;
        let verdict: MatchVerdict =
            serde_json::from_value(value).map_err(|e| MatchError::InvalidVerdict(e.to_string()))?;

        if !verdict.trial_id.is_empty() && verdict.trial_id != trial.trial_id {
            tracing::debug!(
                expected = %trial.trial_id,
                echoed = %verdict.trial_id,
                "Verdict echoes a different trial id, keeping the requested one"
            );
        }

        Ok(verdict)
    }
}

/// Keep the first record for each id, in input order.
fn first_by_id<'r, T>(records: &'r [T], id: impl Fn(&T) -> &str, kind: &'static str) -> Vec<&'r T> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|record| {
            let key = id(*record);
            let fresh = seen.insert(key.to_string());
            if !fresh {
                tracing::warn!(kind, id = key, "Duplicate record id, keeping first occurrence");
            }
            fresh
        })
        .collect()
}
