//! End-to-end batch run: acquire and ingest, extract, match, report.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::pipeline::acquisition::{acquire_trials, TrialSource};
use crate::pipeline::cohort::ingest_cohort;
use crate::pipeline::gateway::ExtractionGateway;
use crate::pipeline::matching::{MatchSummary, MatchingEngine};
use crate::pipeline::report::{assemble, write_artifacts, ArtifactReport};
use crate::pipeline::structuring::LlmClient;
use crate::pipeline::PipelineError;

/// What one run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub pages: usize,
    pub failed_page_requests: u32,
    pub bundles: usize,
    pub patients: usize,
    pub trials: usize,
    pub matches: MatchSummary,
    pub eligible: usize,
    pub artifacts: Vec<ArtifactReport>,
}

impl RunSummary {
    pub fn all_artifacts_written(&self) -> bool {
        self.artifacts.iter().all(ArtifactReport::is_written)
    }
}

/// Run the whole pipeline once.
///
/// Trial acquisition and cohort ingestion run concurrently, then patient and
/// trial extraction. Failed pages and failed cells are contained by their
/// stage; an unreadable cohort or a failed bulk extraction aborts the run.
pub async fn run_pipeline(
    config: &PipelineConfig,
    source: &dyn TrialSource,
    llm: &dyn LlmClient,
) -> Result<RunSummary, PipelineError> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    tracing::info!(
        %run_id,
        cohort_dir = %config.cohort_dir.display(),
        output_dir = %config.output_dir.display(),
        model = llm.model_name(),
        "Pipeline run started"
    );

    let (acquisition, bundles) = tokio::join!(
        acquire_trials(source, config.max_page_requests),
        ingest_cohort(&config.cohort_dir),
    );
    let bundles = bundles?;

    let gateway = ExtractionGateway::new(llm, started_at.date_naive())
        .with_trial_study_threshold(config.trial_study_threshold);
    let (patients, trials) = tokio::try_join!(
        gateway.extract_patient_features(&bundles, config.patient_limit),
        gateway.extract_trial_features(&acquisition.pages, config.trial_page_cap),
    )?;

    let matrix = MatchingEngine::new(llm)
        .with_concurrency(config.match_concurrency)
        .with_timeout(config.inference_timeout())
        .match_all(&patients, &trials)
        .await;

    let report = assemble(&matrix);
    let artifacts = write_artifacts(&config.output_dir, &matrix, &report).await;

    let summary = RunSummary {
        run_id,
        started_at,
        pages: acquisition.pages.len(),
        failed_page_requests: acquisition.failed_requests,
        bundles: bundles.len(),
        patients: patients.len(),
        trials: trials.len(),
        matches: matrix.summary(),
        eligible: report.eligible_count(),
        artifacts,
    };

    tracing::info!(
        %run_id,
        pages = summary.pages,
        patients = summary.patients,
        trials = summary.trials,
        unknown_cells = summary.matches.unknown,
        eligible = summary.eligible,
        all_artifacts_written = summary.all_artifacts_written(),
        elapsed_ms = (Utc::now() - started_at).num_milliseconds(),
        "Pipeline run finished"
    );

    Ok(summary)
}
