pub mod config;
pub mod models;
pub mod pipeline;

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use config::PipelineConfig;
use pipeline::acquisition::ClinicalTrialsGovClient;
use pipeline::runner::{run_pipeline, RunSummary};
use pipeline::structuring::OpenAiClient;
use pipeline::PipelineError;

/// Binary entry point: one batch run from environment configuration.
pub async fn run() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = PipelineConfig::from_env();
    match run_with(&config).await {
        Ok(summary) => {
            for artifact in &summary.artifacts {
                if let Err(e) = &artifact.result {
                    tracing::error!(
                        artifact = artifact.kind.file_name(),
                        path = %artifact.path.display(),
                        error = %e,
                        "Output artifact missing"
                    );
                }
            }
            if summary.all_artifacts_written() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Run aborted");
            ExitCode::FAILURE
        }
    }
}

async fn run_with(config: &PipelineConfig) -> Result<RunSummary, PipelineError> {
    tracing::debug!(
        config = %serde_json::to_string(config).unwrap_or_default(),
        "Run configuration"
    );
    if config.api_key.is_none() {
        tracing::warn!(url = %config.inference_base_url, "No API key configured, sending unauthenticated requests");
    }

    let source = ClinicalTrialsGovClient::from_config(config)?;
    let llm = OpenAiClient::new(
        &config.inference_base_url,
        config.api_key.clone(),
        &config.model_name,
        config.inference_timeout_secs,
    )?;

    run_pipeline(config, &source, &llm).await
}
