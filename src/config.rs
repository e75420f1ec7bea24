//! Run configuration.
//!
//! Every knob has a default tuned for one batch run against the public
//! registry; `TRIALMATCH_*` environment variables override them. Invalid
//! values fall back to the default with a warning rather than failing the run.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

/// Application-level constants
pub const APP_NAME: &str = "trialmatch";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Registry page requests per run, successful or not.
pub const DEFAULT_MAX_PAGE_REQUESTS: u32 = 11;
/// Bundles sent to patient extraction; bounded by the model's input size.
pub const DEFAULT_PATIENT_LIMIT: usize = 11;
/// Trial accumulation stops after the page that pushes the count above this.
pub const DEFAULT_TRIAL_STUDY_THRESHOLD: usize = 1;

const ENV_PREFIX: &str = "TRIALMATCH_";

/// Debug builds log this crate at debug level.
pub fn is_dev() -> bool {
    cfg!(debug_assertions)
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if is_dev() {
        "info,trialmatch_lib=debug"
    } else {
        "info"
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    // Trial registry
    pub registry_base_url: String,
    pub status_filter: String,
    pub page_size: u32,
    pub max_page_requests: u32,
    pub source_timeout_secs: u64,

    // Cohort
    pub cohort_dir: PathBuf,
    pub patient_limit: usize,

    // Trial extraction
    pub trial_page_cap: usize,
    pub trial_study_threshold: usize,

    // Inference capability
    pub inference_base_url: String,
    pub model_name: String,
    #[serde(skip)]
    pub api_key: Option<String>,
    pub inference_timeout_secs: u64,

    // Matching
    pub match_concurrency: usize,

    // Output
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            registry_base_url: "https://clinicaltrials.gov/api/v2".into(),
            status_filter: "RECRUITING".into(),
            page_size: 30,
            max_page_requests: DEFAULT_MAX_PAGE_REQUESTS,
            source_timeout_secs: 30,
            cohort_dir: PathBuf::from("./dataset/synthea_sample_data_fhir_latest"),
            patient_limit: DEFAULT_PATIENT_LIMIT,
            trial_page_cap: DEFAULT_MAX_PAGE_REQUESTS as usize,
            trial_study_threshold: DEFAULT_TRIAL_STUDY_THRESHOLD,
            inference_base_url: "https://api.openai.com/v1".into(),
            model_name: "gpt-3.5-turbo".into(),
            api_key: None,
            inference_timeout_secs: 120,
            match_concurrency: 4,
            output_dir: PathBuf::from("."),
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup(name)`, where `name` is the full
    /// variable name (e.g. `TRIALMATCH_PAGE_SIZE`).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |suffix: &str| {
            lookup(&format!("{ENV_PREFIX}{suffix}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("API_KEY").or_else(|| {
            lookup("OPENAI_API_KEY")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        });

        Self {
            registry_base_url: get("REGISTRY_URL").unwrap_or(defaults.registry_base_url),
            status_filter: get("STATUS_FILTER").unwrap_or(defaults.status_filter),
            page_size: parse_or("PAGE_SIZE", get("PAGE_SIZE"), defaults.page_size),
            max_page_requests: parse_or(
                "MAX_PAGE_REQUESTS",
                get("MAX_PAGE_REQUESTS"),
                defaults.max_page_requests,
            )
            .max(1),
            source_timeout_secs: parse_or(
                "SOURCE_TIMEOUT_SECS",
                get("SOURCE_TIMEOUT_SECS"),
                defaults.source_timeout_secs,
            ),
            cohort_dir: get("COHORT_DIR").map(PathBuf::from).unwrap_or(defaults.cohort_dir),
            patient_limit: parse_or("PATIENT_LIMIT", get("PATIENT_LIMIT"), defaults.patient_limit),
            trial_page_cap: parse_or("TRIAL_PAGE_CAP", get("TRIAL_PAGE_CAP"), defaults.trial_page_cap),
            trial_study_threshold: parse_or(
                "TRIAL_STUDY_THRESHOLD",
                get("TRIAL_STUDY_THRESHOLD"),
                defaults.trial_study_threshold,
            ),
            inference_base_url: get("INFERENCE_URL").unwrap_or(defaults.inference_base_url),
            model_name: get("MODEL").unwrap_or(defaults.model_name),
            api_key,
            inference_timeout_secs: parse_or(
                "INFERENCE_TIMEOUT_SECS",
                get("INFERENCE_TIMEOUT_SECS"),
                defaults.inference_timeout_secs,
            ),
            match_concurrency: parse_or(
                "MATCH_CONCURRENCY",
                get("MATCH_CONCURRENCY"),
                defaults.match_concurrency,
            )
            .max(1),
            output_dir: get("OUTPUT_DIR").map(PathBuf::from).unwrap_or(defaults.output_dir),
        }
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(suffix: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(
                variable = %format!("{ENV_PREFIX}{suffix}"),
                value = %raw,
                default = %default,
                "Invalid configuration value, using default"
            );
            default
        }),
    }
}
