use std::time::Duration;

use async_trait::async_trait;

use crate::config::PipelineConfig;
use crate::models::RawTrialPage;
use crate::pipeline::SourceFetchError;

use super::TrialSource;

/// Field projection requested from the registry.
pub const STUDY_FIELDS: &str = "EligibilityCriteria|NCTId|BriefTitle";

/// HTTP client for the clinicaltrials.gov v2 `studies` endpoint.
pub struct ClinicalTrialsGovClient {
    base_url: String,
    status_filter: String,
    page_size: u32,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl ClinicalTrialsGovClient {
    pub fn new(
        base_url: &str,
        status_filter: &str,
        page_size: u32,
        timeout_secs: u64,
    ) -> Result<Self, SourceFetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SourceFetchError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            status_filter: status_filter.to_string(),
            page_size,
            client,
            timeout_secs,
        })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self, SourceFetchError> {
        Self::new(
            &config.registry_base_url,
            &config.status_filter,
            config.page_size,
            config.source_timeout_secs,
        )
    }

    fn studies_url(&self) -> String {
        format!("{}/studies", self.base_url)
    }

    /// Query parameters for one page request.
    fn query_params(&self, cursor: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("filter.overallStatus", self.status_filter.clone()),
            ("fields", STUDY_FIELDS.to_string()),
            ("countTotal", "true".to_string()),
            ("pageSize", self.page_size.to_string()),
        ];
        if let Some(token) = cursor {
            params.push(("pageToken", token.to_string()));
        }
        params
    }
}

#[async_trait]
impl TrialSource for ClinicalTrialsGovClient {
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<RawTrialPage, SourceFetchError> {
        let url = self.studies_url();

        let response = self
            .client
            .get(&url)
            .query(&self.query_params(cursor))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SourceFetchError::Timeout {
                        url: url.clone(),
                        secs: self.timeout_secs,
                    }
                } else {
                    SourceFetchError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceFetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // The client timeout also bounds the body read.
        response.json::<RawTrialPage>().await.map_err(|e| {
            if e.is_timeout() {
                SourceFetchError::Timeout {
                    url,
                    secs: self.timeout_secs,
                }
            } else {
                SourceFetchError::Decode(e.to_string())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_support::{closed_port_url, serve_once, serve_silence, serve_stalled_body};

    fn client() -> ClinicalTrialsGovClient {
        ClinicalTrialsGovClient::new("https://clinicaltrials.gov/api/v2/", "RECRUITING", 30, 30).unwrap()
    }

    #[test]
    fn trims_trailing_slash() {
        assert_eq!(client().studies_url(), "https://clinicaltrials.gov/api/v2/studies");
    }

    #[test]
    fn first_page_has_no_page_token() {
        let params = client().query_params(None);
        assert!(params.iter().all(|(k, _)| *k != "pageToken"));
        assert!(params.contains(&("filter.overallStatus", "RECRUITING".to_string())));
        assert!(params.contains(&("fields", STUDY_FIELDS.to_string())));
        assert!(params.contains(&("countTotal", "true".to_string())));
        assert!(params.contains(&("pageSize", "30".to_string())));
    }

    #[test]
    fn continuation_carries_page_token() {
        let params = client().query_params(Some("NF0g5JGBlPMuwQY"));
        assert_eq!(params.last(), Some(&("pageToken", "NF0g5JGBlPMuwQY".to_string())));
    }

    #[test]
    fn from_config_uses_configured_filter() {
        let config = PipelineConfig {
            status_filter: "NOT_YET_RECRUITING".into(),
            page_size: 10,
            ..PipelineConfig::default()
        };
        let client = ClinicalTrialsGovClient::from_config(&config).unwrap();
        let params = client.query_params(None);
        assert!(params.contains(&("filter.overallStatus", "NOT_YET_RECRUITING".to_string())));
        assert!(params.contains(&("pageSize", "10".to_string())));
    }

    fn local(base_url: &str, timeout_secs: u64) -> ClinicalTrialsGovClient {
        ClinicalTrialsGovClient::new(base_url, "RECRUITING", 30, timeout_secs).unwrap()
    }

    #[tokio::test]
    async fn fetches_and_decodes_page() {
        let body = r#"{"studies": [{"protocolSection": {
            "identificationModule": {"nctId": "NCT1", "briefTitle": "T1"},
            "eligibilityModule": {"eligibilityCriteria": "Adults"}}}],
            "nextPageToken": "abc", "totalCount": 7}"#;
        let base = serve_once("200 OK", "application/json", body).await;

        let page = local(&base, 5).fetch_page(None).await.unwrap();

        assert_eq!(page.studies.len(), 1);
        assert_eq!(page.studies[0].nct_id(), Some("NCT1"));
        assert_eq!(page.cursor(), Some("abc"));
        assert_eq!(page.total_count, Some(7));
    }

    #[tokio::test]
    async fn non_success_status_is_reported_with_body() {
        let base = serve_once("503 Service Unavailable", "text/plain", "maintenance").await;

        let result = local(&base, 5).fetch_page(Some("tok")).await;

        match result {
            Err(SourceFetchError::Status { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_body_is_a_decode_error() {
        let base = serve_once("200 OK", "text/html", "<html>nope</html>").await;

        let result = local(&base, 5).fetch_page(None).await;

        assert!(matches!(result, Err(SourceFetchError::Decode(_))));
    }

    #[tokio::test]
    async fn refused_connection_is_an_http_client_error() {
        let base = closed_port_url().await;

        let result = local(&base, 5).fetch_page(None).await;

        assert!(matches!(result, Err(SourceFetchError::HttpClient(_))));
    }

    #[tokio::test]
    async fn unanswered_request_times_out() {
        let base = serve_silence().await;

        let result = local(&base, 1).fetch_page(None).await;

        match result {
            Err(SourceFetchError::Timeout { url, secs }) => {
                assert_eq!(url, format!("{base}/studies"));
                assert_eq!(secs, 1);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stalled_body_times_out_instead_of_decode_error() {
        let base = serve_stalled_body(r#"{"studies": ["#).await;

        let result = local(&base, 1).fetch_page(None).await;

        assert!(matches!(result, Err(SourceFetchError::Timeout { secs: 1, .. })));
    }
}
