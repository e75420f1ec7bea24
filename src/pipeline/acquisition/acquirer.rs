use crate::models::RawTrialPage;

use super::TrialSource;

/// Pages collected by one acquisition run, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct AcquisitionOutcome {
    pub pages: Vec<RawTrialPage>,
    pub requests_made: u32,
    pub failed_requests: u32,
}

impl AcquisitionOutcome {
    pub fn study_count(&self) -> usize {
        self.pages.iter().map(|p| p.studies.len()).sum()
    }
}

/// Fetch up to `max_requests` pages, following the continuation cursor.
///
/// Stops early when a page carries no cursor. A failed request is logged and
/// still consumes one slot of the budget; the cursor is not advanced, so the
/// next slot asks for the same page again. No retry, no backoff.
pub async fn acquire_trials(source: &dyn TrialSource, max_requests: u32) -> AcquisitionOutcome {
    let mut outcome = AcquisitionOutcome::default();
    let mut cursor: Option<String> = None;

    while outcome.requests_made < max_requests {
        outcome.requests_made += 1;
        let request = outcome.requests_made;

        match source.fetch_page(cursor.as_deref()).await {
            Ok(page) => {
                let next = page.cursor().map(str::to_string);
                tracing::debug!(
                    request,
                    studies = page.studies.len(),
                    has_next = next.is_some(),
                    "Trial page fetched"
                );
                outcome.pages.push(page);

                match next {
                    Some(token) => cursor = Some(token),
                    None => {
                        tracing::info!(request, "Trial registry exhausted before request cap");
                        break;
                    }
                }
            }
            Err(e) => {
                outcome.failed_requests += 1;
                tracing::warn!(
                    request,
                    cursor = cursor.as_deref().unwrap_or("<first page>"),
                    error = %e,
                    "Failed to fetch trial page, slot consumed"
                );
            }
        }
    }

    tracing::info!(
        pages = outcome.pages.len(),
        studies = outcome.study_count(),
        requests = outcome.requests_made,
        failed = outcome.failed_requests,
        "Trial acquisition finished"
    );

    outcome
}
