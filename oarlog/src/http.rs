//! HTTP client for the Concept2 logbook API.
//!
//! Pages through the results endpoint until exhausted, retrying transient
//! failures (connection errors, 429, 5xx) with exponential backoff up to a
//! fixed attempt ceiling. Rejected credentials (401/403) surface immediately
//! as [`SyncError::AuthExpired`] and are never retried here - token refresh
//! belongs to the auth layer.

use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::types::ResultsPage;
use ergstats::WorkoutRecord;

/// Base backoff delay; doubles per retry (500ms, 1s, 2s, ...).
const BACKOFF_BASE_MS: u64 = 500;

/// Anything that can produce workout records for the sync coordinator.
/// The production implementation is [`LogbookClient`]; tests substitute
/// canned sources.
pub trait RecordSource {
    fn fetch_records_since(
        &self,
        since: Option<NaiveDate>,
    ) -> impl Future<Output = Result<Vec<WorkoutRecord>>> + Send;
}

/// Client for the logbook results endpoint.
pub struct LogbookClient {
    client: Client,
    auth_header: String,
    config: SyncConfig,
}

impl LogbookClient {
    /// Create a client with a pre-formatted bearer auth header
    /// (e.g. "Bearer eyJ..."), as issued by the auth layer.
    pub fn new(auth_header: String, config: SyncConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .tcp_keepalive(Duration::from_secs(30))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SyncError::remote(format!("failed to create HTTP client: {}", e), None))?;

        Ok(Self {
            client,
            auth_header,
            config,
        })
    }

    /// Fetch one page of results, retrying transient failures.
    async fn fetch_page(&self, since: Option<NaiveDate>, page: u32) -> Result<ResultsPage> {
        let url = format!("{}/users/me/results", self.config.base_url);
        let accept = format!("application/vnd.c2logbook.{}+json", self.config.api_version);

        let mut retries = 0u32;
        loop {
            let mut request = self
                .client
                .get(&url)
                .header("Authorization", &self.auth_header)
                .header("Accept", &accept)
                .query(&[
                    ("page", page.to_string()),
                    ("number", self.config.page_size.to_string()),
                    ("type", self.config.workout_type.clone()),
                ]);
            if let Some(from) = since {
                request = request.query(&[("from", from.format("%Y-%m-%d").to_string())]);
            }

            match request.send().await {
                Ok(resp) => {
                    let status = resp.status();

                    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                        warn!("[Fetch] Credentials rejected with HTTP {}", status);
                        return Err(SyncError::AuthExpired);
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                        retries += 1;
                        if retries > self.config.max_retries {
                            return Err(SyncError::remote(
                                format!("HTTP {} after {} retries", status, self.config.max_retries),
                                Some(status.as_u16()),
                            ));
                        }
                        let wait = backoff(retries);
                        warn!(
                            "[Fetch] HTTP {} on page {}, retry {} after {:?}",
                            status, page, retries, wait
                        );
                        tokio::time::sleep(wait).await;
                        continue;
                    }

                    if !status.is_success() {
                        return Err(SyncError::remote(
                            format!("HTTP {}", status),
                            Some(status.as_u16()),
                        ));
                    }

                    return resp.json::<ResultsPage>().await.map_err(|e| {
                        SyncError::remote(format!("invalid response body: {}", e), None)
                    });
                }
                Err(e) => {
                    retries += 1;
                    if retries > self.config.max_retries {
                        return Err(SyncError::remote(
                            format!("request failed after {} retries: {}", self.config.max_retries, e),
                            None,
                        ));
                    }
                    let wait = backoff(retries);
                    warn!(
                        "[Fetch] Request error on page {}: {}, retry {} after {:?}",
                        page, e, retries, wait
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

impl RecordSource for LogbookClient {
    /// Fetch all workout records, optionally limited to dates on or after
    /// `since`, walking the pagination cursor until the last page.
    async fn fetch_records_since(&self, since: Option<NaiveDate>) -> Result<Vec<WorkoutRecord>> {
        let mut records = Vec::new();
        let mut page = 1u32;

        loop {
            let results = self.fetch_page(since, page).await?;
            let total_pages = results
                .meta
                .as_ref()
                .map(|m| m.pagination.total_pages)
                .unwrap_or(page);
            let page_count = results.data.len();

            records.extend(results.data.into_iter().filter_map(|r| r.into_record()));

            debug!(
                "[Fetch] Page {}/{}: {} results ({} total so far)",
                page,
                total_pages,
                page_count,
                records.len()
            );

            // Cursors strictly advance; the meta block names the last page
            if page >= total_pages {
                break;
            }
            page += 1;
        }

        info!(
            "[Fetch] Retrieved {} records (since {:?})",
            records.len(),
            since
        );
        Ok(records)
    }
}

fn backoff(retry: u32) -> Duration {
    Duration::from_millis(BACKOFF_BASE_MS * (1 << retry.min(4)))
}
