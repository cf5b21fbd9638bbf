//! Job source
//!
//! Discovers completed applications from the active ResourceManager through a
//! trailing time window. The watermark only advances after a fully successful
//! cycle, so a failed or partially failed poll re-offers the same window next
//! cycle and no window is ever skipped.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};
use yarnscope_client::{AppRecord, AppsQuery, AuthToken, ClientError, ResourceManagerClient};
use yarnscope_core::domain::{AnalyticJob, ApplicationType, PollWindow};

use crate::service::ResultStore;

/// A poll cycle failure. The whole cycle is abandoned; partial results are
/// never committed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("ResourceManager query failed: {0}")]
    Http(#[from] ClientError),

    #[error("result store lookup failed: {0}")]
    Store(#[source] anyhow::Error),
}

/// Incremental source of completed applications.
pub struct JobSource {
    client: Arc<ResourceManagerClient>,
    store: Arc<dyn ResultStore>,
    lag_ms: i64,
    watermark: i64,
    /// False until the first successful cycle of this process lifetime.
    /// While unprimed, polled applications are deduplicated against the
    /// result store to avoid re-analysis across a restart.
    primed: bool,
}

impl JobSource {
    pub fn new(
        client: Arc<ResourceManagerClient>,
        store: Arc<dyn ResultStore>,
        lag: Duration,
    ) -> Self {
        Self {
            client,
            store,
            lag_ms: lag.as_millis() as i64,
            watermark: 0,
            primed: false,
        }
    }

    /// Opens the poll window for a cycle starting at `now_ms`.
    pub fn next_window(&self, now_ms: i64) -> PollWindow {
        PollWindow::trailing(self.watermark, now_ms, self.lag_ms)
    }

    /// Upper timestamp bound through which jobs have already been polled.
    #[allow(dead_code)]
    pub fn watermark(&self) -> i64 {
        self.watermark
    }

    /// Fetches all succeeded and failed applications that finished inside
    /// `window`, succeeded first.
    ///
    /// Any query or parse error aborts the whole cycle; the caller must not
    /// [`commit`](Self::commit) the window in that case.
    pub async fn poll_new_jobs(
        &self,
        endpoint: &str,
        token: &AuthToken,
        window: &PollWindow,
    ) -> Result<Vec<AnalyticJob>, FetchError> {
        if window.is_empty() {
            debug!("Poll window is empty, nothing to fetch");
            return Ok(Vec::new());
        }

        info!(
            "Fetching applications finished between {} and {}",
            window.query_begin(),
            window.query_end()
        );

        let succeeded = AppsQuery {
            final_status: "SUCCEEDED",
            state: None,
            finished_time_begin: window.query_begin(),
            finished_time_end: window.query_end(),
        };
        // finalStatus is reported by the application master; the additional
        // state filter keeps retries/attempts still in flight out of the
        // failed listing.
        let failed = AppsQuery {
            final_status: "FAILED",
            state: Some("FINISHED"),
            finished_time_begin: window.query_begin(),
            finished_time_end: window.query_end(),
        };

        let mut records = self.client.list_apps(endpoint, token, &succeeded).await?;
        records.extend(self.client.list_apps(endpoint, token, &failed).await?);

        self.to_jobs(records).await
    }

    /// Advances the watermark to the end of a fully polled window.
    ///
    /// The watermark never regresses; committing an empty window is a no-op
    /// apart from ending the cold-start phase.
    pub fn commit(&mut self, window: &PollWindow) {
        self.watermark = self.watermark.max(window.end);
        self.primed = true;
    }

    /// Converts raw records into analytic jobs: cold-start dedup against the
    /// result store, then analyzer-capability filtering.
    async fn to_jobs(&self, records: Vec<AppRecord>) -> Result<Vec<AnalyticJob>, FetchError> {
        let mut jobs = Vec::with_capacity(records.len());

        for record in records {
            if !self.primed && self.store.exists(&record.id).await.map_err(FetchError::Store)? {
                debug!("Skipping already-analyzed application {}", record.id);
                continue;
            }

            // Unsupported application types are excluded silently.
            let Some(app_type) = ApplicationType::from_name(&record.application_type) else {
                continue;
            };

            jobs.push(AnalyticJob {
                app_id: record.id,
                app_type,
                user: record.user,
                name: record.name,
                queue: record.queue,
                tracking_url: record.tracking_url,
                started_time: record.started_time,
                finished_time: record.finished_time,
                retries: 0,
            });
        }

        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::InMemoryResultStore;
    use yarnscope_core::domain::AnalysisResult;

    fn record(id: &str, app_type: &str) -> AppRecord {
        AppRecord {
            id: id.to_string(),
            user: "etl".to_string(),
            name: "nightly".to_string(),
            queue: "default".to_string(),
            tracking_url: None,
            started_time: 1_000,
            finished_time: 5_000,
            application_type: app_type.to_string(),
        }
    }

    fn source_with_store(store: Arc<InMemoryResultStore>) -> JobSource {
        JobSource::new(
            Arc::new(ResourceManagerClient::new()),
            store,
            Duration::from_secs(300),
        )
    }

    #[tokio::test]
    async fn test_cold_start_dedup_skips_persisted_apps() {
        let store = Arc::new(InMemoryResultStore::new());
        store
            .save(&AnalysisResult {
                app_id: "app-1".to_string(),
                resource_used: 1,
                resource_wasted: 0,
                total_delay: 0,
            })
            .await
            .unwrap();

        let source = source_with_store(Arc::clone(&store));
        let jobs = source
            .to_jobs(vec![record("app-1", "SPARK"), record("app-2", "SPARK")])
            .await
            .unwrap();

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].app_id, "app-2");
    }

    #[tokio::test]
    async fn test_dedup_is_skipped_after_first_successful_cycle() {
        let store = Arc::new(InMemoryResultStore::new());
        store
            .save(&AnalysisResult {
                app_id: "app-1".to_string(),
                resource_used: 1,
                resource_wasted: 0,
                total_delay: 0,
            })
            .await
            .unwrap();

        let mut source = source_with_store(Arc::clone(&store));
        source.commit(&PollWindow::trailing(0, 305_000, 300_000));

        // After the cold-start cycle the watermark alone prevents
        // re-offering; the store is no longer consulted.
        let jobs = source.to_jobs(vec![record("app-1", "SPARK")]).await.unwrap();
        assert_eq!(jobs.len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_application_types_are_dropped_silently() {
        let source = source_with_store(Arc::new(InMemoryResultStore::new()));
        let jobs = source
            .to_jobs(vec![record("app-1", "FLINK"), record("app-2", "MAPREDUCE")])
            .await
            .unwrap();

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].app_type, ApplicationType::MapReduce);
        assert_eq!(jobs[0].retries, 0);
    }

    #[tokio::test]
    async fn test_watermark_advances_only_on_commit_and_never_regresses() {
        let mut source = source_with_store(Arc::new(InMemoryResultStore::new()));
        assert_eq!(source.watermark(), 0);

        let window = source.next_window(305_000);
        assert_eq!(window.begin, 0);
        assert_eq!(window.end, 5_000);

        // A failed cycle does not commit: the same window is re-offered.
        let retried = source.next_window(305_000);
        assert_eq!(retried, window);

        source.commit(&window);
        assert_eq!(source.watermark(), 5_000);

        // The next window starts exactly where the last one ended.
        let next = source.next_window(310_000);
        assert_eq!(next.query_begin(), window.query_end() + 1);

        // Committing an older (empty) window never regresses the watermark.
        source.commit(&PollWindow::trailing(5_000, 304_000, 300_000));
        assert_eq!(source.watermark(), 5_000);
    }

    #[tokio::test]
    async fn test_empty_window_polls_nothing() {
        let mut source = source_with_store(Arc::new(InMemoryResultStore::new()));
        source.commit(&PollWindow::trailing(0, 310_000, 300_000));

        let window = source.next_window(305_000);
        assert!(window.is_empty());
        let jobs = source
            .poll_new_jobs("rm:8088", &AuthToken::new("t", 0), &window)
            .await
            .unwrap();
        assert!(jobs.is_empty());
    }
}
