//! Persistence collaborator

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use yarnscope_core::domain::AnalysisResult;

/// Service trait for the analysis-result store.
///
/// `exists` is consulted once per application id, on the cold-start poll
/// cycle only, to avoid re-analyzing jobs across a process restart.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Whether a result for `app_id` has already been persisted.
    async fn exists(&self, app_id: &str) -> anyhow::Result<bool>;

    /// Persists one analysis result.
    async fn save(&self, result: &AnalysisResult) -> anyhow::Result<()>;
}

/// In-memory [`ResultStore`], used by tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    results: Mutex<HashMap<String, AnalysisResult>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a persisted result by application id.
    #[allow(dead_code)]
    pub fn get(&self, app_id: &str) -> Option<AnalysisResult> {
        self.results
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(app_id)
            .cloned()
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn exists(&self, app_id: &str) -> anyhow::Result<bool> {
        Ok(self
            .results
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(app_id))
    }

    async fn save(&self, result: &AnalysisResult) -> anyhow::Result<()> {
        self.results
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(result.app_id.clone(), result.clone());
        Ok(())
    }
}
