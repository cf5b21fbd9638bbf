//! Application listing endpoint

use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::{AuthToken, ResourceManagerClient};

/// Query parameters for `GET /ws/v1/cluster/apps`.
///
/// Time bounds are inclusive millisecond epoch values on the application's
/// finish time.
#[derive(Debug, Clone)]
pub struct AppsQuery {
    /// `finalStatus` filter, e.g. `SUCCEEDED` or `FAILED`.
    pub final_status: &'static str,
    /// Optional `state` filter, e.g. `FINISHED`.
    pub state: Option<&'static str>,
    /// Inclusive `finishedTimeBegin` bound.
    pub finished_time_begin: i64,
    /// Inclusive `finishedTimeEnd` bound.
    pub finished_time_end: i64,
}

impl AppsQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("finalStatus", self.final_status.to_string())];
        if let Some(state) = self.state {
            params.push(("state", state.to_string()));
        }
        params.push(("finishedTimeBegin", self.finished_time_begin.to_string()));
        params.push(("finishedTimeEnd", self.finished_time_end.to_string()));
        params
    }
}

/// One raw application record from the ResourceManager.
///
/// A missing `trackingUrl` is tolerated (the history UI may be disabled);
/// every other field is required and a record missing one fails the whole
/// response parse.
#[derive(Debug, Clone, Deserialize)]
pub struct AppRecord {
    pub id: String,
    pub user: String,
    pub name: String,
    pub queue: String,
    #[serde(rename = "trackingUrl", default)]
    pub tracking_url: Option<String>,
    #[serde(rename = "startedTime")]
    pub started_time: i64,
    #[serde(rename = "finishedTime")]
    pub finished_time: i64,
    #[serde(rename = "applicationType")]
    pub application_type: String,
}

/// Response envelope: `{"apps": {"app": [...]}}`.
///
/// The ResourceManager serializes an empty result as `"apps": null`, so both
/// levels are optional.
#[derive(Debug, Deserialize)]
struct AppsResponse {
    #[serde(default)]
    apps: Option<Apps>,
}

#[derive(Debug, Deserialize)]
struct Apps {
    #[serde(default)]
    app: Vec<AppRecord>,
}

impl ResourceManagerClient {
    /// List applications matching `query` on the active ResourceManager
    ///
    /// # Arguments
    /// * `address` - ResourceManager webapp address (`host:port`)
    /// * `token` - Current authentication credential
    /// * `query` - Final-status/state filter and finish-time window
    ///
    /// # Returns
    /// The raw application records, possibly empty.
    pub async fn list_apps(
        &self,
        address: &str,
        token: &AuthToken,
        query: &AppsQuery,
    ) -> Result<Vec<AppRecord>> {
        debug!(
            "Listing {} apps on {} finished in ({}, {}]",
            query.final_status,
            address,
            query.finished_time_begin - 1,
            query.finished_time_end
        );

        let response: AppsResponse = self
            .get_json(address, "/ws/v1/cluster/apps", &query.params(), token)
            .await?;

        Ok(response.apps.map(|apps| apps.app).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_app_records() {
        let body = r#"{
            "apps": {
                "app": [
                    {
                        "id": "application_1700000000000_0001",
                        "user": "etl",
                        "name": "daily-aggregate",
                        "queue": "default",
                        "trackingUrl": "http://rm1:8088/proxy/application_1700000000000_0001/",
                        "startedTime": 1000,
                        "finishedTime": 5000,
                        "applicationType": "MAPREDUCE",
                        "finalStatus": "SUCCEEDED"
                    },
                    {
                        "id": "application_1700000000000_0002",
                        "user": "ds",
                        "name": "model-train",
                        "queue": "research",
                        "startedTime": 2000,
                        "finishedTime": 4000,
                        "applicationType": "SPARK"
                    }
                ]
            }
        }"#;
        let parsed: AppsResponse = serde_json::from_str(body).unwrap();
        let records = parsed.apps.unwrap().app;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "application_1700000000000_0001");
        assert!(records[0].tracking_url.is_some());
        // Missing trackingUrl is absent, not an error.
        assert!(records[1].tracking_url.is_none());
        assert_eq!(records[1].application_type, "SPARK");
    }

    #[test]
    fn test_parse_null_apps_as_empty() {
        let parsed: AppsResponse = serde_json::from_str(r#"{"apps": null}"#).unwrap();
        assert!(parsed.apps.is_none());
        let parsed: AppsResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(parsed.apps.is_none());
    }

    #[test]
    fn test_query_params_include_state_only_when_set() {
        let query = AppsQuery {
            final_status: "FAILED",
            state: Some("FINISHED"),
            finished_time_begin: 1_001,
            finished_time_end: 5_000,
        };
        let params = query.params();
        assert!(params.contains(&("state", "FINISHED".to_string())));
        assert!(params.contains(&("finishedTimeBegin", "1001".to_string())));

        let query = AppsQuery {
            final_status: "SUCCEEDED",
            state: None,
            finished_time_begin: 1_001,
            finished_time_end: 5_000,
        };
        assert!(!query.params().iter().any(|(k, _)| *k == "state"));
    }
}
