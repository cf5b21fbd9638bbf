//! Cluster status endpoint

use serde::Deserialize;

use crate::error::Result;
use crate::{AuthToken, ResourceManagerClient};

/// Status of one ResourceManager, from `GET /ws/v1/cluster/info`.
///
/// Only the high-availability state is consulted; an HA candidate reporting
/// the literal value `ACTIVE` is the live ResourceManager.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterInfo {
    /// High-availability state, e.g. `ACTIVE` or `STANDBY`.
    #[serde(rename = "haState", default)]
    pub ha_state: String,
}

/// Response envelope: `{"clusterInfo": {...}}`
#[derive(Debug, Deserialize)]
struct ClusterInfoResponse {
    #[serde(rename = "clusterInfo")]
    cluster_info: ClusterInfo,
}

impl ResourceManagerClient {
    /// Query the cluster status of one ResourceManager candidate
    ///
    /// # Arguments
    /// * `address` - ResourceManager webapp address (`host:port`)
    /// * `token` - Current authentication credential
    pub async fn cluster_info(&self, address: &str, token: &AuthToken) -> Result<ClusterInfo> {
        let response: ClusterInfoResponse = self
            .get_json(address, "/ws/v1/cluster/info", &[], token)
            .await?;
        Ok(response.cluster_info)
    }
}
