//! Yarnscope ResourceManager Client
//!
//! A typed HTTP client for the YARN ResourceManager REST API (`/ws/v1`).
//!
//! The client is endpoint-agnostic: the daemon re-resolves the active
//! ResourceManager address every cycle (HA failover), so every call takes the
//! address explicitly instead of binding one at construction time. All calls
//! attach the current [`AuthToken`] as a `hadoop.auth` cookie.
//!
//! # Example
//!
//! ```no_run
//! use yarnscope_client::{AuthToken, ResourceManagerClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), yarnscope_client::ClientError> {
//!     let client = ResourceManagerClient::new();
//!     let token = AuthToken::new("t-1", 0);
//!
//!     let info = client.cluster_info("rm1.example.com:8088", &token).await?;
//!     println!("haState = {}", info.ha_state);
//!     Ok(())
//! }
//! ```

mod apps;
mod auth;
mod cluster;
pub mod error;

// Re-export commonly used types
pub use apps::{AppRecord, AppsQuery};
pub use auth::AuthToken;
pub use cluster::ClusterInfo;
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the ResourceManager REST API
///
/// Provides the two calls the polling core needs:
/// - Cluster status probe (`GET /ws/v1/cluster/info`) for HA resolution
/// - Application listing (`GET /ws/v1/cluster/apps`) for window polling
#[derive(Debug, Clone)]
pub struct ResourceManagerClient {
    /// HTTP client instance
    client: Client,
}

impl Default for ResourceManagerClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceManagerClient {
    /// Create a new ResourceManager client
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Create a new ResourceManager client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Issue an authenticated GET against `http://{address}{path}`.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        address: &str,
        path: &str,
        query: &[(&str, String)],
        token: &AuthToken,
    ) -> Result<T> {
        let url = format!("http://{}{}", address.trim_end_matches('/'), path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .header(reqwest::header::COOKIE, token.cookie())
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle an API response and deserialize JSON
    ///
    /// Checks the status code and returns an appropriate error if the request
    /// failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}
