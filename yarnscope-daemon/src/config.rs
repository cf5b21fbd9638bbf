//! Daemon configuration
//!
//! Defines all configurable parameters for the dispatch daemon including
//! polling cadence, worker-pool sizing, and ResourceManager addressing.

use std::time::Duration;

use crate::resolver::HaCandidate;

/// Daemon configuration
///
/// All intervals are configurable to allow tuning for different cluster
/// sizes (small clusters publish job history slower, large clusters need a
/// bigger worker pool).
#[derive(Debug, Clone)]
pub struct Config {
    /// Fixed ResourceManager webapp address (`host:port`), used when HA is
    /// disabled
    pub resource_manager_address: Option<String>,

    /// Whether ResourceManager high availability is enabled
    pub ha_enabled: bool,

    /// Ordered HA candidates, probed in order until one reports ACTIVE
    pub ha_candidates: Vec<HaCandidate>,

    /// Optional distro-specific shell command whose output is the
    /// ResourceManager address (bypasses HA probing)
    pub discovery_command: Option<String>,

    /// Cadence of the poll/dispatch cycle
    pub fetch_interval: Duration,

    /// Pacing applied after a transient cycle failure before retrying
    pub retry_interval: Duration,

    /// Size of the analysis worker pool (minimum 1)
    pub worker_count: usize,

    /// Trailing lag subtracted from "now" when closing a poll window,
    /// compensating for job-history publication delay
    pub fetch_lag: Duration,

    /// Base interval between credential renewals (jitter is added on top)
    pub token_renewal_base: Duration,

    /// Transient failures tolerated per job before it is dropped
    pub max_job_retries: u32,
}

impl Config {
    /// Creates a new configuration with defaults for everything but the
    /// ResourceManager address
    pub fn new(resource_manager_address: String) -> Self {
        Self {
            resource_manager_address: Some(resource_manager_address),
            ha_enabled: false,
            ha_candidates: Vec::new(),
            discovery_command: None,
            fetch_interval: Duration::from_secs(60),
            retry_interval: Duration::from_secs(60),
            worker_count: 5,
            fetch_lag: Duration::from_secs(300),
            token_renewal_base: Duration::from_secs(30 * 60),
            max_job_retries: 3,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - RESOURCE_MANAGER_ADDRESS (required unless HA or discovery is used)
    /// - RM_HA_ENABLED (optional, "true"/"false", default: false)
    /// - RM_HA_IDS (required when HA is enabled, e.g. "rm1=host1:8088,rm2=host2:8088")
    /// - DISCOVERY_COMMAND (optional shell command printing the address)
    /// - FETCH_INTERVAL (optional, seconds, default: 60)
    /// - RETRY_INTERVAL (optional, seconds, default: 60)
    /// - WORKER_COUNT (optional, default: 5)
    /// - FETCH_LAG_MS (optional, milliseconds, default: 300000)
    /// - TOKEN_RENEWAL_BASE_SECS (optional, seconds, default: 1800)
    /// - MAX_JOB_RETRIES (optional, default: 3)
    pub fn from_env() -> anyhow::Result<Self> {
        let resource_manager_address = std::env::var("RESOURCE_MANAGER_ADDRESS").ok();

        let ha_enabled = std::env::var("RM_HA_ENABLED")
            .ok()
            .and_then(|s| s.parse::<bool>().ok())
            .unwrap_or(false);

        let ha_candidates = match std::env::var("RM_HA_IDS") {
            Ok(raw) => parse_ha_candidates(&raw)?,
            Err(_) => Vec::new(),
        };

        let discovery_command = std::env::var("DISCOVERY_COMMAND").ok();

        let fetch_interval = std::env::var("FETCH_INTERVAL")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60));

        let retry_interval = std::env::var("RETRY_INTERVAL")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60));

        let worker_count = std::env::var("WORKER_COUNT")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(5);

        let fetch_lag = std::env::var("FETCH_LAG_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_secs(300));

        let token_renewal_base = std::env::var("TOKEN_RENEWAL_BASE_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30 * 60));

        let max_job_retries = std::env::var("MAX_JOB_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(3);

        Ok(Self {
            resource_manager_address,
            ha_enabled,
            ha_candidates,
            discovery_command,
            fetch_interval,
            retry_interval,
            worker_count,
            fetch_lag,
            token_renewal_base,
            max_job_retries,
        })
    }

    /// Validates the configuration
    ///
    /// A worker pool below 1 or a missing endpoint configuration is an
    /// unrecoverable startup error.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.worker_count < 1 {
            anyhow::bail!("worker_count must be at least 1");
        }

        if self.fetch_interval.is_zero() {
            anyhow::bail!("fetch_interval must be greater than 0");
        }

        if self.retry_interval.is_zero() {
            anyhow::bail!("retry_interval must be greater than 0");
        }

        if self.token_renewal_base.is_zero() {
            anyhow::bail!("token_renewal_base must be greater than 0");
        }

        if self.ha_enabled {
            if self.ha_candidates.is_empty() {
                anyhow::bail!("HA is enabled but no HA candidates are configured");
            }
        } else if self.discovery_command.is_none()
            && self
                .resource_manager_address
                .as_deref()
                .unwrap_or("")
                .is_empty()
        {
            anyhow::bail!(
                "no ResourceManager address configured (set RESOURCE_MANAGER_ADDRESS, \
                 enable HA, or configure a discovery command)"
            );
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("localhost:8088".to_string())
    }
}

/// Parses "id=host:port,id=host:port" into ordered HA candidates.
fn parse_ha_candidates(raw: &str) -> anyhow::Result<Vec<HaCandidate>> {
    let mut candidates = Vec::new();
    for entry in raw.split(',').filter(|e| !e.trim().is_empty()) {
        let (id, address) = entry
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("malformed HA candidate entry: {entry:?}"))?;
        candidates.push(HaCandidate {
            id: id.trim().to_string(),
            address: address.trim().to_string(),
        });
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.fetch_interval, Duration::from_secs(60));
        assert_eq!(config.worker_count, 5);
        assert_eq!(config.fetch_lag, Duration::from_secs(300));
        assert_eq!(config.max_job_retries, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_workers_is_fatal() {
        let mut config = Config::default();
        config.worker_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_endpoint_configuration_is_fatal() {
        let mut config = Config::default();
        config.resource_manager_address = None;
        assert!(config.validate().is_err());

        // A discovery command stands in for a fixed address.
        config.discovery_command = Some("maprcli urls -name resourcemanager".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ha_requires_candidates() {
        let mut config = Config::default();
        config.ha_enabled = true;
        assert!(config.validate().is_err());

        config.ha_candidates = parse_ha_candidates("rm1=host1:8088,rm2=host2:8088").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_ha_candidates_preserves_order() {
        let candidates = parse_ha_candidates("rm1=host1:8088, rm2=host2:8088").unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].id, "rm1");
        assert_eq!(candidates[0].address, "host1:8088");
        assert_eq!(candidates[1].id, "rm2");
    }

    #[test]
    fn test_parse_ha_candidates_rejects_malformed_entries() {
        assert!(parse_ha_candidates("rm1").is_err());
    }
}
