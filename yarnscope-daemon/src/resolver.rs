//! Cluster endpoint resolution
//!
//! Determines the currently active ResourceManager webapp address. Three
//! strategies, checked in order:
//! 1. A distro-specific discovery command (e.g. `maprcli`), when configured
//! 2. A single fixed address, when HA is disabled
//! 3. An ordered probe of HA candidates via `GET /ws/v1/cluster/info`,
//!    stopping at the first one reporting ACTIVE
//!
//! A total resolution failure is an unrecoverable configuration error, not a
//! transient condition.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};
use yarnscope_client::{AuthToken, ClientError, ResourceManagerClient};

/// HA state value identifying the live ResourceManager.
const HA_STATE_ACTIVE: &str = "ACTIVE";

/// One named ResourceManager address in an HA set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaCandidate {
    pub id: String,
    pub address: String,
}

/// Resolution failures. Both variants abort daemon startup.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no ResourceManager address configured")]
    NotConfigured,

    #[error("no ACTIVE ResourceManager found among {candidates} HA candidate(s)")]
    NoActiveEndpoint { candidates: usize },
}

/// Narrow adapter around shell invocation so resolver logic is testable
/// without spawning processes.
pub trait CommandRunner: Send + Sync {
    /// Runs `command` through the shell and returns its stdout.
    fn run(&self, command: &str) -> anyhow::Result<String>;
}

/// Default [`CommandRunner`] backed by `sh -c`.
pub struct ShellCommandRunner;

impl CommandRunner for ShellCommandRunner {
    fn run(&self, command: &str) -> anyhow::Result<String> {
        let output = std::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()?;
        if !output.status.success() {
            anyhow::bail!("discovery command exited with {}", output.status);
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Status probe issued against an HA candidate.
///
/// Implemented by [`ResourceManagerClient`]; mocked in tests.
#[async_trait]
pub trait ClusterProbe: Send + Sync {
    /// Returns the candidate's HA state (e.g. `ACTIVE`, `STANDBY`).
    async fn ha_state(&self, address: &str, token: &AuthToken) -> Result<String, ClientError>;
}

#[async_trait]
impl ClusterProbe for ResourceManagerClient {
    async fn ha_state(&self, address: &str, token: &AuthToken) -> Result<String, ClientError> {
        Ok(self.cluster_info(address, token).await?.ha_state)
    }
}

/// How the active endpoint is determined when no discovery command applies.
#[derive(Debug, Clone)]
pub enum DiscoveryStrategy {
    /// HA disabled: one configured address, returned verbatim.
    Fixed(String),
    /// HA enabled: ordered candidates, first ACTIVE probe wins.
    HaProbe(Vec<HaCandidate>),
}

/// Resolves the active ResourceManager endpoint once per dispatch cycle.
pub struct EndpointResolver {
    discovery_command: Option<String>,
    strategy: DiscoveryStrategy,
    runner: Box<dyn CommandRunner>,
}

impl EndpointResolver {
    pub fn new(
        strategy: DiscoveryStrategy,
        discovery_command: Option<String>,
        runner: Box<dyn CommandRunner>,
    ) -> Self {
        Self {
            discovery_command,
            strategy,
            runner,
        }
    }

    /// Resolves the currently active endpoint.
    ///
    /// Probe failures against individual HA candidates are logged and treated
    /// as "not active"; only a total failure surfaces as [`ResolveError`].
    pub async fn resolve(
        &self,
        probe: &dyn ClusterProbe,
        token: &AuthToken,
    ) -> Result<String, ResolveError> {
        if let Some(command) = &self.discovery_command {
            match self.runner.run(command) {
                Ok(output) => {
                    if let Some(address) = first_nonempty_line(&output) {
                        let address = strip_scheme(address).to_string();
                        info!("Discovery command resolved ResourceManager at {}", address);
                        return Ok(address);
                    }
                    debug!("Discovery command produced no output, falling back");
                }
                Err(e) => warn!("Discovery command failed: {:#}", e),
            }
        }

        match &self.strategy {
            DiscoveryStrategy::Fixed(address) => {
                if address.is_empty() {
                    return Err(ResolveError::NotConfigured);
                }
                Ok(address.clone())
            }
            DiscoveryStrategy::HaProbe(candidates) => {
                for candidate in candidates {
                    match probe.ha_state(&candidate.address, token).await {
                        Ok(state) if state == HA_STATE_ACTIVE => {
                            info!("ResourceManager {} is ACTIVE", candidate.id);
                            return Ok(candidate.address.clone());
                        }
                        Ok(state) => {
                            info!("ResourceManager {} is {}", candidate.id, state);
                        }
                        Err(e) => {
                            warn!("Error probing ResourceManager {}: {}", candidate.id, e);
                        }
                    }
                }
                Err(ResolveError::NoActiveEndpoint {
                    candidates: candidates.len(),
                })
            }
        }
    }
}

fn first_nonempty_line(output: &str) -> Option<&str> {
    output.lines().map(str::trim).find(|line| !line.is_empty())
}

fn strip_scheme(address: &str) -> &str {
    address
        .trim_start_matches("https://")
        .trim_start_matches("http://")
}
