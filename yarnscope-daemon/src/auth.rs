//! Authentication token lifecycle
//!
//! Owns the renewable credential attached to every outbound ResourceManager
//! call. Renewal is purely local (no network I/O); the ResourceManager
//! validates the token lazily on first use.

use std::time::Duration;

use rand::Rng;
use tracing::info;
use uuid::Uuid;
use yarnscope_client::AuthToken;

/// Manages the daemon's renewable authentication credential.
///
/// The renewal interval is the configured base plus a bounded random jitter
/// fixed once per process lifetime, so collocated daemon instances do not
/// renew in lockstep.
pub struct TokenManager {
    token: AuthToken,
    renewal_interval_ms: i64,
}

impl TokenManager {
    /// Creates a token manager with an unissued credential; the first
    /// [`ensure_fresh`](Self::ensure_fresh) call issues one.
    pub fn new(renewal_base: Duration) -> Self {
        let base_ms = renewal_base.as_millis() as i64;
        let jitter_bound = base_ms / 10;
        let jitter = if jitter_bound > 0 {
            rand::thread_rng().gen_range(-jitter_bound..=jitter_bound)
        } else {
            0
        };

        Self {
            token: AuthToken::new("", 0),
            renewal_interval_ms: base_ms + jitter,
        }
    }

    /// Issues a new credential if and only if the current one is older than
    /// the jittered renewal interval. Idempotent within an interval.
    ///
    /// Returns `true` when a new credential was issued.
    pub fn ensure_fresh(&mut self, now_ms: i64) -> bool {
        if now_ms - self.token.issued_at_ms() <= self.renewal_interval_ms {
            return false;
        }
        info!("Renewing ResourceManager authentication token");
        self.token = AuthToken::new(Uuid::new_v4().to_string(), now_ms);
        true
    }

    /// The current credential.
    pub fn token(&self) -> &AuthToken {
        &self.token
    }

    #[cfg(test)]
    fn renewal_interval_ms(&self) -> i64 {
        self.renewal_interval_ms
    }
}
