//! Renewable authentication credential
//!
//! The ResourceManager expects a `hadoop.auth` cookie on every request. The
//! token value is opaque to this crate; it is issued and renewed by the
//! daemon's token manager and validated lazily by the ResourceManager on
//! first use.

/// An opaque renewable credential bound to its wall-clock issue time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    value: String,
    issued_at_ms: i64,
}

impl AuthToken {
    /// Wraps an opaque token value issued at `issued_at_ms` (millisecond
    /// epoch).
    pub fn new(value: impl Into<String>, issued_at_ms: i64) -> Self {
        Self {
            value: value.into(),
            issued_at_ms,
        }
    }

    /// The opaque token value, attached as the `hadoop.auth` cookie.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Millisecond epoch at which this token was issued.
    pub fn issued_at_ms(&self) -> i64 {
        self.issued_at_ms
    }

    /// Cookie header value for outbound requests.
    pub(crate) fn cookie(&self) -> String {
        format!("hadoop.auth={}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_format() {
        let token = AuthToken::new("t-123", 1_000);
        assert_eq!(token.cookie(), "hadoop.auth=t-123");
        assert_eq!(token.issued_at_ms(), 1_000);
    }
}
