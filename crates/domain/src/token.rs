//! Ephemeral single-use tokens (email verification, password reset).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short-lived, single-use token record.
///
/// Stored under its opaque token string with a mandatory expiry and a
/// secondary email index for resend lookups. Consumed exactly once via the
/// store's atomic take; an unconsumed record simply expires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub token: String,
    pub email: String,
    /// Opaque payload restored to the caller on redemption (e.g. the
    /// pending signup fields).
    pub payload: serde_json::Value,
    pub expires_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Returns true if the record has expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let record = TokenRecord {
            token: "ab".repeat(32),
            email: "a@example.com".to_string(),
            payload: serde_json::json!({"username": "a"}),
            expires_at: now,
        };
        assert!(record.is_expired(now));
        assert!(!record.is_expired(now - Duration::seconds(1)));
    }
}
