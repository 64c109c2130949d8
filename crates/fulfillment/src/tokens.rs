//! Ephemeral token issue and single-use redemption.

use std::time::Duration;

use chrono::Utc;
use domain::TokenRecord;
use rand::RngCore;
use store::FulfillmentStore;

use crate::{FulfillmentError, Result};

/// Default token lifetime (15 minutes, matching the emailed-link flows).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

/// Issues and redeems short-lived single-use tokens (email verification,
/// password reset).
///
/// Redemption rides the store's atomic take: of two concurrent redemptions
/// of the same token exactly one succeeds, the other sees
/// [`FulfillmentError::InvalidOrExpiredToken`] - the same error an expired
/// or unknown token produces, so a caller learns nothing from the
/// distinction.
pub struct TokenService<S> {
    store: S,
    ttl: Duration,
}

impl<S: FulfillmentStore> TokenService<S> {
    /// Creates a token service with the default TTL.
    pub fn new(store: S) -> Self {
        Self::with_ttl(store, DEFAULT_TOKEN_TTL)
    }

    /// Creates a token service with an explicit TTL.
    pub fn with_ttl(store: S, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Issues a fresh token for `email` carrying `payload`, returning the
    /// opaque token string to embed in the emailed link. Any token
    /// previously issued to the same address is superseded.
    #[tracing::instrument(skip(self, payload))]
    pub async fn issue(&self, email: &str, payload: serde_json::Value) -> Result<String> {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        let record = TokenRecord {
            token: token.clone(),
            email: email.to_string(),
            payload,
            expires_at: Utc::now() + self.ttl,
        };
        self.store.put_token(&record).await?;
        Ok(token)
    }

    /// Redeems a token, consuming it. Exactly one redemption per issued
    /// token can ever succeed.
    #[tracing::instrument(skip(self, token))]
    pub async fn redeem(&self, token: &str) -> Result<TokenRecord> {
        self.store
            .take_token(token)
            .await?
            .ok_or(FulfillmentError::InvalidOrExpiredToken)
    }

    /// Finds the live token previously issued to an email address, for the
    /// resend flow. Does not consume it.
    pub async fn pending_for_email(&self, email: &str) -> Result<Option<String>> {
        Ok(self.store.token_for_email(email).await?)
    }
}
