//! Webhook signature verification.
//!
//! The provider signs every delivery with a header of the form
//! `t=<unix-seconds>,v1=<hex hmac>`, where the MAC is HMAC-SHA256 over
//! `"{timestamp}.{raw body}"` keyed with the shared webhook secret. The
//! timestamp bound rejects replayed captures of old deliveries.

use std::time::Duration;

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// How far a delivery timestamp may drift from our clock (5 minutes).
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(5 * 60);

/// Verifies provider signatures over raw webhook bodies.
///
/// Verification runs on the exact bytes received, before any JSON parsing.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Vec<u8>,
    tolerance_secs: i64,
}

impl SignatureVerifier {
    /// Creates a verifier with the default replay tolerance.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self::with_tolerance(secret, DEFAULT_TOLERANCE)
    }

    /// Creates a verifier with an explicit replay tolerance.
    pub fn with_tolerance(secret: impl Into<Vec<u8>>, tolerance: Duration) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs: tolerance.as_secs() as i64,
        }
    }

    /// Checks `header` against `payload`, rejecting bad MACs, unparseable
    /// headers, and timestamps outside the tolerance window.
    pub fn verify(&self, payload: &[u8], header: &str) -> Result<(), WebhookError> {
        let (timestamp, expected) =
            parse_header(header).ok_or(WebhookError::InvalidSignature)?;

        let skew = (Utc::now().timestamp() - timestamp).abs();
        if skew > self.tolerance_secs {
            tracing::warn!(skew, "webhook timestamp outside tolerance window");
            return Err(WebhookError::InvalidSignature);
        }

        let mut mac = self.mac(timestamp, payload);
        mac.verify_slice(&expected)
            .map_err(|_| WebhookError::InvalidSignature)
    }

    /// Produces a `t=..,v1=..` header for `payload` at `timestamp`. Used by
    /// the local test harness to stand in for the provider.
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> String {
        let mac = self.mac(timestamp, payload);
        format!(
            "t={timestamp},v1={}",
            hex::encode(mac.finalize().into_bytes())
        )
    }

    fn mac(&self, timestamp: i64, payload: &[u8]) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac
    }
}

fn parse_header(header: &str) -> Option<(i64, Vec<u8>)> {
    let mut timestamp = None;
    let mut signature = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => signature = hex::decode(value).ok(),
            _ => {}
        }
    }
    Some((timestamp?, signature?))
}
