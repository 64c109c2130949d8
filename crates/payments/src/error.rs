//! Payment processing error types.

use store::StoreError;
use thiserror::Error;

/// Errors the webhook processor can reject an event with.
///
/// Deliberately narrow: business-logic mismatches (unknown event type,
/// unresolvable order reference) are not errors - the processor logs them
/// and acknowledges anyway, because the provider treats any rejection as
/// "retry forever".
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The event's signature did not verify. Never processed, never retried
    /// by us, always logged.
    #[error("invalid event signature")]
    InvalidSignature,

    /// The event body is not parseable as a payment event.
    #[error("malformed event payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// Transient storage failure; the provider's redelivery is the correct
    /// retry path.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from the payment gateway collaborator.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The amount is below the provider's minimum charge.
    #[error("amount {0} is below the provider minimum")]
    AmountTooSmall(i64),

    /// Provider-side failure.
    #[error("payment gateway error: {0}")]
    Provider(String),
}

/// Errors from the notification collaborator.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Delivery failure; the caller logs and moves on.
    #[error("notification failed: {0}")]
    Failed(String),
}
