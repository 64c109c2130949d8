//! Provider webhook event shapes.
//!
//! Only the fields the pipeline reads are modeled; everything else in the
//! provider payload is ignored by serde.

use serde::Deserialize;

/// Event type for a completed payment.
pub const PAYMENT_SUCCEEDED: &str = "payment_succeeded";
/// Event type for a declined or errored payment.
pub const PAYMENT_FAILED: &str = "payment_failed";

/// What an event means to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Succeeded,
    Failed,
    /// Any type we do not handle. Acknowledged and dropped.
    Other,
}

/// A deserialized provider event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEvent {
    /// Provider-assigned unique event id, the idempotency key.
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: EventObject,
}

/// The payment intent the event describes.
#[derive(Debug, Clone, Deserialize)]
pub struct EventObject {
    #[serde(default)]
    pub metadata: EventMetadata,
    #[serde(default)]
    pub last_payment_error: Option<PaymentFailure>,
}

/// Free-form metadata we attached when creating the intent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventMetadata {
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentFailure {
    pub message: Option<String>,
}

impl PaymentEvent {
    pub fn kind(&self) -> EventKind {
        match self.event_type.as_str() {
            PAYMENT_SUCCEEDED => EventKind::Succeeded,
            PAYMENT_FAILED => EventKind::Failed,
            _ => EventKind::Other,
        }
    }

    /// The order id carried in the intent metadata, unparsed.
    pub fn order_ref(&self) -> Option<&str> {
        self.data.object.metadata.order_id.as_deref()
    }

    /// The provider's failure message, if this is a failure event.
    pub fn failure_message(&self) -> Option<&str> {
        self.data
            .object
            .last_payment_error
            .as_ref()
            .and_then(|e| e.message.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_success_event() {
        let event: PaymentEvent = serde_json::from_str(
            r#"{
                "id": "evt_123",
                "type": "payment_succeeded",
                "data": {
                    "object": {
                        "amount": 2500,
                        "currency": "usd",
                        "metadata": {"order_id": "7b1d3c1e-9f43-4a8f-9a46-0e9a8e1f2b3c"}
                    }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(event.kind(), EventKind::Succeeded);
        assert_eq!(
            event.order_ref(),
            Some("7b1d3c1e-9f43-4a8f-9a46-0e9a8e1f2b3c")
        );
        assert_eq!(event.failure_message(), None);
    }

    #[test]
    fn test_parses_failure_event_with_message() {
        let event: PaymentEvent = serde_json::from_str(
            r#"{
                "id": "evt_456",
                "type": "payment_failed",
                "data": {
                    "object": {
                        "metadata": {"order_id": "x"},
                        "last_payment_error": {"message": "card declined"}
                    }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(event.kind(), EventKind::Failed);
        assert_eq!(event.failure_message(), Some("card declined"));
    }

    #[test]
    fn test_unhandled_type_and_missing_metadata() {
        let event: PaymentEvent = serde_json::from_str(
            r#"{"id": "evt_789", "type": "charge.refunded", "data": {"object": {}}}"#,
        )
        .unwrap();

        assert_eq!(event.kind(), EventKind::Other);
        assert_eq!(event.order_ref(), None);
    }
}
