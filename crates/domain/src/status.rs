//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Transitions:
/// ```text
/// Pending ──► Processing ──► Shipped ──► Delivered
///    │             │            │
///    ├──► PaymentFailed         │
///    └─────────────┴────────────┴──► Cancelled
/// ```
///
/// `Pending → Processing` and `Pending → PaymentFailed` are driven
/// exclusively by the payment event processor; the remaining transitions
/// are administrative. `PaymentFailed` is recoverable only via a new
/// checkout, never by retrying the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order created, payment not yet confirmed.
    #[default]
    Pending,

    /// Payment confirmed, order is being fulfilled.
    Processing,

    /// The payment provider reported a failure.
    PaymentFailed,

    /// Order handed to the carrier.
    Shipped,

    /// Order received by the customer (terminal).
    Delivered,

    /// Order cancelled administratively (terminal).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns true if the state machine permits moving to `next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, Processing) | (Pending, PaymentFailed) => true,
            (Processing, Shipped) | (Shipped, Delivered) => true,
            (from, Cancelled) if !from.is_terminal() => true,
            _ => false,
        }
    }

    /// Returns true if `next` is a transition the payment event processor
    /// owns. The administrative status route must refuse these.
    pub fn is_payment_authority(next: OrderStatus) -> bool {
        matches!(next, OrderStatus::Processing | OrderStatus::PaymentFailed)
    }

    /// Returns the status as its snake_case wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::PaymentFailed => "payment_failed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = crate::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "payment_failed" => Ok(OrderStatus::PaymentFailed),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(crate::DomainError::UnknownStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_payment_transitions_from_pending() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::PaymentFailed));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn test_fulfillment_chain() {
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Processing.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn test_cancel_from_any_non_terminal_status() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::PaymentFailed.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_terminal_statuses_admit_nothing() {
        for next in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::PaymentFailed,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert!(!OrderStatus::Delivered.can_transition_to(next));
            assert!(!OrderStatus::Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn test_payment_failed_is_not_retryable() {
        assert!(!OrderStatus::PaymentFailed.can_transition_to(OrderStatus::Processing));
        assert!(!OrderStatus::PaymentFailed.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_payment_authority_targets() {
        assert!(OrderStatus::is_payment_authority(OrderStatus::Processing));
        assert!(OrderStatus::is_payment_authority(OrderStatus::PaymentFailed));
        assert!(!OrderStatus::is_payment_authority(OrderStatus::Shipped));
        assert!(!OrderStatus::is_payment_authority(OrderStatus::Cancelled));
    }

    #[test]
    fn test_wire_string_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::PaymentFailed,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("paid".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&OrderStatus::PaymentFailed).unwrap();
        assert_eq!(json, "\"payment_failed\"");
    }
}
