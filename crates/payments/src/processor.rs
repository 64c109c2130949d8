//! Idempotent application of provider payment events to orders.

use std::sync::Arc;

use common::OrderId;
use domain::OrderStatus;
use store::{FulfillmentStore, StoreError, Transition};

use crate::{
    EventKind, NotificationService, PaymentEvent, SignatureVerifier, WebhookError,
};

/// What a delivery amounted to. Every variant is acknowledged to the
/// provider; only a [`WebhookError`] produces a non-2xx response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receipt {
    /// The event moved an order to a new status.
    Applied,
    /// This event id was already processed; nothing happened.
    Duplicate,
    /// Acknowledged without effect: unhandled type, unresolvable order
    /// reference, or an order whose status had already moved on.
    Ignored,
}

/// Processes signed webhook deliveries from the payment provider.
///
/// Deliveries arrive at least once and in no particular order, so every
/// effect here must be idempotent. The status compare-and-set is the
/// authoritative guard: of two concurrent deliveries for the same order,
/// exactly one transition applies. The event-id record on top of it lets
/// re-deliveries be reported as duplicates, and is written only after the
/// transition so a transient failure mid-flight leaves the event
/// re-deliverable rather than half-processed.
pub struct PaymentEventProcessor<S, N> {
    store: S,
    verifier: SignatureVerifier,
    notifier: Arc<N>,
}

impl<S, N> PaymentEventProcessor<S, N>
where
    S: FulfillmentStore,
    N: NotificationService + 'static,
{
    pub fn new(store: S, verifier: SignatureVerifier, notifier: Arc<N>) -> Self {
        Self {
            store,
            verifier,
            notifier,
        }
    }

    /// Verifies, parses, and applies one delivery. `body` is the raw bytes
    /// as received; signature verification runs before anything else.
    #[tracing::instrument(skip_all)]
    pub async fn process(
        &self,
        body: &[u8],
        signature_header: &str,
    ) -> Result<Receipt, WebhookError> {
        self.verifier.verify(body, signature_header)?;
        let event: PaymentEvent = serde_json::from_slice(body)?;

        let (from, to) = match event.kind() {
            EventKind::Succeeded => (OrderStatus::Pending, OrderStatus::Processing),
            EventKind::Failed => (OrderStatus::Pending, OrderStatus::PaymentFailed),
            EventKind::Other => {
                tracing::info!(event_id = %event.id, event_type = %event.event_type,
                    "unhandled event type, acknowledging");
                metrics::counter!("payment_events_ignored_total").increment(1);
                return Ok(Receipt::Ignored);
            }
        };

        let Some(order_id) = event.order_ref().and_then(|r| OrderId::parse(r).ok()) else {
            tracing::warn!(event_id = %event.id,
                "event carries no usable order reference, acknowledging");
            metrics::counter!("payment_events_ignored_total").increment(1);
            return Ok(Receipt::Ignored);
        };

        if let Some(message) = event.failure_message() {
            tracing::warn!(%order_id, message, "payment failed at provider");
        }

        let transition = match self.store.transition_order(order_id, from, to).await {
            Ok(transition) => transition,
            Err(StoreError::OrderNotFound(_)) => {
                tracing::warn!(event_id = %event.id, %order_id,
                    "event references an unknown order, acknowledging");
                metrics::counter!("payment_events_ignored_total").increment(1);
                return Ok(Receipt::Ignored);
            }
            Err(e) => return Err(e.into()),
        };
        let first_delivery = self.store.record_payment_event(&event.id).await?;

        match transition {
            Transition::Applied(order) => {
                tracing::info!(event_id = %event.id, %order_id, status = %order.status,
                    "payment event applied");
                metrics::counter!("payment_events_applied_total").increment(1);
                if event.kind() == EventKind::Succeeded {
                    self.notify_confirmation(order);
                }
                Ok(Receipt::Applied)
            }
            Transition::Superseded { .. } if !first_delivery => {
                tracing::debug!(event_id = %event.id, %order_id,
                    "duplicate delivery, already processed");
                metrics::counter!("payment_events_duplicate_total").increment(1);
                Ok(Receipt::Duplicate)
            }
            Transition::Superseded { current } => {
                tracing::info!(event_id = %event.id, %order_id, %current,
                    "order already past the expected status, acknowledging");
                metrics::counter!("payment_events_ignored_total").increment(1);
                Ok(Receipt::Ignored)
            }
        }
    }

    /// Confirmation runs off the request path; a failed send is logged and
    /// never fails the delivery.
    fn notify_confirmation(&self, order: domain::Order) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.order_confirmation(&order).await {
                tracing::error!(order_id = %order.id, error = %e,
                    "order confirmation failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use common::{CartId, ProductId, UserId};
    use domain::{Money, Order, OrderedItem, Product};
    use store::{CheckoutPlan, InMemoryStore, StockDecrement};

    use super::*;
    use crate::InMemoryNotifier;

    const SECRET: &str = "whsec_test";

    fn processor(
        store: InMemoryStore,
    ) -> (PaymentEventProcessor<InMemoryStore, InMemoryNotifier>, Arc<InMemoryNotifier>) {
        let notifier = Arc::new(InMemoryNotifier::new());
        let processor = PaymentEventProcessor::new(
            store,
            SignatureVerifier::new(SECRET),
            Arc::clone(&notifier),
        );
        (processor, notifier)
    }

    async fn pending_order(store: &InMemoryStore) -> Order {
        let product = Product::new(ProductId::new(), "Widget", Money::from_cents(1000), 10);
        store.upsert_product(&product).await.unwrap();
        let order = Order::place(
            UserId::new(),
            vec![OrderedItem::snapshot(&product, 2)],
            "1 Main St",
        )
        .unwrap();
        let plan = CheckoutPlan {
            order: order.clone(),
            decrements: vec![StockDecrement {
                product_id: product.id,
                quantity: 2,
            }],
            cart_id: CartId::new(),
        };
        let mut cart = domain::Cart::guest();
        cart.id = plan.cart_id;
        cart.add_item(product.id, 2).unwrap();
        store.save_cart(&cart).await.unwrap();
        store.commit_checkout(plan).await.unwrap()
    }

    fn signed(event: &serde_json::Value) -> (Vec<u8>, String) {
        let body = serde_json::to_vec(event).unwrap();
        let header = SignatureVerifier::new(SECRET).sign(&body, Utc::now().timestamp());
        (body, header)
    }

    fn success_event(id: &str, order_id: OrderId) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "type": "payment_succeeded",
            "data": {"object": {"metadata": {"order_id": order_id.to_string()}}}
        })
    }

    #[tokio::test]
    async fn test_success_event_moves_order_to_processing() {
        let store = InMemoryStore::new();
        let order = pending_order(&store).await;
        let (processor, notifier) = processor(store.clone());

        let (body, header) = signed(&success_event("evt_1", order.id));
        let receipt = processor.process(&body, &header).await.unwrap();
        assert_eq!(receipt, Receipt::Applied);

        let stored = store.order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Processing);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(notifier.sent(), vec![order.id]);
    }

    #[tokio::test]
    async fn test_redelivery_is_duplicate_with_single_notification() {
        let store = InMemoryStore::new();
        let order = pending_order(&store).await;
        let (processor, notifier) = processor(store.clone());

        let (body, header) = signed(&success_event("evt_1", order.id));
        assert_eq!(
            processor.process(&body, &header).await.unwrap(),
            Receipt::Applied
        );
        assert_eq!(
            processor.process(&body, &header).await.unwrap(),
            Receipt::Duplicate
        );

        let stored = store.order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Processing);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(notifier.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_event_marks_payment_failed_without_restock() {
        let store = InMemoryStore::new();
        let order = pending_order(&store).await;
        let product_id = order.items[0].product_id;
        let stock_after_checkout = store.stock_of(product_id).await;
        let (processor, notifier) = processor(store.clone());

        let (body, header) = signed(&serde_json::json!({
            "id": "evt_2",
            "type": "payment_failed",
            "data": {"object": {
                "metadata": {"order_id": order.id.to_string()},
                "last_payment_error": {"message": "card declined"}
            }}
        }));
        let receipt = processor.process(&body, &header).await.unwrap();
        assert_eq!(receipt, Receipt::Applied);

        let stored = store.order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::PaymentFailed);
        // Reserved stock stays reserved; release is a manual follow-up.
        assert_eq!(store.stock_of(product_id).await, stock_after_checkout);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(notifier.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_signature_is_rejected_before_parsing() {
        let store = InMemoryStore::new();
        let order = pending_order(&store).await;
        let (processor, _) = processor(store.clone());

        let body = serde_json::to_vec(&success_event("evt_1", order.id)).unwrap();
        let header = SignatureVerifier::new("whsec_wrong").sign(&body, Utc::now().timestamp());

        let err = processor.process(&body, &header).await.unwrap_err();
        assert!(matches!(err, WebhookError::InvalidSignature));

        let stored = store.order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let (processor, _) = processor(InMemoryStore::new());
        let body = b"not json at all";
        let header = SignatureVerifier::new(SECRET).sign(body, Utc::now().timestamp());
        let err = processor.process(body, &header).await.unwrap_err();
        assert!(matches!(err, WebhookError::MalformedPayload(_)));
    }

    #[tokio::test]
    async fn test_unhandled_type_is_acknowledged() {
        let (processor, _) = processor(InMemoryStore::new());
        let (body, header) = signed(&serde_json::json!({
            "id": "evt_3",
            "type": "charge.refunded",
            "data": {"object": {}}
        }));
        assert_eq!(
            processor.process(&body, &header).await.unwrap(),
            Receipt::Ignored
        );
    }

    #[tokio::test]
    async fn test_unknown_order_is_acknowledged() {
        let (processor, _) = processor(InMemoryStore::new());
        let (body, header) = signed(&success_event("evt_4", OrderId::new()));
        assert_eq!(
            processor.process(&body, &header).await.unwrap(),
            Receipt::Ignored
        );
    }

    #[tokio::test]
    async fn test_missing_order_reference_is_acknowledged() {
        let (processor, _) = processor(InMemoryStore::new());
        let (body, header) = signed(&serde_json::json!({
            "id": "evt_5",
            "type": "payment_succeeded",
            "data": {"object": {"metadata": {}}}
        }));
        assert_eq!(
            processor.process(&body, &header).await.unwrap(),
            Receipt::Ignored
        );
    }

    #[tokio::test]
    async fn test_failed_notification_does_not_fail_delivery() {
        let store = InMemoryStore::new();
        let order = pending_order(&store).await;
        let (processor, notifier) = processor(store.clone());
        notifier.set_failing(true);

        let (body, header) = signed(&success_event("evt_6", order.id));
        assert_eq!(
            processor.process(&body, &header).await.unwrap(),
            Receipt::Applied
        );
        let stored = store.order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Processing);
    }
}
