//! Order confirmation notifications.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;
use domain::Order;

use crate::NotifyError;

/// Sends customer-facing notifications. Delivery is best-effort: the
/// webhook processor fires it off the request path and only logs failures,
/// so implementations must not be load-bearing for order state.
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Tells the customer their order was paid and is being processed.
    async fn order_confirmation(&self, order: &Order) -> Result<(), NotifyError>;
}

/// Records notifications in memory. Used in tests and as the default wiring
/// until a real email provider is configured.
#[derive(Clone, Default)]
pub struct InMemoryNotifier {
    inner: Arc<RwLock<NotifierState>>,
}

#[derive(Default)]
struct NotifierState {
    sent: Vec<OrderId>,
    failing: bool,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent send fail, for exercising the best-effort
    /// path.
    pub fn set_failing(&self, failing: bool) {
        self.inner.write().unwrap().failing = failing;
    }

    /// Order ids confirmed so far, in send order.
    pub fn sent(&self) -> Vec<OrderId> {
        self.inner.read().unwrap().sent.clone()
    }

    pub fn sent_count(&self) -> usize {
        self.inner.read().unwrap().sent.len()
    }
}

#[async_trait]
impl NotificationService for InMemoryNotifier {
    async fn order_confirmation(&self, order: &Order) -> Result<(), NotifyError> {
        let mut state = self.inner.write().unwrap();
        if state.failing {
            return Err(NotifyError::Failed("simulated delivery failure".into()));
        }
        state.sent.push(order.id);
        Ok(())
    }
}
