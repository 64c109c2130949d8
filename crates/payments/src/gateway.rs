//! Payment intent creation against the provider.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;
use domain::Money;

use crate::GatewayError;

/// Provider minimum charge in cents.
pub const MINIMUM_CHARGE_CENTS: i64 = 50;

/// A created payment intent. The client secret goes back to the browser to
/// drive the provider's payment UI; everything else stays server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    pub order_id: OrderId,
    pub amount: Money,
    pub currency: String,
}

/// Creates payment intents with the order id stamped into the intent
/// metadata, so the later webhook can find its way back to the order.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(
        &self,
        order_id: OrderId,
        amount: Money,
        currency: &str,
    ) -> Result<PaymentIntent, GatewayError>;
}

/// Deterministic in-memory gateway for tests and local development.
#[derive(Clone, Default)]
pub struct InMemoryGateway {
    inner: Arc<RwLock<GatewayState>>,
}

#[derive(Default)]
struct GatewayState {
    created: Vec<PaymentIntent>,
    failing: bool,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.inner.write().unwrap().failing = failing;
    }

    /// Intents created so far, in creation order.
    pub fn created(&self) -> Vec<PaymentIntent> {
        self.inner.read().unwrap().created.clone()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryGateway {
    async fn create_intent(
        &self,
        order_id: OrderId,
        amount: Money,
        currency: &str,
    ) -> Result<PaymentIntent, GatewayError> {
        if amount.cents() < MINIMUM_CHARGE_CENTS {
            return Err(GatewayError::AmountTooSmall(amount.cents()));
        }

        let mut state = self.inner.write().unwrap();
        if state.failing {
            return Err(GatewayError::Provider("simulated provider outage".into()));
        }

        let seq = state.created.len() + 1;
        let intent = PaymentIntent {
            id: format!("pi_{seq:08}"),
            client_secret: format!("pi_{seq:08}_secret"),
            order_id,
            amount,
            currency: currency.to_string(),
        };
        state.created.push(intent.clone());
        Ok(intent)
    }
}
