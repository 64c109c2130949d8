//! HTTP API server for the order fulfillment pipeline.
//!
//! Cart management, checkout, order reads, payment intents, the signed
//! provider webhook, and admin status moves, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use fulfillment::{CartMergeReconciler, CheckoutService};
use metrics_exporter_prometheus::PrometheusHandle;
use payments::{
    InMemoryGateway, InMemoryNotifier, PaymentEventProcessor, SignatureVerifier,
};
use store::FulfillmentStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: FulfillmentStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/cart", get(routes::carts::get::<S>))
        .route("/cart/items", post(routes::carts::add_item::<S>))
        .route(
            "/cart/items/{product_id}",
            put(routes::carts::set_quantity::<S>),
        )
        .route(
            "/cart/items/{product_id}",
            delete(routes::carts::remove_item::<S>),
        )
        .route("/cart/merge", post(routes::carts::merge::<S>))
        .route("/orders", post(routes::orders::place::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/payments/intent", post(routes::payments::create_intent::<S>))
        .route("/webhooks/payment", post(routes::payments::webhook::<S>))
        .route("/admin/orders", get(routes::admin::list::<S>))
        .route(
            "/admin/orders/{id}/status",
            put(routes::admin::set_status::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state: workflow services over the given
/// store, with in-memory gateway and notifier collaborators.
pub fn create_default_state<S: FulfillmentStore + Clone + 'static>(
    store: S,
    config: &Config,
) -> (Arc<AppState<S>>, Arc<InMemoryNotifier>) {
    let notifier = Arc::new(InMemoryNotifier::new());
    let verifier = SignatureVerifier::new(config.webhook_secret.as_bytes());

    let state = Arc::new(AppState {
        checkout: CheckoutService::with_budget(store.clone(), config.checkout_timeout),
        merger: CartMergeReconciler::new(store.clone()),
        processor: PaymentEventProcessor::new(store.clone(), verifier, Arc::clone(&notifier)),
        gateway: InMemoryGateway::new(),
        admin_key: config.admin_key.clone(),
        store,
    });

    (state, notifier)
}
