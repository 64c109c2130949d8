//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use fulfillment::FulfillmentError;
use payments::{GatewayError, WebhookError};
use store::StoreError;

/// API-level error type that maps to HTTP responses.
///
/// Storage failures always map to a generic 500 body; internal detail is
/// logged, never returned to the client.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Identity required and absent or unparseable.
    Unauthorized(String),
    /// Identity present but not allowed.
    Forbidden(String),
    /// Fulfillment workflow error.
    Fulfillment(FulfillmentError),
    /// Webhook processing error.
    Webhook(WebhookError),
    /// Payment gateway error.
    Gateway(GatewayError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Fulfillment(err) => fulfillment_error_to_response(err),
            ApiError::Webhook(err) => webhook_error_to_response(err),
            ApiError::Gateway(err) => gateway_error_to_response(err),
            ApiError::Internal(msg) => internal(&msg),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn internal(detail: &str) -> (StatusCode, String) {
    tracing::error!(error = %detail, "internal server error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal error".to_string(),
    )
}

fn fulfillment_error_to_response(err: FulfillmentError) -> (StatusCode, String) {
    match &err {
        FulfillmentError::EmptyCart
        | FulfillmentError::ShippingAddressRequired
        | FulfillmentError::ProductMissing(_)
        | FulfillmentError::InvalidOrExpiredToken => (StatusCode::BAD_REQUEST, err.to_string()),
        FulfillmentError::InsufficientStock { .. } => (StatusCode::CONFLICT, err.to_string()),
        FulfillmentError::Timeout => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
        FulfillmentError::Domain(domain_err) => domain_error_to_response(domain_err, &err),
        FulfillmentError::Store(store_err) => store_error_to_response(store_err),
    }
}

fn domain_error_to_response(err: &DomainError, display: &dyn std::fmt::Display) -> (StatusCode, String) {
    match err {
        DomainError::InvalidTransition { .. } => (StatusCode::CONFLICT, display.to_string()),
        DomainError::InvalidQuantity(_)
        | DomainError::EmptyOrder
        | DomainError::UnknownStatus(_) => (StatusCode::BAD_REQUEST, display.to_string()),
    }
}

fn store_error_to_response(err: &StoreError) -> (StatusCode, String) {
    match err {
        StoreError::ProductNotFound(_)
        | StoreError::CartNotFound(_)
        | StoreError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        StoreError::InsufficientStock(_) => (StatusCode::CONFLICT, err.to_string()),
        _ => internal(&err.to_string()),
    }
}

fn webhook_error_to_response(err: WebhookError) -> (StatusCode, String) {
    match &err {
        WebhookError::InvalidSignature | WebhookError::MalformedPayload(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        WebhookError::Store(_) => internal(&err.to_string()),
    }
}

fn gateway_error_to_response(err: GatewayError) -> (StatusCode, String) {
    match &err {
        GatewayError::AmountTooSmall(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        GatewayError::Provider(_) => (StatusCode::BAD_GATEWAY, err.to_string()),
    }
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        ApiError::Fulfillment(err)
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        ApiError::Webhook(err)
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError::Gateway(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let (status, message) = store_error_to_response(&err);
        match status {
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::CONFLICT => ApiError::Fulfillment(FulfillmentError::Store(err)),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}
