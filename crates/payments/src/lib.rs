//! Payment provider integration for the order pipeline.
//!
//! Two halves: [`PaymentGateway`] creates payment intents with the order id
//! stamped into metadata, and [`PaymentEventProcessor`] applies the signed
//! webhook events that come back, idempotently, to order status.

pub mod error;
pub mod event;
pub mod gateway;
pub mod notify;
pub mod processor;
pub mod signature;

pub use error::{GatewayError, NotifyError, WebhookError};
pub use event::{EventKind, PaymentEvent, PAYMENT_FAILED, PAYMENT_SUCCEEDED};
pub use gateway::{InMemoryGateway, PaymentGateway, PaymentIntent, MINIMUM_CHARGE_CENTS};
pub use notify::{InMemoryNotifier, NotificationService};
pub use processor::{PaymentEventProcessor, Receipt};
pub use signature::{SignatureVerifier, DEFAULT_TOLERANCE};
