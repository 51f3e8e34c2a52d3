//! Engine events.
//!
//! The engine emits an event when a registration's payment is confirmed. Confirmation email delivery hangs off
//! this seam: the server installs a hook at startup and the dispatch runs on detached tasks, so a slow or failing
//! mail provider can never delay or fail the IPN response that triggered it.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::PaymentConfirmedEvent;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
