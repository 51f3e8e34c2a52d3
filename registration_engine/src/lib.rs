//! OnePay Registration Engine
//!
//! The registration engine contains the core logic for an event-registration payment gateway backed by the OnePay
//! payment provider. It is transport-agnostic: the HTTP server crate drives it, but nothing in here depends on
//! actix or any other web framework.
//!
//! The library is divided into three main sections:
//! 1. The OnePay protocol ([`mod@onepay`]): canonical parameter strings, HMAC-SHA256 secure hashes, outbound
//!    payment-redirect URLs and inbound IPN callback classification.
//! 2. Storage ([`mod@traits`] and the SQLite backend). You should never need to touch the database directly;
//!    use the flow API instead. The data types live in `db_types` and are public.
//! 3. The flow API ([`RegistrationFlowApi`]): registration, accompany-person add-ons, fee resolution and IPN
//!    reconciliation, glued to the storage traits.
//!
//! The engine also emits a `PaymentConfirmedEvent` whenever a registration's payment is confirmed. Subscribe a
//! hook to it to send confirmation emails; the dispatch runs on a detached task and can never fail a callback.
mod api;
pub mod db_types;
pub mod events;
pub mod exchange_rate;
pub mod fees;
pub mod helpers;
pub mod onepay;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub mod test_utils;

pub use api::{IpnResolution, OptionQuote, PaymentRedirect, RegistrationFlowApi, RegistrationFlowError};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
