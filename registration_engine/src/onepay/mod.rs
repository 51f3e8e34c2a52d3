//! The OnePay wire protocol.
//!
//! OnePay authenticates both directions of the exchange with the same scheme: the `vpc_`/`user_`-prefixed
//! parameters are canonicalized into a sorted `key=value&...` string and signed with HMAC-SHA256 under the
//! merchant's secure secret. Outbound payment redirects carry the resulting `vpc_SecureHash`; inbound IPN
//! callbacks are verified by recomputing it.
//!
//! * [`params`]: the strongly-typed, ordered parameter list and canonicalization rules.
//! * [`signature`]: HMAC-SHA256 signing and verification.
//! * [`ipn`]: parsing and classifying inbound IPN callbacks.
//! * [`request`]: building signed payment-redirect URLs for the primary and add-on flows.
mod errors;
pub mod ipn;
pub mod params;
pub mod request;
pub mod signature;

pub use errors::OnePayError;

/// The literal body the gateway expects in response to a successfully verified IPN callback, regardless of
/// whether the underlying transaction succeeded.
pub const IPN_ACK_BODY: &str = "responsecode=1&desc=confirm-success";

/// `vpc_TxnResponseCode` value signalling a successful transaction.
pub const TXN_RESPONSE_SUCCESS: &str = "0";
