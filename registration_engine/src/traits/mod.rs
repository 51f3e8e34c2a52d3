//! Storage interface contracts.
//!
//! These traits define what a backend must expose for the registration engine to run on top of it. The engine
//! ships a SQLite implementation; the flow API only ever talks to these traits, so other backends can be swapped
//! in without touching the payment logic.
//!
//! * [`RegistrationManagement`]: the registration rows, including the conditional payment-status transition that
//!   keeps IPN redelivery idempotent.
//! * [`OptionManagement`]: the read-mostly fee table.
//! * [`AccompanyManagement`]: pending accompany-person batches keyed by add-on transaction id.
mod accompany_management;
mod option_management;
mod registration_management;

pub use accompany_management::{AccompanyApiError, AccompanyManagement};
pub use option_management::{OptionApiError, OptionManagement};
pub use registration_management::{RegistrationApiError, RegistrationManagement};
