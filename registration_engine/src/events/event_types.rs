use crate::db_types::Registration;

/// Emitted after a registration's payment status has actually transitioned to `done`.
///
/// Duplicate IPN deliveries do not re-emit this event: the conditional status transition guarantees at most one
/// emission per registration.
#[derive(Debug, Clone)]
pub struct PaymentConfirmedEvent {
    pub registration: Registration,
}

impl PaymentConfirmedEvent {
    pub fn new(registration: Registration) -> Self {
        Self { registration }
    }
}
