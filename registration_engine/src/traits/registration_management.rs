use thiserror::Error;

use crate::db_types::{AccompanyPerson, PaymentStatus, Registration, RegistrationId};

#[derive(Debug, Clone, Error)]
pub enum RegistrationApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Registration not found: {0}")]
    RegistrationNotFound(RegistrationId),
    #[error("The email {0} already has a completed registration")]
    EmailAlreadyRegistered(String),
}

impl From<sqlx::Error> for RegistrationApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait RegistrationManagement: Clone {
    /// Persist a fully-formed registration record. The id must be fresh.
    async fn insert_registration(&self, registration: Registration) -> Result<(), RegistrationApiError>;

    async fn fetch_registration_by_id(&self, id: &RegistrationId)
        -> Result<Option<Registration>, RegistrationApiError>;

    async fn fetch_registration_by_email(&self, email: &str) -> Result<Option<Registration>, RegistrationApiError>;

    /// Conditionally transition a registration's payment status away from `pending`.
    ///
    /// The update is guarded by the current status in a single statement, so concurrent duplicate callbacks
    /// cannot both apply: the first one wins and the second observes `false`. A registration that has already
    /// reached `done` is never moved again through this call.
    async fn try_transition_payment_status(
        &self,
        id: &RegistrationId,
        to: PaymentStatus,
    ) -> Result<bool, RegistrationApiError>;

    /// Replace the accompany-person list on a registration.
    async fn update_accompany_persons(
        &self,
        id: &RegistrationId,
        persons: &[AccompanyPerson],
    ) -> Result<(), RegistrationApiError>;

    /// Remove a superseded (pending/failed) registration.
    async fn delete_registration(&self, id: &RegistrationId) -> Result<(), RegistrationApiError>;
}
