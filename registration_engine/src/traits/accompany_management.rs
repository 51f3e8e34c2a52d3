use thiserror::Error;

use crate::db_types::AccompanyBatch;

#[derive(Debug, Clone, Error)]
pub enum AccompanyApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("No pending accompany-person batch for transaction {0}")]
    BatchNotFound(String),
}

impl From<sqlx::Error> for AccompanyApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait AccompanyManagement: Clone {
    /// Store a batch of accompany persons awaiting payment under its transaction id.
    async fn save_batch(&self, batch: AccompanyBatch) -> Result<(), AccompanyApiError>;

    /// Fetch the pending batch for a transaction id.
    ///
    /// Batches older than the retention window are treated as not found, so an abandoned (never paid)
    /// transaction cannot be resurrected indefinitely.
    async fn fetch_batch(&self, transaction_id: &str) -> Result<Option<AccompanyBatch>, AccompanyApiError>;

    /// Delete a batch after it has been merged into its registration.
    async fn delete_batch(&self, transaction_id: &str) -> Result<(), AccompanyApiError>;
}
