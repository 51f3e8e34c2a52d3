use opg_common::{UsdCents, Vnd};
use thiserror::Error;

use crate::{db_types::RegistrationOption, fees::OptionKey};

#[derive(Debug, Clone, Error)]
pub enum OptionApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("No registration option matches ({category}, {subtype:?})")]
    OptionNotFound { category: String, subtype: Option<String> },
}

impl From<sqlx::Error> for OptionApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait OptionManagement: Clone {
    /// Look up the single active option for a (category, subtype) pair.
    ///
    /// The options table guarantees at most one active row per pair, so this lookup is deterministic. A miss is
    /// reported as [`OptionApiError::OptionNotFound`].
    async fn fetch_option(&self, key: &OptionKey) -> Result<RegistrationOption, OptionApiError>;

    /// Insert an option row. Used by the one-time seed and by tests; options are immutable afterwards.
    async fn insert_option(
        &self,
        category: &str,
        subtype: Option<&str>,
        fee_usd: UsdCents,
        fee_vnd: Vnd,
    ) -> Result<i64, OptionApiError>;
}
