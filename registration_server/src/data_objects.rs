use registration_engine::db_types::AccompanyPerson;
use serde::{Deserialize, Serialize};

/// Query parameters for the public fee-quote endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionQuoteParams {
    /// The public category name, e.g. "ENT Doctors" or "Student & Trainees".
    pub category: String,
    #[serde(default)]
    pub attend_gala_dinner: bool,
}

/// Request body for adding accompany persons to an existing, paid registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccompanyRequest {
    pub email: String,
    #[serde(default)]
    pub accompany_persons: Vec<AccompanyPerson>,
}
