use thiserror::Error;

use crate::{
    onepay::OnePayError,
    traits::{AccompanyApiError, OptionApiError, RegistrationApiError},
};

/// Everything that can go wrong while driving a registration or payment flow. The server maps these onto HTTP
/// status codes; the engine only distinguishes the cases.
#[derive(Debug, Error)]
pub enum RegistrationFlowError {
    #[error("Payment gateway error: {0}")]
    OnePayError(#[from] OnePayError),
    #[error("Registration storage error: {0}")]
    RegistrationError(#[from] RegistrationApiError),
    #[error("Option storage error: {0}")]
    OptionError(#[from] OptionApiError),
    #[error("Accompany-person storage error: {0}")]
    AccompanyError(#[from] AccompanyApiError),
    #[error("The email {0} already has a completed registration")]
    EmailAlreadyRegistered(String),
    #[error("No completed registration exists for {0}")]
    NoPaidRegistration(String),
    #[error("An accompany-person request must include at least one person")]
    EmptyAccompanyList,
}
