use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum OnePayError {
    #[error("The merchant secure secret is not valid hexadecimal: {0}")]
    InvalidSecret(String),
    #[error("The configured gateway endpoint is not a valid URL: {0}")]
    InvalidEndpoint(String),
    #[error("The callback is missing the required parameter {0}")]
    MissingParameter(&'static str),
    #[error("The secure hash on the callback does not match the recomputed signature")]
    SignatureMismatch,
}
