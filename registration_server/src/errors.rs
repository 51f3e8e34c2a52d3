use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use registration_engine::{
    onepay::OnePayError,
    traits::{AccompanyApiError, OptionApiError, RegistrationApiError},
    RegistrationFlowError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Invalid request. {0}")]
    InvalidRequest(String),
    #[error("The payment callback could not be authenticated. {0}")]
    CallbackAuthFailed(String),
}

impl ServerError {
    fn code(&self) -> &'static str {
        match self.status_code() {
            StatusCode::BAD_REQUEST => "bad_request",
            StatusCode::FORBIDDEN => "forbidden",
            StatusCode::NOT_FOUND => "not_found",
            _ => "server_error",
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::CallbackAuthFailed(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let trace_id = format!("{:08x}", rand::random::<u32>());
        error!("💻️ [{trace_id}] {self}");
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).body(
            serde_json::json!({ "error": self.to_string(), "code": self.code(), "trace_id": trace_id }).to_string(),
        )
    }
}

impl From<RegistrationFlowError> for ServerError {
    fn from(e: RegistrationFlowError) -> Self {
        match e {
            RegistrationFlowError::OnePayError(OnePayError::MissingParameter(p)) => {
                Self::InvalidRequestBody(format!("missing parameter {p}"))
            },
            RegistrationFlowError::OnePayError(OnePayError::SignatureMismatch) => {
                Self::CallbackAuthFailed(OnePayError::SignatureMismatch.to_string())
            },
            RegistrationFlowError::OnePayError(e) => Self::Unspecified(e.to_string()),
            RegistrationFlowError::RegistrationError(RegistrationApiError::RegistrationNotFound(id)) => {
                Self::NoRecordFound(format!("Registration {id} not found"))
            },
            RegistrationFlowError::RegistrationError(RegistrationApiError::EmailAlreadyRegistered(email)) => {
                Self::InvalidRequest(format!("The email {email} already has a completed registration"))
            },
            RegistrationFlowError::RegistrationError(RegistrationApiError::DatabaseError(e)) => {
                Self::BackendError(format!("Database error: {e}"))
            },
            RegistrationFlowError::OptionError(e @ OptionApiError::OptionNotFound { .. }) => {
                Self::NoRecordFound(e.to_string())
            },
            RegistrationFlowError::OptionError(OptionApiError::DatabaseError(e)) => {
                Self::BackendError(format!("Database error: {e}"))
            },
            RegistrationFlowError::AccompanyError(e @ AccompanyApiError::BatchNotFound(_)) => {
                Self::NoRecordFound(e.to_string())
            },
            RegistrationFlowError::AccompanyError(AccompanyApiError::DatabaseError(e)) => {
                Self::BackendError(format!("Database error: {e}"))
            },
            e @ RegistrationFlowError::EmailAlreadyRegistered(_) => Self::InvalidRequest(e.to_string()),
            e @ RegistrationFlowError::NoPaidRegistration(_) => Self::InvalidRequest(e.to_string()),
            e @ RegistrationFlowError::EmptyAccompanyList => Self::InvalidRequest(e.to_string()),
        }
    }
}
