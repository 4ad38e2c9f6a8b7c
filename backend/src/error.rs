use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use common::req::MessageResponse;
use log::error;

use crate::telemetry::TelemetryError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Email already exists")]
    Duplicate,
    #[error("User not found")]
    UserNotFound,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Not logged in")]
    Unauthorized,
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Message sent to the client. Internal details stay in the log.
    pub fn user_message(&self) -> String {
        match self {
            Self::Telemetry(TelemetryError::Timeout(_)) => {
                "Weather station did not respond in time".to_owned()
            }
            Self::Telemetry(TelemetryError::Rejected { .. }) => {
                "Weather station rejected the request".to_owned()
            }
            Self::Telemetry(_) => "Weather station is unavailable".to_owned(),
            Self::Internal(_) => "Something went wrong".to_owned(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Duplicate => StatusCode::BAD_REQUEST,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::InvalidCredentials | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Telemetry(TelemetryError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            Self::Telemetry(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::Internal(_) => error!("{self}"),
            Self::Telemetry(e) => error!("telemetry: {e}"),
            _ => {}
        }
        HttpResponse::build(self.status_code()).json(MessageResponse::new(self.user_message()))
    }
}
