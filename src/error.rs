use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// User-visible failures of the start/stop control surface.
///
/// None of these are fatal; the scheduler and broadcaster keep running for
/// the life of the process.
#[derive(Debug, Error)]
pub enum ControlError {
    /// A start request arrived while a run is active.
    #[error("timer is already running")]
    AlreadyRunning,

    /// A stop request arrived while idle.
    #[error("timer is not running")]
    NotRunning,

    /// The requested start instant is unparsable or not in the future.
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    /// The request body cannot be interpreted as a configuration.
    #[error("malformed configuration: {0}")]
    MalformedConfiguration(String),

    /// The scheduler task is gone. Only possible during process shutdown.
    #[error("scheduler is unavailable")]
    Unavailable,
}

impl ResponseError for ControlError {
    fn status_code(&self) -> StatusCode {
        match self {
            ControlError::AlreadyRunning | ControlError::NotRunning => StatusCode::CONFLICT,
            ControlError::InvalidSchedule(_) | ControlError::MalformedConfiguration(_) => {
                StatusCode::BAD_REQUEST
            }
            ControlError::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).body(self.to_string())
    }
}
