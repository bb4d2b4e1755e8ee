use crate::Error;
use actix_web::{
    error::{JsonPayloadError, QueryPayloadError},
    http::StatusCode,
    web::Json,
    HttpRequest, HttpResponse, ResponseError,
};
use serde_json::json;
use std::fmt;
use tracing::error;

pub type RestResult<T, E = RestApiError> = std::result::Result<Json<T>, E>;

#[derive(Debug)]
pub struct RestApiError {
    pub code: RestApiErrorCode,
    pub message: String,
}

impl RestApiError {
    pub fn new(code: RestApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::new(
            RestApiErrorCode::NotFound,
            "Entity with requested ID doesn't exist.",
        )
    }

    pub fn database() -> Self {
        Self::new(
            RestApiErrorCode::Database,
            "Database query failed. Contact the operations team to resolve.",
        )
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(RestApiErrorCode::InvalidInput, message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestApiErrorCode {
    NotFound,
    InvalidRange,
    InvalidInput,
    Database,
}

impl fmt::Display for RestApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl fmt::Display for RestApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestApiErrorCode::NotFound => write!(f, "not_found"),
            RestApiErrorCode::InvalidRange => write!(f, "invalid_range"),
            RestApiErrorCode::InvalidInput => write!(f, "invalid_input"),
            RestApiErrorCode::Database => write!(f, "database"),
        }
    }
}

impl RestApiErrorCode {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidRange | Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::Database => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ResponseError for RestApiError {
    fn error_response(&self) -> HttpResponse {
        let body = json!({
            "code": self.code.to_string(),
            "message": self.message,
        });
        HttpResponse::build(self.status_code())
            .content_type("application/json")
            .json(body)
    }

    fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }
}

impl From<Error> for RestApiError {
    fn from(error: Error) -> Self {
        match error {
            Error::Rusqlite(rusqlite::Error::QueryReturnedNoRows) => RestApiError::not_found(),
            Error::NotFound(message) => RestApiError::new(RestApiErrorCode::NotFound, message),
            Error::InvalidRange(message) => {
                RestApiError::new(RestApiErrorCode::InvalidRange, message)
            }
            Error::InvalidInput(message) => RestApiError::invalid_input(message),
            error => {
                // Details stay in the logs, clients get a generic message
                error!(%error, "Request failed");
                RestApiError::database()
            }
        }
    }
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    RestApiError::invalid_input(format!("Invalid arguments: {err}")).into()
}

pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    RestApiError::invalid_input(format!("Invalid body: {err}")).into()
}
