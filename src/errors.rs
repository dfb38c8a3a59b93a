use std::fmt;

use actix_web::{
    error::{QueryPayloadError, ResponseError},
    http::{header::ContentType, StatusCode},
    HttpResponse
};

#[derive(Debug)]
pub enum AppError {
    /// `size` is how much was read before giving up, not the full body length.
    PayloadTooLarge { size: usize, limit: usize },
    MalformedCoordinate(String),
    MalformedFilter(String),
    MalformedPayload(String),
    /// Query string that could not be deserialized at all.
    MalformedQuery(String),
    UnsupportedMediaType(String),
    StoreUnavailable(String),
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::PayloadTooLarge { limit, .. } => {
                write!(f, "Image size too large: the limit is {} bytes", limit)
            }
            AppError::MalformedCoordinate(msg) => write!(f, "Malformed coordinate: {}", msg),
            AppError::MalformedFilter(msg) => write!(f, "Malformed filter: {}", msg),
            AppError::MalformedPayload(msg) => write!(f, "Malformed payload: {}", msg),
            AppError::MalformedQuery(msg) => write!(f, "Malformed query: {}", msg),
            AppError::UnsupportedMediaType(msg) => write!(f, "Unsupported media type: {}", msg),
            AppError::StoreUnavailable(msg) => write!(f, "Image store unavailable: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal server error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let message = match self {
            // Driver details stay in the logs
            AppError::StoreUnavailable(_) => "Image store unavailable".to_string(),
            AppError::InternalError(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(serde_json::json!({"error": message}))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::MalformedCoordinate(_) => StatusCode::BAD_REQUEST,
            AppError::MalformedFilter(_) => StatusCode::BAD_REQUEST,
            AppError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            AppError::MalformedQuery(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<QueryPayloadError> for AppError {
    fn from(err: QueryPayloadError) -> Self {
        AppError::MalformedQuery(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => AppError::StoreUnavailable(err.to_string()),
            sqlx::Error::Database(e) => AppError::StoreUnavailable(format!("write rejected: {}", e)),
            _ => AppError::InternalError(format!("Database error: {}", err))
        }
    }
}
