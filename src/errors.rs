use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use std::fmt;

use crate::config::ConfigError;
use crate::provider::ProviderError;
use crate::storage::StorageError;

#[derive(Debug)]
pub enum AppError {
    Unauthenticated,
    Forbidden,
    NotFound,
    InvalidArgument(String),
    TooFar { distance_m: f64 },
    AlreadyCheckedIn,
    GeocodeFailure(String),
    Persistence(String),
    Session(String),
    Config(String),
}

/// Body of every error response.
#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Unauthenticated => write!(f, "Not authenticated"),
            AppError::Forbidden => write!(f, "Forbidden"),
            AppError::NotFound => write!(f, "Not found"),
            AppError::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
            AppError::TooFar { distance_m } => {
                write!(f, "Too far from event ({distance_m:.0} m away)")
            }
            AppError::AlreadyCheckedIn => write!(f, "Already checked in to this event"),
            AppError::GeocodeFailure(msg) => write!(f, "Geocoding failed: {msg}"),
            AppError::Persistence(msg) => write!(f, "Persistence error: {msg}"),
            AppError::Session(msg) => write!(f, "Session error: {msg}"),
            AppError::Config(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden | AppError::TooFar { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::AlreadyCheckedIn => StatusCode::CONFLICT,
            AppError::GeocodeFailure(_) => StatusCode::BAD_GATEWAY,
            AppError::Persistence(_) | AppError::Session(_) | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            log::error!("{self}");
            match self {
                AppError::GeocodeFailure(_) => "Could not resolve event location".to_string(),
                _ => "Internal Server Error".to_string(),
            }
        } else {
            self.to_string()
        };
        HttpResponse::build(status).json(ErrorBody { error: message })
    }
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::NotFound => AppError::NotFound,
            ProviderError::InvalidColumn(col) => {
                AppError::InvalidArgument(format!("Unknown field '{col}'"))
            }
            ProviderError::EmptyChanges => {
                AppError::InvalidArgument("No fields to update".to_string())
            }
            other => AppError::Persistence(other.to_string()),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => AppError::NotFound,
            StorageError::InvalidPath(path) => {
                AppError::InvalidArgument(format!("Invalid object path '{path}'"))
            }
            other => AppError::Persistence(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Persistence(format!("Malformed row: {e}"))
    }
}

impl From<actix_session::SessionInsertError> for AppError {
    fn from(e: actix_session::SessionInsertError) -> Self {
        AppError::Session(e.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn statuses() {
        assert_eq!(AppError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::TooFar { distance_m: 2000.0 }.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AppError::AlreadyCheckedIn.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::GeocodeFailure("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn provider_not_found_stays_distinct() {
        assert!(matches!(
            AppError::from(ProviderError::NotFound),
            AppError::NotFound
        ));
        assert!(matches!(
            AppError::from(ProviderError::Database("boom".into())),
            AppError::Persistence(_)
        ));
    }

    #[actix_web::test]
    async fn server_errors_hide_details() {
        let resp = AppError::Persistence("relation users does not exist".into()).error_response();
        let body = to_bytes(resp.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "Internal Server Error");
    }
}
