//! Error types for Skywatch.
//!
//! Each concern gets its own enum. [`ApiError`] is the only one that knows
//! about HTTP; handlers convert into it and axum renders it as a JSON body.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Failure of a weather provider lookup.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The city argument was empty or whitespace.
    #[error("city must not be empty")]
    EmptyCity,

    /// The provider did not answer with a success status.
    ///
    /// Unknown cities and transport failures are deliberately the same variant:
    /// the caller only ever shows "City not found."
    #[error("city not found")]
    NotFound,

    /// The provider answered successfully but the body did not have the expected shape.
    #[error("unexpected provider response: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

/// Failure of the news headline lookup.
#[derive(Debug, Error)]
pub enum NewsError {
    #[error("news provider unavailable: {0}")]
    Unavailable(String),
}

/// A classifier input that is outside its physical range.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid {field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Failure to load or validate the serialized classifier.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode model artifact: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("model feature schema mismatch: expected {expected:?}, found {found:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("invalid model: {0}")]
    Invalid(String),
}

/// Startup configuration problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing credential: {0} is not set")]
    MissingCredential(&'static str),
}

/// Error returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    News(#[from] NewsError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The query string did not deserialize.
    #[error(transparent)]
    Query(#[from] QueryRejection),

    /// The request body was not the expected JSON.
    #[error(transparent)]
    Body(#[from] JsonRejection),
}

/// JSON error envelope.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

impl ApiError {
    fn status_and_detail(&self) -> (StatusCode, ErrorDetail) {
        match self {
            ApiError::Fetch(FetchError::EmptyCity) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "EMPTY_CITY",
                    message: "Please enter a city.".to_string(),
                    field: Some("city"),
                },
            ),
            ApiError::Fetch(FetchError::NotFound) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "CITY_NOT_FOUND",
                    message: "City not found.".to_string(),
                    field: None,
                },
            ),
            ApiError::Fetch(FetchError::Parse(msg)) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "PROVIDER_RESPONSE_INVALID",
                    message: msg.clone(),
                    field: None,
                },
            ),
            ApiError::News(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "NEWS_UNAVAILABLE",
                    message: "Could not load news at the moment.".to_string(),
                    field: None,
                },
            ),
            ApiError::Validation(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INVALID_INPUT",
                    message: err.to_string(),
                    field: Some(err.field),
                },
            ),
            ApiError::Query(rejection) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INVALID_QUERY",
                    message: rejection.body_text(),
                    field: None,
                },
            ),
            ApiError::Body(rejection) => (
                rejection.status(),
                ErrorDetail {
                    code: "INVALID_BODY",
                    message: rejection.body_text(),
                    field: None,
                },
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_detail();
        (status, Json(ErrorResponse { error })).into_response()
    }
}
