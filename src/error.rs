use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A configuration error (missing or invalid secret, bad settings).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The response cookie layer is not installed, so cookies cannot be written.
    #[error("Cookies cannot be set here: CookieManagerLayer is not installed")]
    MutationContext,

    /// An encryption error.
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// A serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Config(ref msg) => {
                tracing::error!("Configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Configuration error".to_string())
            }

            AppError::MutationContext => {
                tracing::error!("Cookie write attempted without CookieManagerLayer");
                (StatusCode::INTERNAL_SERVER_ERROR, "Configuration error".to_string())
            }

            AppError::Encryption(ref msg) => {
                tracing::error!("Encryption error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Encryption error".to_string())
            }

            AppError::Serialization(ref msg) => {
                tracing::error!("Serialization error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Serialization error".to_string())
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "error": message
        }))
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (
            status,
            [(http::header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutation_context_maps_to_server_error() {
        let response = AppError::MutationContext.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()[http::header::CONTENT_TYPE],
            "application/json"
        );
    }

    #[test]
    fn error_messages_name_the_failure() {
        let err = AppError::Config("COOKIE_SECRET must be set".into());
        assert_eq!(
            err.to_string(),
            "Configuration error: COOKIE_SECRET must be set"
        );
    }
}
