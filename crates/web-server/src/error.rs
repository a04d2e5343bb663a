use analytics::AnalyticsError;
use api_client::error::ApiError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
    #[error("Quote provider error: {0}")]
    Api(#[from] ApiError),
    #[error("Configuration error: {0}")]
    Config(#[from] configuration::error::ConfigError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Analytics(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Api(ApiError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            AppError::Api(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match &self {
            AppError::Analytics(analytics_err) => {
                tracing::warn!(error = %analytics_err, "Metrics could not be computed.");
                analytics_err.to_string()
            }
            AppError::Api(ApiError::InvalidRequest(message)) => message.clone(),
            AppError::Api(api_err) => {
                tracing::error!(error = ?api_err, "Quote provider error.");
                api_err.to_string()
            }
            AppError::Config(config_err) => {
                tracing::error!(error = ?config_err, "Configuration error.");
                "A server configuration error occurred".to_string()
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
