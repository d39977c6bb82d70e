use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("unauthorized: {message}")]
    Unauthorized {
        code: &'static str,
        message: &'static str,
    },
    #[error("upstream unavailable: {message}")]
    Connectivity { message: String },
    #[error("upstream returned status {status}")]
    Upstream { status: u16, body: String },
    #[error("invalid upstream response: {message}")]
    ResponseFormat { message: String },
    #[error("internal error")]
    Internal { code: &'static str, message: String },
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(code: &'static str, message: &'static str) -> Self {
        Self::Unauthorized { code, message }
    }

    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::Connectivity {
            message: message.into(),
        }
    }

    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            body: body.into(),
        }
    }

    pub fn response_format(message: impl Into<String>) -> Self {
        Self::ResponseFormat {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            code: "internal_error",
            message: message.into(),
        }
    }

    /// True for failures that originate from talking to the backend.
    pub fn is_upstream_failure(&self) -> bool {
        matches!(
            self,
            Self::Connectivity { .. } | Self::Upstream { .. } | Self::ResponseFormat { .. }
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest { code, .. }
            | Self::Unauthorized { code, .. }
            | Self::Internal { code, .. } => *code,
            Self::Connectivity { .. } => "upstream_unavailable",
            Self::Upstream { .. } => "upstream_error",
            Self::ResponseFormat { .. } => "invalid_upstream_response",
        }
    }

    /// Message safe to hand back to callers.
    pub fn public_message(&self) -> String {
        match self {
            Self::BadRequest { message, .. } => message.clone(),
            Self::Unauthorized { message, .. } => message.to_string(),
            Self::Connectivity { message } => format!("upstream service unreachable: {message}"),
            Self::Upstream { status, .. } => format!("upstream returned status {status}"),
            Self::ResponseFormat { .. } => "upstream returned an invalid response".to_string(),
            Self::Internal { .. } => "internal server error".to_string(),
        }
    }

    pub fn details(&self) -> Value {
        match self {
            Self::Upstream { status, body } => json!({
                "status": status,
                "body": body_value(body),
            }),
            _ => json!({}),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Connectivity { .. } => StatusCode::SERVICE_UNAVAILABLE,
            // Only client and server errors pass through; other codes cannot carry a body.
            Self::Upstream { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|code| code.is_client_error() || code.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            Self::ResponseFormat { .. } => StatusCode::BAD_GATEWAY,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request("invalid_path", rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request("invalid_query", rejection.body_text())
    }
}

/// Upstream error bodies are usually JSON; anything else is kept as text.
fn body_value(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal { message, .. } => {
                tracing::error!(error = %message, "request failed with internal error");
            }
            Self::ResponseFormat { message } => {
                tracing::warn!(error = %message, "upstream response could not be decoded");
            }
            _ => {}
        }

        (
            self.status_code(),
            Json(ErrorResponse {
                code: self.code().to_string(),
                message: self.public_message(),
                details: self.details(),
            }),
        )
            .into_response()
    }
}
