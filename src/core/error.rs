//! Crate-wide error type with stable, programmatically comparable codes.
//!
//! Every failure carries an `ErrorCode` so callers can branch on the kind of
//! failure (`err.code == ErrorCode::ApiNotFound`) instead of matching message
//! strings, plus a JSON `details` payload for anything structured the caller
//! or the log line might need.

use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// HTTP 404: the resource is absent.
    ApiNotFound,
    /// HTTP 400: the engine rejected the request.
    ApiBadRequest,
    /// Any other non-2xx response.
    ApiServerError,
    /// Transport-level failure (connection refused, DNS, timeout).
    ApiUnreachable,
    /// A 2xx response body that does not decode into the expected shape.
    ApiInvalidResponse,

    ConfigInvalidValue,

    ValidationInvalidArgument,

    InternalIoError,
    InternalJsonError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ApiNotFound => "api.not_found",
            ErrorCode::ApiBadRequest => "api.bad_request",
            ErrorCode::ApiServerError => "api.server_error",
            ErrorCode::ApiUnreachable => "api.unreachable",
            ErrorCode::ApiInvalidResponse => "api.invalid_response",

            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpStatusDetails {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreachableDetails {
    pub error: String,
    pub attempts: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDeleteFailure {
    pub id: String,
    pub code: String,
    pub message: String,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            retryable: None,
        }
    }

    pub fn api_not_found(operation: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ApiNotFound,
            "Resource not found",
            json!({ "operation": operation.into() }),
        )
    }

    /// Structured rejection from the engine: renders as `"{code}. {message}"`.
    pub fn api_bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let message = message.into();
        let details = json!({ "code": code, "message": message });
        Self::new(
            ErrorCode::ApiBadRequest,
            format!("{}. {}", code, message),
            details,
        )
    }

    /// A 400 whose body did not decode as the engine's error payload.
    pub fn api_bad_request_raw(body: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ApiBadRequest,
            "Request rejected by the engine",
            json!({ "body": body.into() }),
        )
    }

    pub fn api_server_error(status: u16, body: impl Into<String>) -> Self {
        let details = serde_json::to_value(HttpStatusDetails {
            status,
            body: body.into(),
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
        Self::new(
            ErrorCode::ApiServerError,
            format!("API error: HTTP {}", status),
            details,
        )
    }

    pub fn api_unreachable(error: impl Into<String>, attempts: u32) -> Self {
        let details = serde_json::to_value(UnreachableDetails {
            error: error.into(),
            attempts,
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
        let mut err = Self::new(ErrorCode::ApiUnreachable, "Admin API unreachable", details);
        err.retryable = Some(true);
        err
    }

    pub fn api_invalid_response(error: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ApiInvalidResponse,
            "Invalid API response",
            json!({ "error": error.into(), "operation": operation.into() }),
        )
    }

    /// Combined error for a removal pass where some deletions failed.
    ///
    /// Built after every deletion was attempted; `failures` holds one entry
    /// per flow that could not be deleted.
    pub fn flow_delete_failed(failures: &[(String, Error)]) -> Self {
        let entries: Vec<FlowDeleteFailure> = failures
            .iter()
            .map(|(id, err)| FlowDeleteFailure {
                id: id.clone(),
                code: err.code.as_str().to_string(),
                message: err.message.clone(),
            })
            .collect();
        let ids: Vec<&str> = failures.iter().map(|(id, _)| id.as_str()).collect();
        let details =
            serde_json::to_value(&entries).unwrap_or_else(|_| Value::Array(Vec::new()));
        Self::new(
            ErrorCode::ApiServerError,
            format!("Failed to delete flows: {}", ids.join(", ")),
            json!({ "failures": details }),
        )
    }

    pub fn config_invalid_value(key: impl Into<String>, problem: impl Into<String>) -> Self {
        let key = key.into();
        let problem = problem.into();
        Self::new(
            ErrorCode::ConfigInvalidValue,
            format!("Invalid configuration value for '{}'", key),
            json!({ "key": key, "problem": problem }),
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
    ) -> Self {
        let field = field.into();
        let problem = problem.into();
        Self::new(
            ErrorCode::ValidationInvalidArgument,
            format!("Invalid argument '{}': {}", field, problem),
            json!({ "field": field, "problem": problem }),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalIoError,
            "IO error",
            json!({ "error": error.into(), "context": context }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            json!({ "error": error.into(), "context": context }),
        )
    }
}
