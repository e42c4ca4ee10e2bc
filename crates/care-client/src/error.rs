//! Error taxonomy shared by reads, writes and the session layer.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The request never produced an HTTP response
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// 401, or a secured call attempted without a token
    #[error("authentication required")]
    AuthRequired { body: Option<Value> },

    /// 403
    #[error("forbidden")]
    Forbidden { body: Option<Value> },

    /// Any other 4xx
    #[error("request rejected ({status}): {message}")]
    ValidationFailure {
        status: u16,
        message: String,
        field_errors: BTreeMap<String, String>,
        body: Option<Value>,
    },

    /// 5xx, or a status the client does not otherwise classify
    #[error("server failure ({status})")]
    ServerFailure { status: u16, body: Option<Value> },

    /// Body was not JSON, or did not match the expected schema
    #[error("unexpected response: {0}")]
    Parse(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Classifies a non-2xx response.
    pub fn from_status(status: u16, body: Option<Value>) -> Self {
        match status {
            401 => ApiError::AuthRequired { body },
            403 => ApiError::Forbidden { body },
            400..=499 => {
                let message = body
                    .as_ref()
                    .and_then(message_field)
                    .unwrap_or("request rejected")
                    .to_string();
                let field_errors = body.as_ref().map(field_errors).unwrap_or_default();
                ApiError::ValidationFailure {
                    status,
                    message,
                    field_errors,
                    body,
                }
            }
            _ => ApiError::ServerFailure { status, body },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::AuthRequired { .. } => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::ValidationFailure { status, .. } | ApiError::ServerFailure { status, .. } => {
                Some(*status)
            }
            ApiError::NetworkFailure(_) | ApiError::Parse(_) => None,
        }
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            ApiError::AuthRequired { body }
            | ApiError::Forbidden { body }
            | ApiError::ValidationFailure { body, .. }
            | ApiError::ServerFailure { body, .. } => body.as_ref(),
            ApiError::NetworkFailure(_) | ApiError::Parse(_) => None,
        }
    }

    /// Text suitable for a toast: the backend's `message` when it sent one.
    pub fn user_message(&self) -> String {
        if let Some(message) = self.body().and_then(message_field) {
            return message.to_string();
        }
        match self {
            ApiError::NetworkFailure(_) => "Could not reach the server".into(),
            ApiError::AuthRequired { .. } => "Please log in to continue".into(),
            ApiError::Forbidden { .. } => "You do not have access to this".into(),
            ApiError::ValidationFailure { message, .. } => message.clone(),
            ApiError::ServerFailure { .. } => "Something went wrong, please try again".into(),
            ApiError::Parse(_) => "Received an unexpected response".into(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Parse(e.to_string())
    }
}

fn message_field(body: &Value) -> Option<&str> {
    body.get("message").and_then(Value::as_str)
}

// Accepts `{"errors": {"field": "msg"}}` and `{"errors": [{"field": .., "message": ..}]}`.
fn field_errors(body: &Value) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    match body.get("errors") {
        Some(Value::Object(map)) => {
            for (field, message) in map {
                let text = message
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| message.to_string());
                out.insert(field.clone(), text);
            }
        }
        Some(Value::Array(items)) => {
            for item in items {
                let field = item
                    .get("field")
                    .or_else(|| item.get("path"))
                    .and_then(Value::as_str);
                let message = item.get("message").and_then(Value::as_str);
                if let (Some(field), Some(message)) = (field, message) {
                    out.insert(field.to_string(), message.to_string());
                }
            }
        }
        _ => {}
    }
    out
}
