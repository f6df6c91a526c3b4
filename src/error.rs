use serde_json::{Map, Value};

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum JsonDbError {
    /// Structured error returned by the API for a non-success status.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Network or request execution error from `reqwest`, after retries.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Success response whose body does not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
    /// Request body could not be serialized to JSON.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    /// Invalid client configuration or request input.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl JsonDbError {
    /// Returns the structured API error, if this is one.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }

    /// HTTP status that produced the error, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(err) => Some(err.status),
            Self::Transport(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// Machine-readable API error code, when the API returned one.
    pub fn code(&self) -> Option<&str> {
        self.as_api().map(|err| err.code.as_str())
    }
}

/// Error returned by the API, translated from a failed HTTP exchange.
///
/// `message`, `code` and `status` are always present. Kind-specific data
/// lives in [`ApiErrorKind`].
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{message} (status {status}, code {code})")]
pub struct ApiError {
    /// Human-readable message.
    pub message: String,
    /// Machine-readable code, e.g. `DOCUMENT_NOT_FOUND`.
    pub code: String,
    /// HTTP status of the response.
    pub status: u16,
    /// Raw `details` object from the error body.
    pub details: Map<String, Value>,
    /// Classification of the error.
    pub kind: ApiErrorKind,
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, ApiErrorKind::NotFound { .. })
    }

    /// `true` for both rate limiting and plan quota exhaustion.
    pub fn is_throttled(&self) -> bool {
        matches!(
            self.kind,
            ApiErrorKind::RateLimited | ApiErrorKind::QuotaExceeded { .. }
        )
    }
}

/// Closed set of API error classifications.
#[derive(Clone, Debug, PartialEq)]
pub enum ApiErrorKind {
    /// 404. Carries the missing document id when the API reports it.
    NotFound { document_id: Option<String> },
    /// 409.
    Conflict,
    /// 400 with `VALIDATION_FAILED`.
    Validation { errors: Vec<FieldError> },
    /// 401.
    Unauthorized,
    /// 403.
    Forbidden,
    /// 429 with any code other than `RATE_LIMITED`.
    QuotaExceeded {
        limit: Option<serde_json::Number>,
        current: Option<serde_json::Number>,
    },
    /// 429 with `RATE_LIMITED`.
    RateLimited,
    /// 413.
    DocumentTooLarge,
    /// Any 5xx.
    ServerError,
    /// Everything else; `code` and `details` carry the server's values.
    Generic,
}

/// Single schema validation failure.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldError {
    /// JSON pointer of the offending field.
    pub path: String,
    pub message: String,
    /// JSON Schema keyword that failed, e.g. `required`.
    pub keyword: String,
}
