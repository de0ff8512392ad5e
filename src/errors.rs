use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Utterance returned to the voice assistant whenever a request cannot be answered.
pub const APOLOGY_TEXT: &str = "Sorry, I couldn't look up that account balance right now.";

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// External account data unavailable or malformed.
    Fetch(String),
    /// The spoken keyword is missing from the inbound payload.
    MalformedRequest(String),
    /// No account scored or aliased for the keyword.
    NoMatch(String),
    /// The matched account id is absent from the fetched set.
    AccountNotFound(String),
    /// The account cache could not be written.
    CacheWrite(String),
    /// Invalid or unreadable configuration.
    Config(String),
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// The innermost error, skipping any context wrappers.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// HTTP status this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self.root() {
            AppError::Fetch(_) => StatusCode::BAD_GATEWAY,
            AppError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NoMatch(_) => StatusCode::NOT_FOUND,
            AppError::AccountNotFound(_)
            | AppError::CacheWrite(_)
            | AppError::Config(_)
            | AppError::InternalError(_)
            | AppError::WithContext { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Fetch(msg) => write!(f, "Fetch error: {}", msg),
            AppError::MalformedRequest(msg) => write!(f, "Malformed request: {}", msg),
            AppError::NoMatch(msg) => write!(f, "No matching account: {}", msg),
            AppError::AccountNotFound(msg) => write!(f, "Account not found: {}", msg),
            AppError::CacheWrite(msg) => write!(f, "Cache write error: {}", msg),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// The body is always a speech envelope with an apologetic utterance so the
    /// assistant has something to say, plus an `error` field for the caller.
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match &self {
            AppError::Fetch(msg) => {
                tracing::error!("Fetch error: {}", msg);
                "Account data unavailable".to_string()
            }
            AppError::MalformedRequest(msg) => msg.clone(),
            AppError::NoMatch(msg) => msg.clone(),
            AppError::AccountNotFound(msg) => {
                tracing::error!("Matched account missing from fetched set: {}", msg);
                "Internal server error".to_string()
            }
            AppError::CacheWrite(msg) => {
                tracing::error!("Cache write error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::Config(msg) | AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::WithContext { source, context } => {
                // Log full context chain for debugging
                tracing::error!("Error with context: {} -> {}", context, source);
                // Delegate to underlying error's response
                return source.as_ref().clone().into_response();
            }
        };

        let body = Json(json!({
            "response": {
                "outputSpeech": {
                    "type": "PlainText",
                    "text": APOLOGY_TEXT,
                },
                "shouldEndSession": true,
            },
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<serde_json::Error> for AppError {
    /// Converts a `serde_json::Error` into an `AppError`.
    fn from(err: serde_json::Error) -> Self {
        AppError::Fetch(format!("Invalid account data: {}", err))
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

/// Extension for `std::io::Error`; I/O failures in this crate are cache writes.
impl<T> ResultExt<T> for Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::CacheWrite(e.to_string())),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::CacheWrite(e.to_string())),
            context: f(),
        })
    }
}
