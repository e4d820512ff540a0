//! Framework-wide error types
//!
//! One error enum is shared by the storage layer, the transaction context
//! and the HTTP handlers. Each variant knows its HTTP status code; the
//! conversion into an `HttpResponse` (see `http::response`) decides how much
//! of the error the client gets to see.

use std::time::Duration;
use thiserror::Error;

/// Framework-wide error type
///
/// Client-caused variants (4xx) carry a message that is safe to return in
/// the response body. Everything else maps to 500 and is only ever logged.
///
/// # Example
///
/// ```rust,ignore
/// use kit::{FrameworkError, Response};
///
/// pub async fn show(req: Request) -> Response {
///     let id: i64 = req
///         .param("id")?
///         .parse()
///         .map_err(|_| FrameworkError::validation("Did not receive a valid integer ID."))?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Error)]
pub enum FrameworkError {
    /// Missing or malformed client input (400 Bad Request)
    #[error("{message}")]
    Validation {
        /// Client-facing explanation
        message: String,
    },

    /// The addressed entity does not exist (404 Not Found)
    #[error("{message}")]
    NotFound {
        /// Client-facing explanation
        message: String,
    },

    /// The handler does not support the request method (405)
    #[error("Method not allowed: {method}")]
    MethodNotAllowed {
        /// The rejected method, as sent by the client
        method: String,
    },

    /// Request body exceeded the configured limit (413)
    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge {
        /// Configured limit in bytes
        limit: usize,
    },

    /// Query or statement failure
    #[error("Database error: {0}")]
    Database(String),

    /// The store could not start or finalize a transaction
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// A transaction outlived its deadline
    #[error("Transaction timed out after {0:?}")]
    Timeout(Duration),

    /// An update or delete affected zero rows
    ///
    /// Happens when the row vanished between read and write, or when the
    /// in-memory entity was already deleted.
    #[error("No row matched rowid {rowid}")]
    NoMatchingRow {
        /// The rowid the statement was keyed on
        rowid: i64,
    },

    /// Response encoding failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid or unusable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic internal server error
    #[error("Internal server error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl FrameworkError {
    /// Create a Validation error (400)
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a NotFound error (404)
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a MethodNotAllowed error (405)
    pub fn method_not_allowed(method: impl Into<String>) -> Self {
        Self::MethodNotAllowed {
            method: method.into(),
        }
    }

    /// Create a Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    /// Create a Transaction error
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction(message.into())
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::MethodNotAllowed { .. } => 405,
            Self::PayloadTooLarge { .. } => 413,
            Self::Database(_)
            | Self::Transaction(_)
            | Self::Timeout(_)
            | Self::NoMatchingRow { .. }
            | Self::Serialization(_)
            | Self::Config(_)
            | Self::Internal { .. } => 500,
        }
    }

    /// Whether the error was caused by the server rather than the client
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

impl From<sea_orm::DbErr> for FrameworkError {
    fn from(e: sea_orm::DbErr) -> Self {
        Self::Database(e.to_string())
    }
}

impl From<serde_json::Error> for FrameworkError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(FrameworkError::validation("bad").status_code(), 400);
        assert_eq!(FrameworkError::not_found("gone").status_code(), 404);
        assert_eq!(FrameworkError::method_not_allowed("PATCH").status_code(), 405);
        assert_eq!(FrameworkError::PayloadTooLarge { limit: 1 }.status_code(), 413);
    }

    #[test]
    fn storage_failures_map_to_500() {
        for err in [
            FrameworkError::database("locked"),
            FrameworkError::transaction("busy"),
            FrameworkError::Timeout(Duration::from_secs(3)),
            FrameworkError::NoMatchingRow { rowid: 7 },
            FrameworkError::Serialization("bad float".into()),
        ] {
            assert!(err.is_server_error(), "{err} should be a server error");
        }
    }

    #[test]
    fn method_not_allowed_names_the_method() {
        let err = FrameworkError::method_not_allowed("PATCH");
        assert_eq!(err.to_string(), "Method not allowed: PATCH");
    }
}
