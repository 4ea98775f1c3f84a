//! Error taxonomy for API calls and form submission
//!
//! Network and HTTP failures are carried as `ApiError`, client-side form
//! problems as `FormError`. Both reduce to a single user-facing message.

use std::fmt;

/// Shown when neither the server nor the transport gave us anything useful
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Errors raised by the REST layer
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The request never produced a response (DNS, refused, timeout)
    Transport(String),
    /// The server answered with a non-success status
    Http {
        status: u16,
        /// `message` field from the response body, if the body carried one
        message: Option<String>,
    },
    /// The response body could not be decoded
    Decode(String),
    /// A local file needed for the request could not be read
    Io(String),
}

impl ApiError {
    /// Message suitable for an alert banner.
    ///
    /// Prefers the server-provided message, then the error text, then a
    /// generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Http {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            other => {
                let text = other.to_string();
                if text.trim().is_empty() {
                    GENERIC_FAILURE.to_string()
                } else {
                    text
                }
            }
        }
    }

    /// Build an HTTP error from a status code and raw response body
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.get("message")
                    .and_then(|m| m.as_str())
                    .map(|m| m.to_string())
            });
        ApiError::Http { status, message }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport(e) => write!(f, "Request failed: {}", e),
            ApiError::Http { status, message } => {
                match message.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
                    Some(m) => write!(f, "HTTP {}: {}", status, m),
                    None => write!(f, "HTTP {}", status),
                }
            }
            ApiError::Decode(e) => write!(f, "Unexpected response: {}", e),
            ApiError::Io(e) => write!(f, "File error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Http {
                status: status.as_u16(),
                message: None,
            }
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Io(err.to_string())
    }
}

/// Errors detected before a form is sent anywhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// A required field was left empty (holds the field label)
    Required(String),
    /// A field does not match its expected format
    Invalid { field: String, reason: String },
    /// Edit form submitted without any modification
    NoChanges,
    /// A mutation for the same record is still in flight
    Busy,
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::Required(field) => write!(f, "{} is required", field),
            FormError::Invalid { field, reason } => write!(f, "{}: {}", field, reason),
            FormError::NoChanges => write!(f, "No changes to save"),
            FormError::Busy => write!(f, "A save for this record is already in progress"),
        }
    }
}

impl std::error::Error for FormError {}
