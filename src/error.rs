//! Error taxonomy for calls against the back-office API.
//!
//! Every API-originating failure is caught at the call site and turned into a
//! user-facing string with [`ApiError::user_message`]. The server's own message
//! wins whenever it sent one.

use thiserror::Error;

/// Shown when neither the server nor the transport produced a usable message.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Cannot reach back-office API at {url}")]
    Network { url: String },

    #[error("Connection to {url} timed out")]
    Timeout { url: String },

    #[error("Invalid back-office API URL: {0}")]
    InvalidUrl(String),

    #[error("Session expired or invalid, please sign in again")]
    Unauthorized { message: Option<String> },

    /// `message` is the server's own text for a 404, when it sent one.
    #[error("Not found: {what}")]
    NotFound {
        what: String,
        message: Option<String>,
    },

    #[error("Back-office API error (HTTP {status})")]
    Server {
        status: u16,
        message: Option<String>,
    },

    /// The envelope arrived with `success: false`.
    #[error("Request rejected: {message}")]
    Rejected {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Invalid response from back-office API: {0}")]
    Decode(String),
}

impl ApiError {
    /// A record missing locally or from an empty server result.
    pub fn not_found(what: impl Into<String>) -> Self {
        ApiError::NotFound {
            what: what.into(),
            message: None,
        }
    }

    /// The message a toast or inline error should display.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Server {
                message: Some(m), ..
            }
            | ApiError::Unauthorized { message: Some(m) }
            | ApiError::NotFound {
                message: Some(m), ..
            } => non_blank(m),
            ApiError::Rejected { message, .. } => non_blank(message),
            ApiError::Server { message: None, .. } | ApiError::Decode(_) => {
                GENERIC_FAILURE.to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Connectivity failures never carry a server message.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ApiError::Network { .. } | ApiError::Timeout { .. })
    }
}

fn non_blank(message: &str) -> String {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        GENERIC_FAILURE.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_is_preferred_verbatim() {
        let err = ApiError::Server {
            status: 409,
            message: Some("Restaurant name already taken".into()),
        };
        assert_eq!(err.user_message(), "Restaurant name already taken");
    }

    #[test]
    fn missing_or_blank_message_falls_back_to_generic() {
        let err = ApiError::Server {
            status: 500,
            message: None,
        };
        assert_eq!(err.user_message(), GENERIC_FAILURE);

        let err = ApiError::Rejected {
            message: "   ".into(),
            status_code: Some(400),
        };
        assert_eq!(err.user_message(), GENERIC_FAILURE);
    }

    #[test]
    fn not_found_shows_the_server_text_unprefixed() {
        let err = ApiError::NotFound {
            what: "/branches/b9".into(),
            message: Some("Branch b9 was archived".into()),
        };
        assert_eq!(err.user_message(), "Branch b9 was archived");
        assert_eq!(
            ApiError::not_found("branch b9").user_message(),
            "Not found: branch b9"
        );
    }

    #[test]
    fn transport_errors_describe_the_target() {
        let err = ApiError::Network {
            url: "https://api.example.com".into(),
        };
        assert!(err.is_connectivity());
        assert!(err.user_message().contains("api.example.com"));
    }
}
