use shelf_model::validation::{FieldError, FieldErrors};
use thiserror::Error;

pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your internet connection.";
pub const SERVER_FALLBACK_MESSAGE: &str = "Something went wrong on the server.";

/// Failures seen by callers of the book API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The server could not be reached or did not answer in time
    #[error("{}", NETWORK_ERROR_MESSAGE)]
    Network(String),

    /// The server answered with a failure envelope
    #[error("{message}")]
    Server {
        status: u16,
        message: String,
        details: Vec<FieldError>,
    },

    /// The server answered with a body we could not read
    #[error("unexpected response from server: {0}")]
    Decode(String),
}

impl ClientError {
    /// Message suitable for a banner or alert
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
            ClientError::Server { message, .. } if !message.trim().is_empty() => message.clone(),
            ClientError::Server { .. } | ClientError::Decode(_) => {
                SERVER_FALLBACK_MESSAGE.to_string()
            }
        }
    }

    /// Errors the server attributed to specific fields
    pub fn field_errors(&self) -> FieldErrors {
        match self {
            ClientError::Server { details, .. } => details
                .iter()
                .filter(|detail| !detail.field.is_empty())
                .cloned()
                .collect::<Vec<_>>()
                .into(),
            _ => FieldErrors::new(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            ClientError::Decode(error.to_string())
        } else {
            ClientError::Network(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(message: &str, details: Vec<FieldError>) -> ClientError {
        ClientError::Server {
            status: 400,
            message: message.to_string(),
            details,
        }
    }

    #[test]
    fn network_errors_have_a_fixed_message() {
        let error = ClientError::Network("connection refused".to_string());
        assert_eq!(error.user_message(), NETWORK_ERROR_MESSAGE);
        assert_eq!(error.to_string(), NETWORK_ERROR_MESSAGE);
    }

    #[test]
    fn server_message_falls_back_when_blank() {
        assert_eq!(server("Book not found", vec![]).user_message(), "Book not found");
        assert_eq!(server("  ", vec![]).user_message(), SERVER_FALLBACK_MESSAGE);
        assert_eq!(
            ClientError::Decode("eof".to_string()).user_message(),
            SERVER_FALLBACK_MESSAGE
        );
    }

    #[test]
    fn field_errors_skip_unattributed_details() {
        let error = server(
            "Invalid ISBN format",
            vec![
                FieldError {
                    field: "isbn".to_string(),
                    message: "Invalid ISBN format".to_string(),
                },
                FieldError {
                    field: String::new(),
                    message: "something else".to_string(),
                },
            ],
        );

        let errors = error.field_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("isbn"), Some("Invalid ISBN format"));
    }
}
