//! Error types for the command line client.

use std::fmt;
use std::path::PathBuf;

/// Errors surfaced to the user by `moncli`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    /// A required setting has no value.
    MissingSetting { setting: &'static str },
    /// The HTTP request could not be sent or completed.
    Request { url: String },
    /// The server answered with a non-success status.
    Status { status: u16, body: String },
    /// The response body was not what the command expected.
    Decode { url: String },
    /// The token file could not be read or written.
    TokenFile { path: PathBuf },
    /// The pasted login output is not a token response.
    InvalidToken { reason: String },
    /// A command line argument could not be parsed.
    InvalidArgument { name: &'static str },
    /// Reading from standard input failed.
    Input,
    /// Writing to standard output failed.
    Output,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSetting { setting } => write!(f, "{setting} is not set"),
            Self::Request { url } => write!(f, "request to {url} failed"),
            Self::Status { status, body } if body.is_empty() => {
                write!(f, "unexpected status: {status}")
            }
            Self::Status { status, body } => write!(f, "unexpected status: {status} ({body})"),
            Self::Decode { url } => write!(f, "decoding response from {url}"),
            Self::TokenFile { path } => write!(f, "token file {}", path.display()),
            Self::InvalidToken { reason } => write!(f, "invalid login output: {reason}"),
            Self::InvalidArgument { name } => write!(f, "invalid {name}"),
            Self::Input => write!(f, "reading input"),
            Self::Output => write!(f, "writing output"),
        }
    }
}

impl std::error::Error for CliError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_includes_server_message() {
        let err = CliError::Status {
            status: 404,
            body: "account not found".to_string(),
        };
        assert_eq!(err.to_string(), "unexpected status: 404 (account not found)");

        let err = CliError::Status {
            status: 500,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "unexpected status: 500");
    }
}
