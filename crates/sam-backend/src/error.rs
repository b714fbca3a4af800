use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to decode response: {0}")]
    Decode(String),

    /// A 2xx response whose `success` flag was false.
    #[error("{message}")]
    Rejected { message: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid MIME type `{mime}` for {name}")]
    InvalidMime { name: String, mime: String },
}

impl BackendError {
    /// Text shown to the user when a form submission fails.
    ///
    /// Non-success statuses are reported with `status_message`; the server's
    /// own message is used when it rejected the request.
    pub fn user_message(&self, status_message: &str) -> String {
        match self {
            BackendError::Status { .. } => status_message.to_string(),
            BackendError::Rejected { message } => message.clone(),
            other => other.to_string(),
        }
    }
}
