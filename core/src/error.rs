use serde::Serialize;
use thiserror::Error;

/// Crate-level error, serializable for callers that report failures as JSON.
#[derive(Error, Debug, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Semantic analysis error: {message}")]
    Collaborator { message: String },

    #[error("Malformed model: {message}")]
    MalformedModel { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {message}")]
    Io { message: String, path: Option<String> },
}

impl AppError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn collaborator(message: impl Into<String>) -> Self {
        Self::Collaborator {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an IO error with the path involved
    pub fn io_at(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Check if retrying (or falling back) can succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Collaborator calls fall back to rule-only analysis
            // IO issues may be transient
            Self::Collaborator { .. } | Self::Io { .. } => true,
            // Same source, same failure
            Self::Parse { .. } | Self::MalformedModel { .. } | Self::Config { .. } => false,
        }
    }
}

impl From<crate::parser::ParseError> for AppError {
    fn from(err: crate::parser::ParseError) -> Self {
        AppError::parse(err.to_string())
    }
}

impl From<crate::semantic::CollaboratorError> for AppError {
    fn from(err: crate::semantic::CollaboratorError) -> Self {
        AppError::collaborator(err.to_string())
    }
}

impl From<crate::diff::DiffError> for AppError {
    fn from(err: crate::diff::DiffError) -> Self {
        AppError::MalformedModel {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io {
            message: err.to_string(),
            path: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Io {
            message: format!("JSON: {err}"),
            path: None,
        }
    }
}
