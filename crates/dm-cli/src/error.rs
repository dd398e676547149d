//! Error types for dm-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from dm-core
    #[error(transparent)]
    Core(#[from] dm_core::Error),

    /// Error from dm-fs
    #[error(transparent)]
    Fs(#[from] dm_fs::Error),

    /// Error from the storage engine
    #[error(transparent)]
    Engine(#[from] dm_git::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON given on the command line or printed to it
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Interactive prompt error
    #[error("Interactive prompt error: {0}")]
    Dialoguer(#[from] dialoguer::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_error_displays_message() {
        let error = CliError::user("test error");
        assert_eq!(format!("{}", error), "test error");
    }

    #[test]
    fn core_errors_are_transparent() {
        let error: CliError = dm_core::Error::IncompleteTreePath {
            level: "project".to_string(),
        }
        .into();
        assert!(error.to_string().starts_with("Incomplete tree path"));
    }
}
