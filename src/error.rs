use crate::infrastructure::config::ConfigError;
use crate::infrastructure::extract::ExtractError;
use std::process::ExitCode;

/// Main application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    #[error("Merge failed: {0}")]
    Merge(String),

    #[error("Aborted: {0}")]
    Aborted(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Internal(_) => 1,
            Self::Config(_) => 2,
            Self::Input(_) => 3,
            Self::Synthesis(_) => 4,
            Self::Merge(_) => 5,
            Self::Aborted(_) => 6,
        }
    }
}

impl From<&AppError> for ExitCode {
    fn from(err: &AppError) -> Self {
        ExitCode::from(err.exit_code())
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        AppError::Input(err.to_string())
    }
}

/// Custom result type for the application
pub type AppResult<T> = Result<T, AppError>;
