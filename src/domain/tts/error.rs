use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("provider rejected request ({status}): {message}")]
    Rejected { status: String, message: String },
    #[error("provider unavailable: {0}")]
    Transport(String),
    #[error("provider returned no audio")]
    EmptyAudio,
    #[error("invalid provider configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<reqwest::Error> for SynthesisError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => SynthesisError::Rejected {
                status: status.to_string(),
                message: err.to_string(),
            },
            None => SynthesisError::Transport(err.to_string()),
        }
    }
}

impl From<SynthesisError> for AppError {
    fn from(err: SynthesisError) -> Self {
        match err {
            SynthesisError::InvalidConfig(_) => AppError::Config(err.to_string()),
            _ => AppError::Synthesis(err.to_string()),
        }
    }
}
