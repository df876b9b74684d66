use crate::domain::tts::SynthesisError;
use crate::error::AppError;
use crate::infrastructure::audio::MergeError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("failed to access state file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("state file {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum NarrationError {
    #[error("synthesis failed for chunk {}: {source}", .index + 1)]
    Synthesis {
        index: usize,
        #[source]
        source: SynthesisError,
    },
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error("merge refused, missing chunk indices {missing:?}")]
    Incomplete { missing: Vec<usize> },
    #[error(
        "chunk {} in state file {} is {bytes} bytes, over the current limit of {limit}; \
         restore the earlier limit or delete the state file",
        .index + 1,
        .path.display()
    )]
    StoredChunkTooLarge {
        path: PathBuf,
        index: usize,
        bytes: usize,
        limit: usize,
    },
    #[error("synthesis of {chunks} chunks was not confirmed")]
    Aborted { chunks: usize },
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("worker task failed: {0}")]
    Join(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NarrationError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NarrationError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<NarrationError> for AppError {
    fn from(err: NarrationError) -> Self {
        match err {
            NarrationError::Synthesis { .. } => AppError::Synthesis(err.to_string()),
            NarrationError::Merge(_) | NarrationError::Incomplete { .. } => AppError::Merge(err.to_string()),
            NarrationError::Aborted { .. } => AppError::Aborted(err.to_string()),
            NarrationError::StoredChunkTooLarge { .. } => AppError::Config(err.to_string()),
            NarrationError::Progress(ProgressError::Corrupt { .. }) => AppError::Input(err.to_string()),
            NarrationError::Progress(_)
            | NarrationError::Io { .. }
            | NarrationError::Join(_)
            | NarrationError::Other(_) => AppError::Internal(err.to_string()),
        }
    }
}
