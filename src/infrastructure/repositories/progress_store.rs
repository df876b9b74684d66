use crate::domain::narration::{PipelineState, Progress, ProgressError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Durable progress record for one output target, backed by a JSON file.
///
/// Every mutation happens under one lock and is written to disk before the
/// lock is released, so the file always reflects a superset of what any
/// earlier write recorded. Writes go to a temporary file that is renamed over
/// the record, so readers never see a partial document.
///
/// Two processes targeting the same output are not excluded from each other.
pub struct ProgressStore {
    path: PathBuf,
    state: Mutex<PipelineState>,
    resumed: bool,
}

impl ProgressStore {
    /// Read the record at `path`, if any.
    pub async fn load(path: &Path) -> Result<Option<PipelineState>, ProgressError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ProgressError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let state = serde_json::from_slice(&bytes).map_err(|source| ProgressError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(state))
    }

    /// Resume the record at `path`, or create and persist a fresh one holding
    /// `chunks`. A stored chunk list always wins over `chunks`.
    pub async fn init_or_resume(path: PathBuf, chunks: Vec<String>) -> Result<Self, ProgressError> {
        if let Some(state) = Self::load(&path).await? {
            if state.chunks != chunks {
                tracing::warn!(
                    state_file = %path.display(),
                    stored_chunks = state.chunks.len(),
                    fresh_chunks = chunks.len(),
                    "Stored chunk list differs from current input, resuming with stored chunks"
                );
            }
            tracing::info!(
                state_file = %path.display(),
                total = state.total(),
                completed = state.completed.len(),
                "Resuming from saved progress"
            );
            return Ok(Self {
                path,
                state: Mutex::new(state),
                resumed: true,
            });
        }

        let state = PipelineState::new(chunks);
        write_atomic(&path, &state).await?;
        tracing::info!(
            state_file = %path.display(),
            total = state.total(),
            "Created progress record"
        );

        Ok(Self {
            path,
            state: Mutex::new(state),
            resumed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn resumed(&self) -> bool {
        self.resumed
    }

    pub async fn snapshot(&self) -> PipelineState {
        self.state.lock().await.clone()
    }

    /// Record a synthesized chunk and persist the record while still holding
    /// the lock. Recording the same artifact twice is a no-op.
    pub async fn mark_complete(&self, index: usize, artifact_id: &str) -> Result<Progress, ProgressError> {
        let mut state = self.state.lock().await;
        if state.mark_complete(artifact_id) {
            write_atomic(&self.path, &state).await?;
        } else {
            tracing::debug!(chunk_index = index, artifact = artifact_id, "Chunk already recorded");
        }

        Ok(Progress {
            completed: state.completed.len(),
            total: state.total(),
        })
    }

    /// Drop the completion record of an artifact that no longer exists.
    pub async fn forget(&self, artifact_id: &str) -> Result<(), ProgressError> {
        let mut state = self.state.lock().await;
        if state.forget(artifact_id) {
            write_atomic(&self.path, &state).await?;
        }
        Ok(())
    }

    /// Delete the record at `path`. Failures are logged, never returned: a
    /// stray record only makes a later run see a finished state.
    pub async fn clear(path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => tracing::debug!(state_file = %path.display(), "Progress record removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                state_file = %path.display(),
                error = %e,
                "Failed to remove progress record"
            ),
        }
    }
}

async fn write_atomic(path: &Path, state: &PipelineState) -> Result<(), ProgressError> {
    let bytes = serde_json::to_vec_pretty(state)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, &bytes)
        .await
        .map_err(|source| ProgressError::Io {
            path: tmp.clone(),
            source,
        })?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|source| ProgressError::Io {
            path: path.to_path_buf(),
            source,
        })
}
