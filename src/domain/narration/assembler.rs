use super::error::NarrationError;
use super::model::ChunkArtifact;
use crate::infrastructure::audio::AudioMerger;
use crate::infrastructure::repositories::ProgressStore;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Orders completed chunk artifacts, merges them and removes intermediates.
pub struct Assembler {
    merger: Arc<dyn AudioMerger>,
}

impl Assembler {
    pub fn new(merger: Arc<dyn AudioMerger>) -> Self {
        Self { merger }
    }

    /// Merge `artifacts` into `output_path`, sorted by chunk index regardless
    /// of the order they completed in.
    ///
    /// Refuses to merge unless every index in `0..total` is present. On
    /// success the chunk audio, sidecars and the progress record at
    /// `state_path` are deleted; deletion failures are only logged.
    pub async fn assemble(
        &self,
        artifacts: &[ChunkArtifact],
        total: usize,
        output_path: &Path,
        state_path: &Path,
    ) -> Result<(), NarrationError> {
        let mut ordered: Vec<&ChunkArtifact> = artifacts.iter().collect();
        ordered.sort_by_key(|a| a.index);
        ordered.dedup_by_key(|a| a.index);

        let missing = missing_indices(&ordered, total);
        if !missing.is_empty() {
            tracing::warn!(
                total = total,
                missing = ?missing,
                "Chunk set incomplete, merge skipped"
            );
            return Err(NarrationError::Incomplete { missing });
        }

        let inputs: Vec<PathBuf> = ordered
            .iter()
            .filter(|a| a.index < total)
            .map(|a| a.audio_path.clone())
            .collect();
        self.merger.concat(&inputs, output_path).await?;
        tracing::info!(
            output = %output_path.display(),
            chunks = inputs.len(),
            "Merged audio saved"
        );

        for artifact in &ordered {
            remove_intermediate(&artifact.audio_path).await;
            remove_intermediate(&artifact.text_sidecar_path).await;
        }
        ProgressStore::clear(state_path).await;

        Ok(())
    }
}

fn missing_indices(ordered: &[&ChunkArtifact], total: usize) -> Vec<usize> {
    let mut present = ordered.iter().map(|a| a.index).peekable();
    let mut missing = Vec::new();
    for index in 0..total {
        while present.next_if(|i| *i < index).is_some() {}
        if present.next_if_eq(&index).is_none() {
            missing.push(index);
        }
    }
    missing
}

async fn remove_intermediate(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed temporary file"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            path = %path.display(),
            error = %e,
            "Failed to remove temporary file"
        ),
    }
}
