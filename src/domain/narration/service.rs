use super::artifacts::ArtifactLayout;
use super::assembler::Assembler;
use super::error::NarrationError;
use super::model::{Chunk, ChunkArtifact, PipelinePhase, PipelineState};
use super::segmenter::segment;
use super::worker_pool::{PendingChunk, WorkerPool};
use crate::infrastructure::audio::AudioMerger;
use crate::infrastructure::prompt::Confirmation;
use crate::infrastructure::repositories::{ProgressStore, TtsRepository};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Limits and behaviour of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub max_chunk_bytes: usize,
    pub max_unit_bytes: usize,
    pub concurrency: usize,
    /// Skip the confirmation gate for multi-chunk runs
    pub assume_yes: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrationOutcome {
    /// Input held no text; nothing was written
    Empty,
    /// Text fit in one request and was written straight to the output
    SingleShot { output: PathBuf },
    Merged {
        output: PathBuf,
        chunks: usize,
        synthesized: usize,
        reused: usize,
    },
}

pub struct NarrationService {
    tts_repo: Arc<dyn TtsRepository>,
    merger: Arc<dyn AudioMerger>,
    confirmation: Arc<dyn Confirmation>,
    settings: PipelineSettings,
}

impl NarrationService {
    pub fn new(
        tts_repo: Arc<dyn TtsRepository>,
        merger: Arc<dyn AudioMerger>,
        confirmation: Arc<dyn Confirmation>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            tts_repo,
            merger,
            confirmation,
            settings,
        }
    }
}

#[async_trait]
pub trait NarrationServiceApi: Send + Sync {
    /// Synthesize `text` into `output_path`
    ///
    /// This operation:
    /// - Segments the text into provider-legal chunks
    /// - Writes a one-chunk text straight to the output
    /// - Otherwise resumes or creates the progress record beside the output,
    ///   synthesizes the chunks not yet on disk and merges them in order
    ///
    /// A failed run leaves its progress record and finished chunks in place;
    /// calling again with the same output resumes after them.
    async fn narrate(&self, text: &str, output_path: &Path) -> Result<NarrationOutcome, NarrationError>;
}

#[async_trait]
impl NarrationServiceApi for NarrationService {
    async fn narrate(&self, text: &str, output_path: &Path) -> Result<NarrationOutcome, NarrationError> {
        let start_time = Instant::now();
        let layout = ArtifactLayout::for_output(output_path);

        // 1. Segment
        let (chunk_limit, unit_limit) = self.limits();
        tracing::info!(
            phase = %PipelinePhase::Segmenting,
            text_length = text.len(),
            max_chunk_bytes = chunk_limit,
            max_unit_bytes = unit_limit,
            "Segmenting text"
        );
        let chunks = segment(text, chunk_limit, unit_limit);
        let hard_splits = chunks.iter().filter(|c| c.hard_split).count();
        if hard_splits > 0 {
            tracing::warn!(hard_splits = hard_splits, "Oversized words were cut mid-word");
        }

        // 2. Resume takes precedence over the single-shot shortcut
        let existing = ProgressStore::load(&layout.state_path()).await?;
        let Some(total) = Self::planned_total(existing.as_ref(), chunks.len()) else {
            return self.finish_trivial(chunks, &layout).await;
        };
        if let Some(state) = &existing {
            Self::check_stored_chunks(state, chunk_limit, &layout.state_path())?;
        }

        // 3. Confirmation gate
        let pending_estimate = match &existing {
            Some(state) => (0..state.total())
                .filter(|i| !state.is_complete(&layout.chunk(*i).id()))
                .count(),
            None => total,
        };
        if !self.settings.assume_yes && !self.confirmation.confirm(total, pending_estimate).await {
            tracing::warn!(chunks = total, "Synthesis not confirmed");
            return Err(NarrationError::Aborted { chunks: total });
        }

        // 4. Synthesize pending chunks
        let chunk_texts = chunks.into_iter().map(|c| c.text).collect();
        let store = Arc::new(ProgressStore::init_or_resume(layout.state_path(), chunk_texts).await?);
        let state = store.snapshot().await;
        let (pending, reused) = self.plan(&state, &layout, &store).await?;

        tracing::info!(
            phase = %PipelinePhase::Synthesizing,
            provider = self.tts_repo.provider_name(),
            total = state.total(),
            pending = pending.len(),
            reused = reused.len(),
            resumed = store.resumed(),
            concurrency = self.settings.concurrency,
            "Synthesizing chunks"
        );
        let synthesized = WorkerPool::new(self.settings.concurrency)
            .run(pending, Arc::clone(&self.tts_repo), Arc::clone(&store))
            .await?;

        // 5. Assemble
        let synthesized_count = synthesized.len();
        let reused_count = reused.len();
        let mut artifacts = reused;
        artifacts.extend(synthesized);

        tracing::info!(phase = %PipelinePhase::Assembling, chunks = artifacts.len(), "Assembling output");
        Assembler::new(Arc::clone(&self.merger))
            .assemble(&artifacts, state.total(), layout.output_path(), store.path())
            .await?;

        tracing::info!(
            phase = %PipelinePhase::Done,
            output = %layout.output_path().display(),
            chunks = state.total(),
            synthesized = synthesized_count,
            reused = reused_count,
            latency_secs = start_time.elapsed().as_secs_f64(),
            "Narration completed"
        );

        Ok(NarrationOutcome::Merged {
            output: layout.output_path().to_path_buf(),
            chunks: state.total(),
            synthesized: synthesized_count,
            reused: reused_count,
        })
    }
}

impl NarrationService {
    /// Effective ceilings: the configured chunk limit never exceeds what the
    /// provider accepts, and the unit limit never exceeds the chunk limit.
    fn limits(&self) -> (usize, usize) {
        let provider_limit = self.tts_repo.max_request_bytes();
        let chunk_limit = self.settings.max_chunk_bytes.min(provider_limit).max(1);
        if chunk_limit < self.settings.max_chunk_bytes {
            tracing::warn!(
                configured = self.settings.max_chunk_bytes,
                provider_limit = provider_limit,
                provider = self.tts_repo.provider_name(),
                "Chunk limit clamped to provider maximum"
            );
        }
        if self.settings.max_unit_bytes > self.settings.max_chunk_bytes {
            tracing::warn!(
                max_unit_bytes = self.settings.max_unit_bytes,
                max_chunk_bytes = self.settings.max_chunk_bytes,
                "Unit limit exceeds chunk limit, units will be capped at the chunk limit"
            );
        }
        let unit_limit = self.settings.max_unit_bytes.min(chunk_limit).max(1);
        (chunk_limit, unit_limit)
    }

    /// Stored chunks are synthesized as recorded, so each must still fit the
    /// current limit. A lone character wider than the limit is allowed, as the
    /// segmenter emits those too. The record is left as it is on failure.
    fn check_stored_chunks(state: &PipelineState, chunk_limit: usize, path: &Path) -> Result<(), NarrationError> {
        let oversized = state
            .chunks
            .iter()
            .enumerate()
            .find(|(_, text)| text.len() > chunk_limit && text.chars().nth(1).is_some());

        match oversized {
            Some((index, text)) => {
                tracing::error!(
                    chunk_index = index + 1,
                    chunk_bytes = text.len(),
                    max_chunk_bytes = chunk_limit,
                    state_path = %path.display(),
                    "Stored chunk exceeds the current chunk limit"
                );
                Err(NarrationError::StoredChunkTooLarge {
                    path: path.to_path_buf(),
                    index,
                    bytes: text.len(),
                    limit: chunk_limit,
                })
            }
            None => Ok(()),
        }
    }

    /// Number of chunks the multi-chunk path will handle, or None when the
    /// run needs no progress record (empty text or a single chunk).
    fn planned_total(existing: Option<&PipelineState>, fresh_chunks: usize) -> Option<usize> {
        match existing {
            Some(state) if state.total() > 0 => Some(state.total()),
            _ if fresh_chunks > 1 => Some(fresh_chunks),
            _ => None,
        }
    }

    async fn finish_trivial(
        &self,
        chunks: Vec<Chunk>,
        layout: &ArtifactLayout,
    ) -> Result<NarrationOutcome, NarrationError> {
        // An emptied record from an earlier run has nothing to resume
        ProgressStore::clear(&layout.state_path()).await;

        match chunks.into_iter().next() {
            None => {
                tracing::info!("No text to synthesize");
                Ok(NarrationOutcome::Empty)
            }
            Some(chunk) => self.single_shot(chunk, layout.output_path()).await,
        }
    }

    async fn single_shot(&self, chunk: Chunk, output_path: &Path) -> Result<NarrationOutcome, NarrationError> {
        tracing::info!(
            phase = %PipelinePhase::SingleShot,
            provider = self.tts_repo.provider_name(),
            chunk_bytes = chunk.byte_length(),
            "Synthesizing single chunk"
        );

        let audio = self
            .tts_repo
            .synthesize(&chunk.text)
            .await
            .map_err(|source| NarrationError::Synthesis { index: 0, source })?;

        let mut tmp = output_path.as_os_str().to_owned();
        tmp.push(".partial");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, &audio)
            .await
            .map_err(|e| NarrationError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, output_path)
            .await
            .map_err(|e| NarrationError::io(output_path, e))?;

        tracing::info!(
            phase = %PipelinePhase::Done,
            output = %output_path.display(),
            audio_size_bytes = audio.len(),
            "Audio saved"
        );
        Ok(NarrationOutcome::SingleShot {
            output: output_path.to_path_buf(),
        })
    }

    /// Split chunks into those needing synthesis and those already on disk.
    /// A chunk recorded complete whose audio file is gone is re-synthesized.
    async fn plan(
        &self,
        state: &PipelineState,
        layout: &ArtifactLayout,
        store: &ProgressStore,
    ) -> Result<(Vec<PendingChunk>, Vec<ChunkArtifact>), NarrationError> {
        let mut pending = Vec::new();
        let mut reused = Vec::new();

        for (index, text) in state.chunks.iter().enumerate() {
            let artifact = layout.chunk(index);
            let id = artifact.id();
            let recorded = state.is_complete(&id);
            let present = tokio::fs::try_exists(&artifact.audio_path).await.unwrap_or(false);

            if recorded && present {
                tracing::debug!(chunk_index = index + 1, "Chunk already synthesized, skipping");
                reused.push(artifact);
                continue;
            }
            if recorded {
                tracing::warn!(
                    chunk_index = index + 1,
                    audio_path = %artifact.audio_path.display(),
                    "Chunk recorded complete but audio is missing, re-synthesizing"
                );
                store.forget(&id).await?;
            }
            pending.push(PendingChunk {
                index,
                text: text.clone(),
                artifact,
            });
        }

        Ok((pending, reused))
    }
}
