use super::error::NarrationError;
use super::model::ChunkArtifact;
use crate::infrastructure::repositories::{ProgressStore, TtsRepository};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

/// One chunk still waiting for audio
#[derive(Debug, Clone)]
pub struct PendingChunk {
    pub index: usize,
    pub text: String,
    pub artifact: ChunkArtifact,
}

/// Bounded pool running one synthesis call per pending chunk.
///
/// Chunks are dispatched in the order given; a permit is taken before each
/// task is spawned, so a concurrency of 1 runs strictly in order. Once a
/// failure is observed no further chunk is dispatched; chunks already in
/// flight finish and are recorded, then the first error is returned.
pub struct WorkerPool {
    concurrency: usize,
}

type UnitResult = Result<Result<ChunkArtifact, NarrationError>, JoinError>;

impl WorkerPool {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns the artifacts synthesized by this run, in completion order.
    pub async fn run(
        &self,
        pending: Vec<PendingChunk>,
        tts: Arc<dyn TtsRepository>,
        store: Arc<ProgressStore>,
    ) -> Result<Vec<ChunkArtifact>, NarrationError> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        // Raised by a failing task before it gives its permit back
        let failed = Arc::new(AtomicBool::new(false));
        let mut tasks = JoinSet::new();
        let mut completed = Vec::with_capacity(pending.len());
        let mut failure: Option<NarrationError> = None;

        for unit in pending {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            while let Some(joined) = tasks.try_join_next() {
                record(joined, &mut completed, &mut failure);
            }
            if failure.is_some() || failed.load(Ordering::SeqCst) {
                break;
            }

            let tts = Arc::clone(&tts);
            let store = Arc::clone(&store);
            let failed = Arc::clone(&failed);
            tasks.spawn(async move {
                let result = synthesize_chunk(unit, tts.as_ref(), store.as_ref()).await;
                if result.is_err() {
                    failed.store(true, Ordering::SeqCst);
                }
                drop(permit);
                result
            });
        }

        while let Some(joined) = tasks.join_next().await {
            record(joined, &mut completed, &mut failure);
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(completed),
        }
    }
}

fn record(joined: UnitResult, completed: &mut Vec<ChunkArtifact>, failure: &mut Option<NarrationError>) {
    let err = match joined {
        Ok(Ok(artifact)) => {
            completed.push(artifact);
            return;
        }
        Ok(Err(err)) => err,
        Err(join_err) => NarrationError::Join(join_err.to_string()),
    };

    if failure.is_none() {
        *failure = Some(err);
    } else {
        tracing::warn!(error = %err, "Additional chunk failure while draining workers");
    }
}

/// Sidecar, synthesis, audio file, then the completion record. A chunk is
/// only recorded once its audio is on disk.
async fn synthesize_chunk(
    unit: PendingChunk,
    tts: &dyn TtsRepository,
    store: &ProgressStore,
) -> Result<ChunkArtifact, NarrationError> {
    let sidecar = &unit.artifact.text_sidecar_path;
    tokio::fs::write(sidecar, &unit.text)
        .await
        .map_err(|e| NarrationError::io(sidecar, e))?;

    tracing::info!(
        chunk_index = unit.index + 1,
        chunk_bytes = unit.text.len(),
        audio_path = %unit.artifact.audio_path.display(),
        "Synthesizing chunk"
    );

    let start_time = Instant::now();
    let audio = tts
        .synthesize(&unit.text)
        .await
        .map_err(|source| {
            tracing::error!(
                chunk_index = unit.index + 1,
                provider = tts.provider_name(),
                error = %source,
                "Chunk synthesis failed"
            );
            NarrationError::Synthesis {
                index: unit.index,
                source,
            }
        })?;

    let audio_path = &unit.artifact.audio_path;
    tokio::fs::write(audio_path, &audio)
        .await
        .map_err(|e| NarrationError::io(audio_path, e))?;

    let progress = store.mark_complete(unit.index, &unit.artifact.id()).await?;
    tracing::info!(
        chunk_index = unit.index + 1,
        completed = progress.completed,
        total = progress.total,
        progress = format!("{:.1}%", progress.percent()),
        latency_ms = start_time.elapsed().as_millis() as u64,
        audio_size_bytes = audio.len(),
        "Chunk saved"
    );

    Ok(unit.artifact)
}
