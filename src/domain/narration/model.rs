use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A provider-legal slice of the input text.
///
/// The chunk's index is the position of its audio in the merged output and
/// never changes once the chunk is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
    /// Set when the chunk holds a piece of a word that was cut at a byte offset
    pub hard_split: bool,
}

impl Chunk {
    pub fn byte_length(&self) -> usize {
        self.text.len()
    }
}

/// Durable record of a multi-chunk run.
///
/// `completed` holds artifact file names (see [`ChunkArtifact::id`]), never
/// duplicated, so a chunk recorded twice still counts once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    pub chunks: Vec<String>,
    #[serde(rename = "completed_chunks", default)]
    pub completed: Vec<String>,
}

impl PipelineState {
    pub fn new(chunks: Vec<String>) -> Self {
        Self {
            chunks,
            completed: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_complete(&self, artifact_id: &str) -> bool {
        self.completed.iter().any(|c| c == artifact_id)
    }

    /// Returns false when the artifact was already recorded.
    pub fn mark_complete(&mut self, artifact_id: &str) -> bool {
        if self.is_complete(artifact_id) {
            return false;
        }
        self.completed.push(artifact_id.to_string());
        true
    }

    /// Drops a completion record. Returns false when nothing was recorded.
    pub fn forget(&mut self, artifact_id: &str) -> bool {
        let before = self.completed.len();
        self.completed.retain(|c| c != artifact_id);
        before != self.completed.len()
    }
}

/// Audio file and text sidecar produced for one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkArtifact {
    pub index: usize,
    pub audio_path: PathBuf,
    pub text_sidecar_path: PathBuf,
}

impl ChunkArtifact {
    /// Identifier stored in the progress record: the audio file name, so the
    /// record stays valid when the run is repeated from another directory.
    pub fn id(&self) -> String {
        self.audio_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.audio_path.to_string_lossy().into_owned())
    }
}

/// Completion counter returned after each recorded chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.completed as f64 * 100.0 / self.total as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Segmenting,
    SingleShot,
    Synthesizing,
    Assembling,
    Done,
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelinePhase::Segmenting => "segmenting",
            PipelinePhase::SingleShot => "single_shot",
            PipelinePhase::Synthesizing => "synthesizing",
            PipelinePhase::Assembling => "assembling",
            PipelinePhase::Done => "done",
        };
        f.write_str(name)
    }
}
