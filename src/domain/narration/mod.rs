pub mod artifacts;
pub mod assembler;
pub mod error;
pub mod model;
pub mod segmenter;
pub mod service;
pub mod worker_pool;

pub use artifacts::ArtifactLayout;
pub use assembler::Assembler;
pub use error::{NarrationError, ProgressError};
pub use model::{Chunk, ChunkArtifact, PipelinePhase, PipelineState, Progress};
pub use segmenter::segment;
pub use service::{NarrationOutcome, NarrationService, NarrationServiceApi, PipelineSettings};
pub use worker_pool::{PendingChunk, WorkerPool};
