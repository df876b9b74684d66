use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tts_cli::domain::narration::{segment, NarrationService, PipelineSettings};
use tts_cli::infrastructure::audio::AudioMerger;
use tts_cli::infrastructure::prompt::{AutoConfirm, Confirmation};

pub mod fakes;

pub use fakes::{ConcatMerger, DeclineConfirm, FailingMerger, FakeTts};

/// A scratch directory holding one narration target, `book.mp3`
pub struct TestContext {
    pub dir: TempDir,
    pub output: PathBuf,
}

impl TestContext {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let output = dir.path().join("book.mp3");
        Self { dir, output }
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.path().join("book-state.json")
    }

    /// Chunk audio file, numbered from 1 like on disk
    pub fn part(&self, number: usize) -> PathBuf {
        self.dir.path().join(format!("book_part{}.mp3", number))
    }

    pub fn service(
        &self,
        tts: Arc<FakeTts>,
        merger: Arc<dyn AudioMerger>,
        settings: PipelineSettings,
    ) -> NarrationService {
        NarrationService::new(tts, merger, Arc::new(AutoConfirm), settings)
    }

    pub fn service_with_confirmation(
        &self,
        tts: Arc<FakeTts>,
        confirmation: Arc<dyn Confirmation>,
        settings: PipelineSettings,
    ) -> NarrationService {
        NarrationService::new(tts, Arc::new(ConcatMerger::new()), confirmation, settings)
    }

    /// File names left in the directory, sorted
    pub fn files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dir.path())
            .expect("Failed to list temp dir")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    pub fn read_output(&self) -> Vec<u8> {
        std::fs::read(&self.output).expect("Output not written")
    }
}

pub fn settings(max_chunk_bytes: usize, concurrency: usize) -> PipelineSettings {
    PipelineSettings {
        max_chunk_bytes,
        max_unit_bytes: max_chunk_bytes,
        concurrency,
        assume_yes: true,
    }
}

/// Twelve short numbered sentences, about 400 bytes
pub fn sample_text() -> String {
    (1..=12)
        .map(|i| format!("Sentence number {} is right here.", i))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn chunk_texts(text: &str, max_chunk_bytes: usize) -> Vec<String> {
    segment(text, max_chunk_bytes, max_chunk_bytes)
        .into_iter()
        .map(|c| c.text)
        .collect()
}

/// What an uninterrupted run produces with [`FakeTts`] and [`ConcatMerger`]
pub fn expected_audio(text: &str, max_chunk_bytes: usize) -> Vec<u8> {
    chunk_texts(text, max_chunk_bytes)
        .iter()
        .flat_map(|chunk| FakeTts::audio_for(chunk))
        .collect()
}
