use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tts_cli::domain::tts::SynthesisError;
use tts_cli::infrastructure::audio::{AudioMerger, MergeError};
use tts_cli::infrastructure::prompt::Confirmation;
use tts_cli::infrastructure::repositories::TtsRepository;

type DelayFn = Box<dyn Fn(&str) -> Duration + Send + Sync>;

/// Provider double: the "audio" for a text is the text in brackets.
pub struct FakeTts {
    fail_on: Option<String>,
    delay: DelayFn,
    max_request_bytes: usize,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeTts {
    pub fn new() -> Self {
        Self {
            fail_on: None,
            delay: Box::new(|_| Duration::ZERO),
            max_request_bytes: 4096,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Reject the request whose text equals `text`
    pub fn failing_on(mut self, text: &str) -> Self {
        self.fail_on = Some(text.to_string());
        self
    }

    pub fn with_delay(mut self, delay: impl Fn(&str) -> Duration + Send + Sync + 'static) -> Self {
        self.delay = Box::new(delay);
        self
    }

    pub fn with_max_request_bytes(mut self, max: usize) -> Self {
        self.max_request_bytes = max;
        self
    }

    pub fn audio_for(text: &str) -> Vec<u8> {
        format!("[{}]", text).into_bytes()
    }

    /// Texts requested so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TtsRepository for FakeTts {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthesisError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push(text.to_string());

        tokio::time::sleep((self.delay)(text)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_on.as_deref() == Some(text) {
            return Err(SynthesisError::Rejected {
                status: "500".to_string(),
                message: "scripted failure".to_string(),
            });
        }
        Ok(Self::audio_for(text))
    }

    fn max_request_bytes(&self) -> usize {
        self.max_request_bytes
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

/// Merger double: byte-concatenates inputs in the order given
pub struct ConcatMerger {
    merged: Mutex<Vec<Vec<PathBuf>>>,
}

impl ConcatMerger {
    pub fn new() -> Self {
        Self {
            merged: Mutex::new(Vec::new()),
        }
    }

    /// Input lists of every merge so far
    pub fn merges(&self) -> Vec<Vec<PathBuf>> {
        self.merged.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioMerger for ConcatMerger {
    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<(), MergeError> {
        self.merged.lock().unwrap().push(inputs.to_vec());

        let mut bytes = Vec::new();
        for input in inputs {
            let audio = tokio::fs::read(input).await.map_err(|source| MergeError::Io {
                path: input.clone(),
                source,
            })?;
            bytes.extend(audio);
        }
        tokio::fs::write(output, bytes).await.map_err(|source| MergeError::Io {
            path: output.to_path_buf(),
            source,
        })
    }
}

pub struct FailingMerger;

#[async_trait]
impl AudioMerger for FailingMerger {
    async fn concat(&self, _inputs: &[PathBuf], _output: &Path) -> Result<(), MergeError> {
        Err(MergeError::Failed {
            tool: "ffmpeg".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "scripted merge failure".to_string(),
        })
    }
}

/// Answers "no" and counts how often it was asked
pub struct DeclineConfirm {
    asked: AtomicUsize,
}

impl DeclineConfirm {
    pub fn new() -> Self {
        Self {
            asked: AtomicUsize::new(0),
        }
    }

    pub fn times_asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Confirmation for DeclineConfirm {
    async fn confirm(&self, _total_chunks: usize, _pending_chunks: usize) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        false
    }
}
