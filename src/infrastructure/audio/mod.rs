//! Lossless concatenation of same-codec audio files through ffmpeg's concat
//! demuxer.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Longest stderr excerpt kept in a merge error
const STDERR_TAIL_BYTES: usize = 2000;

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("{0} not found on PATH")]
    ToolNotFound(String),
    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },
    #[error("merge I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait AudioMerger: Send + Sync {
    /// Concatenate `inputs` in the given order into `output` without
    /// re-encoding. All inputs share one codec and container.
    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<(), MergeError>;
}

pub struct FfmpegMerger {
    binary: String,
}

impl FfmpegMerger {
    pub fn new() -> Self {
        Self::with_binary("ffmpeg")
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for FfmpegMerger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioMerger for FfmpegMerger {
    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<(), MergeError> {
        let list_path = filelist_path(output);
        let mut absolute = Vec::with_capacity(inputs.len());
        for input in inputs {
            let path = tokio::fs::canonicalize(input)
                .await
                .map_err(|source| MergeError::Io {
                    path: input.clone(),
                    source,
                })?;
            absolute.push(path);
        }

        tokio::fs::write(&list_path, filelist_contents(&absolute))
            .await
            .map_err(|source| MergeError::Io {
                path: list_path.clone(),
                source,
            })?;

        tracing::info!(
            tool = %self.binary,
            inputs = inputs.len(),
            output = %output.display(),
            "Merging chunk audio"
        );

        let result = Command::new(&self.binary)
            .arg("-y")
            .args(["-f", "concat", "-safe", "0", "-i"])
            .arg(&list_path)
            .args(["-c", "copy"])
            .arg(output)
            .output()
            .await;

        if let Err(e) = tokio::fs::remove_file(&list_path).await {
            tracing::warn!(path = %list_path.display(), error = %e, "Failed to remove merge list");
        }

        let output = match result {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(MergeError::ToolNotFound(self.binary.clone()))
            }
            Err(source) => {
                return Err(MergeError::Io {
                    path: PathBuf::from(&self.binary),
                    source,
                })
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail_start = stderr.len().saturating_sub(STDERR_TAIL_BYTES);
            let tail_start = (tail_start..stderr.len())
                .find(|i| stderr.is_char_boundary(*i))
                .unwrap_or(stderr.len());
            return Err(MergeError::Failed {
                tool: self.binary.clone(),
                status: output.status.to_string(),
                stderr: stderr[tail_start..].trim().to_string(),
            });
        }

        Ok(())
    }
}

fn filelist_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!("{}_filelist.txt", stem))
}

/// Concat demuxer script; single quotes inside paths are closed, escaped and
/// reopened.
fn filelist_contents(inputs: &[PathBuf]) -> String {
    inputs
        .iter()
        .map(|path| {
            let escaped = path.to_string_lossy().replace('\'', r"'\''");
            format!("file '{}'\n", escaped)
        })
        .collect()
}
