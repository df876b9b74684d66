use async_trait::async_trait;
use std::io::{self, BufRead, IsTerminal, Write};

/// Human-in-the-loop gate before a multi-chunk run is billed.
#[async_trait]
pub trait Confirmation: Send + Sync {
    async fn confirm(&self, total_chunks: usize, pending_chunks: usize) -> bool;
}

/// Accepts without asking
pub struct AutoConfirm;

#[async_trait]
impl Confirmation for AutoConfirm {
    async fn confirm(&self, _total_chunks: usize, _pending_chunks: usize) -> bool {
        true
    }
}

/// Asks on the terminal. Declines when stdin is not a terminal, since no
/// one can answer; pass `--yes` for unattended runs.
pub struct StdinConfirmation;

#[async_trait]
impl Confirmation for StdinConfirmation {
    async fn confirm(&self, total_chunks: usize, pending_chunks: usize) -> bool {
        let answer = tokio::task::spawn_blocking(move || {
            if !io::stdin().is_terminal() {
                tracing::warn!("Confirmation required but stdin is not a terminal");
                return false;
            }

            let mut stderr = io::stderr();
            let _ = write!(
                stderr,
                "Text splits into {} chunks, {} to synthesize. Continue? [y/N] ",
                total_chunks, pending_chunks
            );
            let _ = stderr.flush();

            let mut line = String::new();
            if io::stdin().lock().read_line(&mut line).is_err() {
                return false;
            }
            is_yes(&line)
        })
        .await;

        answer.unwrap_or(false)
    }
}

fn is_yes(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}
