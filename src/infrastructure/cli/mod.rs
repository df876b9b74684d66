use crate::infrastructure::config::Config;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "tts")]
#[command(about = "Convert documents and web pages to speech audio", version)]
pub struct Cli {
    /// Document path (.txt, .md, .html, .pdf, .doc, .docx) or http(s) URL
    pub input: String,

    /// Output audio file; defaults to the input name with the provider's format
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Provider key from the config file
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Chunks synthesized in parallel
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Largest chunk sent to the provider, in bytes
    #[arg(long)]
    pub max_chunk_bytes: Option<usize>,

    /// Skip the confirmation prompt for multi-chunk runs
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Config file (default: ~/.local/tts-cli/config.json)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Flags win over the config file and environment
    pub fn apply(&self, config: &mut Config) {
        if let Some(provider) = &self.provider {
            config.default_provider = provider.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.pipeline.concurrency = concurrency;
        }
        if let Some(max_chunk_bytes) = self.max_chunk_bytes {
            config.pipeline.max_chunk_bytes = max_chunk_bytes;
        }
        if self.yes {
            config.pipeline.assume_yes = true;
        }
    }
}
