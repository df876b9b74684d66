//! Turns an input argument (a document path or an http(s) URL) into the plain
//! text handed to the narration pipeline.

mod document;
mod web;

pub use document::read_document;
pub use web::fetch_url;

use html2text::from_read;
use regex::Regex;
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("unsupported input format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("{tool} failed: {message}")]
    Tool { tool: String, message: String },
    #[error("malformed document {}: {message}", .path.display())]
    Document { path: PathBuf, message: String },
}

/// Where the text comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    File(PathBuf),
    Url(Url),
}

impl InputSource {
    pub fn parse(input: &str) -> Result<Self, ExtractError> {
        let lower = input.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            let url = Url::parse(input).map_err(|e| ExtractError::Fetch {
                url: input.to_string(),
                message: e.to_string(),
            })?;
            return Ok(InputSource::Url(url));
        }
        Ok(InputSource::File(PathBuf::from(input)))
    }

    /// Output path used when none is given: the input path with the audio
    /// extension for files, `<last path segment or host>.<ext>` in the
    /// current directory for URLs.
    pub fn default_output(&self, extension: &str) -> PathBuf {
        match self {
            InputSource::File(path) => path.with_extension(extension),
            InputSource::Url(url) => {
                let segment = url
                    .path_segments()
                    .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                    .and_then(|s| Path::new(s).file_stem().map(|stem| stem.to_string_lossy().into_owned()));
                let name = segment
                    .or_else(|| url.host_str().map(str::to_string))
                    .unwrap_or_else(|| "narration".to_string());
                PathBuf::from(format!("{}.{}", sanitize_file_name(&name), extension))
            }
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            InputSource::File(path) => path.display().to_string(),
            InputSource::Url(url) => url.to_string(),
        }
    }
}

/// Read or download the text behind `source`
pub async fn extract(source: &InputSource) -> Result<String, ExtractError> {
    let text = match source {
        InputSource::File(path) => read_document(path).await?,
        InputSource::Url(url) => fetch_url(url).await?,
    };
    tracing::info!(
        source = %source.display_name(),
        text_length = text.len(),
        "Text extracted"
    );
    Ok(text)
}

/// Convert HTML to plain text, drop URLs and collapse whitespace
pub fn clean_text(html: &str) -> String {
    static URL_PATTERN: OnceLock<Regex> = OnceLock::new();
    static WHITESPACE_PATTERN: OnceLock<Regex> = OnceLock::new();

    let plain_text = from_read(html.as_bytes(), usize::MAX);

    let url_pattern = URL_PATTERN.get_or_init(|| Regex::new(r"https?://[^\s]+").expect("valid regex"));
    let without_urls = url_pattern.replace_all(&plain_text, "");

    let whitespace_pattern = WHITESPACE_PATTERN.get_or_init(|| Regex::new(r"\s+").expect("valid regex"));
    let normalized = whitespace_pattern.replace_all(&without_urls, " ");

    normalized.trim().to_string()
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() {
        "narration".to_string()
    } else {
        cleaned
    }
}
