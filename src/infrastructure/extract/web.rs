use super::{clean_text, ExtractError};
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Download `url` and return its readable text.
///
/// HTML pages are converted with [`clean_text`]; `text/plain` bodies are
/// returned as is. Anything else is rejected.
pub async fn fetch_url(url: &Url) -> Result<String, ExtractError> {
    let fetch_error = |message: String| ExtractError::Fetch {
        url: url.to_string(),
        message,
    };

    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(concat!("tts-cli/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| fetch_error(e.to_string()))?;

    tracing::debug!(url = %url, "Fetching page");
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| fetch_error(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(fetch_error(format!("HTTP {}", status)));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("text/html")
        .to_ascii_lowercase();

    let body = response.text().await.map_err(|e| fetch_error(e.to_string()))?;

    if content_type.contains("html") {
        Ok(clean_text(&body))
    } else if content_type.starts_with("text/plain") {
        Ok(body)
    } else {
        Err(ExtractError::UnsupportedFormat(content_type))
    }
}
