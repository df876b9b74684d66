use super::tts_repository::TtsRepository;
use crate::domain::tts::{LanguageCode, SynthesisError};
use crate::infrastructure::config::{AudioFormat, AzureConfig};
use async_trait::async_trait;
use std::time::Duration;

/// Azure Speech accepts up to this many characters in one synthesis request
const MAX_BATCH_SIZE: usize = 5000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Azure Speech REST implementation of TTS repository
pub struct AzureTtsRepository {
    http: reqwest::Client,
    endpoint: String,
    speech_key: String,
    voice: String,
    output_format: &'static str,
    max_request_bytes: usize,
}

impl AzureTtsRepository {
    pub fn new(config: &AzureConfig, language: LanguageCode) -> Result<Self, SynthesisError> {
        let endpoint = format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            config.service_region
        );
        Self::with_endpoint(config, language, endpoint)
    }

    pub fn with_endpoint(
        config: &AzureConfig,
        language: LanguageCode,
        endpoint: impl Into<String>,
    ) -> Result<Self, SynthesisError> {
        if config.speech_key.trim().is_empty() {
            return Err(SynthesisError::InvalidConfig("Azure speech_key is empty".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("tts-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            speech_key: config.speech_key.clone(),
            voice: config
                .voice
                .clone()
                .unwrap_or_else(|| Self::get_voice_for_language(language).to_string()),
            output_format: Self::output_format_header(config.output_format),
            max_request_bytes: config.max_text_length.unwrap_or(MAX_BATCH_SIZE).min(MAX_BATCH_SIZE),
        })
    }

    /// Select the appropriate neural voice for a language
    fn get_voice_for_language(language: LanguageCode) -> &'static str {
        match language {
            LanguageCode::English => "en-US-JennyNeural",
            LanguageCode::Spanish => "es-ES-ElviraNeural",
            LanguageCode::French => "fr-FR-DeniseNeural",
            LanguageCode::German => "de-DE-KatjaNeural",
            LanguageCode::Italian => "it-IT-ElsaNeural",
            LanguageCode::Portuguese => "pt-BR-FranciscaNeural",
        }
    }

    fn output_format_header(format: AudioFormat) -> &'static str {
        match format {
            AudioFormat::Mp3 => "audio-16khz-128kbitrate-mono-mp3",
            AudioFormat::Wav => "riff-16khz-16bit-mono-pcm",
            AudioFormat::Ogg => "ogg-16khz-16bit-mono-opus",
        }
    }

    /// Locale prefix of a voice name, `en-US` for `en-US-JennyNeural`
    fn voice_locale(voice: &str) -> &str {
        let mut dashes = voice.match_indices('-').map(|(i, _)| i);
        match (dashes.next(), dashes.next()) {
            (Some(_), Some(second)) => &voice[..second],
            _ => "en-US",
        }
    }

    fn ssml(&self, text: &str) -> String {
        format!(
            "<speak version='1.0' xml:lang='{locale}'><voice name='{voice}'>{text}</voice></speak>",
            locale = Self::voice_locale(&self.voice),
            voice = xml_escape(&self.voice),
            text = xml_escape(text),
        )
    }
}

fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[async_trait]
impl TtsRepository for AzureTtsRepository {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthesisError> {
        tracing::debug!(
            voice = %self.voice,
            output_format = self.output_format,
            text_length = text.len(),
            "Calling Azure Speech synthesis"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header("Ocp-Apim-Subscription-Key", &self.speech_key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", self.output_format)
            .body(self.ssml(text))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                voice = %self.voice,
                text_length = text.len(),
                "Azure Speech synthesis failed"
            );
            return Err(SynthesisError::Rejected {
                status: status.as_u16().to_string(),
                message,
            });
        }

        let audio_bytes = response.bytes().await?.to_vec();
        if audio_bytes.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }
        Ok(audio_bytes)
    }

    fn max_request_bytes(&self) -> usize {
        self.max_request_bytes
    }

    fn provider_name(&self) -> &'static str {
        "azure"
    }
}
