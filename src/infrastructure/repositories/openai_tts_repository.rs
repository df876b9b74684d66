use super::tts_repository::TtsRepository;
use crate::domain::tts::{LanguageCode, SynthesisError};
use crate::infrastructure::config::{AudioFormat, OpenAiConfig};
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{CreateSpeechRequest, SpeechModel, SpeechResponseFormat, Voice},
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;

/// OpenAI has a limit of 4096 characters per request
const MAX_BATCH_SIZE: usize = 4096;

const DEFAULT_MODEL: &str = "tts-1";

/// OpenAI TTS implementation of TTS repository
pub struct OpenAiTtsRepository {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
    voice: String,
    response_format: SpeechResponseFormat,
    max_request_bytes: usize,
}

impl OpenAiTtsRepository {
    pub fn new(client: Arc<Client<OpenAIConfig>>, config: &OpenAiConfig, language: LanguageCode) -> Self {
        let voice = config
            .voice
            .clone()
            .unwrap_or_else(|| Self::get_voice_for_language(language).to_string());
        let response_format = match config.output_format {
            AudioFormat::Mp3 => SpeechResponseFormat::Mp3,
            AudioFormat::Wav => SpeechResponseFormat::Wav,
            AudioFormat::Ogg => SpeechResponseFormat::Opus,
        };

        Self {
            client,
            model: config.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            voice,
            response_format,
            max_request_bytes: config.max_text_length.unwrap_or(MAX_BATCH_SIZE).min(MAX_BATCH_SIZE),
        }
    }

    /// Select the appropriate OpenAI voice for a language
    /// Based on voice characteristics that suit each language
    fn get_voice_for_language(language: LanguageCode) -> &'static str {
        match language {
            LanguageCode::English => "alloy",     // Neutral American accent
            LanguageCode::Spanish => "echo",      // Warm, clear for Spanish
            LanguageCode::French => "nova",       // Soft, suitable for French
            LanguageCode::German => "onyx",       // Clear, authoritative
            LanguageCode::Italian => "fable",     // Expressive for Italian
            LanguageCode::Portuguese => "shimmer", // Clear articulation
        }
    }

    fn speech_model(&self) -> SpeechModel {
        match self.model.as_str() {
            "tts-1" => SpeechModel::Tts1,
            "tts-1-hd" => SpeechModel::Tts1Hd,
            other => SpeechModel::Other(other.to_string()),
        }
    }

    fn speech_voice(&self) -> Voice {
        match self.voice.to_lowercase().as_str() {
            "alloy" => Voice::Alloy,
            "echo" => Voice::Echo,
            "fable" => Voice::Fable,
            "onyx" => Voice::Onyx,
            "nova" => Voice::Nova,
            "shimmer" => Voice::Shimmer,
            other => {
                tracing::warn!(voice = other, "Unknown OpenAI voice, using alloy");
                Voice::Alloy
            }
        }
    }
}

#[async_trait]
impl TtsRepository for OpenAiTtsRepository {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthesisError> {
        let start_time = std::time::Instant::now();

        tracing::debug!(
            model = %self.model,
            voice = %self.voice,
            text_length = text.len(),
            "Calling OpenAI TTS API"
        );

        let request = CreateSpeechRequest {
            model: self.speech_model(),
            input: text.to_string(),
            voice: self.speech_voice(),
            response_format: Some(self.response_format.clone()),
            speed: None, // Defaults to 1.0
        };

        let response = self.client.audio().speech(request).await.map_err(|e| {
            tracing::error!(
                error = %e,
                model = %self.model,
                voice = %self.voice,
                text_length = text.len(),
                "OpenAI TTS API call failed"
            );
            match e {
                OpenAIError::ApiError(api) => SynthesisError::Rejected {
                    status: api.r#type.unwrap_or_else(|| "api_error".to_string()),
                    message: api.message,
                },
                other => SynthesisError::Transport(format!("OpenAI TTS error: {}", other)),
            }
        })?;

        let audio_bytes = response.bytes.to_vec();
        if audio_bytes.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }

        tracing::debug!(
            provider = "openai",
            latency_ms = start_time.elapsed().as_millis(),
            audio_size_bytes = audio_bytes.len(),
            "OpenAI TTS audio received"
        );

        Ok(audio_bytes)
    }

    fn max_request_bytes(&self) -> usize {
        self.max_request_bytes
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}
