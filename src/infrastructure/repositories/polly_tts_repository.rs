use super::tts_repository::TtsRepository;
use crate::domain::tts::{LanguageCode, SynthesisError};
use crate::infrastructure::config::{AudioFormat, PollyConfig};
use async_trait::async_trait;
use aws_sdk_polly::{
    types::{Engine, OutputFormat, VoiceId},
    Client as PollyClient,
};
use std::sync::Arc;

/// AWS Polly has a limit of 3000 characters per request
const MAX_BATCH_SIZE: usize = 3000;

/// AWS Polly implementation of TTS repository
pub struct PollyTtsRepository {
    polly_client: Arc<PollyClient>,
    voice: String,
    engine: Engine,
    output_format: OutputFormat,
    max_request_bytes: usize,
}

impl PollyTtsRepository {
    pub fn new(
        polly_client: Arc<PollyClient>,
        config: &PollyConfig,
        language: LanguageCode,
    ) -> Result<Self, SynthesisError> {
        let output_format = match config.output_format {
            AudioFormat::Mp3 => OutputFormat::Mp3,
            AudioFormat::Ogg => OutputFormat::OggVorbis,
            AudioFormat::Wav => {
                return Err(SynthesisError::InvalidConfig(
                    "Polly cannot produce wav, use mp3 or ogg".to_string(),
                ))
            }
        };

        let voice = config
            .voice
            .clone()
            .unwrap_or_else(|| Self::get_voice_for_language(language).to_string());
        let engine = config
            .engine
            .as_deref()
            .map(Engine::from)
            .unwrap_or(Engine::Neural);

        Ok(Self {
            polly_client,
            voice,
            engine,
            output_format,
            max_request_bytes: config.max_text_length.unwrap_or(MAX_BATCH_SIZE).min(MAX_BATCH_SIZE),
        })
    }

    /// Select the appropriate Polly voice for a language
    fn get_voice_for_language(language: LanguageCode) -> &'static str {
        match language {
            LanguageCode::English => "Joanna",
            LanguageCode::Spanish => "Lupe",
            LanguageCode::French => "Lea",
            LanguageCode::German => "Vicki",
            LanguageCode::Italian => "Bianca",
            LanguageCode::Portuguese => "Ines",
        }
    }
}

#[async_trait]
impl TtsRepository for PollyTtsRepository {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthesisError> {
        let voice_id = VoiceId::from(self.voice.as_str());

        tracing::debug!(
            voice = %self.voice,
            engine = ?self.engine,
            output_format = ?self.output_format,
            text_length = text.len(),
            "Calling AWS Polly synthesize_speech"
        );

        let result = self
            .polly_client
            .synthesize_speech()
            .text(text)
            .voice_id(voice_id)
            .output_format(self.output_format.clone())
            .engine(self.engine.clone())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = ?e,
                    error_display = %e,
                    voice = %self.voice,
                    engine = ?self.engine,
                    text_length = text.len(),
                    "AWS Polly synthesize_speech failed"
                );
                match e.raw_response() {
                    Some(raw) => SynthesisError::Rejected {
                        status: raw.status().as_u16().to_string(),
                        message: format!("{:?}", e),
                    },
                    None => SynthesisError::Transport(format!("AWS Polly error: {:?}", e)),
                }
            })?;

        let audio_stream = result.audio_stream.collect().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to collect audio stream from Polly response");
            SynthesisError::Transport(format!("Failed to read audio stream: {}", e))
        })?;

        let audio_bytes = audio_stream.into_bytes().to_vec();
        if audio_bytes.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }
        Ok(audio_bytes)
    }

    fn max_request_bytes(&self) -> usize {
        self.max_request_bytes
    }

    fn provider_name(&self) -> &'static str {
        "polly"
    }
}
