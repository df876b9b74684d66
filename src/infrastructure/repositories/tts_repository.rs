use crate::domain::tts::SynthesisError;
use async_trait::async_trait;

/// Repository for TTS synthesis operations.
/// Abstracts the underlying TTS provider (Azure Speech, AWS Polly, OpenAI)
///
/// Implementations synthesize exactly the text they are given in one request.
/// Splitting long documents is the narration pipeline's job; callers never
/// pass more than `max_request_bytes` bytes.
#[async_trait]
pub trait TtsRepository: Send + Sync {
    /// Synthesize one chunk of text
    ///
    /// Returns encoded audio in the provider's configured output format
    ///
    /// # Errors
    /// Returns error if the provider rejects the request or is unreachable
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthesisError>;

    /// Largest request the provider accepts, in bytes of UTF-8 text
    fn max_request_bytes(&self) -> usize;

    fn provider_name(&self) -> &'static str;
}
