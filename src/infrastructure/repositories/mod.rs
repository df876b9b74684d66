pub mod azure_tts_repository;
pub mod openai_tts_repository;
pub mod polly_tts_repository;
pub mod progress_store;
pub mod tts_repository;

pub use azure_tts_repository::AzureTtsRepository;
pub use openai_tts_repository::OpenAiTtsRepository;
pub use polly_tts_repository::PollyTtsRepository;
pub use progress_store::ProgressStore;
pub use tts_repository::TtsRepository;

use crate::domain::tts::{LanguageCode, SynthesisError};
use crate::infrastructure::config::ProviderConfig;
use std::sync::Arc;

/// Instantiate the provider client described by `provider`.
///
/// `language` picks a default voice when the provider entry names none.
pub async fn build_tts_repository(
    provider: &ProviderConfig,
    language: LanguageCode,
) -> Result<Arc<dyn TtsRepository>, SynthesisError> {
    match provider {
        ProviderConfig::Azure(config) => Ok(Arc::new(AzureTtsRepository::new(config, language)?)),
        ProviderConfig::Polly(config) => {
            let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
            if let Some(region) = &config.region {
                loader = loader.region(aws_config::Region::new(region.clone()));
            }
            let aws_config = loader.load().await;

            tracing::debug!(region = ?aws_config.region(), "AWS configuration loaded");
            if aws_config.region().is_none() {
                return Err(SynthesisError::InvalidConfig(
                    "no AWS region configured for Polly".to_string(),
                ));
            }

            let polly_client = Arc::new(aws_sdk_polly::Client::new(&aws_config));
            Ok(Arc::new(PollyTtsRepository::new(polly_client, config, language)?))
        }
        ProviderConfig::OpenAi(config) => {
            let mut client_config = async_openai::config::OpenAIConfig::new();
            if let Some(key) = &config.api_key {
                client_config = client_config.with_api_key(key);
            }
            let client = Arc::new(async_openai::Client::with_config(client_config));
            Ok(Arc::new(OpenAiTtsRepository::new(client, config, language)))
        }
    }
}
