use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    domain::{
        narration::{ArtifactLayout, NarrationOutcome, NarrationService, NarrationServiceApi},
        tts::{detect_language, LanguageCode},
    },
    error::{AppError, AppResult},
    infrastructure::{
        audio::AudioMerger,
        config::Config,
        extract::{extract, InputSource},
        prompt::Confirmation,
        repositories::build_tts_repository,
    },
};

/// Handles one `tts <input>` invocation: extraction, provider selection and
/// the narration pipeline.
pub struct NarrateController {
    config: Arc<Config>,
    merger: Arc<dyn AudioMerger>,
    confirmation: Arc<dyn Confirmation>,
}

impl NarrateController {
    pub fn new(config: Arc<Config>, merger: Arc<dyn AudioMerger>, confirmation: Arc<dyn Confirmation>) -> Self {
        Self {
            config,
            merger,
            confirmation,
        }
    }

    pub async fn narrate(&self, input: &str, output: Option<&Path>) -> AppResult<NarrationOutcome> {
        let source = InputSource::parse(input)?;
        let (provider_key, provider) = self.config.provider()?;
        let output_format = provider.output_format();

        tracing::info!(
            provider_key = provider_key,
            provider_type = provider.kind(),
            output_format = output_format.extension(),
            "Using provider"
        );

        let text = extract(&source).await?;

        let output_path: PathBuf = match output {
            Some(path) => path.to_path_buf(),
            None => source.default_output(output_format.extension()),
        };
        let text_path = ArtifactLayout::for_output(&output_path).text_path();
        tokio::fs::write(&text_path, &text)
            .await
            .map_err(|e| AppError::Internal(format!("failed to write {}: {}", text_path.display(), e)))?;
        tracing::info!(path = %text_path.display(), "Text saved");

        let language = match provider.voice() {
            Some(_) => LanguageCode::English,
            None if text.trim().is_empty() => LanguageCode::English,
            None => {
                let language = detect_language(&text);
                tracing::info!(language = %language, "No voice configured, detected language");
                language
            }
        };

        let tts_repo = build_tts_repository(provider, language).await?;
        let service = NarrationService::new(
            tts_repo,
            Arc::clone(&self.merger),
            Arc::clone(&self.confirmation),
            self.config.pipeline_settings(),
        );

        let outcome = service.narrate(&text, &output_path).await?;
        Ok(outcome)
    }
}
