use crate::domain::narration::PipelineSettings;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const CONFIG_PATH_ENV: &str = "TTS_CLI_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {} (set TTS_CLI_CONFIG or pass --config)", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for {name}: {value}")]
    InvalidEnv { name: String, value: String },
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    pub default_provider: String,
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub max_chunk_bytes: usize,
    pub max_unit_bytes: usize,
    pub concurrency: usize,
    pub assume_yes: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_chunk_bytes: 4000,
            max_unit_bytes: 4000,
            concurrency: 4,
            assume_yes: false,
        }
    }
}

impl From<&PipelineConfig> for PipelineSettings {
    fn from(config: &PipelineConfig) -> Self {
        PipelineSettings {
            max_chunk_bytes: config.max_chunk_bytes,
            max_unit_bytes: config.max_unit_bytes,
            concurrency: config.concurrency,
            assume_yes: config.assume_yes,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
    Ogg,
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
            AudioFormat::Ogg => "ogg",
        }
    }
}

/// Provider entry, selected by its `type` field
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Azure(AzureConfig),
    Polly(PollyConfig),
    #[serde(rename = "openai")]
    OpenAi(OpenAiConfig),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AzureConfig {
    pub speech_key: String,
    pub service_region: String,
    pub voice: Option<String>,
    #[serde(default)]
    pub output_format: AudioFormat,
    pub max_text_length: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PollyConfig {
    pub region: Option<String>,
    pub voice: Option<String>,
    pub engine: Option<String>,
    #[serde(default)]
    pub output_format: AudioFormat,
    pub max_text_length: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub voice: Option<String>,
    #[serde(default)]
    pub output_format: AudioFormat,
    pub max_text_length: Option<usize>,
}

impl ProviderConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderConfig::Azure(_) => "azure",
            ProviderConfig::Polly(_) => "polly",
            ProviderConfig::OpenAi(_) => "openai",
        }
    }

    pub fn output_format(&self) -> AudioFormat {
        match self {
            ProviderConfig::Azure(c) => c.output_format,
            ProviderConfig::Polly(c) => c.output_format,
            ProviderConfig::OpenAi(c) => c.output_format,
        }
    }

    pub fn voice(&self) -> Option<&str> {
        match self {
            ProviderConfig::Azure(c) => c.voice.as_deref(),
            ProviderConfig::Polly(c) => c.voice.as_deref(),
            ProviderConfig::OpenAi(c) => c.voice.as_deref(),
        }
    }

    pub fn max_text_length(&self) -> Option<usize> {
        match self {
            ProviderConfig::Azure(c) => c.max_text_length,
            ProviderConfig::Polly(c) => c.max_text_length,
            ProviderConfig::OpenAi(c) => c.max_text_length,
        }
    }
}

impl Config {
    /// Load from `explicit`, else `$TTS_CLI_CONFIG`, else
    /// `~/.local/tts-cli/config.json`, then apply environment overrides.
    /// Not validated; command-line flags are applied first.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match env::var(CONFIG_PATH_ENV) {
                Ok(path) => PathBuf::from(path),
                Err(_) => Self::default_path().ok_or_else(|| {
                    ConfigError::Invalid("cannot locate home directory".to_string())
                })?,
            },
        };

        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".local").join("tts-cli").join("config.json"))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(provider) = env::var("TTS_PROVIDER") {
            self.default_provider = provider;
        }
        if let Some(value) = env_override("TTS_CONCURRENCY")? {
            self.pipeline.concurrency = value;
        }
        if let Some(value) = env_override("TTS_MAX_CHUNK_BYTES")? {
            self.pipeline.max_chunk_bytes = value;
        }
        if let Some(value) = env_override("TTS_MAX_UNIT_BYTES")? {
            self.pipeline.max_unit_bytes = value;
        }
        if let Ok(value) = env::var("TTS_ASSUME_YES") {
            self.pipeline.assume_yes = matches!(value.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Ok(value) = env::var("LOG_FORMAT") {
            self.log_format = match value.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".to_string()));
        }
        if self.pipeline.max_chunk_bytes == 0 || self.pipeline.max_unit_bytes == 0 {
            return Err(ConfigError::Invalid("byte limits must be at least 1".to_string()));
        }
        if !self.providers.contains_key(&self.default_provider) {
            return Err(ConfigError::UnknownProvider(self.default_provider.clone()));
        }
        Ok(())
    }

    /// The selected provider and its key
    pub fn provider(&self) -> Result<(&str, &ProviderConfig), ConfigError> {
        self.providers
            .get_key_value(&self.default_provider)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownProvider(self.default_provider.clone()))
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings::from(&self.pipeline)
    }
}

fn env_override<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv {
                name: name.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}
