use secrecy::Secret;
use serde::Serialize;
use service_core::config as core_config;
use service_core::error::AppError;

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_GOOGLE_MAPS_API_BASE: &str = "https://maps.googleapis.com/maps/api/place";

/// Immutable process configuration, resolved once at startup.
#[derive(Debug, Clone, Default)]
pub struct RelayConfig {
    pub common: core_config::Config,
    pub gemini: GeminiSettings,
    pub openai: OpenAiSettings,
    pub google_maps: GoogleMapsSettings,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct GoogleMapsSettings {
    pub api_key: Option<Secret<String>>,
    pub api_base: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
        }
    }
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_OPENAI_MODEL.to_string(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
        }
    }
}

impl Default for GoogleMapsSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_GOOGLE_MAPS_API_BASE.to_string(),
        }
    }
}

/// Which upstream integrations have a key configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub google_maps: bool,
    pub openai: bool,
    pub gemini: bool,
}

impl RelayConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_source(&core_config::layered_source()?)
    }

    /// Reads every setting from a layered `config` source, so keys may come
    /// from `configuration.*` as well as the environment.
    pub fn from_source(source: &config::Config) -> Result<Self, AppError> {
        let common = core_config::Config::from_source(source)?;
        Ok(Self::from_lookup(common, |key| {
            source.get_string(&key.to_lowercase()).ok()
        }))
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let secret = |key: &str| value(key).map(Secret::new);

        RelayConfig {
            common,
            gemini: GeminiSettings {
                api_key: secret("GEMINI_API_KEY"),
                model: value("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                api_base: value("GEMINI_API_BASE")
                    .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
            },
            openai: OpenAiSettings {
                api_key: secret("OPENAI_API_KEY"),
                model: value("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                api_base: value("OPENAI_API_BASE")
                    .unwrap_or_else(|| DEFAULT_OPENAI_API_BASE.to_string()),
            },
            google_maps: GoogleMapsSettings {
                api_key: secret("GOOGLE_MAPS_API_KEY"),
                api_base: value("GOOGLE_MAPS_API_BASE")
                    .unwrap_or_else(|| DEFAULT_GOOGLE_MAPS_API_BASE.to_string()),
            },
            otlp_endpoint: value("OTLP_ENDPOINT"),
        }
    }

    pub fn services(&self) -> ServiceStatus {
        ServiceStatus {
            google_maps: self.google_maps.api_key.is_some(),
            openai: self.openai.api_key.is_some(),
            gemini: self.gemini.api_key.is_some(),
        }
    }
}
