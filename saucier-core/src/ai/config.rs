//! Generation service configuration from environment variables.

use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default OpenAI base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model for recipe and wine pairing generation.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

/// Default image model.
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";

/// Default image resolution.
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";

/// Environment variable holding the API credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

/// Generation client configuration.
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// API key. `None` is allowed at load time; calls that need it fail with
    /// [`ConfigError::MissingEnvVar`].
    pub api_key: Option<String>,
    /// Base URL for the API.
    pub base_url: String,
    /// Model for text completions.
    pub chat_model: String,
    /// Model for image generation.
    pub image_model: String,
    /// Image resolution, e.g. "1024x1024".
    pub image_size: String,
    /// Milliseconds to wait between requests. 0 disables rate limiting.
    pub rate_limit_ms: u64,
    /// Per-request timeout. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            image_size: DEFAULT_IMAGE_SIZE.to_string(),
            rate_limit_ms: 0,
            request_timeout: None,
        }
    }
}

impl AiConfig {
    /// Load configuration from environment variables.
    ///
    /// - `OPENAI_API_KEY`: API credential (absence is reported lazily)
    /// - `SAUCIER_AI_BASE_URL`: API base URL (default: "https://api.openai.com/v1")
    /// - `SAUCIER_CHAT_MODEL`: text model (default: "gpt-3.5-turbo")
    /// - `SAUCIER_IMAGE_MODEL`: image model (default: "dall-e-3")
    /// - `SAUCIER_IMAGE_SIZE`: image resolution (default: "1024x1024")
    /// - `SAUCIER_AI_RATE_LIMIT_MS`: delay between requests in ms (default: 0)
    /// - `SAUCIER_AI_TIMEOUT_SECS`: per-request timeout (default: none)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_key = env::var(API_KEY_ENV).ok();

        let base_url = env::var("SAUCIER_AI_BASE_URL").unwrap_or(defaults.base_url);
        let chat_model = env::var("SAUCIER_CHAT_MODEL").unwrap_or(defaults.chat_model);
        let image_model = env::var("SAUCIER_IMAGE_MODEL").unwrap_or(defaults.image_model);
        let image_size = env::var("SAUCIER_IMAGE_SIZE").unwrap_or(defaults.image_size);

        let rate_limit_ms = env::var("SAUCIER_AI_RATE_LIMIT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.rate_limit_ms);

        let request_timeout = env::var("SAUCIER_AI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs);

        Self::default()
            .with_api_key_opt(api_key)
            .with_base_url(base_url)
            .with_models(chat_model, image_model)
            .with_image_size(image_size)
            .with_rate_limit_ms(rate_limit_ms)
            .with_request_timeout(request_timeout)
    }

    pub fn with_api_key(self, api_key: impl Into<String>) -> Self {
        self.with_api_key_opt(Some(api_key.into()))
    }

    fn with_api_key_opt(mut self, api_key: Option<String>) -> Self {
        // Blank values behave like an unset variable.
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_models(
        mut self,
        chat_model: impl Into<String>,
        image_model: impl Into<String>,
    ) -> Self {
        self.chat_model = chat_model.into();
        self.image_model = image_model.into();
        self
    }

    pub fn with_image_size(mut self, image_size: impl Into<String>) -> Self {
        self.image_size = image_size.into();
        self
    }

    pub fn with_rate_limit_ms(mut self, ms: u64) -> Self {
        self.rate_limit_ms = ms;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Whether a usable credential is configured.
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// The credential, or the error to surface at the point of use.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar(API_KEY_ENV.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_credential() {
        let config = AiConfig::default();
        assert!(!config.has_credential());
        assert_eq!(
            config.require_api_key(),
            Err(ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))
        );
        assert_eq!(config.chat_model, "gpt-3.5-turbo");
        assert_eq!(config.image_size, "1024x1024");
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let config = AiConfig::default().with_api_key("   ");
        assert!(!config.has_credential());

        let config = AiConfig::default().with_api_key("sk-test");
        assert_eq!(config.require_api_key(), Ok("sk-test"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = AiConfig::default().with_base_url("http://localhost:8080/v1/");
        assert_eq!(config.base_url, "http://localhost:8080/v1");
    }
}
