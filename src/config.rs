use serde::Deserialize;

/// Upper bound accepted for `MAX_RECOMMENDATIONS`
pub const MAX_RECOMMENDATIONS_LIMIT: usize = 50;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Completion API key. Optional at startup; requests fail with a
    /// configuration error until it is set.
    #[serde(default)]
    pub openai_api_key: Option<String>,

    /// Completion API base URL (OpenAI-compatible)
    #[serde(default = "default_openai_api_url")]
    pub openai_api_url: String,

    /// Completion model identifier
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// Sampling temperature sent with every completion request
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Number of books recommended when the request doesn't ask for a count
    #[serde(default = "default_recommendations")]
    pub default_recommendations: usize,

    /// Upper bound on the number of books a single request may ask for
    #[serde(default = "default_max_recommendations")]
    pub max_recommendations: usize,

    /// Synthesize generic books when the model reply can't be parsed
    #[serde(default = "default_recovery_fallback")]
    pub recovery_fallback: bool,

    /// Book metadata API base URL (Google Books compatible)
    #[serde(default = "default_books_api_url")]
    pub books_api_url: String,

    /// Optional Google Books API key
    #[serde(default)]
    pub books_api_key: Option<String>,

    /// Base URL for generated placeholder covers
    #[serde(default = "default_placeholder_image_url")]
    pub placeholder_image_url: String,

    /// Maximum number of cover lookups in flight per request
    #[serde(default = "default_enrichment_concurrency")]
    pub enrichment_concurrency: usize,

    /// Timeout applied to every outbound HTTP request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_openai_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_recommendations() -> usize {
    5
}

fn default_max_recommendations() -> usize {
    10
}

fn default_recovery_fallback() -> bool {
    true
}

fn default_books_api_url() -> String {
    "https://www.googleapis.com/books/v1".to_string()
}

fn default_placeholder_image_url() -> String {
    "https://placehold.co/128x192".to_string()
}

fn default_enrichment_concurrency() -> usize {
    4
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            openai_api_key: None,
            openai_api_url: default_openai_api_url(),
            openai_model: default_openai_model(),
            temperature: default_temperature(),
            default_recommendations: default_recommendations(),
            max_recommendations: default_max_recommendations(),
            recovery_fallback: default_recovery_fallback(),
            books_api_url: default_books_api_url(),
            books_api_key: None,
            placeholder_image_url: default_placeholder_image_url(),
            enrichment_concurrency: default_enrichment_concurrency(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would make every request fail or hang
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=MAX_RECOMMENDATIONS_LIMIT).contains(&self.max_recommendations) {
            anyhow::bail!(
                "MAX_RECOMMENDATIONS must be between 1 and {}",
                MAX_RECOMMENDATIONS_LIMIT
            );
        }
        if self.default_recommendations == 0
            || self.default_recommendations > self.max_recommendations
        {
            anyhow::bail!(
                "DEFAULT_RECOMMENDATIONS must be between 1 and {}",
                self.max_recommendations
            );
        }
        if self.enrichment_concurrency == 0 {
            anyhow::bail!("ENRICHMENT_CONCURRENCY must be at least 1");
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            anyhow::bail!("TEMPERATURE must be between 0.0 and 2.0");
        }
        Ok(())
    }

    /// The completion credential, treating a blank value as unset
    pub fn api_key(&self) -> Option<&str> {
        self.openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_recommendations, 5);
        assert_eq!(config.temperature, 0.7);
    }

    #[test]
    fn test_default_above_max_rejected() {
        let config = Config {
            default_recommendations: 12,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_recommendations_bounded() {
        let config = Config {
            max_recommendations: MAX_RECOMMENDATIONS_LIMIT + 1,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            max_recommendations: MAX_RECOMMENDATIONS_LIMIT,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_api_key_is_unset() {
        let config = Config {
            openai_api_key: Some("   ".to_string()),
            ..Config::default()
        };
        assert_eq!(config.api_key(), None);

        let config = Config {
            openai_api_key: Some("sk-test".to_string()),
            ..Config::default()
        };
        assert_eq!(config.api_key(), Some("sk-test"));
    }
}
