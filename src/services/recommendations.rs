use std::sync::Arc;

use reqwest::Url;
use tracing::instrument;

use crate::{
    config::Config,
    error::AppResult,
    models::{PreferenceSet, RecommendationResult},
    services::{
        enrichment::{enrich_covers, EnrichmentOptions},
        prompt::build_prompt,
        providers::{CompletionProvider, CoverProvider, GoogleBooksProvider, OpenAiProvider},
        recovery::{recover, RecoveryOptions},
    },
};

/// Request-independent knobs for the pipeline
#[derive(Debug, Clone)]
pub struct RecommendationSettings {
    pub default_count: usize,
    pub max_count: usize,
    pub allow_fallback: bool,
    pub enrichment: EnrichmentOptions,
}

impl RecommendationSettings {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let placeholder_base = Url::parse(&config.placeholder_image_url).map_err(|e| {
            anyhow::anyhow!(
                "Invalid PLACEHOLDER_IMAGE_URL {:?}: {}",
                config.placeholder_image_url,
                e
            )
        })?;

        Ok(Self {
            default_count: config.default_recommendations,
            max_count: config.max_recommendations,
            allow_fallback: config.recovery_fallback,
            enrichment: EnrichmentOptions {
                concurrency: config.enrichment_concurrency,
                placeholder_base,
            },
        })
    }
}

/// Generates book recommendations for one set of reader preferences
///
/// Pipeline: prompt -> completion -> recovery -> cover enrichment. Holds no
/// per-request state, so one instance serves every request.
pub struct RecommendationService {
    completion: Arc<dyn CompletionProvider>,
    covers: Arc<dyn CoverProvider>,
    settings: RecommendationSettings,
}

impl RecommendationService {
    pub fn new(
        completion: Arc<dyn CompletionProvider>,
        covers: Arc<dyn CoverProvider>,
        settings: RecommendationSettings,
    ) -> Self {
        Self {
            completion,
            covers,
            settings,
        }
    }

    /// Wires the OpenAI and Google Books providers from configuration
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let settings = RecommendationSettings::from_config(config)?;
        let completion = OpenAiProvider::new(config)?;
        let covers = GoogleBooksProvider::new(config)?;

        if config.api_key().is_none() {
            tracing::warn!("OPENAI_API_KEY is not set; recommendation requests will fail");
        }

        tracing::info!(
            completion = completion.name(),
            covers = covers.name(),
            model = %config.openai_model,
            temperature = config.temperature,
            default_count = settings.default_count,
            "Recommendation service configured"
        );

        Ok(Self::new(Arc::new(completion), Arc::new(covers), settings))
    }

    #[instrument(skip_all, fields(count = tracing::field::Empty))]
    pub async fn recommend(&self, preferences: &PreferenceSet) -> AppResult<RecommendationResult> {
        preferences.validate()?;

        let count =
            preferences.requested_count(self.settings.default_count, self.settings.max_count);
        tracing::Span::current().record("count", count);

        let prompt = build_prompt(preferences, count);
        let raw = self.completion.complete(&prompt).await?;

        let recovered = recover(
            &raw,
            preferences,
            RecoveryOptions {
                requested_count: count,
                allow_fallback: self.settings.allow_fallback,
            },
        )?;

        tracing::info!(
            source = recovered.source.as_str(),
            books = recovered.books.len(),
            "Recovered recommendations"
        );

        let recommendations = enrich_covers(
            Arc::clone(&self.covers),
            recovered.books,
            &self.settings.enrichment,
        )
        .await;

        Ok(RecommendationResult { recommendations })
    }
}
