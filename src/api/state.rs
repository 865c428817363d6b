use std::sync::Arc;

use crate::{config::Config, services::RecommendationService};

/// Shared application state
///
/// Read-only after startup; requests never write to it.
#[derive(Clone)]
pub struct AppState {
    pub recommendations: Arc<RecommendationService>,
}

impl AppState {
    pub fn new(recommendations: RecommendationService) -> Self {
        Self {
            recommendations: Arc::new(recommendations),
        }
    }

    /// Builds the production providers from configuration
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(RecommendationService::from_config(config)?))
    }
}
