mod book;
mod preferences;

pub use book::{BookRecommendation, EnrichedBook, RecommendationResult};
pub use preferences::PreferenceSet;

/// Prompt pair and output budget for one completion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionPrompt {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
}
