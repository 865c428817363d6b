pub mod enrichment;
pub mod prompt;
pub mod providers;
pub mod recommendations;
pub mod recovery;

pub use recommendations::{RecommendationService, RecommendationSettings};
