/// External service abstractions
///
/// The recommendation pipeline talks to two black-box HTTP services: a chat
/// completion API that writes the recommendations and a book metadata API that
/// supplies cover art. Each sits behind a trait so the pipeline can be driven
/// by mocks in tests and the vendors can be swapped without touching it.
use crate::{error::AppResult, models::CompletionPrompt};

pub mod google_books;
pub mod openai;

pub use google_books::GoogleBooksProvider;
pub use openai::OpenAiProvider;

/// Chat-completion backend
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Sends the prompt pair and returns the model's free-form reply
    ///
    /// Fails with a configuration error, without any network traffic, when no
    /// credential is configured.
    async fn complete(&self, prompt: &CompletionPrompt) -> AppResult<String>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Cover image lookup backend
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CoverProvider: Send + Sync {
    /// Looks up the first matching volume and returns its cover image URL,
    /// or `None` when there is no match or the match has no image
    async fn find_cover(&self, title: &str, author: &str) -> AppResult<Option<String>>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
