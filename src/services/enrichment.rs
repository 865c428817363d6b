use std::sync::Arc;

use reqwest::Url;
use tokio::sync::Semaphore;

use crate::{
    models::{BookRecommendation, EnrichedBook},
    services::providers::CoverProvider,
};

/// Placeholder covers carry at most this many characters of the title
const PLACEHOLDER_TITLE_CHARS: usize = 30;

#[derive(Debug, Clone)]
pub struct EnrichmentOptions {
    /// Maximum number of cover lookups in flight at once
    pub concurrency: usize,
    /// Base URL that placeholder covers are built from
    pub placeholder_base: Url,
}

/// Deterministic placeholder cover for `title`
pub fn placeholder_url(base: &Url, title: &str) -> String {
    let label: String = title.trim().chars().take(PLACEHOLDER_TITLE_CHARS).collect();
    let mut url = base.clone();
    url.query_pairs_mut().append_pair("text", label.trim_end());
    url.to_string()
}

/// Attaches a cover image URL to every book
///
/// Lookups run as spawned tasks, at most `options.concurrency` at a time.
/// Handles are awaited in input order, so the output order always matches
/// `books`. A failed or empty lookup only affects its own book, which gets a
/// placeholder cover.
pub async fn enrich_covers(
    provider: Arc<dyn CoverProvider>,
    books: Vec<BookRecommendation>,
    options: &EnrichmentOptions,
) -> Vec<EnrichedBook> {
    let permits = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut tasks = Vec::with_capacity(books.len());

    for book in &books {
        let provider = Arc::clone(&provider);
        let permits = Arc::clone(&permits);
        let title = book.title.clone();
        let author = book.author.clone();

        let task = tokio::spawn(async move {
            // The semaphore is never closed, so acquiring only waits
            let _permit = permits.acquire_owned().await;
            provider.find_cover(&title, &author).await
        });
        tasks.push(task);
    }

    let mut enriched = Vec::with_capacity(books.len());
    let mut placeholders = 0usize;

    for (book, task) in books.into_iter().zip(tasks) {
        let cover = match task.await {
            Ok(Ok(Some(url))) => Some(url),
            Ok(Ok(None)) => {
                tracing::debug!(title = %book.title, "No cover found");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!(title = %book.title, error = %e, "Cover lookup failed");
                None
            }
            Err(e) => {
                tracing::warn!(title = %book.title, error = %e, "Cover lookup task failed");
                None
            }
        };

        let image_url = cover.unwrap_or_else(|| {
            placeholders += 1;
            placeholder_url(&options.placeholder_base, &book.title)
        });
        enriched.push(book.with_cover(image_url));
    }

    tracing::info!(books = enriched.len(), placeholders, "Cover enrichment finished");

    enriched
}
