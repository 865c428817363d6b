/// Google Books cover provider
///
/// Searches `/volumes` with `intitle:`/`inauthor:` qualifiers and reads only the
/// first result's image links.
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    services::providers::CoverProvider,
};

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    #[serde(default)]
    volume_info: Option<VolumeInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    #[serde(default)]
    image_links: Option<ImageLinks>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageLinks {
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    small_thumbnail: Option<String>,
}

#[derive(Clone)]
pub struct GoogleBooksProvider {
    http_client: HttpClient,
    api_url: String,
    api_key: Option<String>,
}

impl GoogleBooksProvider {
    pub fn new(config: &Config) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            api_url: config.books_api_url.trim_end_matches('/').to_string(),
            api_key: config
                .books_api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
        })
    }

    /// Search query for a title/author pair
    fn search_query(title: &str, author: &str) -> String {
        format!("intitle:{} inauthor:{}", title.trim(), author.trim())
    }

    /// Google Books hands out `http://` thumbnail links; browsers on an
    /// https page block them as mixed content
    fn secure_url(url: String) -> String {
        match url.strip_prefix("http://") {
            Some(rest) => format!("https://{}", rest),
            None => url,
        }
    }

    fn first_cover(volumes: VolumesResponse) -> Option<String> {
        let links = volumes.items.into_iter().next()?.volume_info?.image_links?;
        links
            .thumbnail
            .or(links.small_thumbnail)
            .filter(|url| !url.trim().is_empty())
            .map(Self::secure_url)
    }
}

#[async_trait::async_trait]
impl CoverProvider for GoogleBooksProvider {
    async fn find_cover(&self, title: &str, author: &str) -> AppResult<Option<String>> {
        let query = Self::search_query(title, author);

        let mut request = self
            .http_client
            .get(format!("{}/volumes", self.api_url))
            .query(&[("q", query.as_str()), ("maxResults", "1")]);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key.as_str())]);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ExternalApi(format!(
                "Google Books API returned status {}",
                status.as_u16()
            )));
        }

        let volumes: VolumesResponse = response.json().await?;
        let cover = Self::first_cover(volumes);

        tracing::debug!(query = %query, found = cover.is_some(), "Cover lookup finished");

        Ok(cover)
    }

    fn name(&self) -> &'static str {
        "google_books"
    }
}
