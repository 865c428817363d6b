use serde::{Deserialize, Deserializer};

use crate::error::{AppError, AppResult};

/// Accepts genres as either a comma-separated string or a list of tags
fn deserialize_genres<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrVec {
        String(String),
        Vec(Vec<String>),
        Null,
    }

    let raw = match StringOrVec::deserialize(deserializer)? {
        StringOrVec::String(s) => s.split(',').map(str::to_string).collect(),
        StringOrVec::Vec(v) => v,
        StringOrVec::Null => Vec::new(),
    };

    Ok(raw
        .into_iter()
        .map(|genre| genre.trim().to_string())
        .filter(|genre| !genre.is_empty())
        .collect())
}

/// Accepts the requested count as a number or a numeric string
fn deserialize_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInt {
        Int(i64),
        String(String),
        Null,
    }

    match StringOrInt::deserialize(deserializer)? {
        StringOrInt::Int(n) => Ok(Some(n)),
        StringOrInt::String(s) if s.trim().is_empty() => Ok(None),
        StringOrInt::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        StringOrInt::Null => Ok(None),
    }
}

/// Reader preferences submitted by the widget. Lives for one request.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceSet {
    pub favorite_books: String,
    #[serde(default)]
    pub favorite_authors: Option<String>,
    #[serde(default, deserialize_with = "deserialize_genres")]
    pub genres: Vec<String>,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub length: Option<String>,
    #[serde(default)]
    pub additional_info: Option<String>,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub num_recommendations: Option<i64>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl PreferenceSet {
    /// Checks required fields before anything leaves the process
    pub fn validate(&self) -> AppResult<()> {
        if self.favorite_books.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "favoriteBooks cannot be empty".to_string(),
            ));
        }
        if let Some(n) = self.num_recommendations {
            if n <= 0 {
                return Err(AppError::InvalidInput(
                    "numRecommendations must be a positive integer".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Resolves the number of books to return, clamped to `max`
    pub fn requested_count(&self, default: usize, max: usize) -> usize {
        let count = match self.num_recommendations {
            Some(n) if n > 0 => (n as u64).min(max as u64) as usize,
            _ => default.min(max),
        };
        count.max(1)
    }

    pub fn favorite_books(&self) -> &str {
        self.favorite_books.trim()
    }

    pub fn favorite_authors(&self) -> Option<&str> {
        non_blank(&self.favorite_authors)
    }

    pub fn mood(&self) -> Option<&str> {
        non_blank(&self.mood)
    }

    pub fn length(&self) -> Option<&str> {
        non_blank(&self.length)
    }

    pub fn additional_info(&self) -> Option<&str> {
        non_blank(&self.additional_info)
    }

    /// Genres joined for display, if any were given
    pub fn genres_label(&self) -> Option<String> {
        if self.genres.is_empty() {
            None
        } else {
            Some(self.genres.join(", "))
        }
    }
}
