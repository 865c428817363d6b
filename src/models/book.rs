use serde::{Deserialize, Serialize};

/// A recommended book recovered from model output, before cover enrichment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookRecommendation {
    pub title: String,
    pub author: String,
    pub description: String,
    /// Cosmetic thematic tags, when the model supplies them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub themes: Vec<String>,
}

/// A recommendation with its cover attached, as returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedBook {
    pub title: String,
    pub author: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub themes: Vec<String>,
    pub image_url: String,
}

impl BookRecommendation {
    pub fn with_cover(self, image_url: String) -> EnrichedBook {
        EnrichedBook {
            title: self.title,
            author: self.author,
            description: self.description,
            themes: self.themes,
            image_url,
        }
    }
}

/// Response body for a successful recommendation request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResult {
    pub recommendations: Vec<EnrichedBook>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enriched_book_serializes_camel_case() {
        let book = BookRecommendation {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            description: "Spice and sand.".to_string(),
            themes: vec![],
        }
        .with_cover("https://covers.example/dune.jpg".to_string());

        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["imageUrl"], "https://covers.example/dune.jpg");
        assert!(json.get("themes").is_none());
    }
}
