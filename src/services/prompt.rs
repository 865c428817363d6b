/// Prompt construction for the completion API
///
/// The completion API does not enforce structured output, so the user prompt
/// carries a literal example of the expected JSON alongside the preferences.
use std::fmt::Write;

use crate::models::{CompletionPrompt, PreferenceSet};

const SYSTEM_PROMPT: &str = "You are a helpful assistant that specializes in book recommendations. \
Respond with valid JSON only, no prose and no code fences. The JSON must be an object with a \
\"recommendations\" array; every element is an object with string fields \"title\", \"author\" \
and \"description\".";

/// Output tokens reserved for the JSON envelope
const BASE_TOKEN_BUDGET: u32 = 200;
/// Output tokens allowed per recommended book
const TOKENS_PER_BOOK: u32 = 150;

/// Output token budget sized so `count` recommendations fit without truncation
pub fn token_budget(count: usize) -> u32 {
    let count = u32::try_from(count).unwrap_or(u32::MAX);
    BASE_TOKEN_BUDGET.saturating_add(TOKENS_PER_BOOK.saturating_mul(count))
}

/// Renders preferences into the system/user prompt pair
///
/// Unset or blank preference fields are left out entirely.
pub fn build_prompt(preferences: &PreferenceSet, count: usize) -> CompletionPrompt {
    let mut user = String::new();

    let noun = if count == 1 { "book" } else { "books" };
    let _ = writeln!(
        user,
        "Based on the following preferences, recommend exactly {} {}.",
        count, noun
    );
    user.push('\n');

    let _ = writeln!(user, "- Favorite books: {}", preferences.favorite_books());
    if let Some(authors) = preferences.favorite_authors() {
        let _ = writeln!(user, "- Favorite authors: {}", authors);
    }
    if let Some(genres) = preferences.genres_label() {
        let _ = writeln!(user, "- Preferred genres: {}", genres);
    }
    if let Some(mood) = preferences.mood() {
        let _ = writeln!(user, "- Preferred mood: {}", mood);
    }
    if let Some(length) = preferences.length() {
        let _ = writeln!(user, "- Length preference: {}", length);
    }
    if let Some(info) = preferences.additional_info() {
        let _ = writeln!(user, "- Additional information: {}", info);
    }

    user.push('\n');
    user.push_str(
        "Do not recommend the favorite books themselves. Respond with JSON in exactly this shape:\n",
    );
    user.push_str(EXAMPLE_RESPONSE);

    CompletionPrompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
        max_tokens: token_budget(count),
    }
}

const EXAMPLE_RESPONSE: &str = r#"{
  "recommendations": [
    {
      "title": "Book Title",
      "author": "Author Name",
      "description": "Two or three sentences on the book and why it fits these preferences."
    }
  ]
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs() -> PreferenceSet {
        PreferenceSet {
            favorite_books: "The Hobbit, Dune".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_prompt_states_count_and_books() {
        let prompt = build_prompt(&prefs(), 5);
        assert!(prompt.user.contains("recommend exactly 5 books"));
        assert!(prompt.user.contains("- Favorite books: The Hobbit, Dune"));
        assert!(prompt.system.contains("\"recommendations\""));
    }

    #[test]
    fn test_unset_fields_are_omitted() {
        let mut preferences = prefs();
        preferences.mood = Some("   ".to_string());
        let prompt = build_prompt(&preferences, 3);

        assert!(!prompt.user.contains("mood"));
        assert!(!prompt.user.contains("genres"));
        assert!(!prompt.user.contains("Not specified"));
    }

    #[test]
    fn test_all_fields_rendered() {
        let preferences = PreferenceSet {
            favorite_books: "Rebecca".to_string(),
            favorite_authors: Some("Daphne du Maurier".to_string()),
            genres: vec!["gothic".to_string(), "mystery".to_string()],
            mood: Some("dark".to_string()),
            length: Some("short".to_string()),
            additional_info: Some("set near the sea".to_string()),
            num_recommendations: Some(1),
        };
        let prompt = build_prompt(&preferences, 1);

        assert!(prompt.user.contains("recommend exactly 1 book."));
        assert!(prompt.user.contains("- Favorite authors: Daphne du Maurier"));
        assert!(prompt.user.contains("- Preferred genres: gothic, mystery"));
        assert!(prompt.user.contains("- Preferred mood: dark"));
        assert!(prompt.user.contains("- Length preference: short"));
        assert!(prompt.user.contains("- Additional information: set near the sea"));
    }

    #[test]
    fn test_example_json_is_valid() {
        let value: serde_json::Value = serde_json::from_str(EXAMPLE_RESPONSE).unwrap();
        let first = &value["recommendations"][0];
        assert!(first["title"].is_string());
        assert!(first["author"].is_string());
        assert!(first["description"].is_string());
    }

    #[test]
    fn test_budget_grows_with_count() {
        assert!(build_prompt(&prefs(), 10).max_tokens > build_prompt(&prefs(), 5).max_tokens);
        assert_eq!(token_budget(5), 950);
        assert_eq!(token_budget(usize::MAX), u32::MAX);
    }

    #[test]
    fn test_build_is_pure() {
        assert_eq!(build_prompt(&prefs(), 4), build_prompt(&prefs(), 4));
    }
}
