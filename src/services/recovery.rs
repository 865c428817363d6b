/// Recovery of a recommendations list from free-form model output
///
/// Model replies are not guaranteed to be JSON. Recovery moves through three
/// stages and stops at the first one that yields at least one valid book:
///
/// 1. `Direct`: the whole reply parses as JSON of a known shape
/// 2. `Extracted`: a JSON object/array embedded in prose or code fences
/// 3. `Fallback`: deterministic generic books derived from the preferences
///
/// Recovery is a pure function of its inputs.
use serde_json::{Map, Value};

use crate::{
    error::{AppError, AppResult},
    models::{BookRecommendation, PreferenceSet},
};

/// Synthetic fallback never produces more than this many books
pub const FALLBACK_LIMIT: usize = 5;

/// Raw output echoed back in parse errors is cut to this many characters
const SNIPPET_CHARS: usize = 200;

/// Keys checked, in order, for a list of books inside a JSON object
const BOOK_LIST_KEYS: &[&str] = &["recommendations", "books"];

const FALLBACK_POOL: &[(&str, &str)] = &[
    ("The Name of the Wind", "Patrick Rothfuss"),
    ("The Night Circus", "Erin Morgenstern"),
    ("Project Hail Mary", "Andy Weir"),
    ("The Secret History", "Donna Tartt"),
    ("Circe", "Madeline Miller"),
    ("Station Eleven", "Emily St. John Mandel"),
    ("The Shadow of the Wind", "Carlos Ruiz Zafón"),
    ("Piranesi", "Susanna Clarke"),
    ("The Remains of the Day", "Kazuo Ishiguro"),
    ("A Gentleman in Moscow", "Amor Towles"),
];

/// Which stage produced the recovered books
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySource {
    Direct,
    Extracted,
    Fallback,
}

impl RecoverySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoverySource::Direct => "direct",
            RecoverySource::Extracted => "extracted",
            RecoverySource::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovered {
    pub books: Vec<BookRecommendation>,
    pub source: RecoverySource,
}

#[derive(Debug, Clone, Copy)]
pub struct RecoveryOptions {
    /// Maximum number of books to keep
    pub requested_count: usize,
    /// Whether to synthesize books when nothing can be parsed
    pub allow_fallback: bool,
}

/// Recovers an ordered, non-empty list of at most `requested_count` books
pub fn recover(
    raw: &str,
    preferences: &PreferenceSet,
    options: RecoveryOptions,
) -> AppResult<Recovered> {
    let mut stage = RecoverySource::Direct;
    // A list of a known shape was found but held no usable entries
    let mut found_empty_list = false;

    let (books, source) = loop {
        match stage {
            RecoverySource::Direct => match parse_books(raw.trim(), preferences) {
                Some(books) if !books.is_empty() => break (books, stage),
                parsed => {
                    found_empty_list |= parsed.is_some();
                    stage = RecoverySource::Extracted;
                }
            },
            RecoverySource::Extracted => {
                let mut extracted = None;
                for candidate in json_candidates(raw) {
                    match parse_books(candidate, preferences) {
                        Some(books) if !books.is_empty() => {
                            extracted = Some(books);
                            break;
                        }
                        parsed => found_empty_list |= parsed.is_some(),
                    }
                }
                match extracted {
                    Some(books) => break (books, stage),
                    None => stage = RecoverySource::Fallback,
                }
            }
            RecoverySource::Fallback => {
                if !options.allow_fallback {
                    if found_empty_list {
                        return Err(AppError::NoRecommendations);
                    }
                    return Err(AppError::Parse {
                        snippet: snippet(raw),
                    });
                }
                break (fallback_books(preferences, options.requested_count), stage);
            }
        }
    };

    let mut books = books;
    books.truncate(options.requested_count);

    if books.is_empty() {
        return Err(AppError::NoRecommendations);
    }

    Ok(Recovered { books, source })
}

/// Parses `text` as JSON and pulls valid books out of any known shape
///
/// Returns `None` when `text` is not JSON or holds no book list at all, and
/// an empty list when every known list validated to zero books.
fn parse_books(text: &str, preferences: &PreferenceSet) -> Option<Vec<BookRecommendation>> {
    let value: Value = serde_json::from_str(text).ok()?;
    let lists = book_lists(&value);
    if lists.is_empty() {
        return None;
    }

    let books = lists
        .into_iter()
        .map(|items| validate_books(items, preferences))
        .find(|books| !books.is_empty())
        .unwrap_or_default();
    Some(books)
}

/// Candidate arrays in priority order
fn book_lists(value: &Value) -> Vec<&Vec<Value>> {
    match value {
        Value::Array(items) => vec![items],
        Value::Object(map) => {
            let mut lists: Vec<&Vec<Value>> = BOOK_LIST_KEYS
                .iter()
                .filter_map(|key| map.get(*key).and_then(Value::as_array))
                .collect();

            lists.extend(
                map.iter()
                    .filter(|(key, _)| !BOOK_LIST_KEYS.contains(&key.as_str()))
                    .filter_map(|(_, value)| value.as_array())
                    .filter(|items| items.iter().any(Value::is_object)),
            );

            lists
        }
        _ => Vec::new(),
    }
}

fn validate_books(items: &[Value], preferences: &PreferenceSet) -> Vec<BookRecommendation> {
    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|item| validate_book(item, preferences))
        .collect()
}

/// Enforces the required string fields on one model-supplied entry
fn validate_book(
    item: &Map<String, Value>,
    preferences: &PreferenceSet,
) -> Option<BookRecommendation> {
    let title = non_blank_str(item.get("title"))?;

    let author = non_blank_str(item.get("author")).or_else(|| {
        let authors: Vec<String> = item
            .get("authors")?
            .as_array()?
            .iter()
            .filter_map(|a| non_blank_str(Some(a)))
            .collect();
        (!authors.is_empty()).then(|| authors.join(", "))
    })?;

    let description = non_blank_str(item.get("description"))
        .or_else(|| non_blank_str(item.get("reason")))
        .unwrap_or_else(|| synthesized_description(preferences));

    let themes: Vec<String> = item
        .get("themes")
        .or_else(|| item.get("tags"))
        .and_then(Value::as_array)
        .map(|tags| tags.iter().filter_map(|t| non_blank_str(Some(t))).collect())
        .unwrap_or_default();

    Some(BookRecommendation {
        title,
        author,
        description,
        themes,
    })
}

fn non_blank_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// JSON-looking spans of `raw`, ordered by where they start
///
/// For each bracket kind there is a greedy span (first opener to last closer)
/// and, when it differs, the balanced span closing the first opener.
fn json_candidates(raw: &str) -> Vec<&str> {
    let mut spans: Vec<(usize, usize)> = Vec::new();

    for (open, close) in [('{', '}'), ('[', ']')] {
        let Some(start) = raw.find(open) else {
            continue;
        };
        if let Some(end) = raw.rfind(close).filter(|end| *end > start) {
            spans.push((start, end));
        }
        if let Some(end) = balanced_end(raw, start) {
            if !spans.contains(&(start, end)) {
                spans.push((start, end));
            }
        }
    }

    spans.sort_by_key(|(start, _)| *start);
    spans
        .into_iter()
        .map(|(start, end)| &raw[start..=end])
        .collect()
}

/// Byte offset of the bracket closing the one at `start`, skipping over
/// string literals
fn balanced_end(raw: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in raw[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }

    None
}

fn snippet(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut cut: String = trimmed.chars().take(SNIPPET_CHARS).collect();
    if cut.len() < trimmed.len() {
        cut.push_str("...");
    }
    Some(cut)
}

fn synthesized_description(preferences: &PreferenceSet) -> String {
    let mut description = format!(
        "Suggested for readers who enjoyed {}.",
        preferences.favorite_books()
    );
    if let Some(genres) = preferences.genres_label() {
        description.push_str(&format!(" Genres: {}.", genres));
    }
    if let Some(mood) = preferences.mood() {
        description.push_str(&format!(" Mood: {}.", mood));
    }
    description
}

/// Generic books picked from a fixed pool at an offset seeded by genre and mood
fn fallback_books(
    preferences: &PreferenceSet,
    requested_count: usize,
) -> Vec<BookRecommendation> {
    let seed_text = format!(
        "{}|{}",
        preferences.genres_label().unwrap_or_default(),
        preferences.mood().unwrap_or_default()
    )
    .to_lowercase();
    let seed = seed_text
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
    let offset = seed as usize % FALLBACK_POOL.len();
    let description = synthesized_description(preferences);

    (0..requested_count.min(FALLBACK_LIMIT))
        .map(|i| {
            let (title, author) = FALLBACK_POOL[(offset + i) % FALLBACK_POOL.len()];
            BookRecommendation {
                title: title.to_string(),
                author: author.to_string(),
                description: description.clone(),
                themes: preferences.genres.clone(),
            }
        })
        .collect()
}
