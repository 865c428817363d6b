/// Saved-books library
///
/// The widget keeps a reader's saved books in browser storage under a single
/// key. This module owns that record format and its operations so any client
/// (browser bindings, a CLI, tests) shares one implementation. Storage is
/// abstracted behind [`LibraryStorage`]; nothing here runs on the server.
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::AppResult, models::EnrichedBook};

/// Storage key holding the serialized library
pub const LIBRARY_KEY: &str = "bookOracleLibrary";

/// A book the reader saved, with the time it was saved
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SavedBook {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub saved_at: DateTime<Utc>,
}

impl SavedBook {
    fn same_book(&self, title: &str, author: &str) -> bool {
        self.title.eq_ignore_ascii_case(title.trim())
            && self.author.eq_ignore_ascii_case(author.trim())
    }
}

/// String key-value storage, e.g. browser local storage
pub trait LibraryStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

/// Storage backed by a `HashMap`
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl LibraryStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// The reader's saved books, persisted under [`LIBRARY_KEY`]
pub struct LibraryStore<S: LibraryStorage> {
    storage: S,
    books: Vec<SavedBook>,
}

impl<S: LibraryStorage> LibraryStore<S> {
    /// Opens the library, loading whatever is already stored
    pub fn open(storage: S) -> Self {
        let mut store = Self {
            storage,
            books: Vec::new(),
        };
        store.load();
        store
    }

    /// Reloads from storage. Missing or unreadable data yields an empty library.
    pub fn load(&mut self) {
        self.books = match self.storage.get(LIBRARY_KEY) {
            None => Vec::new(),
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Discarding unreadable library data");
                Vec::new()
            }),
        };
    }

    /// Writes the current books to storage
    pub fn save(&mut self) -> AppResult<()> {
        let raw = serde_json::to_string(&self.books)?;
        self.storage.set(LIBRARY_KEY, raw);
        Ok(())
    }

    /// Saves a recommended book. Returns `false` if it was already saved.
    pub fn add(&mut self, book: &EnrichedBook) -> AppResult<bool> {
        self.add_at(book, Utc::now())
    }

    fn add_at(&mut self, book: &EnrichedBook, saved_at: DateTime<Utc>) -> AppResult<bool> {
        if self.contains(&book.title, &book.author) {
            return Ok(false);
        }

        self.books.push(SavedBook {
            title: book.title.trim().to_string(),
            author: book.author.trim().to_string(),
            description: book.description.clone(),
            image_url: Some(book.image_url.clone()),
            saved_at,
        });
        self.save()?;
        Ok(true)
    }

    /// Removes a saved book. Returns `false` if it wasn't in the library.
    pub fn remove(&mut self, title: &str, author: &str) -> AppResult<bool> {
        let before = self.books.len();
        self.books.retain(|saved| !saved.same_book(title, author));

        if self.books.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    pub fn contains(&self, title: &str, author: &str) -> bool {
        self.books.iter().any(|saved| saved.same_book(title, author))
    }

    /// Saved books, newest first
    pub fn list(&self) -> Vec<&SavedBook> {
        let mut books: Vec<&SavedBook> = self.books.iter().collect();
        books.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        books
    }

    /// Empties the library and deletes its storage entry
    pub fn clear(&mut self) {
        self.books.clear();
        self.storage.remove(LIBRARY_KEY);
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Gives the storage back, e.g. to reopen it
    pub fn into_storage(self) -> S {
        self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn book(title: &str) -> EnrichedBook {
        EnrichedBook {
            title: title.to_string(),
            author: "Author".to_string(),
            description: "Desc".to_string(),
            themes: vec![],
            image_url: format!("https://covers.example/{}.jpg", title),
        }
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_add_persists_and_reloads() {
        let mut store = LibraryStore::open(MemoryStorage::default());
        assert!(store.is_empty());
        assert!(store.add(&book("Dune")).unwrap());

        let reopened = LibraryStore::open(store.into_storage());
        assert_eq!(reopened.len(), 1);
        assert!(reopened.contains("dune", "author"));
        assert_eq!(
            reopened.list()[0].image_url.as_deref(),
            Some("https://covers.example/Dune.jpg")
        );
    }

    #[test]
    fn test_duplicates_ignored() {
        let mut store = LibraryStore::open(MemoryStorage::default());
        assert!(store.add(&book("Dune")).unwrap());
        assert!(!store.add(&book("Dune")).unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_padded_titles_match_saved_entry() {
        let mut store = LibraryStore::open(MemoryStorage::default());
        assert!(store.add(&book("  Dune ")).unwrap());
        assert_eq!(store.list()[0].title, "Dune");

        assert!(!store.add(&book("Dune")).unwrap());
        assert!(store.contains(" dune", "Author "));
        assert!(store.remove("Dune", "Author").unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_list_newest_first() {
        let mut store = LibraryStore::open(MemoryStorage::default());
        store.add_at(&book("Old"), at(1)).unwrap();
        store.add_at(&book("New"), at(3)).unwrap();
        store.add_at(&book("Middle"), at(2)).unwrap();

        let titles: Vec<&str> = store.list().iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["New", "Middle", "Old"]);
    }

    #[test]
    fn test_remove() {
        let mut store = LibraryStore::open(MemoryStorage::default());
        store.add(&book("Dune")).unwrap();
        store.add(&book("Emma")).unwrap();

        assert!(store.remove("Dune", "Author").unwrap());
        assert!(!store.remove("Dune", "Author").unwrap());

        let reopened = LibraryStore::open(store.into_storage());
        assert_eq!(reopened.len(), 1);
        assert!(reopened.contains("Emma", "Author"));
    }

    #[test]
    fn test_clear_removes_storage_entry() {
        let mut store = LibraryStore::open(MemoryStorage::default());
        store.add(&book("Dune")).unwrap();
        store.clear();
        assert!(store.is_empty());

        let storage = store.into_storage();
        assert!(storage.get(LIBRARY_KEY).is_none());
    }

    #[test]
    fn test_corrupt_storage_loads_empty() {
        let mut storage = MemoryStorage::default();
        storage.set(LIBRARY_KEY, "not json".to_string());

        let mut store = LibraryStore::open(storage);
        assert!(store.is_empty());
        assert!(store.add(&book("Dune")).unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_reads_browser_format() {
        let mut storage = MemoryStorage::default();
        storage.set(
            LIBRARY_KEY,
            r#"[{"title":"Circe","author":"Madeline Miller","imageUrl":null,"savedAt":"2024-03-01T10:00:00.000Z"}]"#
                .to_string(),
        );

        let store = LibraryStore::open(storage);
        let saved = store.list();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].title, "Circe");
        assert_eq!(saved[0].description, "");
        assert_eq!(saved[0].image_url, None);
    }
}
