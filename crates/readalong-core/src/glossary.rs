//! The reader's personal word list for one book.

use crate::dictionary::Dictionary;
use crate::storage::{self, BlobStore, Concern};
use serde::{Deserialize, Serialize};
use tracing::debug;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

pub const NO_DEFINITION: &str = "No definition in dictionary.";
pub const NO_DEFINITION_SECONDARY: &str = "Sin definición en el diccionario.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GlossaryEntry {
    pub word: String,
    pub definition: String,
    #[serde(rename = "definitionEs")]
    pub definition_secondary: String,
    pub added_at: i64,
}

#[derive(Debug, Clone, Default)]
pub struct Glossary {
    book_id: String,
    entries: Vec<GlossaryEntry>,
}

fn normalize_word(word: &str) -> String {
    word.trim()
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_alphanumeric() || *ch == '_' || *ch == '\'')
        .collect()
}

/// Alphabetical key: accents folded away so `ética` sorts with the `e`s.
fn sort_key(word: &str) -> String {
    word.nfd().filter(|ch| !is_combining_mark(*ch)).collect()
}

impl Glossary {
    /// Read the stored glossary for `book_id`.
    pub fn load(store: &dyn BlobStore, book_id: &str) -> Self {
        let entries = storage::load_list(store, &storage::storage_key(Concern::Glossary, book_id));
        debug!(book_id, count = entries.len(), "Loaded glossary");
        Self {
            book_id: book_id.to_string(),
            entries,
        }
    }

    pub fn book_id(&self) -> &str {
        &self.book_id
    }

    pub fn entries(&self) -> &[GlossaryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        let needle = normalize_word(word);
        self.entries.iter().any(|entry| entry.word == needle)
    }

    /// Add `word` with its definitions from `dictionary`.
    ///
    /// Returns false when the word normalizes to nothing. Adding a word that
    /// is already present is accepted but changes nothing.
    pub fn add(&mut self, store: &dyn BlobStore, word: &str, dictionary: &Dictionary) -> bool {
        self.add_at(store, word, dictionary, storage::now_millis())
    }

    pub fn add_at(
        &mut self,
        store: &dyn BlobStore,
        word: &str,
        dictionary: &Dictionary,
        added_at: i64,
    ) -> bool {
        let normalized = normalize_word(word);
        if normalized.is_empty() {
            return false;
        }
        if self.contains(&normalized) {
            return true;
        }
        let found = dictionary.get(&normalized);
        let entry = GlossaryEntry {
            definition: found
                .map(|entry| entry.definition.clone())
                .unwrap_or_else(|| NO_DEFINITION.to_string()),
            definition_secondary: found
                .map(|entry| entry.definition_secondary.clone())
                .filter(|definition| !definition.is_empty())
                .unwrap_or_else(|| NO_DEFINITION_SECONDARY.to_string()),
            word: normalized,
            added_at,
        };
        debug!(book_id = %self.book_id, word = %entry.word, "Adding glossary word");
        self.entries.push(entry);
        self.entries.sort_by(|a, b| {
            sort_key(&a.word)
                .cmp(&sort_key(&b.word))
                .then_with(|| a.word.cmp(&b.word))
        });
        self.persist(store);
        true
    }

    pub fn remove(&mut self, store: &dyn BlobStore, word: &str) {
        let needle = normalize_word(word);
        self.entries.retain(|entry| entry.word != needle);
        self.persist(store);
    }

    fn persist(&self, store: &dyn BlobStore) {
        storage::save_json(
            store,
            &storage::storage_key(Concern::Glossary, &self.book_id),
            &self.entries,
        );
    }
}
