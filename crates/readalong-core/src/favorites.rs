//! Saved words and quotes, tied to the page they were taken from.

use crate::storage::{self, BlobStore, Concern};
use crate::text_utils::truncate_chars;
use serde::{Deserialize, Serialize};

pub const MAX_FAVORITE_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteKind {
    Word,
    Quote,
}

impl std::fmt::Display for FavoriteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FavoriteKind::Word => "word",
            FavoriteKind::Quote => "quote",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    pub id: String,
    pub page_index: usize,
    #[serde(rename = "type")]
    pub kind: FavoriteKind,
    pub content: String,
    pub added_at: i64,
}

#[derive(Debug, Clone, Default)]
pub struct Favorites {
    book_id: String,
    entries: Vec<FavoriteEntry>,
}

impl Favorites {
    pub fn load(store: &dyn BlobStore, book_id: &str) -> Self {
        let entries = storage::load_list(store, &storage::storage_key(Concern::Favorites, book_id));
        Self {
            book_id: book_id.to_string(),
            entries,
        }
    }

    pub fn entries(&self) -> &[FavoriteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Save `content` from `page_index`. Blank content is ignored; longer
    /// content is cut to [`MAX_FAVORITE_CHARS`].
    pub fn add(
        &mut self,
        store: &dyn BlobStore,
        page_index: usize,
        kind: FavoriteKind,
        content: &str,
    ) -> Option<&FavoriteEntry> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return None;
        }
        self.entries.push(FavoriteEntry {
            id: storage::generate_id("fav"),
            page_index,
            kind,
            content: truncate_chars(trimmed, MAX_FAVORITE_CHARS).to_string(),
            added_at: storage::now_millis(),
        });
        self.persist(store);
        self.entries.last()
    }

    pub fn remove(&mut self, store: &dyn BlobStore, id: &str) {
        self.entries.retain(|entry| entry.id != id);
        self.persist(store);
    }

    pub fn for_page(&self, page_index: usize) -> Vec<&FavoriteEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.page_index == page_index)
            .collect()
    }

    fn persist(&self, store: &dyn BlobStore) {
        storage::save_json(
            store,
            &storage::storage_key(Concern::Favorites, &self.book_id),
            &self.entries,
        );
    }
}
