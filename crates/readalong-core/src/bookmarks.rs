//! Page bookmarks for one book. At most one bookmark per page.

use crate::storage::{self, BlobStore, Concern};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    pub page_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub added_at: i64,
}

#[derive(Debug, Clone, Default)]
pub struct Bookmarks {
    book_id: String,
    entries: Vec<Bookmark>,
}

impl Bookmarks {
    pub fn load(store: &dyn BlobStore, book_id: &str) -> Self {
        let entries = storage::load_list(store, &storage::storage_key(Concern::Bookmarks, book_id));
        Self {
            book_id: book_id.to_string(),
            entries,
        }
    }

    pub fn entries(&self) -> &[Bookmark] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bookmark `page_index`. Returns the existing bookmark when the page is
    /// already bookmarked.
    pub fn add(
        &mut self,
        store: &dyn BlobStore,
        page_index: usize,
        paragraph_index: Option<usize>,
        note: Option<String>,
    ) -> &Bookmark {
        if let Some(pos) = self.position_for_page(page_index) {
            return &self.entries[pos];
        }
        debug!(book_id = %self.book_id, page_index, "Adding bookmark");
        self.entries.push(Bookmark {
            id: storage::generate_id("bm"),
            page_index,
            paragraph_index,
            note,
            added_at: storage::now_millis(),
        });
        self.persist(store);
        let last = self.entries.len() - 1;
        &self.entries[last]
    }

    pub fn remove(&mut self, store: &dyn BlobStore, id: &str) {
        self.entries.retain(|bookmark| bookmark.id != id);
        self.persist(store);
    }

    pub fn update_note(&mut self, store: &dyn BlobStore, id: &str, note: &str) {
        for bookmark in self.entries.iter_mut().filter(|bookmark| bookmark.id == id) {
            bookmark.note = Some(note.to_string());
        }
        self.persist(store);
    }

    pub fn is_page_bookmarked(&self, page_index: usize) -> bool {
        self.position_for_page(page_index).is_some()
    }

    pub fn for_page(&self, page_index: usize) -> Option<&Bookmark> {
        self.position_for_page(page_index).map(|pos| &self.entries[pos])
    }

    fn position_for_page(&self, page_index: usize) -> Option<usize> {
        self.entries
            .iter()
            .position(|bookmark| bookmark.page_index == page_index)
    }

    fn persist(&self, store: &dyn BlobStore) {
        storage::save_json(
            store,
            &storage::storage_key(Concern::Bookmarks, &self.book_id),
            &self.entries,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, ReadOnlyStore};

    #[test]
    fn failed_writes_keep_the_in_memory_list() {
        let store = ReadOnlyStore;
        let mut bookmarks = Bookmarks::load(&store, "book");
        let id = bookmarks.add(&store, 4, Some(12), Some("later".into())).id.clone();
        assert_eq!(bookmarks.len(), 1);
        assert!(bookmarks.is_page_bookmarked(4));
        bookmarks.update_note(&store, &id, "edited");
        assert_eq!(bookmarks.entries()[0].note.as_deref(), Some("edited"));
    }

    #[test]
    fn add_is_idempotent_per_page() {
        let store = MemoryStore::new();
        let mut bookmarks = Bookmarks::load(&store, "book");
        let first_id = bookmarks.add(&store, 3, None, None).id.clone();
        let second_id = bookmarks.add(&store, 3, Some(20), Some("again".into())).id.clone();
        assert_eq!(first_id, second_id);
        assert_eq!(bookmarks.len(), 1);
        assert!(bookmarks.is_page_bookmarked(3));
        assert!(!bookmarks.is_page_bookmarked(4));
    }

    #[test]
    fn notes_and_removal_persist() {
        let store = MemoryStore::new();
        let mut bookmarks = Bookmarks::load(&store, "book");
        let id = bookmarks.add(&store, 1, Some(7), None).id.clone();
        bookmarks.add(&store, 2, None, None);
        bookmarks.update_note(&store, &id, "favourite scene");

        let reloaded = Bookmarks::load(&store, "book");
        assert_eq!(
            reloaded.for_page(1).and_then(|b| b.note.as_deref()),
            Some("favourite scene")
        );
        assert_eq!(reloaded.for_page(1).and_then(|b| b.paragraph_index), Some(7));

        bookmarks.remove(&store, &id);
        let reloaded = Bookmarks::load(&store, "book");
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.for_page(1).is_none());
    }

    #[test]
    fn reads_original_wire_format() {
        let store = MemoryStore::new();
        let json = br#"[{"id":"bm-1-abc","pageIndex":4,"addedAt":1700000000000}]"#;
        store
            .set(&storage::storage_key(Concern::Bookmarks, "book"), json)
            .expect("set");
        let bookmarks = Bookmarks::load(&store, "book");
        assert_eq!(bookmarks.for_page(4).map(|b| b.id.as_str()), Some("bm-1-abc"));
    }
}
