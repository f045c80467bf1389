//! Reading core for the bilingual reader.
//!
//! Everything that is not presentation lives here: the paragraph store and
//! its loaders, table-of-contents resolution, tokenizing and read-aloud word
//! alignment, the speech controller, and the per-book persistence adapters.
//! Front-ends own a [`session::ReadingSession`] and drive it one event at a
//! time.

pub mod bookmarks;
pub mod content;
pub mod dictionary;
pub mod favorites;
pub mod glossary;
pub mod highlight;
pub mod ingest;
pub mod library;
pub mod loader;
pub mod pagination;
pub mod preferences;
pub mod search;
pub mod session;
pub mod speech;
pub mod stats;
pub mod storage;
pub mod text_utils;
pub mod toc;
pub mod tokenizer;

pub use content::{BookContent, ContentBlock, Language};
pub use session::ReadingSession;
pub use storage::{BlobStore, FileStore, MemoryStore};
