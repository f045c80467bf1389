//! Reading session state.
//!
//! One [`ReadingSession`] owns everything the reader has open: the selected
//! book and its paragraph store, the resolved TOC, the current page, and the
//! per-book collections. Collections are read from storage once, when a book
//! is selected, and written back after every mutation.

use crate::bookmarks::{Bookmark, Bookmarks};
use crate::content::{BookContent, ContentBlock, Language};
use crate::dictionary::Dictionary;
use crate::favorites::{FavoriteEntry, FavoriteKind, Favorites};
use crate::glossary::Glossary;
use crate::library::{BookMetadata, Catalog};
use crate::loader::{self, CancellationToken, LoadState, LoadTicket, LoadTracker};
use crate::pagination::{Paginator, ViewMode};
use crate::preferences::Preferences;
use crate::search::{self, SearchResult};
use crate::stats::{ReadingStats, StatsSummary};
use crate::storage::BlobStore;
use crate::toc::{self, ResolvedTocEntry, SiblingSearch, TocEntry};
use crate::tokenizer::{self, Span};
use anyhow::{Result, anyhow};
use chrono::{Local, NaiveDate};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub paragraphs_per_page: usize,
    pub sibling_search: SiblingSearch,
    pub view_mode: ViewMode,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            paragraphs_per_page: 5,
            sibling_search: SiblingSearch::default(),
            view_mode: ViewMode::default(),
        }
    }
}

pub struct ReadingSession {
    store: Box<dyn BlobStore>,
    catalog: Catalog,
    options: SessionOptions,
    paginator: Paginator,
    book_id: String,
    language: Language,
    content: BookContent,
    toc_entries: Vec<TocEntry>,
    toc: Vec<ResolvedTocEntry>,
    dictionary: Dictionary,
    page: usize,
    glossary: Glossary,
    favorites: Favorites,
    bookmarks: Bookmarks,
    stats: ReadingStats,
    loads: LoadTracker,
}

impl ReadingSession {
    /// Open a session on the last selected book (or the catalog default).
    /// Content is not loaded yet.
    pub fn new(store: Box<dyn BlobStore>, catalog: Catalog, options: SessionOptions) -> Self {
        let (book_id, language) = {
            let prefs = Preferences::new(&*store);
            (prefs.selected_book(&catalog), prefs.language())
        };
        let mut session = Self {
            paginator: Paginator::new(options.paragraphs_per_page),
            options,
            language,
            content: BookContent::default(),
            toc_entries: Vec::new(),
            toc: Vec::new(),
            dictionary: Dictionary::default(),
            page: 0,
            glossary: Glossary::default(),
            favorites: Favorites::default(),
            bookmarks: Bookmarks::default(),
            stats: ReadingStats::default(),
            loads: LoadTracker::new(),
            book_id: String::new(),
            store,
            catalog,
        };
        session.switch_to(book_id);
        session
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &dyn BlobStore {
        &*self.store
    }

    pub fn preferences(&self) -> Preferences<'_> {
        Preferences::new(&*self.store)
    }

    pub fn book(&self) -> &BookMetadata {
        self.catalog
            .get(&self.book_id)
            .unwrap_or_else(|| self.catalog.default_book())
    }

    pub fn book_id(&self) -> &str {
        &self.book_id
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn content(&self) -> &BookContent {
        &self.content
    }

    pub fn toc(&self) -> &[ResolvedTocEntry] {
        &self.toc
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn glossary(&self) -> &Glossary {
        &self.glossary
    }

    pub fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    pub fn bookmarks(&self) -> &Bookmarks {
        &self.bookmarks
    }

    pub fn stats(&self) -> &ReadingStats {
        &self.stats
    }

    pub fn load_state(&self) -> &LoadState {
        self.loads.state()
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn view_mode(&self) -> ViewMode {
        self.options.view_mode
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.options.view_mode = mode;
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn total_pages(&self) -> usize {
        self.paginator.total_pages(self.content.len())
    }

    /// Switch to another catalog book. Unknown ids are an error and leave the
    /// session untouched. The new book's content still has to be loaded.
    pub fn select_book(&mut self, book_id: &str) -> Result<()> {
        if !self.preferences().set_selected_book(&self.catalog, book_id) {
            return Err(anyhow!("Unknown book id {book_id}"));
        }
        if book_id != self.book_id {
            self.switch_to(book_id.to_string());
        }
        Ok(())
    }

    fn switch_to(&mut self, book_id: String) {
        let book = self
            .catalog
            .get(&book_id)
            .unwrap_or_else(|| self.catalog.default_book())
            .clone();
        info!(book = %book.id, title = %book.title_primary, "Switching book");
        let store = &*self.store;
        self.glossary = Glossary::load(store, &book.id);
        self.favorites = Favorites::load(store, &book.id);
        self.bookmarks = Bookmarks::load(store, &book.id);
        self.stats = ReadingStats::load(store, &book.id);
        self.toc_entries = self.catalog.load_toc(&book);
        self.dictionary = self.catalog.load_dictionary(&book);
        self.loads.invalidate();
        self.content = BookContent::default();
        self.toc.clear();
        self.page = 0;
        self.book_id = book.id;
    }

    /// Location of the selected book's content.
    pub fn content_location(&self) -> String {
        self.catalog.resolve_location(&self.book().content_path)
    }

    /// Start loading the selected book. Results for older tickets are
    /// discarded by [`ReadingSession::finish_load`].
    pub fn begin_load(&mut self) -> (LoadTicket, CancellationToken) {
        self.page = 0;
        self.loads.begin_load()
    }

    /// Install the result of a load. Returns true when the content was
    /// accepted.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<BookContent>) -> bool {
        let Some(content) = self.loads.finish_load(ticket, result) else {
            return false;
        };
        info!(
            book = %self.book_id,
            paragraphs = content.len(),
            pages = self.paginator.total_pages(content.len()),
            "Book content ready"
        );
        self.content = content;
        self.page = 0;
        self.resolve_toc();
        self.record_session(Local::now().date_naive());
        true
    }

    /// Fetch and install the selected book's content on this thread.
    pub fn load(&mut self) -> Result<()> {
        let location = self.content_location();
        let (ticket, cancel) = self.begin_load();
        let result = loader::fetch_content_with(&location, &cancel);
        self.finish_load(ticket, result);
        match self.loads.state() {
            LoadState::Failed(message) => Err(anyhow!("{message}")),
            _ => Ok(()),
        }
    }

    /// Count a reading session for `today` and the current page.
    pub fn record_session(&mut self, today: NaiveDate) {
        let started = self.stats.begin_session(today);
        let visited = self.stats.visit_page(self.page);
        if started || visited {
            self.stats.save(&*self.store, &self.book_id);
        }
    }

    pub fn add_reading_time(&mut self, seconds: u64) {
        if seconds == 0 {
            return;
        }
        self.stats.add_reading_time(seconds);
        self.stats.save(&*self.store, &self.book_id);
    }

    pub fn stats_summary(&self, session_secs: u64) -> StatsSummary {
        self.stats
            .summary(self.total_pages(), self.glossary.len(), session_secs)
    }

    pub fn set_language(&mut self, language: Language) {
        if language == self.language {
            return;
        }
        self.language = language;
        self.preferences().set_language(language);
        self.resolve_toc();
        debug!(%language, "Language changed");
    }

    fn resolve_toc(&mut self) {
        self.toc = toc::resolve_with(
            &self.content.paragraphs,
            &self.toc_entries,
            0,
            self.options.sibling_search,
        );
    }

    /// Move to `page` (clamped). Returns the page actually shown.
    pub fn goto_page(&mut self, page: usize) -> usize {
        self.page = self.paginator.clamp_page(page, self.content.len());
        if self.stats.visit_page(self.page) {
            self.stats.save(&*self.store, &self.book_id);
        }
        self.page
    }

    pub fn next_page(&mut self) -> bool {
        if self.page + 1 >= self.total_pages() {
            return false;
        }
        self.goto_page(self.page + 1);
        true
    }

    pub fn prev_page(&mut self) -> bool {
        if self.page == 0 {
            return false;
        }
        self.goto_page(self.page - 1);
        true
    }

    /// Parse reader input such as `"12"` and go there.
    pub fn goto_input(&mut self, input: &str) -> Option<usize> {
        let page = self.paginator.parse_goto(input, self.total_pages())?;
        Some(self.goto_page(page))
    }

    pub fn goto_paragraph(&mut self, paragraph_index: usize) -> usize {
        let paragraph_index = paragraph_index.min(self.content.len().saturating_sub(1));
        self.goto_page(self.paginator.page_of(paragraph_index))
    }

    pub fn goto_toc(&mut self, id: &str) -> Option<usize> {
        let paragraph_index = toc::find(&self.toc, id)?.paragraph_index;
        Some(self.goto_paragraph(paragraph_index))
    }

    /// Deepest TOC entry covering the first paragraph on screen.
    pub fn current_section(&self) -> Option<&ResolvedTocEntry> {
        let range = self.paginator.page_range(self.page, self.content.len());
        toc::section_at(&self.toc, range.start)
    }

    /// Blocks on screen with their store indices.
    pub fn page_blocks(&self) -> impl Iterator<Item = (usize, &ContentBlock)> {
        let range = self
            .paginator
            .view_range(self.options.view_mode, self.page, self.content.len());
        self.content.paragraphs[range.clone()]
            .iter()
            .enumerate()
            .map(move |(offset, block)| (range.start + offset, block))
    }

    /// Speakable text of the page in the active language.
    pub fn page_text(&self) -> String {
        self.page_blocks()
            .filter_map(|(_, block)| block.text_for(self.language))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        search::search(&self.content.paragraphs, query, self.language, &self.paginator)
    }

    pub fn is_known_word(&self, word: &str) -> bool {
        self.dictionary.contains(word) || self.glossary.contains(word)
    }

    pub fn glossary_spans<'a>(&self, text: &'a str) -> Vec<Span<'a>> {
        tokenizer::glossary_spans(text, |key| self.is_known_word(key))
    }

    pub fn add_to_glossary(&mut self, word: &str) -> bool {
        self.glossary
            .add(&*self.store, word, &self.dictionary)
    }

    pub fn remove_from_glossary(&mut self, word: &str) {
        self.glossary.remove(&*self.store, word);
    }

    pub fn add_favorite(&mut self, kind: FavoriteKind, content: &str) -> Option<&FavoriteEntry> {
        self.favorites
            .add(&*self.store, self.page, kind, content)
    }

    pub fn remove_favorite(&mut self, id: &str) {
        self.favorites.remove(&*self.store, id);
    }

    /// Bookmark the current page at its first paragraph.
    pub fn bookmark_page(&mut self, note: Option<String>) -> &Bookmark {
        let first = self.paginator.page_range(self.page, self.content.len()).start;
        self.bookmarks
            .add(&*self.store, self.page, Some(first), note)
    }

    pub fn remove_bookmark(&mut self, id: &str) {
        self.bookmarks.remove(&*self.store, id);
    }

    pub fn update_bookmark_note(&mut self, id: &str, note: &str) {
        self.bookmarks.update_note(&*self.store, id, note);
    }

    /// Add or remove the bookmark on the current page. Returns whether the
    /// page is bookmarked afterwards.
    pub fn toggle_bookmark(&mut self) -> bool {
        match self.bookmarks.for_page(self.page).map(|bookmark| bookmark.id.clone()) {
            Some(id) => {
                self.remove_bookmark(&id);
                false
            }
            None => {
                self.bookmark_page(None);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::fs;
    use std::path::Path;

    const CATALOG: &str = r#"
[[book]]
id = "win-friends"
title_en = "How to Win Friends"
title_es = "Cómo ganar amigos"
content_path = "win-friends/content.json"
toc_path = "win-friends/toc.json"
dictionary_path = "win-friends/dictionary.json"

[[book]]
id = "indicators"
title_en = "Economic Indicators"
content_path = "indicators/content.json"
"#;

    fn write_library(dir: &Path) {
        fs::write(dir.join("catalog.toml"), CATALOG).expect("catalog");
        fs::create_dir_all(dir.join("win-friends")).expect("mkdir");
        fs::create_dir_all(dir.join("indicators")).expect("mkdir");

        let mut paragraphs = vec![serde_json::json!("Intro text")];
        paragraphs.push(serde_json::json!({"en": "Part One: Fundamental Techniques", "es": "Parte Uno"}));
        for i in 0..8 {
            paragraphs.push(serde_json::json!(format!("Body paragraph {i} about a smile.")));
        }
        paragraphs.push(serde_json::json!({"type": "image", "src": "/img/1.png"}));
        paragraphs.push(serde_json::json!({"en": "Principle 1: Don't criticize", "es": "Principio 1: No critique"}));
        fs::write(
            dir.join("win-friends/content.json"),
            serde_json::json!({ "paragraphs": paragraphs }).to_string(),
        )
        .expect("content");
        fs::write(
            dir.join("win-friends/toc.json"),
            r#"[{"id": "part1", "titleEn": "Part One", "titleEs": "Parte Uno", "match": "Part One",
                 "children": [{"id": "p1", "titleEn": "Principle 1", "titleEs": "Principio 1", "match": "Principle 1"}]}]"#,
        )
        .expect("toc");
        fs::write(
            dir.join("win-friends/dictionary.json"),
            r#"[{"word": "smile", "definition": "A pleased expression", "definitionEs": "Sonrisa"}]"#,
        )
        .expect("dictionary");
        fs::write(
            dir.join("indicators/content.json"),
            r#"{"paragraphs": ["Chapter 1: Gross Domestic Product"]}"#,
        )
        .expect("content");
    }

    fn session(dir: &Path) -> ReadingSession {
        write_library(dir);
        let catalog = Catalog::load(dir).expect("catalog");
        ReadingSession::new(Box::new(MemoryStore::new()), catalog, SessionOptions::default())
    }

    #[test]
    fn loads_default_book_and_resolves_toc() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(dir.path());
        assert_eq!(session.book_id(), "win-friends");
        session.load().expect("load");

        assert_eq!(session.content().len(), 12);
        assert_eq!(session.total_pages(), 3);
        assert_eq!(session.toc()[0].paragraph_index, 1);
        assert_eq!(session.toc()[0].children[0].paragraph_index, 11);
        assert_eq!(session.stats().sessions_count, 1);
        assert_eq!(session.load_state(), &LoadState::Ready);
    }

    #[test]
    fn switching_books_discards_the_pending_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(dir.path());
        let (ticket, token) = session.begin_load();
        session.select_book("indicators").expect("select");
        assert!(token.is_cancelled());

        let late = BookContent::new(vec![ContentBlock::text("content of the first book")]);
        assert!(!session.finish_load(ticket, Ok(late)));
        assert_eq!(session.book_id(), "indicators");
        assert!(session.content().is_empty());
        assert_eq!(session.stats().sessions_count, 0);
        assert_eq!(session.load_state(), &LoadState::Idle);

        session.load().expect("load");
        assert_eq!(session.content().len(), 1);
    }

    #[test]
    fn navigation_and_sections() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(dir.path());
        session.load().expect("load");

        assert!(!session.prev_page());
        assert!(session.next_page());
        assert_eq!(session.current_section().map(|e| e.id.as_str()), Some("part1"));
        assert_eq!(session.goto_toc("p1"), Some(2));
        assert_eq!(session.current_section().map(|e| e.id.as_str()), Some("part1"));
        assert!(!session.next_page());
        assert_eq!(session.goto_page(99), 2);
        assert_eq!(session.goto_input("1"), Some(0));
        assert_eq!(session.goto_input("9"), None);
        assert_eq!(session.goto_paragraph(7), 1);
        assert_eq!(session.stats().pages_visited.len(), 3);
    }

    #[test]
    fn page_text_follows_language_and_skips_images() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(dir.path());
        session.load().expect("load");
        session.goto_page(2);

        let blocks: Vec<usize> = session.page_blocks().map(|(idx, _)| idx).collect();
        assert_eq!(blocks, vec![10, 11]);
        assert_eq!(session.page_text(), "Principle 1: Don't criticize");
        session.set_language(Language::Secondary);
        assert_eq!(session.page_text(), "Principio 1: No critique");
        assert_eq!(session.toc()[0].title(Language::Secondary), "Parte Uno");
        assert_eq!(session.preferences().language(), Language::Secondary);

        session.set_view_mode(ViewMode::Scroll);
        assert_eq!(session.page_blocks().count(), 12);
    }

    #[test]
    fn collections_are_per_book() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(dir.path());
        session.load().expect("load");
        assert!(session.add_to_glossary("Smile."));
        assert_eq!(session.glossary().entries()[0].definition_secondary, "Sonrisa");
        assert!(session.toggle_bookmark());
        session.add_favorite(FavoriteKind::Quote, "Don't criticize");

        session.select_book("indicators").expect("select");
        assert!(session.glossary().is_empty());
        assert!(session.bookmarks().is_empty());
        assert!(session.content().is_empty());
        session.load().expect("load");
        assert_eq!(session.content().len(), 1);

        session.select_book("win-friends").expect("select");
        assert_eq!(session.glossary().len(), 1);
        assert_eq!(session.bookmarks().len(), 1);
        assert_eq!(session.favorites().len(), 1);
        assert!(session.select_book("nope").is_err());
        assert_eq!(session.book_id(), "win-friends");
    }

    #[test]
    fn selection_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_library(dir.path());
        let state = tempfile::tempdir().expect("tempdir");
        let open = || {
            ReadingSession::new(
                Box::new(crate::storage::FileStore::new(state.path())),
                Catalog::load(dir.path()).expect("catalog"),
                SessionOptions::default(),
            )
        };
        let mut session = open();
        session.select_book("indicators").expect("select");
        assert_eq!(open().book_id(), "indicators");
    }

    #[test]
    fn glossary_spans_mark_dictionary_and_personal_words() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(dir.path());
        session.load().expect("load");
        session.add_to_glossary("criticize");
        let terms: Vec<&str> = session
            .glossary_spans("Smile, don't criticize a friend.")
            .into_iter()
            .filter_map(|span| match span {
                Span::Term { text, .. } => Some(text),
                Span::Plain(_) => None,
            })
            .collect();
        assert_eq!(terms, vec!["Smile", "criticize"]);
    }

    #[test]
    fn stale_load_does_not_overwrite_current_book() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(dir.path());
        let (stale, _) = session.begin_load();
        session.select_book("indicators").expect("select");
        let (current, _) = session.begin_load();

        let slow = BookContent::new(vec![ContentBlock::text("old book")]);
        let fresh = BookContent::new(vec![ContentBlock::text("new book")]);
        assert!(session.finish_load(current, Ok(fresh)));
        assert!(!session.finish_load(stale, Ok(slow)));
        assert_eq!(session.content().paragraphs[0], ContentBlock::text("new book"));
    }

    #[test]
    fn failed_load_reports_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(dir.path());
        fs::remove_file(dir.path().join("win-friends/content.json")).expect("remove");
        assert!(session.load().is_err());
        assert!(matches!(session.load_state(), LoadState::Failed(_)));
    }

    #[test]
    fn search_uses_paginator() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session(dir.path());
        session.load().expect("load");
        let hits = session.search("paragraph 7");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].paragraph_index, 9);
        assert_eq!(hits[0].page_index, 1);
    }
}
