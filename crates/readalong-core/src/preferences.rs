//! Global reader preferences, persisted as plain strings under
//! `book-friends-*` keys.

use crate::content::Language;
use crate::library::Catalog;
use crate::storage::{self, BlobStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

pub const FONT_SIZES: [u16; 6] = [14, 16, 18, 20, 22, 24];
pub const DEFAULT_FONT_SIZE_INDEX: usize = 1;

const THEME_KEY: &str = "theme";
const FONT_SIZE_KEY: &str = "font-size-index";
const LANGUAGE_KEY: &str = "language";
const SELECTED_BOOK_KEY: &str = "selected-book";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// A theme with `System` resolved away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedTheme {
    Light,
    Dark,
}

impl Theme {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            "system" => Some(Theme::System),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }

    pub fn resolve(self, system_dark: bool) -> ResolvedTheme {
        match self {
            Theme::Light => ResolvedTheme::Light,
            Theme::Dark => ResolvedTheme::Dark,
            Theme::System if system_dark => ResolvedTheme::Dark,
            Theme::System => ResolvedTheme::Light,
        }
    }

    /// Flip the theme as currently displayed; the result is always explicit.
    pub fn toggle(self, system_dark: bool) -> Theme {
        match self.resolve(system_dark) {
            ResolvedTheme::Dark => Theme::Light,
            ResolvedTheme::Light => Theme::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontSize {
    index: usize,
}

impl Default for FontSize {
    fn default() -> Self {
        Self {
            index: DEFAULT_FONT_SIZE_INDEX,
        }
    }
}

impl FontSize {
    pub fn from_index(index: usize) -> Option<Self> {
        (index < FONT_SIZES.len()).then_some(Self { index })
    }

    pub fn index(self) -> usize {
        self.index
    }

    pub fn px(self) -> u16 {
        FONT_SIZES[self.index]
    }

    pub fn can_increase(self) -> bool {
        self.index + 1 < FONT_SIZES.len()
    }

    pub fn can_decrease(self) -> bool {
        self.index > 0
    }

    pub fn increase(self) -> Self {
        Self {
            index: (self.index + 1).min(FONT_SIZES.len() - 1),
        }
    }

    pub fn decrease(self) -> Self {
        Self {
            index: self.index.saturating_sub(1),
        }
    }

    pub fn reset(self) -> Self {
        Self::default()
    }
}

/// Typed access to the persisted preferences. Unreadable values read back
/// as the defaults.
pub struct Preferences<'a> {
    store: &'a dyn BlobStore,
}

impl<'a> Preferences<'a> {
    pub fn new(store: &'a dyn BlobStore) -> Self {
        Self { store }
    }

    pub fn theme(&self) -> Theme {
        storage::load_string(self.store, &storage::global_key(THEME_KEY))
            .and_then(|value| Theme::parse(&value))
            .unwrap_or_default()
    }

    pub fn set_theme(&self, theme: Theme) {
        debug!(%theme, "Theme changed");
        storage::save_string(self.store, &storage::global_key(THEME_KEY), theme.as_str());
    }

    pub fn font_size(&self) -> FontSize {
        storage::load_string(self.store, &storage::global_key(FONT_SIZE_KEY))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .and_then(FontSize::from_index)
            .unwrap_or_default()
    }

    pub fn set_font_size(&self, size: FontSize) {
        storage::save_string(
            self.store,
            &storage::global_key(FONT_SIZE_KEY),
            &size.index().to_string(),
        );
    }

    pub fn language(&self) -> Language {
        storage::load_string(self.store, &storage::global_key(LANGUAGE_KEY))
            .and_then(|value| Language::from_code(value.trim()))
            .unwrap_or_default()
    }

    pub fn set_language(&self, language: Language) {
        storage::save_string(self.store, &storage::global_key(LANGUAGE_KEY), language.code());
    }

    /// Stored book id if the catalog still lists it, else the catalog default.
    pub fn selected_book(&self, catalog: &Catalog) -> String {
        storage::load_string(self.store, &storage::global_key(SELECTED_BOOK_KEY))
            .filter(|id| catalog.get(id).is_some())
            .unwrap_or_else(|| catalog.default_book_id().to_string())
    }

    /// Persist `book_id`; ids missing from the catalog are ignored.
    pub fn set_selected_book(&self, catalog: &Catalog, book_id: &str) -> bool {
        if catalog.get(book_id).is_none() {
            return false;
        }
        storage::save_string(self.store, &storage::global_key(SELECTED_BOOK_KEY), book_id);
        true
    }
}
