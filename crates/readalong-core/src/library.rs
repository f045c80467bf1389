//! Book catalog.
//!
//! A library directory holds `catalog.toml` plus one folder of assets per
//! book. Asset paths in the catalog are relative to the library directory
//! unless they are absolute or an `http(s)://` URL.

use crate::dictionary::Dictionary;
use crate::toc::TocEntry;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const CATALOG_FILE: &str = "catalog.toml";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    SelfHelp,
    Finance,
    Business,
    Psychology,
    #[default]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookMetadata {
    pub id: String,
    #[serde(rename = "title_en", alias = "titleEn")]
    pub title_primary: String,
    #[serde(rename = "title_es", alias = "titleEs", default)]
    pub title_secondary: String,
    #[serde(default)]
    pub author: String,
    #[serde(rename = "description_en", alias = "descriptionEn", default)]
    pub description_primary: String,
    #[serde(rename = "description_es", alias = "descriptionEs", default)]
    pub description_secondary: String,
    #[serde(default)]
    pub category: Category,
    #[serde(alias = "contentPath")]
    pub content_path: String,
    #[serde(alias = "tocPath", default, skip_serializing_if = "Option::is_none")]
    pub toc_path: Option<String>,
    #[serde(alias = "dictionaryPath", default, skip_serializing_if = "Option::is_none")]
    pub dictionary_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    default_book: Option<String>,
    #[serde(default, rename = "book")]
    books: Vec<BookMetadata>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    root: PathBuf,
    books: Vec<BookMetadata>,
    default_book: String,
}

impl Catalog {
    /// Read `catalog.toml` from `dir`. A catalog without books is an error.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CATALOG_FILE);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        let file: CatalogFile = toml::from_str(&data)
            .with_context(|| format!("Invalid catalog {}", path.display()))?;
        let catalog = Self::from_books(dir, file.books, file.default_book)?;
        info!(
            path = %path.display(),
            books = catalog.books.len(),
            default_book = %catalog.default_book,
            "Loaded catalog"
        );
        Ok(catalog)
    }

    pub fn from_books(
        root: &Path,
        books: Vec<BookMetadata>,
        default_book: Option<String>,
    ) -> Result<Self> {
        let Some(first) = books.first() else {
            bail!("Catalog at {} lists no books", root.display());
        };
        let default_book = match default_book {
            Some(id) if books.iter().any(|book| book.id == id) => id,
            Some(id) => {
                warn!(id, "Default book is not in the catalog; using the first entry");
                first.id.clone()
            }
            None => first.id.clone(),
        };
        Ok(Self {
            root: root.to_path_buf(),
            books,
            default_book,
        })
    }

    pub fn books(&self) -> &[BookMetadata] {
        &self.books
    }

    pub fn get(&self, id: &str) -> Option<&BookMetadata> {
        self.books.iter().find(|book| book.id == id)
    }

    pub fn default_book_id(&self) -> &str {
        &self.default_book
    }

    pub fn default_book(&self) -> &BookMetadata {
        self.get(&self.default_book).unwrap_or(&self.books[0])
    }

    /// Location of an asset: URLs and absolute paths pass through, anything
    /// else is joined onto the library directory.
    pub fn resolve_location(&self, location: &str) -> String {
        if is_url(location) || Path::new(location).is_absolute() {
            return location.to_string();
        }
        self.root
            .join(location.trim_start_matches('/'))
            .to_string_lossy()
            .into_owned()
    }

    /// The book's TOC; a book without one, or with an unreadable one, has an
    /// empty TOC.
    pub fn load_toc(&self, book: &BookMetadata) -> Vec<TocEntry> {
        let Some(rel) = book.toc_path.as_deref() else {
            return Vec::new();
        };
        let path = PathBuf::from(self.resolve_location(rel));
        match read_json::<Vec<TocEntry>>(&path) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(book = %book.id, "TOC unavailable: {err:#}");
                Vec::new()
            }
        }
    }

    pub fn load_dictionary(&self, book: &BookMetadata) -> Dictionary {
        let Some(rel) = book.dictionary_path.as_deref() else {
            return Dictionary::default();
        };
        let path = PathBuf::from(self.resolve_location(rel));
        Dictionary::load(&path).unwrap_or_else(|err| {
            warn!(book = %book.id, "Dictionary unavailable: {err:#}");
            Dictionary::default()
        })
    }
}

pub fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("Invalid JSON in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
default_book = "economic-indicators"

[[book]]
id = "win-friends"
title_en = "How to Win Friends and Influence People"
title_es = "Cómo ganar amigos e influir sobre las personas"
author = "Dale Carnegie"
category = "self-help"
content_path = "win-friends/content.json"
toc_path = "win-friends/toc.json"

[[book]]
id = "economic-indicators"
title_en = "The Trader's Guide to Key Economic Indicators"
author = "Richard Yamarone"
category = "finance"
content_path = "economic-indicators/content.json"
dictionary_path = "economic-indicators/dictionary.json"
"#;

    #[test]
    fn loads_catalog_and_optional_assets() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(CATALOG_FILE), CATALOG).expect("write catalog");
        fs::create_dir_all(dir.path().join("win-friends")).expect("mkdir");
        fs::write(
            dir.path().join("win-friends/toc.json"),
            r#"[{"id": "p1", "titleEn": "Part One", "titleEs": "Parte Uno"}]"#,
        )
        .expect("write toc");

        let catalog = Catalog::load(dir.path()).expect("catalog");
        assert_eq!(catalog.books().len(), 2);
        assert_eq!(catalog.default_book_id(), "economic-indicators");

        let win = catalog.get("win-friends").expect("book");
        assert_eq!(win.category, Category::SelfHelp);
        assert_eq!(catalog.load_toc(win).len(), 1);
        assert!(catalog.load_dictionary(win).is_empty());

        // Listed but missing on disk.
        let econ = catalog.get("economic-indicators").expect("book");
        assert!(catalog.load_dictionary(econ).is_empty());
        assert!(catalog.load_toc(econ).is_empty());
    }

    #[test]
    fn unknown_default_falls_back_to_first_book() {
        let books: Vec<BookMetadata> = toml::from_str::<CatalogFile>(CATALOG)
            .expect("parse")
            .books;
        let catalog =
            Catalog::from_books(Path::new("/lib"), books, Some("missing".into())).expect("catalog");
        assert_eq!(catalog.default_book_id(), "win-friends");
    }

    #[test]
    fn empty_catalog_is_an_error() {
        assert!(Catalog::from_books(Path::new("/lib"), Vec::new(), None).is_err());
    }

    #[test]
    fn resolves_relative_locations() {
        let books: Vec<BookMetadata> = toml::from_str::<CatalogFile>(CATALOG)
            .expect("parse")
            .books;
        let catalog = Catalog::from_books(Path::new("/lib"), books, None).expect("catalog");
        assert_eq!(
            catalog.resolve_location("https://example.com/c.json"),
            "https://example.com/c.json"
        );
        assert_eq!(
            catalog.resolve_location("/data/books/x/content.json"),
            "/data/books/x/content.json"
        );
        assert_eq!(catalog.resolve_location("x/content.json"), "/lib/x/content.json");
    }
}
