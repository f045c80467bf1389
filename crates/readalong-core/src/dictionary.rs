//! Static per-book dictionary.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryEntry {
    pub word: String,
    pub definition: String,
    #[serde(rename = "definitionEs", alias = "definitionSecondary", default)]
    pub definition_secondary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: Vec<DictionaryEntry>,
    by_word: HashMap<String, usize>,
}

/// Lookup key: lowercase with every char that is not a word char or an
/// apostrophe removed.
pub fn lookup_key(word: &str) -> String {
    word.nfc()
        .filter(|ch| ch.is_alphanumeric() || *ch == '_' || *ch == '\'')
        .collect::<String>()
        .to_lowercase()
}

impl Dictionary {
    pub fn new(entries: Vec<DictionaryEntry>) -> Self {
        let mut by_word = HashMap::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            // First definition wins when the authored list repeats a word.
            by_word
                .entry(entry.word.nfc().collect::<String>().to_lowercase())
                .or_insert(idx);
        }
        Self { entries, by_word }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read dictionary {}", path.display()))?;
        let entries: Vec<DictionaryEntry> = serde_json::from_str(&data)
            .with_context(|| format!("Invalid dictionary JSON in {}", path.display()))?;
        info!(path = %path.display(), entries = entries.len(), "Loaded dictionary");
        Ok(Self::new(entries))
    }

    pub fn get(&self, word: &str) -> Option<&DictionaryEntry> {
        let idx = self
            .by_word
            .get(&lookup_key(word))
            .or_else(|| self.by_word.get(&word.nfc().collect::<String>().to_lowercase()))?;
        self.entries.get(*idx)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.get(word).is_some()
    }

    pub fn entries(&self) -> &[DictionaryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
