//! Table-of-contents resolution.
//!
//! An authored TOC names each section by a literal phrase. Resolution scans
//! the paragraph store for the first paragraph whose primary text contains
//! that phrase and records its index. Children only search from their
//! parent's index onwards, so a sub-section never lands before its own
//! heading. An unmatched entry collapses to the position it started
//! searching from: navigation degrades, it never breaks.

use crate::content::{ContentBlock, Language};
use crate::text_utils::contains_case_insensitive;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Authored TOC node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TocEntry {
    pub id: String,
    #[serde(rename = "titleEn", alias = "titlePrimary")]
    pub title_primary: String,
    #[serde(rename = "titleEs", alias = "titleSecondary", default)]
    pub title_secondary: String,
    #[serde(
        rename = "match",
        alias = "matchPhrase",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub match_phrase: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TocEntry>,
}

impl TocEntry {
    pub fn new(id: impl Into<String>, title_primary: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title_primary: title_primary.into(),
            title_secondary: String::new(),
            match_phrase: None,
            children: Vec::new(),
        }
    }

    pub fn with_match(mut self, phrase: impl Into<String>) -> Self {
        self.match_phrase = Some(phrase.into());
        self
    }

    pub fn with_children(mut self, children: Vec<TocEntry>) -> Self {
        self.children = children;
        self
    }

    /// Phrase used to locate this entry.
    pub fn phrase(&self) -> &str {
        self.match_phrase.as_deref().unwrap_or(&self.title_primary)
    }
}

/// TOC node annotated with the paragraph it points at.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedTocEntry {
    pub id: String,
    #[serde(rename = "titleEn")]
    pub title_primary: String,
    #[serde(rename = "titleEs")]
    pub title_secondary: String,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_phrase: Option<String>,
    #[serde(rename = "paragraphIndex")]
    pub paragraph_index: usize,
    /// Whether the phrase was actually found, as opposed to the fallback.
    pub matched: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ResolvedTocEntry>,
}

impl ResolvedTocEntry {
    pub fn title(&self, language: Language) -> &str {
        let secondary = if self.title_secondary.is_empty() {
            &self.title_primary
        } else {
            &self.title_secondary
        };
        language.pick(&self.title_primary, secondary)
    }
}

/// Where sibling entries start searching.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SiblingSearch {
    /// Every sibling searches from the index inherited from the parent.
    #[default]
    FromParent,
    /// Each sibling starts where the previous sibling resolved.
    Chained,
}

impl std::fmt::Display for SiblingSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SiblingSearch::FromParent => "from-parent",
            SiblingSearch::Chained => "chained",
        };
        write!(f, "{}", label)
    }
}

/// Resolve `entries` against `paragraphs`, starting at `search_from`.
pub fn resolve(
    paragraphs: &[ContentBlock],
    entries: &[TocEntry],
    search_from: usize,
) -> Vec<ResolvedTocEntry> {
    resolve_with(paragraphs, entries, search_from, SiblingSearch::FromParent)
}

pub fn resolve_with(
    paragraphs: &[ContentBlock],
    entries: &[TocEntry],
    search_from: usize,
    policy: SiblingSearch,
) -> Vec<ResolvedTocEntry> {
    // Keep the fallback a valid index even if the caller overshoots.
    let search_from = search_from.min(paragraphs.len().saturating_sub(1));
    let mut cursor = search_from;
    let mut resolved = Vec::with_capacity(entries.len());

    for entry in entries {
        let start = match policy {
            SiblingSearch::FromParent => search_from,
            SiblingSearch::Chained => cursor,
        };
        let found = find_paragraph(paragraphs, entry.phrase(), start);
        let paragraph_index = found.unwrap_or(start);
        if found.is_none() {
            debug!(id = %entry.id, phrase = entry.phrase(), start, "TOC entry unmatched");
        }
        let children = if entry.children.is_empty() {
            Vec::new()
        } else {
            resolve_with(paragraphs, &entry.children, paragraph_index, policy)
        };
        cursor = paragraph_index;
        resolved.push(ResolvedTocEntry {
            id: entry.id.clone(),
            title_primary: entry.title_primary.clone(),
            title_secondary: entry.title_secondary.clone(),
            match_phrase: entry.match_phrase.clone(),
            paragraph_index,
            matched: found.is_some(),
            children,
        });
    }
    resolved
}

/// First paragraph at or after `from` whose primary text contains `phrase`.
pub fn find_paragraph(paragraphs: &[ContentBlock], phrase: &str, from: usize) -> Option<usize> {
    paragraphs
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, block)| {
            block
                .primary_text()
                .is_some_and(|text| contains_case_insensitive(text, phrase))
        })
        .map(|(idx, _)| idx)
}

/// Depth-first listing with nesting depth, for display.
pub fn flatten(entries: &[ResolvedTocEntry]) -> Vec<(usize, &ResolvedTocEntry)> {
    fn walk<'a>(
        entries: &'a [ResolvedTocEntry],
        depth: usize,
        out: &mut Vec<(usize, &'a ResolvedTocEntry)>,
    ) {
        for entry in entries {
            out.push((depth, entry));
            walk(&entry.children, depth + 1, out);
        }
    }
    let mut out = Vec::new();
    walk(entries, 0, &mut out);
    out
}

pub fn find<'a>(entries: &'a [ResolvedTocEntry], id: &str) -> Option<&'a ResolvedTocEntry> {
    flatten(entries)
        .into_iter()
        .map(|(_, entry)| entry)
        .find(|entry| entry.id == id)
}

/// Deepest entry that starts at or before `paragraph_index`.
///
/// Later entries win ties so the most specific heading is reported.
pub fn section_at(
    entries: &[ResolvedTocEntry],
    paragraph_index: usize,
) -> Option<&ResolvedTocEntry> {
    flatten(entries)
        .into_iter()
        .filter(|(_, entry)| entry.paragraph_index <= paragraph_index)
        .max_by_key(|(depth, entry)| (entry.paragraph_index, *depth))
        .map(|(_, entry)| entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraphs(texts: &[&str]) -> Vec<ContentBlock> {
        texts.iter().map(|text| ContentBlock::text(*text)).collect()
    }

    fn indices(entries: &[ResolvedTocEntry]) -> Vec<usize> {
        entries.iter().map(|entry| entry.paragraph_index).collect()
    }

    #[test]
    fn resolves_chapters_in_order() {
        let paragraphs = paragraphs(&[
            "Intro text",
            "Chapter 1: Basics",
            "More content",
            "Chapter 2: Advanced",
        ]);
        let toc = vec![
            TocEntry::new("c1", "Chapter 1").with_match("Chapter 1"),
            TocEntry::new("c2", "Chapter 2").with_match("Chapter 2"),
        ];
        let resolved = resolve(&paragraphs, &toc, 0);
        assert_eq!(indices(&resolved), vec![1, 3]);
        assert!(resolved.iter().all(|entry| entry.matched));
    }

    #[test]
    fn falls_back_to_title_and_is_case_insensitive() {
        let paragraphs = paragraphs(&["preface", "INTRODUCTION", "body"]);
        let toc = vec![TocEntry::new("intro", "Introduction")];
        assert_eq!(indices(&resolve(&paragraphs, &toc, 0)), vec![1]);
    }

    #[test]
    fn unmatched_collapses_to_search_start() {
        let paragraphs = paragraphs(&["a", "b", "c"]);
        let toc = vec![TocEntry::new("missing", "Nowhere")];
        let resolved = resolve(&paragraphs, &toc, 2);
        assert_eq!(resolved[0].paragraph_index, 2);
        assert!(!resolved[0].matched);
    }

    #[test]
    fn children_never_resolve_before_parent() {
        let paragraphs = paragraphs(&[
            "The Business Cycle is mentioned early",
            "Introduction",
            "The Business Cycle",
            "Part Two",
        ]);
        let toc = vec![TocEntry::new("intro", "Introduction").with_children(vec![
            TocEntry::new("cycle", "The Business Cycle"),
            TocEntry::new("missing", "Absent Section"),
        ])];
        let resolved = resolve(&paragraphs, &toc, 0);
        assert_eq!(resolved[0].paragraph_index, 1);
        assert_eq!(indices(&resolved[0].children), vec![2, 1]);
    }

    #[test]
    fn images_never_match() {
        let paragraphs = vec![
            ContentBlock::image("chapter-1.png"),
            ContentBlock::bilingual("Chapter 1", "Capítulo 1"),
        ];
        let toc = vec![TocEntry::new("c1", "chapter")];
        assert_eq!(indices(&resolve(&paragraphs, &toc, 0)), vec![1]);
    }

    #[test]
    fn empty_store_resolves_to_zero() {
        let toc = vec![TocEntry::new("a", "A").with_children(vec![TocEntry::new("b", "B")])];
        let resolved = resolve(&[], &toc, 5);
        assert_eq!(resolved[0].paragraph_index, 0);
        assert_eq!(resolved[0].children[0].paragraph_index, 0);
    }

    #[test]
    fn sibling_policy_changes_shared_phrase_resolution() {
        let paragraphs = paragraphs(&["Summary one", "Part A", "Summary two", "Part B"]);
        let toc = vec![
            TocEntry::new("a", "Part A"),
            TocEntry::new("s", "Summary"),
        ];
        let from_parent = resolve_with(&paragraphs, &toc, 0, SiblingSearch::FromParent);
        assert_eq!(indices(&from_parent), vec![1, 0]);
        let chained = resolve_with(&paragraphs, &toc, 0, SiblingSearch::Chained);
        assert_eq!(indices(&chained), vec![1, 2]);
    }

    #[test]
    fn resolved_shape_matches_authored_tree() {
        let paragraphs = paragraphs(&["x", "y"]);
        let toc = vec![
            TocEntry::new("a", "x").with_children(vec![
                TocEntry::new("a1", "y").with_children(vec![TocEntry::new("a1i", "z")]),
            ]),
            TocEntry::new("b", "q"),
        ];
        let resolved = resolve(&paragraphs, &toc, 0);
        let flat: Vec<(usize, &str)> = flatten(&resolved)
            .into_iter()
            .map(|(depth, entry)| (depth, entry.id.as_str()))
            .collect();
        assert_eq!(flat, vec![(0, "a"), (1, "a1"), (2, "a1i"), (0, "b")]);
        for (_, entry) in flatten(&resolved) {
            assert!(entry.paragraph_index < paragraphs.len());
        }
    }

    #[test]
    fn section_at_prefers_deepest_heading() {
        let paragraphs = paragraphs(&["Intro", "Chapter 1", "Section 1.1", "text", "Chapter 2"]);
        let toc = vec![
            TocEntry::new("c1", "Chapter 1")
                .with_children(vec![TocEntry::new("s11", "Section 1.1")]),
            TocEntry::new("c2", "Chapter 2"),
        ];
        let resolved = resolve(&paragraphs, &toc, 0);
        assert_eq!(section_at(&resolved, 3).map(|e| e.id.as_str()), Some("s11"));
        assert_eq!(section_at(&resolved, 1).map(|e| e.id.as_str()), Some("c1"));
        assert_eq!(section_at(&resolved, 4).map(|e| e.id.as_str()), Some("c2"));
        assert!(section_at(&resolved, 0).is_none());
        assert_eq!(find(&resolved, "s11").map(|e| e.paragraph_index), Some(2));
    }

    #[test]
    fn parses_authored_json() {
        let json = r#"[{"id": "intro", "titleEn": "Introduction", "titleEs": "Introducción",
            "match": "Introduction", "children": [{"id": "c", "titleEn": "Cycle", "titleEs": "Ciclo"}]}]"#;
        let toc: Vec<TocEntry> = serde_json::from_str(json).expect("toc should parse");
        assert_eq!(toc[0].phrase(), "Introduction");
        assert_eq!(toc[0].children[0].phrase(), "Cycle");
    }
}
