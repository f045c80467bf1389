//! Linear full-text search over the paragraph store.

use crate::content::{ContentBlock, Language};
use crate::pagination::Paginator;
use crate::text_utils::{find_case_insensitive, snippet_around};

pub const MIN_QUERY_CHARS: usize = 2;
pub const MAX_RESULTS: usize = 50;
pub const SNIPPET_CONTEXT: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub paragraph_index: usize,
    pub page_index: usize,
    pub snippet: String,
}

/// First match per paragraph, in store order.
pub fn search(
    paragraphs: &[ContentBlock],
    query: &str,
    lang: Language,
    paginator: &Paginator,
) -> Vec<SearchResult> {
    if query.chars().count() < MIN_QUERY_CHARS {
        return Vec::new();
    }
    paragraphs
        .iter()
        .enumerate()
        .filter_map(|(idx, block)| {
            let text = block.text_for(lang)?;
            let range = find_case_insensitive(text, query)?;
            Some(SearchResult {
                paragraph_index: idx,
                page_index: paginator.page_of(idx),
                snippet: snippet_around(text, range, SNIPPET_CONTEXT),
            })
        })
        .take(MAX_RESULTS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_queries_return_nothing() {
        let paragraphs = vec![ContentBlock::text("a b c")];
        assert!(search(&paragraphs, "a", Language::Primary, &Paginator::new(5)).is_empty());
    }

    #[test]
    fn finds_in_active_language_and_skips_images() {
        let paragraphs = vec![
            ContentBlock::image("/img.png"),
            ContentBlock::bilingual("The smile", "La sonrisa"),
            ContentBlock::text("Nothing here"),
        ];
        let pager = Paginator::new(2);
        let hits = search(&paragraphs, "SONRISA", Language::Secondary, &pager);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].paragraph_index, 1);
        assert_eq!(hits[0].page_index, 0);
        assert_eq!(hits[0].snippet, "La sonrisa");
        assert!(search(&paragraphs, "sonrisa", Language::Primary, &pager).is_empty());
    }

    #[test]
    fn caps_results_and_elides_snippets() {
        let long = format!("{}needle{}", "x".repeat(60), "y".repeat(60));
        let paragraphs = vec![ContentBlock::text(long); 80];
        let hits = search(&paragraphs, "needle", Language::Primary, &Paginator::new(5));
        assert_eq!(hits.len(), MAX_RESULTS);
        assert_eq!(hits[49].page_index, 9);
        let snippet = &hits[0].snippet;
        assert!(snippet.starts_with("...") && snippet.ends_with("..."));
        assert_eq!(snippet.chars().count(), 3 + 40 + 6 + 40 + 3);
    }
}
