//! Pagination over the paragraph store.
//!
//! Pages are fixed-size windows of paragraphs. Nothing here looks at
//! rendered layout; a page is always `paragraphs_per_page` blocks (the last
//! one possibly shorter).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;

static RE_CHAPTER_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^Chapter \d+:").unwrap());
static RE_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:[•\-*]|\d+\.)\s").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Paged,
    /// The whole store on one scrolling surface.
    Scroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    paragraphs_per_page: usize,
}

impl Paginator {
    pub fn new(paragraphs_per_page: usize) -> Self {
        Self {
            paragraphs_per_page: paragraphs_per_page.max(1),
        }
    }

    pub fn paragraphs_per_page(&self) -> usize {
        self.paragraphs_per_page
    }

    /// Never zero, even for an empty store.
    pub fn total_pages(&self, paragraph_count: usize) -> usize {
        paragraph_count.div_ceil(self.paragraphs_per_page).max(1)
    }

    pub fn clamp_page(&self, page: usize, paragraph_count: usize) -> usize {
        page.min(self.total_pages(paragraph_count) - 1)
    }

    /// Paragraph indices shown on `page` (clamped into range).
    pub fn page_range(&self, page: usize, paragraph_count: usize) -> Range<usize> {
        let page = self.clamp_page(page, paragraph_count);
        let start = (page * self.paragraphs_per_page).min(paragraph_count);
        let end = (start + self.paragraphs_per_page).min(paragraph_count);
        start..end
    }

    pub fn view_range(&self, mode: ViewMode, page: usize, paragraph_count: usize) -> Range<usize> {
        match mode {
            ViewMode::Paged => self.page_range(page, paragraph_count),
            ViewMode::Scroll => 0..paragraph_count,
        }
    }

    pub fn page_of(&self, paragraph_index: usize) -> usize {
        paragraph_index / self.paragraphs_per_page
    }

    /// Parse a 1-based page number typed by the reader.
    pub fn parse_goto(&self, input: &str, total_pages: usize) -> Option<usize> {
        let number: usize = input.trim().parse().ok()?;
        (1..=total_pages).contains(&number).then(|| number - 1)
    }
}

/// Percentage of the book reached when `page` is on screen.
pub fn progress_percent(page: usize, total_pages: usize) -> f64 {
    if total_pages > 1 {
        (page + 1) as f64 / total_pages as f64 * 100.0
    } else {
        100.0
    }
}

pub fn is_last_page(page: usize, total_pages: usize) -> bool {
    page + 1 >= total_pages
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    ChapterHeading,
    Bullet,
    Paragraph,
}

/// Presentation hint for one line of a paragraph.
pub fn classify(text: &str) -> LineKind {
    let trimmed = text.trim();
    if RE_CHAPTER_HEADING.is_match(trimmed) {
        LineKind::ChapterHeading
    } else if RE_BULLET.is_match(trimmed) {
        LineKind::Bullet
    } else {
        LineKind::Paragraph
    }
}

/// Non-blank lines of a paragraph.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_counts() {
        let pager = Paginator::new(5);
        assert_eq!(pager.total_pages(0), 1);
        assert_eq!(pager.total_pages(5), 1);
        assert_eq!(pager.total_pages(6), 2);
        assert_eq!(pager.page_range(1, 6), 5..6);
        assert_eq!(pager.page_range(9, 6), 5..6);
        assert_eq!(pager.page_range(0, 0), 0..0);
        assert_eq!(pager.page_of(7), 1);
        assert_eq!(pager.view_range(ViewMode::Scroll, 1, 6), 0..6);
    }

    #[test]
    fn goto_input_is_one_based() {
        let pager = Paginator::new(5);
        assert_eq!(pager.parse_goto(" 3 ", 4), Some(2));
        assert_eq!(pager.parse_goto("0", 4), None);
        assert_eq!(pager.parse_goto("5", 4), None);
        assert_eq!(pager.parse_goto("three", 4), None);
    }

    #[test]
    fn progress_reaches_full_on_last_page() {
        assert_eq!(progress_percent(0, 1), 100.0);
        assert_eq!(progress_percent(1, 4), 50.0);
        assert!(is_last_page(3, 4));
        assert!(!is_last_page(2, 4));
    }

    #[test]
    fn classifies_lines() {
        assert_eq!(classify("Chapter 1: Gross Domestic Product"), LineKind::ChapterHeading);
        assert_eq!(classify("  chapter 12: Jobs"), LineKind::ChapterHeading);
        assert_eq!(classify("• Smile."), LineKind::Bullet);
        assert_eq!(classify("2. Remember names"), LineKind::Bullet);
        assert_eq!(classify("-dash without space"), LineKind::Paragraph);
        assert_eq!(classify("Chapter one"), LineKind::Paragraph);
    }

    #[test]
    fn splits_non_blank_lines() {
        assert_eq!(split_lines("a\n\n  \nb"), vec!["a", "b"]);
    }
}
