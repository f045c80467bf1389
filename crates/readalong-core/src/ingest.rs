//! Building paragraph stores from raw text.

use crate::content::{BookContent, ContentBlock};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Split text into paragraphs separated by blank lines. Paragraphs are
/// trimmed; line breaks inside a paragraph are kept.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut buffer = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            flush(&mut buffer, &mut paragraphs);
        } else {
            buffer.push(line);
        }
    }
    flush(&mut buffer, &mut paragraphs);

    paragraphs
}

fn flush(buffer: &mut Vec<&str>, paragraphs: &mut Vec<String>) {
    if buffer.is_empty() {
        return;
    }
    let paragraph = buffer.join("\n").trim().to_string();
    buffer.clear();
    if !paragraph.is_empty() {
        paragraphs.push(paragraph);
    }
}

/// Append the paragraphs of `raw` to `content`. Returns how many were added.
pub fn append_paragraphs(content: &mut BookContent, raw: &str) -> usize {
    let added = split_paragraphs(raw);
    let count = added.len();
    content
        .paragraphs
        .extend(added.into_iter().map(ContentBlock::Text));
    count
}

/// Append raw text from `raw_path` to the content file at `content_path`,
/// creating the content file if it does not exist yet.
pub fn append_to_file(content_path: &Path, raw_path: &Path) -> Result<usize> {
    let raw = fs::read_to_string(raw_path)
        .with_context(|| format!("Failed to read raw text {}", raw_path.display()))?;
    let mut content = if content_path.exists() {
        let data = fs::read_to_string(content_path)
            .with_context(|| format!("Failed to read {}", content_path.display()))?;
        serde_json::from_str::<BookContent>(&data)
            .with_context(|| format!("Invalid content JSON in {}", content_path.display()))?
    } else {
        BookContent::default()
    };

    let previous = content.len();
    let added = append_paragraphs(&mut content, &raw);
    if added == 0 {
        info!(path = %raw_path.display(), "No new paragraphs found");
        return Ok(0);
    }

    if let Some(parent) = content_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create_dir_all {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&content).context("Failed to encode content")?;
    fs::write(content_path, json)
        .with_context(|| format!("Failed to write {}", content_path.display()))?;
    info!(
        path = %content_path.display(),
        previous,
        added,
        total = content.len(),
        "Appended paragraphs"
    );
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_blank_lines() {
        let raw = "  First line\nsame paragraph  \n\n \t \nSecond\r\n\r\n\n\nThird\n";
        assert_eq!(
            split_paragraphs(raw),
            vec!["First line\nsame paragraph", "Second", "Third"]
        );
        assert!(split_paragraphs("\n \n").is_empty());
    }

    #[test]
    fn appends_after_existing_blocks() {
        let mut content = BookContent::new(vec![ContentBlock::bilingual("Hi", "Hola")]);
        assert_eq!(append_paragraphs(&mut content, "One\n\nTwo"), 2);
        assert_eq!(content.paragraphs[2], ContentBlock::text("Two"));
    }

    #[test]
    fn append_to_file_creates_and_extends() {
        let dir = tempfile::tempdir().expect("tempdir");
        let raw = dir.path().join("raw.txt");
        let content_path = dir.path().join("book/content.json");
        fs::write(&raw, "Alpha\n\nBeta").expect("write raw");

        assert_eq!(append_to_file(&content_path, &raw).expect("append"), 2);
        assert_eq!(append_to_file(&content_path, &raw).expect("append"), 2);

        let data = fs::read_to_string(&content_path).expect("read");
        let content: BookContent = serde_json::from_str(&data).expect("parse");
        assert_eq!(content.len(), 4);
    }
}
