//! Paragraph store model.
//!
//! A book is a flat, ordered list of [`ContentBlock`]s. Identity is the
//! position in that list; nothing mutates it after load.

use serde::{Deserialize, Serialize};

/// Active reading language.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "en", alias = "primary")]
    Primary,
    #[serde(rename = "es", alias = "secondary")]
    Secondary,
}

impl Language {
    /// Pick the label matching this language.
    pub fn pick<'a>(self, primary: &'a str, secondary: &'a str) -> &'a str {
        match self {
            Language::Primary => primary,
            Language::Secondary => secondary,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::Primary => "en",
            Language::Secondary => "es",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Language::Primary => Language::Secondary,
            Language::Secondary => Language::Primary,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" | "primary" => Some(Language::Primary),
            "es" | "secondary" => Some(Language::Secondary),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Image,
}

/// One entry of the paragraph store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ContentBlock {
    Text(String),
    Image {
        #[serde(rename = "type")]
        kind: ImageKind,
        #[serde(alias = "source")]
        src: String,
    },
    Bilingual {
        #[serde(rename = "en", alias = "primaryText")]
        primary: String,
        #[serde(rename = "es", alias = "secondaryText")]
        secondary: String,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text(text.into())
    }

    pub fn bilingual(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        ContentBlock::Bilingual {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }

    pub fn image(src: impl Into<String>) -> Self {
        ContentBlock::Image {
            kind: ImageKind::Image,
            src: src.into(),
        }
    }

    /// Primary-language text; images have none.
    pub fn primary_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text(text) => Some(text),
            ContentBlock::Bilingual { primary, .. } => Some(primary),
            ContentBlock::Image { .. } => None,
        }
    }

    /// Text in the requested language. Plain paragraphs are the same in both.
    pub fn text_for(&self, language: Language) -> Option<&str> {
        match (self, language) {
            (ContentBlock::Bilingual { secondary, .. }, Language::Secondary) => Some(secondary),
            _ => self.primary_text(),
        }
    }

    pub fn image_src(&self) -> Option<&str> {
        match self {
            ContentBlock::Image { src, .. } => Some(src),
            _ => None,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, ContentBlock::Image { .. })
    }
}

/// Payload of a book content file: `{ "paragraphs": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct BookContent {
    #[serde(default)]
    pub paragraphs: Vec<ContentBlock>,
}

impl BookContent {
    pub fn new(paragraphs: Vec<ContentBlock>) -> Self {
        Self { paragraphs }
    }

    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    pub fn is_bilingual(&self) -> bool {
        matches!(self.paragraphs.first(), Some(ContentBlock::Bilingual { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_block_shapes() {
        let json = r#"{"paragraphs": [
            "Plain paragraph",
            {"en": "Hello", "es": "Hola"},
            {"type": "image", "src": "/img/cover.png"},
            {"primaryText": "Good", "secondaryText": "Bueno"}
        ]}"#;
        let content: BookContent = serde_json::from_str(json).expect("content should parse");
        assert_eq!(content.len(), 4);
        assert_eq!(content.paragraphs[0], ContentBlock::text("Plain paragraph"));
        assert_eq!(content.paragraphs[1], ContentBlock::bilingual("Hello", "Hola"));
        assert_eq!(content.paragraphs[2], ContentBlock::image("/img/cover.png"));
        assert_eq!(content.paragraphs[3], ContentBlock::bilingual("Good", "Bueno"));
    }

    #[test]
    fn text_for_falls_back_to_primary() {
        let plain = ContentBlock::text("Only one");
        assert_eq!(plain.text_for(Language::Secondary), Some("Only one"));

        let pair = ContentBlock::bilingual("Hello", "Hola");
        assert_eq!(pair.text_for(Language::Primary), Some("Hello"));
        assert_eq!(pair.text_for(Language::Secondary), Some("Hola"));

        let image = ContentBlock::image("a.png");
        assert_eq!(image.text_for(Language::Primary), None);
        assert_eq!(image.image_src(), Some("a.png"));
    }

    #[test]
    fn language_codes() {
        assert_eq!(Language::from_code("ES"), Some(Language::Secondary));
        assert_eq!(Language::from_code("fr"), None);
        assert_eq!(Language::Primary.pick("Page", "Pag."), "Page");
        assert_eq!(Language::Secondary.toggled(), Language::Primary);
        let json = serde_json::to_string(&Language::Secondary).expect("serialize");
        assert_eq!(json, "\"es\"");
    }
}
