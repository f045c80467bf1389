//! Tokenizing paragraph text for glossary detection.
//!
//! Tokens cover the input exactly: concatenating every token's text gives
//! back the original string.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static RE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\w']+|[^\w\s]|\s+").unwrap());

const LEADING_QUOTES: &[char] = &['\'', '"', '‘', '’', '“', '”', '«', '¿', '¡'];
const TRAILING_STRIP: &[char] = &[
    '\'', '"', '‘', '’', '“', '”', '»', ',', ';', ':', '.', '!', '?', ')', ']', '}',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Punctuation,
    Whitespace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    /// Byte offset into the tokenized string.
    pub start: usize,
    pub kind: TokenKind,
}

impl Token<'_> {
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }
}

pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    RE_TOKEN
        .find_iter(text)
        .map(|m| {
            let token = m.as_str();
            let kind = match token.chars().next() {
                Some(ch) if ch.is_whitespace() => TokenKind::Whitespace,
                Some(ch) if ch.is_alphanumeric() || ch == '_' || ch == '\'' => {
                    if token.chars().count() == 1 && ch == '\'' {
                        TokenKind::Punctuation
                    } else {
                        TokenKind::Word
                    }
                }
                _ => TokenKind::Punctuation,
            };
            Token {
                text: token,
                start: m.start(),
                kind,
            }
        })
        .collect()
}

/// Dictionary lookup key for a token: surrounding quotes and trailing
/// punctuation removed, NFC composed, lowercased.
pub fn normalize_for_lookup(token: &str) -> String {
    token
        .trim_start_matches(|ch: char| LEADING_QUOTES.contains(&ch))
        .trim_end_matches(|ch: char| ch.is_whitespace() || TRAILING_STRIP.contains(&ch))
        .nfc()
        .collect::<String>()
        .to_lowercase()
}

/// Piece of a paragraph as the reader shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span<'a> {
    Plain(&'a str),
    /// A word with a definition, either from the book dictionary or the
    /// reader's own glossary.
    Term { text: &'a str, key: String },
}

impl Span<'_> {
    pub fn text(&self) -> &str {
        match self {
            Span::Plain(text) => text,
            Span::Term { text, .. } => text,
        }
    }
}

/// Split `text` into plain runs and lookup terms.
///
/// Single-letter words are never terms.
pub fn glossary_spans<'a>(text: &'a str, is_known: impl Fn(&str) -> bool) -> Vec<Span<'a>> {
    tokenize(text)
        .into_iter()
        .map(|token| {
            if token.kind != TokenKind::Word {
                return Span::Plain(token.text);
            }
            let key = normalize_for_lookup(token.text);
            if key.chars().count() > 1 && is_known(&key) {
                Span::Term {
                    text: token.text,
                    key,
                }
            } else {
                Span::Plain(token.text)
            }
        })
        .collect()
}
