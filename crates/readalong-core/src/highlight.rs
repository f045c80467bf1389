//! Aligning speech-engine boundary offsets with the words of the spoken
//! text.

use serde::Serialize;

/// A whitespace-delimited word of the spoken text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordToken {
    pub text: String,
    /// Byte offset of the word in the spoken text.
    pub start_offset: usize,
}

/// Word currently being spoken, as last reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpeechHighlight {
    pub word_index: Option<usize>,
    pub char_index: usize,
    pub char_length: usize,
}

/// Split `text` on whitespace, remembering where each word starts.
pub fn spoken_words(text: &str) -> Vec<WordToken> {
    let mut words = Vec::new();
    let mut start = None;
    for (idx, ch) in text.char_indices() {
        match (ch.is_whitespace(), start) {
            (false, None) => start = Some(idx),
            (true, Some(begin)) => {
                words.push(WordToken {
                    text: text[begin..idx].to_string(),
                    start_offset: begin,
                });
                start = None;
            }
            _ => {}
        }
    }
    if let Some(begin) = start {
        words.push(WordToken {
            text: text[begin..].to_string(),
            start_offset: begin,
        });
    }
    words
}

/// Index of the word whose `[start, next_start)` range contains
/// `char_index`; the last word extends to `text_len`.
///
/// Offsets must be increasing, which [`spoken_words`] guarantees.
pub fn word_at(words: &[WordToken], text_len: usize, char_index: usize) -> Option<usize> {
    words.iter().enumerate().position(|(idx, word)| {
        let end = words
            .get(idx + 1)
            .map(|next| next.start_offset)
            .unwrap_or(text_len);
        char_index >= word.start_offset && char_index < end
    })
}
