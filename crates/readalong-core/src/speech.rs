//! Read-aloud controller.
//!
//! The platform speech engine sits behind [`SpeechEngine`]. The controller
//! owns the state machine (`Idle -> Speaking <-> Paused -> Idle`) and learns
//! about progress only through [`SpeechController::handle_event`], which the
//! host calls for each engine callback. Every utterance carries an id, and
//! callbacks for anything but the active utterance are dropped.

use crate::content::Language;
use crate::highlight::{SpeechHighlight, WordToken, spoken_words, word_at};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const MIN_RATE: f32 = 0.5;
pub const MAX_RATE: f32 = 2.0;

/// Engine error reported for utterances we cancelled ourselves.
pub const CANCELED: &str = "canceled";

const PREFERRED_VOICES_PRIMARY: &[&str] = &[
    "Daniel",
    "Aaron",
    "Alex",
    "Tom",
    "David",
    "Mark",
    "James",
    "Google UK English Male",
    "Google US English",
];

const PREFERRED_VOICES_SECONDARY: &[&str] = &["Jorge", "Juan", "Diego", "Pablo", "Google español"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    /// BCP 47 tag such as `en-US`.
    pub lang: String,
    #[serde(default)]
    pub local_service: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: u64,
    pub text: String,
    pub lang: String,
    pub rate: f32,
    pub pitch: f32,
    pub voice: Option<Voice>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Start,
    /// Word boundary; offsets are UTF-8 byte offsets into the utterance text.
    Boundary {
        char_index: usize,
        char_length: usize,
    },
    End,
    Error(String),
    Pause,
    Resume,
}

pub trait SpeechEngine {
    fn speak(&mut self, utterance: &Utterance) -> Result<()>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn cancel(&mut self);
    fn voices(&self) -> Vec<Voice>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeechStatus {
    #[default]
    Idle,
    Speaking,
    Paused,
}

/// Signals for the host once an utterance settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechNotice {
    Finished,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechSettings {
    pub language: Language,
    pub rate: f32,
    pub pitch: f32,
    pub voice: Option<Voice>,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            language: Language::Primary,
            rate: 1.0,
            pitch: 1.0,
            voice: None,
        }
    }
}

pub fn clamp_rate(rate: f32) -> f32 {
    if rate.is_nan() {
        return 1.0;
    }
    rate.clamp(MIN_RATE, MAX_RATE)
}

/// Engine language tag for the reading language.
pub fn speech_lang(language: Language) -> &'static str {
    match language {
        Language::Primary => "en-US",
        Language::Secondary => "es-ES",
    }
}

/// Pick a voice for `lang_code` (`en`, `es`): a preferred voice served
/// locally, then a preferred voice from anywhere, then any local voice, then
/// any voice for the language.
pub fn preferred_voice<'a>(voices: &'a [Voice], lang_code: &str) -> Option<&'a Voice> {
    let preferred = if lang_code == "es" {
        PREFERRED_VOICES_SECONDARY
    } else {
        PREFERRED_VOICES_PRIMARY
    };
    let for_lang: Vec<&Voice> = voices
        .iter()
        .filter(|voice| voice.lang.starts_with(lang_code))
        .collect();

    preferred
        .iter()
        .find_map(|name| {
            for_lang
                .iter()
                .find(|voice| voice.name.contains(*name) && voice.local_service)
        })
        .or_else(|| {
            preferred
                .iter()
                .find_map(|name| for_lang.iter().find(|voice| voice.name.contains(*name)))
        })
        .or_else(|| for_lang.iter().find(|voice| voice.local_service))
        .or_else(|| for_lang.first())
        .copied()
}

pub struct SpeechController<E: SpeechEngine> {
    engine: E,
    settings: SpeechSettings,
    status: SpeechStatus,
    text: Option<String>,
    words: Vec<WordToken>,
    highlight: Option<SpeechHighlight>,
    next_id: u64,
    active: Option<u64>,
    restarting: bool,
    restart_pending: bool,
    notices: Vec<SpeechNotice>,
}

impl<E: SpeechEngine> SpeechController<E> {
    pub fn new(engine: E, mut settings: SpeechSettings) -> Self {
        settings.rate = clamp_rate(settings.rate);
        if settings.voice.is_none() {
            settings.voice =
                preferred_voice(&engine.voices(), settings.language.code()).cloned();
        }
        Self {
            engine,
            settings,
            status: SpeechStatus::Idle,
            text: None,
            words: Vec::new(),
            highlight: None,
            next_id: 0,
            active: None,
            restarting: false,
            restart_pending: false,
            notices: Vec::new(),
        }
    }

    pub fn status(&self) -> SpeechStatus {
        self.status
    }

    pub fn settings(&self) -> &SpeechSettings {
        &self.settings
    }

    pub fn current_text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn highlight(&self) -> Option<SpeechHighlight> {
        self.highlight
    }

    /// Word under the current highlight.
    pub fn highlighted_word(&self) -> Option<&str> {
        let index = self.highlight?.word_index?;
        self.words.get(index).map(|word| word.text.as_str())
    }

    pub fn active_utterance(&self) -> Option<u64> {
        self.active
    }

    pub fn is_restarting(&self) -> bool {
        self.restarting
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn voices(&self) -> Vec<Voice> {
        self.engine.voices()
    }

    pub fn take_notices(&mut self) -> Vec<SpeechNotice> {
        std::mem::take(&mut self.notices)
    }

    /// Start reading `text` from the beginning, replacing whatever is playing.
    /// The status becomes `Speaking` once the engine reports the start.
    pub fn speak(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        self.engine.cancel();
        self.restarting = false;
        self.restart_pending = false;
        self.words = spoken_words(text);
        self.text = Some(text.to_string());
        self.highlight = None;
        self.start_utterance();
    }

    /// Ask the engine to pause; only valid while speaking.
    pub fn pause(&mut self) {
        if self.status == SpeechStatus::Speaking {
            self.engine.pause();
        }
    }

    pub fn resume(&mut self) {
        if self.status == SpeechStatus::Paused {
            self.engine.resume();
        }
    }

    pub fn toggle_play_pause(&mut self) {
        match self.status {
            SpeechStatus::Speaking => self.pause(),
            SpeechStatus::Paused => self.resume(),
            SpeechStatus::Idle => {}
        }
    }

    /// Cancel speech and go idle immediately.
    pub fn stop(&mut self) {
        self.engine.cancel();
        self.reset_to_idle();
        debug!("Speech stopped");
    }

    pub fn set_rate(&mut self, rate: f32) {
        let rate = clamp_rate(rate);
        if (rate - self.settings.rate).abs() < f32::EPSILON {
            return;
        }
        self.settings.rate = rate;
        self.settings_changed();
    }

    pub fn set_voice(&mut self, voice: Option<Voice>) {
        if voice == self.settings.voice {
            return;
        }
        self.settings.voice = voice;
        self.settings_changed();
    }

    /// Select a voice by (partial) name. Returns false when none matches.
    pub fn set_voice_by_name(&mut self, name: &str) -> bool {
        let Some(voice) = self
            .engine
            .voices()
            .into_iter()
            .find(|voice| voice.name.contains(name))
        else {
            return false;
        };
        self.set_voice(Some(voice));
        true
    }

    /// Switch the reading language; the voice follows the language.
    pub fn set_language(&mut self, language: Language) {
        if language == self.settings.language {
            return;
        }
        self.settings.language = language;
        self.settings.voice = preferred_voice(&self.engine.voices(), language.code()).cloned();
        self.settings_changed();
    }

    /// Feed one engine callback for utterance `id`.
    pub fn handle_event(&mut self, id: u64, event: EngineEvent) {
        if self.active != Some(id) {
            debug!(id, active = ?self.active, ?event, "Ignoring stale speech event");
            return;
        }
        match event {
            EngineEvent::Start => {
                self.status = SpeechStatus::Speaking;
                self.highlight = None;
                if self.restarting {
                    self.restarting = false;
                    if std::mem::take(&mut self.restart_pending) {
                        self.restart();
                    }
                }
            }
            EngineEvent::Boundary {
                char_index,
                char_length,
            } => {
                if self.status == SpeechStatus::Idle {
                    debug!(id, "Ignoring boundary before start");
                    return;
                }
                let text_len = self.text.as_ref().map_or(0, String::len);
                self.highlight = Some(SpeechHighlight {
                    word_index: word_at(&self.words, text_len, char_index),
                    char_index,
                    char_length,
                });
            }
            EngineEvent::End => {
                self.reset_to_idle();
                self.notices.push(SpeechNotice::Finished);
            }
            EngineEvent::Error(reason) => {
                if reason == CANCELED {
                    debug!(id, "Swallowing cancellation from engine");
                    return;
                }
                warn!(id, %reason, "Speech engine error");
                self.reset_to_idle();
                self.notices.push(SpeechNotice::Failed(reason));
            }
            EngineEvent::Pause => {
                if self.status == SpeechStatus::Speaking {
                    self.status = SpeechStatus::Paused;
                }
            }
            EngineEvent::Resume => {
                if self.status == SpeechStatus::Paused {
                    self.status = SpeechStatus::Speaking;
                }
            }
        }
    }

    fn settings_changed(&mut self) {
        if self.status == SpeechStatus::Idle || self.text.is_none() {
            return;
        }
        if self.restarting {
            self.restart_pending = true;
            debug!("Restart already settling; coalescing settings change");
            return;
        }
        self.restart();
    }

    /// Replay the current text from word zero with the current settings.
    fn restart(&mut self) {
        info!(
            rate = self.settings.rate,
            voice = ?self.settings.voice.as_ref().map(|voice| voice.name.as_str()),
            language = %self.settings.language,
            "Restarting speech with new settings"
        );
        self.restarting = true;
        self.highlight = None;
        self.engine.cancel();
        self.start_utterance();
    }

    fn start_utterance(&mut self) {
        let Some(text) = self.text.clone() else {
            return;
        };
        self.next_id = self.next_id.wrapping_add(1);
        let utterance = Utterance {
            id: self.next_id,
            text,
            lang: speech_lang(self.settings.language).to_string(),
            rate: self.settings.rate,
            pitch: self.settings.pitch,
            voice: self.settings.voice.clone(),
        };
        self.active = Some(utterance.id);
        debug!(id = utterance.id, rate = utterance.rate, "Submitting utterance");
        if let Err(err) = self.engine.speak(&utterance) {
            warn!(id = utterance.id, "Engine rejected utterance: {err:#}");
            self.reset_to_idle();
            self.notices.push(SpeechNotice::Failed(format!("{err:#}")));
        }
    }

    fn reset_to_idle(&mut self) {
        self.status = SpeechStatus::Idle;
        self.text = None;
        self.words.clear();
        self.highlight = None;
        self.active = None;
        self.restarting = false;
        self.restart_pending = false;
    }
}
