use readalong_core::pagination::ViewMode;
use readalong_core::session::SessionOptions;
use readalong_core::speech::SpeechSettings;
use readalong_core::toc::SiblingSearch;
use readalong_core::Language;
use serde::Deserialize;
use std::path::PathBuf;

/// Flat application configuration. The TOML file groups these fields into
/// tables; see `tables.rs`.
#[derive(Debug, Clone, Deserialize, serde::Serialize, PartialEq)]
pub struct AppConfig {
    #[serde(default = "crate::config::defaults::default_library_dir")]
    pub library_dir: String,
    #[serde(default = "crate::config::defaults::default_state_dir")]
    pub state_dir: String,
    #[serde(default = "crate::config::defaults::default_paragraphs_per_page")]
    pub paragraphs_per_page: usize,
    #[serde(default)]
    pub view_mode: ViewMode,
    #[serde(default)]
    pub speech_language: Option<Language>,
    #[serde(default = "crate::config::defaults::default_speech_rate")]
    pub speech_rate: f32,
    #[serde(default = "crate::config::defaults::default_speech_pitch")]
    pub speech_pitch: f32,
    #[serde(default)]
    pub speech_voice: Option<String>,
    /// Pace of the console engine, used to space boundary events.
    #[serde(default = "crate::config::defaults::default_words_per_minute")]
    pub words_per_minute: u32,
    #[serde(default)]
    pub sibling_search: SiblingSearch,
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            library_dir: crate::config::defaults::default_library_dir(),
            state_dir: crate::config::defaults::default_state_dir(),
            paragraphs_per_page: crate::config::defaults::default_paragraphs_per_page(),
            view_mode: ViewMode::default(),
            speech_language: None,
            speech_rate: crate::config::defaults::default_speech_rate(),
            speech_pitch: crate::config::defaults::default_speech_pitch(),
            speech_voice: None,
            words_per_minute: crate::config::defaults::default_words_per_minute(),
            sibling_search: SiblingSearch::default(),
            log_level: crate::config::defaults::default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn library_path(&self) -> PathBuf {
        PathBuf::from(&self.library_dir)
    }

    pub fn state_path(&self) -> PathBuf {
        PathBuf::from(&self.state_dir)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            paragraphs_per_page: self.paragraphs_per_page.max(1),
            sibling_search: self.sibling_search,
            view_mode: self.view_mode,
        }
    }

    /// Speech settings for `language`; a configured speech language wins.
    pub fn speech_settings(&self, language: Language) -> SpeechSettings {
        SpeechSettings {
            language: self.speech_language.unwrap_or(language),
            rate: self.speech_rate,
            pitch: self.speech_pitch,
            voice: None,
        }
    }
}

/// Logging verbosity.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
