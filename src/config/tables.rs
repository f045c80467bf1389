use super::defaults;
use super::models::{AppConfig, LogLevel};
use readalong_core::Language;
use readalong_core::pagination::ViewMode;
use readalong_core::toc::SiblingSearch;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    library: LibraryConfig,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    reading: ReadingConfig,
    #[serde(default)]
    speech: SpeechConfig,
    #[serde(default)]
    toc: TocConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            library_dir: tables.library.library_dir,
            state_dir: tables.storage.state_dir,
            paragraphs_per_page: tables.reading.paragraphs_per_page,
            view_mode: tables.reading.view_mode,
            speech_language: tables.speech.language,
            speech_rate: tables.speech.rate,
            speech_pitch: tables.speech.pitch,
            speech_voice: tables.speech.voice,
            words_per_minute: tables.speech.words_per_minute,
            sibling_search: tables.toc.sibling_search,
            log_level: tables.logging.log_level,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            library: LibraryConfig {
                library_dir: config.library_dir.clone(),
            },
            storage: StorageConfig {
                state_dir: config.state_dir.clone(),
            },
            reading: ReadingConfig {
                paragraphs_per_page: config.paragraphs_per_page,
                view_mode: config.view_mode,
            },
            speech: SpeechConfig {
                language: config.speech_language,
                rate: config.speech_rate,
                pitch: config.speech_pitch,
                voice: config.speech_voice.clone(),
                words_per_minute: config.words_per_minute,
            },
            toc: TocConfig {
                sibling_search: config.sibling_search,
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LibraryConfig {
    #[serde(default = "defaults::default_library_dir")]
    library_dir: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        LibraryConfig {
            library_dir: defaults::default_library_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct StorageConfig {
    #[serde(default = "defaults::default_state_dir")]
    state_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            state_dir: defaults::default_state_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ReadingConfig {
    #[serde(default = "defaults::default_paragraphs_per_page")]
    paragraphs_per_page: usize,
    #[serde(default)]
    view_mode: ViewMode,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        ReadingConfig {
            paragraphs_per_page: defaults::default_paragraphs_per_page(),
            view_mode: ViewMode::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct SpeechConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<Language>,
    #[serde(default = "defaults::default_speech_rate")]
    rate: f32,
    #[serde(default = "defaults::default_speech_pitch")]
    pitch: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    voice: Option<String>,
    #[serde(default = "defaults::default_words_per_minute")]
    words_per_minute: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        SpeechConfig {
            language: None,
            rate: defaults::default_speech_rate(),
            pitch: defaults::default_speech_pitch(),
            voice: None,
            words_per_minute: defaults::default_words_per_minute(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
struct TocConfig {
    #[serde(default)]
    sibling_search: SiblingSearch,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}
