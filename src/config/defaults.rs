pub(crate) fn default_library_dir() -> String {
    "library".to_string()
}

pub(crate) fn default_state_dir() -> String {
    ".readalong".to_string()
}

pub(crate) fn default_paragraphs_per_page() -> usize {
    5
}

pub(crate) fn default_speech_rate() -> f32 {
    1.0
}

pub(crate) fn default_speech_pitch() -> f32 {
    1.0
}

pub(crate) fn default_words_per_minute() -> u32 {
    180
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Info
}
