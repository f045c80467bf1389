//! Per-book reading statistics: sessions, streaks and time spent.

use crate::storage::{self, BlobStore, Concern};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Assumed reading pace before any page has been visited.
pub const DEFAULT_SECONDS_PER_PAGE: f64 = 120.0;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadingStats {
    pub total_reading_seconds: u64,
    pub pages_visited: Vec<usize>,
    /// `YYYY-MM-DD`, empty before the first session.
    pub last_read_date: String,
    pub streak_days: u32,
    pub sessions_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSummary {
    pub pages_read: usize,
    pub completion_percent: u32,
    pub avg_pages_per_session: u32,
    pub total_seconds: u64,
    pub estimated_remaining_seconds: u64,
    pub streak_days: u32,
    pub sessions_count: u32,
    pub glossary_count: usize,
}

impl ReadingStats {
    pub fn load(store: &dyn BlobStore, book_id: &str) -> Self {
        storage::load_json(store, &storage::storage_key(Concern::ReadingStats, book_id))
            .unwrap_or_default()
    }

    pub fn save(&self, store: &dyn BlobStore, book_id: &str) {
        storage::save_json(
            store,
            &storage::storage_key(Concern::ReadingStats, book_id),
            self,
        );
    }

    fn last_read(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.last_read_date, DATE_FORMAT).ok()
    }

    /// Count a reading session on `today`. Returns false when a session was
    /// already counted for that day.
    pub fn begin_session(&mut self, today: NaiveDate) -> bool {
        let last = self.last_read();
        if last == Some(today) {
            return false;
        }
        let consecutive = last.is_some_and(|date| date + Duration::days(1) == today);
        self.streak_days = if consecutive { self.streak_days + 1 } else { 1 };
        self.sessions_count += 1;
        self.last_read_date = today.format(DATE_FORMAT).to_string();
        debug!(
            streak = self.streak_days,
            sessions = self.sessions_count,
            "Reading session started"
        );
        true
    }

    /// Record a page visit. Returns false when the page was already counted.
    pub fn visit_page(&mut self, page_index: usize) -> bool {
        if self.pages_visited.contains(&page_index) {
            return false;
        }
        self.pages_visited.push(page_index);
        true
    }

    pub fn add_reading_time(&mut self, seconds: u64) {
        self.total_reading_seconds = self.total_reading_seconds.saturating_add(seconds);
    }

    pub fn summary(&self, total_pages: usize, glossary_count: usize, session_secs: u64) -> StatsSummary {
        let pages_read = self.pages_visited.len();
        let completion_percent = if total_pages > 0 {
            (pages_read as f64 / total_pages as f64 * 100.0).round() as u32
        } else {
            0
        };
        let avg_pages_per_session = if self.sessions_count > 0 {
            (pages_read as f64 / self.sessions_count as f64).round() as u32
        } else {
            0
        };
        let total_seconds = self.total_reading_seconds + session_secs;
        let per_page = if pages_read > 0 {
            total_seconds as f64 / pages_read as f64
        } else {
            DEFAULT_SECONDS_PER_PAGE
        };
        let remaining = total_pages.saturating_sub(pages_read);
        StatsSummary {
            pages_read,
            completion_percent,
            avg_pages_per_session,
            total_seconds,
            estimated_remaining_seconds: (remaining as f64 * per_page).round() as u64,
            streak_days: self.streak_days,
            sessions_count: self.sessions_count,
            glossary_count,
        }
    }
}

/// `1h 5m` above an hour, `5m` below.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}
