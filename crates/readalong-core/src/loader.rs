//! Content fetching and load bookkeeping.
//!
//! Loads are tagged with a generation. Starting a new load supersedes every
//! earlier one, and results carrying an old ticket are dropped on arrival.

use crate::content::BookContent;
use crate::library::is_url;
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Raised by [`LoadTracker::begin_load`] on the load it supersedes. The
/// fetch checks it between stages and gives up early.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    generation: u64,
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A token no tracker will ever cancel.
    pub fn new() -> Self {
        Self::default()
    }

    fn for_generation(generation: u64) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn check_cancelled(&self, stage: &'static str) -> Result<()> {
        if self.is_cancelled() {
            bail!("load {} superseded at stage={stage}", self.generation);
        }
        Ok(())
    }
}

/// Read a paragraph store from a local path or an `http(s)://` URL.
pub fn fetch_content(location: &str) -> Result<BookContent> {
    fetch_content_with(location, &CancellationToken::new())
}

pub fn fetch_content_with(location: &str, cancel: &CancellationToken) -> Result<BookContent> {
    cancel.check_cancelled("start")?;
    let body = if is_url(location) {
        fetch_url(location)?
    } else {
        fs::read_to_string(Path::new(location))
            .with_context(|| format!("Failed to read content {location}"))?
    };
    cancel.check_cancelled("parse")?;
    let content: BookContent = serde_json::from_str(&body)
        .with_context(|| format!("Invalid content JSON from {location}"))?;
    info!(location, paragraphs = content.len(), "Fetched book content");
    Ok(content)
}

fn fetch_url(url: &str) -> Result<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("Request to {url} failed"))?;
    let status = response.status();
    if !status.is_success() {
        bail!("Fetching {url} returned HTTP {status}");
    }
    response
        .text()
        .with_context(|| format!("Failed to read response body from {url}"))
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Default)]
pub struct LoadTracker {
    generation: u64,
    state: LoadState,
    cancel: Option<CancellationToken>,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Start a load, cancelling whichever load was in flight.
    pub fn begin_load(&mut self) -> (LoadTicket, CancellationToken) {
        if let Some(previous) = self.cancel.take() {
            debug!(generation = previous.generation, "Cancelling superseded load");
            previous.cancel();
        }
        self.generation = self.generation.wrapping_add(1);
        self.state = LoadState::Loading;
        let token = CancellationToken::for_generation(self.generation);
        self.cancel = Some(token.clone());
        debug!(generation = self.generation, "Load started");
        (
            LoadTicket {
                generation: self.generation,
            },
            token,
        )
    }

    /// Abandon whatever load is in flight; its ticket goes stale and the
    /// state returns to `Idle`.
    pub fn invalidate(&mut self) {
        if let Some(previous) = self.cancel.take() {
            debug!(generation = previous.generation, "Cancelling abandoned load");
            previous.cancel();
        }
        self.generation = self.generation.wrapping_add(1);
        self.state = LoadState::Idle;
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Settle the load for `ticket`. Returns the value only when the ticket is
    /// still current and the load succeeded.
    pub fn finish_load<T>(&mut self, ticket: LoadTicket, result: Result<T>) -> Option<T> {
        if !self.is_current(ticket) {
            debug!(
                generation = ticket.generation,
                current = self.generation,
                "Ignoring stale load result"
            );
            return None;
        }
        self.cancel = None;
        match result {
            Ok(value) => {
                self.state = LoadState::Ready;
                Some(value)
            }
            Err(err) => {
                warn!(generation = ticket.generation, "Load failed: {err:#}");
                self.state = LoadState::Failed(format!("{err:#}"));
                None
            }
        }
    }
}
