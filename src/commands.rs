//! Subcommand handlers. Each one drives a [`ReadingSession`] and writes its
//! report to the given writer.

use crate::cli::{
    BookmarkAction, Cli, Command, FavoriteAction, FavoriteArg, FontStep, GlossaryAction, ThemeArg,
};
use crate::config::{AppConfig, serialize_config};
use crate::console_speech::{self, ConsoleEngine};
use anyhow::{Result, anyhow, bail};
use readalong_core::favorites::FavoriteKind;
use readalong_core::library::{Catalog, is_url};
use readalong_core::pagination::{self, LineKind, ViewMode};
use readalong_core::preferences::Theme;
use readalong_core::speech::SpeechController;
use readalong_core::stats::format_duration;
use readalong_core::storage::{self, global_key};
use readalong_core::tokenizer::Span;
use readalong_core::{ContentBlock, FileStore, Language, ReadingSession, ingest, toc};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

pub fn run(cli: Cli, config: &AppConfig) -> Result<()> {
    let mut out = std::io::stdout().lock();
    if let Command::Config = cli.command {
        write!(out, "{}", serialize_config(config)?)?;
        return Ok(());
    }
    let mut session = open_session(config)?;
    if let Some(book) = cli.book.as_deref() {
        session.select_book(book)?;
    }
    if let Some(code) = cli.language.as_deref() {
        let language =
            Language::from_code(code).ok_or_else(|| anyhow!("Unknown language {code:?}; use en or es"))?;
        session.set_language(language);
    }
    execute(cli.command, &mut session, config, &mut out)
}

pub fn open_session(config: &AppConfig) -> Result<ReadingSession> {
    let catalog = Catalog::load(&config.library_path())?;
    let store = FileStore::new(config.state_path());
    Ok(ReadingSession::new(
        Box::new(store),
        catalog,
        config.session_options(),
    ))
}

pub fn execute(
    command: Command,
    session: &mut ReadingSession,
    config: &AppConfig,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        Command::Books => list_books(session, out),
        Command::Read {
            page,
            next,
            prev,
            section,
            scroll,
        } => {
            load_and_resume(session)?;
            if let Some(id) = section.as_deref() {
                session
                    .goto_toc(id)
                    .ok_or_else(|| anyhow!("No table-of-contents entry {id:?}"))?;
            } else if let Some(page) = page.as_deref() {
                goto(session, page)?;
            } else if next {
                session.next_page();
            } else if prev {
                session.prev_page();
            }
            if scroll {
                session.set_view_mode(ViewMode::Scroll);
            }
            remember_page(session);
            print_page(session, out)
        }
        Command::Toc => {
            session.load()?;
            print_toc(session, out)
        }
        Command::Search { query } => {
            session.load()?;
            let query = query.join(" ");
            let results = session.search(&query);
            if results.is_empty() {
                writeln!(out, "No matches for {query:?}")?;
            }
            for result in results {
                writeln!(
                    out,
                    "p{:<4} #{:<5} {}",
                    result.page_index + 1,
                    result.paragraph_index,
                    result.snippet
                )?;
            }
            Ok(())
        }
        Command::Glossary { action } => glossary(session, action, out),
        Command::Bookmark { action } => bookmark(session, action, out),
        Command::Favorite { action } => favorite(session, action, out),
        Command::Stats => {
            session.load()?;
            print_stats(session, out)
        }
        Command::Speak {
            page,
            rate,
            voice,
            list_voices,
        } => speak(session, config, page, rate, voice, list_voices, out),
        Command::Prefs { theme, font } => prefs(session, theme, font, out),
        Command::Ingest { raw, content } => {
            let target = match content {
                Some(path) => path,
                None => {
                    let location = session.content_location();
                    if is_url(&location) {
                        bail!("Cannot append to remote content {location}; pass --content");
                    }
                    PathBuf::from(location)
                }
            };
            let added = ingest::append_to_file(&target, &raw)?;
            writeln!(out, "Appended {added} paragraphs to {}", target.display())?;
            Ok(())
        }
        Command::Config => {
            write!(out, "{}", serialize_config(config)?)?;
            Ok(())
        }
    }
}

fn last_page_key(book_id: &str) -> String {
    global_key(&format!("last-page-{book_id}"))
}

/// Load the selected book and return to the page last shown.
fn load_and_resume(session: &mut ReadingSession) -> Result<()> {
    session.load()?;
    let key = last_page_key(session.book_id());
    if let Some(page) = storage::load_string(session.store(), &key)
        .and_then(|value| value.trim().parse::<usize>().ok())
    {
        info!(page, "Resuming from stored page");
        session.goto_page(page);
    }
    Ok(())
}

fn remember_page(session: &ReadingSession) {
    let key = last_page_key(session.book_id());
    storage::save_string(session.store(), &key, &session.page().to_string());
}

fn goto(session: &mut ReadingSession, input: &str) -> Result<usize> {
    let total = session.total_pages();
    session
        .goto_input(input)
        .ok_or_else(|| anyhow!("Invalid page {input:?}; the book has {total} pages"))
}

fn list_books(session: &ReadingSession, out: &mut dyn Write) -> Result<()> {
    let language = session.language();
    for book in session.catalog().books() {
        let marker = if book.id == session.book_id() { "*" } else { " " };
        let title = non_empty_or(language.pick(&book.title_primary, &book.title_secondary), &book.title_primary);
        writeln!(out, "{marker} {:<20} {title}", book.id)?;
        if !book.author.is_empty() {
            writeln!(out, "    {}", book.author)?;
        }
        let description = non_empty_or(
            language.pick(&book.description_primary, &book.description_secondary),
            &book.description_primary,
        );
        if !description.is_empty() {
            writeln!(out, "    {description}")?;
        }
    }
    Ok(())
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

fn print_page(session: &ReadingSession, out: &mut dyn Write) -> Result<()> {
    let total = session.total_pages();
    let page = session.page();
    let book = session.book();
    writeln!(
        out,
        "{} | page {}/{} ({:.0}%)",
        book.title_primary,
        page + 1,
        total,
        pagination::progress_percent(page, total)
    )?;
    if let Some(section) = session.current_section() {
        writeln!(out, "Section: {}", section.title(session.language()))?;
    }
    if session.bookmarks().is_page_bookmarked(page) {
        writeln!(out, "[bookmarked]")?;
    }
    writeln!(out)?;

    for (_, block) in session.page_blocks() {
        match block {
            ContentBlock::Image { src, .. } => writeln!(out, "[image: {src}]")?,
            _ => {
                let Some(text) = block.text_for(session.language()) else {
                    continue;
                };
                for line in pagination::split_lines(text) {
                    match pagination::classify(line) {
                        LineKind::ChapterHeading => writeln!(out, "## {line}")?,
                        LineKind::Bullet => writeln!(out, "  {}", render_terms(session, line))?,
                        LineKind::Paragraph => writeln!(out, "{}", render_terms(session, line))?,
                    }
                }
            }
        }
        writeln!(out)?;
    }

    for favorite in session.favorites().for_page(page) {
        writeln!(out, "* {} {:?}", favorite.kind, favorite.content)?;
    }
    if pagination::is_last_page(page, total) {
        writeln!(out, "(end of book)")?;
    }
    Ok(())
}

/// Wrap dictionary and glossary terms in `_underscores_`.
fn render_terms(session: &ReadingSession, line: &str) -> String {
    session
        .glossary_spans(line)
        .iter()
        .map(|span| match span {
            Span::Plain(text) => text.to_string(),
            Span::Term { text, .. } => format!("_{text}_"),
        })
        .collect()
}

fn print_toc(session: &ReadingSession, out: &mut dyn Write) -> Result<()> {
    if session.toc().is_empty() {
        writeln!(out, "This book has no table of contents.")?;
        return Ok(());
    }
    let paginator = session.paginator();
    for (depth, entry) in toc::flatten(session.toc()) {
        let flag = if entry.matched { "" } else { " (?)" };
        writeln!(
            out,
            "{:indent$}{:<16} p{:<4} {}{flag}",
            "",
            entry.id,
            paginator.page_of(entry.paragraph_index) + 1,
            entry.title(session.language()),
            indent = depth * 2
        )?;
    }
    Ok(())
}

fn glossary(
    session: &mut ReadingSession,
    action: Option<GlossaryAction>,
    out: &mut dyn Write,
) -> Result<()> {
    match action.unwrap_or(GlossaryAction::List) {
        GlossaryAction::List => {
            if session.glossary().is_empty() {
                writeln!(out, "Glossary is empty.")?;
            }
            let language = session.language();
            for entry in session.glossary().entries() {
                let definition = language.pick(&entry.definition, &entry.definition_secondary);
                writeln!(out, "{:<18} {definition}", entry.word)?;
            }
        }
        GlossaryAction::Add { word } => {
            if session.add_to_glossary(&word) {
                writeln!(out, "Saved {word:?} ({} words)", session.glossary().len())?;
            } else {
                writeln!(out, "Nothing to save in {word:?}")?;
            }
        }
        GlossaryAction::Remove { word } => {
            session.remove_from_glossary(&word);
            writeln!(out, "Removed {word:?}")?;
        }
    }
    Ok(())
}

fn bookmark(
    session: &mut ReadingSession,
    action: Option<BookmarkAction>,
    out: &mut dyn Write,
) -> Result<()> {
    match action.unwrap_or(BookmarkAction::List) {
        BookmarkAction::List => {
            if session.bookmarks().is_empty() {
                writeln!(out, "No bookmarks.")?;
            }
            for bookmark in session.bookmarks().entries() {
                write!(out, "{}  p{}", bookmark.id, bookmark.page_index + 1)?;
                if let Some(note) = &bookmark.note {
                    write!(out, "  {note}")?;
                }
                writeln!(out)?;
            }
        }
        BookmarkAction::Add { page, note, toggle } => {
            load_and_resume(session)?;
            if let Some(page) = page.as_deref() {
                goto(session, page)?;
            }
            let page = session.page() + 1;
            if toggle {
                let state = if session.toggle_bookmark() { "added" } else { "removed" };
                writeln!(out, "Bookmark {state} on page {page}")?;
            } else {
                let id = session.bookmark_page(note).id.clone();
                writeln!(out, "Bookmarked page {page} as {id}")?;
            }
        }
        BookmarkAction::Remove { id } => {
            session.remove_bookmark(&id);
            writeln!(out, "Removed {id}")?;
        }
        BookmarkAction::Note { id, note } => {
            if !session.bookmarks().entries().iter().any(|bookmark| bookmark.id == id) {
                bail!("No bookmark {id}");
            }
            session.update_bookmark_note(&id, &note);
            writeln!(out, "Updated {id}")?;
        }
    }
    Ok(())
}

fn favorite(
    session: &mut ReadingSession,
    action: Option<FavoriteAction>,
    out: &mut dyn Write,
) -> Result<()> {
    match action.unwrap_or(FavoriteAction::List) {
        FavoriteAction::List => {
            if session.favorites().is_empty() {
                writeln!(out, "No favorites.")?;
            }
            for entry in session.favorites().entries() {
                writeln!(
                    out,
                    "{}  p{:<4} {:<5} {}",
                    entry.id,
                    entry.page_index + 1,
                    entry.kind,
                    entry.content
                )?;
            }
        }
        FavoriteAction::Add { kind, content } => {
            load_and_resume(session)?;
            let kind = match kind {
                FavoriteArg::Word => FavoriteKind::Word,
                FavoriteArg::Quote => FavoriteKind::Quote,
            };
            match session.add_favorite(kind, &content.join(" ")) {
                Some(entry) => writeln!(out, "Saved {} {}", entry.kind, entry.id)?,
                None => writeln!(out, "Nothing to save.")?,
            }
        }
        FavoriteAction::Remove { id } => {
            session.remove_favorite(&id);
            writeln!(out, "Removed {id}")?;
        }
    }
    Ok(())
}

fn print_stats(session: &ReadingSession, out: &mut dyn Write) -> Result<()> {
    let summary = session.stats_summary(0);
    writeln!(out, "Pages read:       {} ({}%)", summary.pages_read, summary.completion_percent)?;
    writeln!(out, "Reading time:     {}", format_duration(summary.total_seconds))?;
    writeln!(
        out,
        "Time remaining:   {}",
        format_duration(summary.estimated_remaining_seconds)
    )?;
    writeln!(out, "Sessions:         {}", summary.sessions_count)?;
    writeln!(out, "Pages/session:    {}", summary.avg_pages_per_session)?;
    writeln!(out, "Streak:           {} days", summary.streak_days)?;
    writeln!(out, "Glossary words:   {}", summary.glossary_count)?;
    Ok(())
}

fn speak(
    session: &mut ReadingSession,
    config: &AppConfig,
    page: Option<String>,
    rate: Option<f32>,
    voice: Option<String>,
    list_voices: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let mut controller = SpeechController::new(
        ConsoleEngine::new(),
        config.speech_settings(session.language()),
    );
    if list_voices {
        for voice in controller.voices() {
            let local = if voice.local_service { "local" } else { "remote" };
            writeln!(out, "{:<22} {:<6} {local}", voice.name, voice.lang)?;
        }
        return Ok(());
    }
    for name in config.speech_voice.iter().chain(voice.iter()) {
        if !controller.set_voice_by_name(name) {
            warn!(voice = %name, "No matching voice; keeping the default");
        }
    }
    if let Some(rate) = rate {
        controller.set_rate(rate);
    }

    load_and_resume(session)?;
    if let Some(page) = page.as_deref() {
        goto(session, page)?;
    }
    remember_page(session);
    let text = session.page_text();
    if text.trim().is_empty() {
        writeln!(out, "Nothing to read on page {}.", session.page() + 1)?;
        return Ok(());
    }

    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&stop);
    if let Err(err) = ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    }) {
        warn!("Failed to install Ctrl+C signal handler: {err}");
    }

    info!(
        page = session.page(),
        rate = controller.settings().rate,
        voice = ?controller.settings().voice.as_ref().map(|voice| voice.name.as_str()),
        "Reading page aloud"
    );
    controller.speak(&text);
    let elapsed = console_speech::play(&mut controller, config.words_per_minute, &stop);
    session.add_reading_time(elapsed.as_secs());
    Ok(())
}

fn prefs(
    session: &mut ReadingSession,
    theme: Option<ThemeArg>,
    font: Option<FontStep>,
    out: &mut dyn Write,
) -> Result<()> {
    let prefs = session.preferences();
    if let Some(theme) = theme {
        prefs.set_theme(match theme {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::System => Theme::System,
        });
    }
    if let Some(step) = font {
        let size = prefs.font_size();
        prefs.set_font_size(match step {
            FontStep::Larger => size.increase(),
            FontStep::Smaller => size.decrease(),
            FontStep::Reset => size.reset(),
        });
    }
    writeln!(out, "theme     {}", prefs.theme())?;
    writeln!(out, "font      {}px", prefs.font_size().px())?;
    writeln!(out, "language  {}", prefs.language())?;
    writeln!(out, "book      {}", prefs.selected_book(session.catalog()))?;
    Ok(())
}
