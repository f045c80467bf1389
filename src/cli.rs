use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "readalong",
    version,
    about = "Bilingual read-along reader for the terminal.",
    long_about = None
)]
pub struct Cli {
    /// Use a specific configuration file
    #[clap(short = 'c', long, value_name = "FILE", default_value = "conf/config.toml")]
    pub config: PathBuf,

    /// Book id from the catalog; also becomes the selected book
    #[clap(short = 'b', long, value_name = "ID")]
    pub book: Option<String>,

    /// Reading language (`en` or `es`); remembered for later runs
    #[clap(short = 'l', long, value_name = "LANG")]
    pub language: Option<String>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the books in the catalog
    Books,
    /// Print a page of the selected book
    Read {
        /// 1-based page number; defaults to the last page read
        #[clap(short, long)]
        page: Option<String>,
        /// Go to the page after the last one read
        #[clap(long, conflicts_with_all = ["page", "prev"])]
        next: bool,
        /// Go to the page before the last one read
        #[clap(long, conflicts_with = "page")]
        prev: bool,
        /// Jump to a table-of-contents entry by id
        #[clap(long, value_name = "ID", conflicts_with = "page")]
        section: Option<String>,
        /// Print the whole book instead of one page
        #[clap(long)]
        scroll: bool,
    },
    /// Show the resolved table of contents
    Toc,
    /// Find paragraphs containing a phrase
    Search {
        query: Vec<String>,
    },
    /// Manage the reader's glossary
    Glossary {
        #[clap(subcommand)]
        action: Option<GlossaryAction>,
    },
    /// Manage page bookmarks
    Bookmark {
        #[clap(subcommand)]
        action: Option<BookmarkAction>,
    },
    /// Manage saved words and quotes
    Favorite {
        #[clap(subcommand)]
        action: Option<FavoriteAction>,
    },
    /// Show reading statistics for the selected book
    Stats,
    /// Read the current page aloud on the console
    Speak {
        /// 1-based page number; defaults to the last page read
        #[clap(short, long)]
        page: Option<String>,
        /// Speech rate multiplier (0.5 to 2.0)
        #[clap(short, long)]
        rate: Option<f32>,
        /// Voice name, or part of it
        #[clap(long)]
        voice: Option<String>,
        /// List the available voices and exit
        #[clap(long)]
        list_voices: bool,
    },
    /// Show or change reader preferences
    Prefs {
        #[clap(long, value_enum)]
        theme: Option<ThemeArg>,
        #[clap(long, value_enum)]
        font: Option<FontStep>,
    },
    /// Append paragraphs from a plain-text file to a book's content
    Ingest {
        /// Plain text; paragraphs are separated by blank lines
        #[clap(value_name = "RAW")]
        raw: PathBuf,
        /// Content file to extend; defaults to the selected book's
        #[clap(long, value_name = "FILE")]
        content: Option<PathBuf>,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Subcommand, Debug)]
pub enum GlossaryAction {
    List,
    Add { word: String },
    Remove { word: String },
}

#[derive(Subcommand, Debug)]
pub enum BookmarkAction {
    List,
    /// Bookmark the last page read, or toggle it off with `--toggle`
    Add {
        #[clap(short, long)]
        page: Option<String>,
        #[clap(short, long)]
        note: Option<String>,
        #[clap(long)]
        toggle: bool,
    },
    Remove { id: String },
    Note { id: String, note: String },
}

#[derive(Subcommand, Debug)]
pub enum FavoriteAction {
    List,
    Add {
        #[clap(value_enum)]
        kind: FavoriteArg,
        content: Vec<String>,
    },
    Remove { id: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ThemeArg {
    Light,
    Dark,
    System,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FontStep {
    Larger,
    Smaller,
    Reset,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FavoriteArg {
    Word,
    Quote,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_and_subcommands() {
        let cli = Cli::parse_from(["readalong", "-b", "freedom", "-l", "es", "read", "--next"]);
        assert_eq!(cli.book.as_deref(), Some("freedom"));
        assert_eq!(cli.language.as_deref(), Some("es"));
        assert!(matches!(cli.command, Command::Read { next: true, .. }));
        assert_eq!(cli.config, PathBuf::from("conf/config.toml"));
    }

    #[test]
    fn favorite_content_is_joined_from_words() {
        let cli = Cli::parse_from(["readalong", "favorite", "add", "quote", "be", "kind"]);
        match cli.command {
            Command::Favorite {
                action: Some(FavoriteAction::Add { kind, content }),
            } => {
                assert!(matches!(kind, FavoriteArg::Quote));
                assert_eq!(content.join(" "), "be kind");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
