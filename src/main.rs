//! # SyntaxKit
//!
//! Command-line front end for the highlighter and the smart editor.
//!
//! ```bash
//! # Print a file with true-color highlighting
//! cargo run -- highlight path/to/File.swift
//!
//! # Force a grammar and theme
//! cargo run -- highlight Main.txt --grammar java --theme default-light
//!
//! # Replay keystrokes through the smart editor
//! cargo run -- type 'func f() {\n'
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use syntaxkit_buffer::{CharStyle, Color, StyledBuffer};
use syntaxkit_core::{Config, SyntaxEditor};
use syntaxkit_syntax::{Grammar, Highlighter, ThemeStore};

/// SyntaxKit - regex syntax highlighting and smart editing
#[derive(Parser, Debug)]
#[command(name = "syntaxkit")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file (defaults to the user config directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Print a file with ANSI true-color highlighting
    Highlight {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Built-in grammar name or grammar file (default: by file suffix)
        #[arg(short, long)]
        grammar: Option<String>,

        /// Theme name (default: the grammar's appearance)
        #[arg(short, long)]
        theme: Option<String>,

        /// JSON file of color overrides for the theme
        #[arg(long, value_name = "FILE")]
        overrides: Option<PathBuf>,
    },

    /// Type keys into an empty editor and print the result
    Type {
        /// Keys to type; `\n`, `\t` and `\\` are unescaped
        keys: String,

        /// Built-in grammar name or grammar file
        #[arg(short, long, default_value = "swift")]
        grammar: String,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    tracing::info!("Starting SyntaxKit v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => Config::load(),
    };
    let store = ThemeStore::in_memory();

    match args.command {
        Command::Highlight {
            file,
            grammar,
            theme,
            overrides,
        } => highlight(&config, &store, &file, grammar, theme, overrides),
        Command::Type { keys, grammar } => type_keys(&config, &store, &keys, &grammar),
    }
}

fn highlight(
    config: &Config,
    store: &ThemeStore,
    file: &Path,
    grammar: Option<String>,
    theme: Option<String>,
    overrides: Option<PathBuf>,
) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let grammar = match grammar {
        Some(name) => load_grammar(&name, store)?,
        None => {
            let suffix = file
                .extension()
                .and_then(|ext| ext.to_str())
                .context("No file suffix; pass --grammar")?;
            match config.grammar_path(suffix) {
                Some(path) => Grammar::load(path, store)?,
                None => Grammar::builtin_for_suffix(suffix, store)?,
            }
        }
    };

    let grammar = match theme.or_else(|| config.appearance.theme.clone()) {
        Some(name) => {
            let theme = store.theme(&name)?;
            grammar.with_theme(theme)
        }
        None => grammar,
    };

    let grammar = match overrides {
        Some(path) => {
            let mut theme = grammar.theme().clone();
            let applied = theme
                .load_overrides(store, &path)
                .with_context(|| format!("Failed to read overrides {}", path.display()))?;
            tracing::info!("Applied {} color overrides", applied);
            grammar.with_theme(theme)
        }
        None => grammar,
    };

    let mut buffer = StyledBuffer::from(text.as_str());
    Highlighter::new(store.clone()).highlight(&mut buffer, &grammar);

    let mut out = std::io::stdout().lock();
    for run in buffer.style_runs() {
        let slice = buffer.slice(run.range.clone())?;
        write!(out, "{}{}\x1b[0m", ansi(&run.style), slice)?;
    }
    out.flush()?;
    Ok(())
}

fn type_keys(config: &Config, store: &ThemeStore, keys: &str, grammar: &str) -> anyhow::Result<()> {
    let grammar = load_grammar(grammar, store)?;
    let mut editor = SyntaxEditor::with_config(grammar, store.clone(), config.editor.clone());
    editor.type_text(&unescape(keys))?;

    let selection = editor.selection();
    println!("{}", editor.text());
    println!("selection: {}..{}", selection.start, selection.end);
    Ok(())
}

/// A built-in grammar name, or a path to a grammar file.
fn load_grammar(name: &str, store: &ThemeStore) -> anyhow::Result<Grammar> {
    let path = Path::new(name);
    let grammar = if path.is_file() {
        Grammar::load(path, store)
    } else {
        Grammar::builtin(name, store)
    };
    grammar.with_context(|| format!("Failed to load grammar {name}"))
}

fn ansi(style: &CharStyle) -> String {
    let mut codes = String::new();
    if let Some(Color { r, g, b, .. }) = style.foreground {
        codes.push_str(&format!("\x1b[38;2;{r};{g};{b}m"));
    }
    if let Some(Color { r, g, b, .. }) = style.background {
        codes.push_str(&format!("\x1b[48;2;{r};{g};{b}m"));
    }
    codes
}

fn unescape(keys: &str) -> String {
    let mut out = String::with_capacity(keys.len());
    let mut chars = keys.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
