//! Terminal styling helpers
//!
//! Colors are emitted unconditionally; output goes through `anstream`,
//! which strips them when the stream is not a terminal.

use indicatif::ProgressStyle;
use owo_colors::OwoColorize;
use std::fmt::Display;

/// Check mark glyph
pub const CHECK: &str = "✓";
/// Cross glyph
pub const CROSS: &str = "✗";
/// Warning glyph
pub const WARN: &str = "⚠";

/// Semantic styles for CLI output
pub trait Stylize {
    /// Bold, for headings and names
    fn emphasis(&self) -> String;
    /// Cyan, for values the user typed or will copy
    fn accent(&self) -> String;
    /// Dimmed, for secondary information
    fn muted(&self) -> String;
    /// Yellow, for partial results and retries
    fn warn(&self) -> String;
    /// Red, for failures
    fn error(&self) -> String;
    /// Green, for completed work
    fn success(&self) -> String;
}

impl<T: Display + ?Sized> Stylize for T {
    fn emphasis(&self) -> String {
        self.bold().to_string()
    }

    fn accent(&self) -> String {
        self.cyan().to_string()
    }

    fn muted(&self) -> String {
        self.dimmed().to_string()
    }

    fn warn(&self) -> String {
        self.yellow().to_string()
    }

    fn error(&self) -> String {
        self.red().to_string()
    }

    fn success(&self) -> String {
        self.green().to_string()
    }
}

/// Green check mark
pub fn check() -> String {
    CHECK.success()
}

/// Spinner style used while waiting on GitHub
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "])
}
