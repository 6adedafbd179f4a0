//! Terminal output formatting.
//!
//! Diagnostics and status go to stderr so stdout stays scriptable; only
//! `profile_line` (used by `claudeswap list`) writes to stdout.

use crate::tui::settings;
use crossterm::style::Stylize;

/// Handles all terminal output formatting.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    /// Whether ANSI color/style output is enabled.
    color: bool,
}

impl Renderer {
    /// Create a renderer with optional color output.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn color(&self) -> bool {
        self.color
    }

    /// Print a warning (to stderr).
    pub fn warn(&self, msg: &str) {
        if self.color {
            eprintln!(
                "\r{} {msg}",
                settings::LABEL_WARNING.with(settings::COLOR_WARNING).bold()
            );
        } else {
            eprintln!("\r{} {msg}", settings::LABEL_WARNING);
        }
    }

    /// Print an error (to stderr).
    pub fn error(&self, msg: &str) {
        if self.color {
            eprintln!(
                "\r{} {msg}",
                settings::LABEL_ERROR.with(settings::COLOR_ERROR).bold()
            );
        } else {
            eprintln!("\r{} {msg}", settings::LABEL_ERROR);
        }
    }

    /// Print a completed-action line.
    pub fn success(&self, msg: &str) {
        if self.color {
            eprintln!(
                "\r{} {msg}",
                settings::GLYPH_SUCCESS.with(settings::COLOR_SUCCESS).bold()
            );
        } else {
            eprintln!("\r{} {msg}", settings::GLYPH_SUCCESS_PLAIN);
        }
    }

    /// Print a small section header in status-style output.
    pub fn section(&self, title: &str) {
        if self.color {
            eprintln!(
                "\r{} {}",
                settings::GLYPH_SECTION_BULLET.with(settings::COLOR_SECTION_BULLET),
                title.with(settings::COLOR_SECTION_TITLE).bold()
            );
        } else {
            eprintln!("\r{title}:");
        }
    }

    /// Print an activity line for in-flight work (validation, writes).
    pub fn activity(&self, text: &str) {
        if self.color {
            eprintln!(
                "\r{} {}",
                settings::GLYPH_SECTION_BULLET.with(settings::COLOR_SECTION_BULLET),
                text.with(settings::COLOR_ACTIVITY_TEXT).bold()
            );
        } else {
            eprintln!("\r{text}");
        }
    }

    /// Print a key/value line under a status section.
    pub fn field(&self, key: &str, value: &str) {
        if self.color {
            eprintln!(
                "\r{}{} {}",
                settings::INDENT_1,
                format!("{key}:").with(settings::COLOR_FIELD_KEY),
                value.with(settings::COLOR_FIELD_VALUE),
            );
        } else {
            eprintln!("\r{}{key}: {value}", settings::INDENT_1);
        }
    }

    /// Print a simple indented detail line.
    pub fn detail(&self, text: &str) {
        if self.color {
            eprintln!(
                "\r{}{}",
                settings::INDENT_2,
                text.with(settings::COLOR_FIELD_VALUE)
            );
        } else {
            eprintln!("\r{}{text}", settings::INDENT_2);
        }
    }

    /// Print one profile entry to stdout.
    pub fn profile_line(&self, name: &str, host: &str, active: bool) {
        if !self.color {
            println!("{}", profile_line_plain(name, host, active));
            return;
        }
        let marker = settings::active_marker(active);
        if active {
            println!(
                "{} {} {}",
                marker.with(settings::COLOR_PROFILE_ACTIVE).bold(),
                name.with(settings::COLOR_PROFILE_ACTIVE).bold(),
                host.with(settings::COLOR_PROFILE_HOST)
            );
        } else {
            println!(
                "{} {} {}",
                marker,
                name.with(settings::COLOR_PROFILE_NAME),
                host.with(settings::COLOR_PROFILE_HOST)
            );
        }
    }
}

/// Uncolored `list` row: active marker, name, endpoint host.
pub fn profile_line_plain(name: &str, host: &str, active: bool) -> String {
    format!("{} {name} {host}", settings::active_marker(active))
}
