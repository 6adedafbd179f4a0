//! Centralized, hardcoded UI settings for the terminal interface.
//!
//! This is the single place to tweak labels, glyphs, colors, and
//! indentation.

use crossterm::style::Color;

// ---------------------------------------------------------------------------
// Layout / indentation
// ---------------------------------------------------------------------------

pub const INDENT_1: &str = "  ";
pub const INDENT_2: &str = "    ";
pub const FALLBACK_COLUMNS: usize = 80;

pub const PICKER_POLL_MS: u64 = 80;

// ---------------------------------------------------------------------------
// Labels / glyphs
// ---------------------------------------------------------------------------

pub const LABEL_WARNING: &str = "warning:";
pub const LABEL_ERROR: &str = "error:";
pub const LABEL_DEFAULT_PROVIDER: &str = "(default)";

pub const GLYPH_SECTION_BULLET: &str = "•";
pub const GLYPH_ACTIVE: &str = "*";
pub const GLYPH_INACTIVE: &str = " ";
pub const GLYPH_SUCCESS: &str = "✓";
pub const GLYPH_SUCCESS_PLAIN: &str = "ok";

pub const PICKER_SELECTED_COLOR: &str = "▶";
pub const PICKER_UNSELECTED_COLOR: &str = "·";
pub const PICKER_SELECTED_PLAIN: &str = ">";
pub const PICKER_UNSELECTED_PLAIN: &str = "-";

pub const PROMPT_SUFFIX: &str = ": ";

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

pub const COLOR_WARNING: Color = Color::Yellow;
pub const COLOR_ERROR: Color = Color::Red;
pub const COLOR_SUCCESS: Color = Color::Green;

pub const COLOR_SECTION_BULLET: Color = Color::DarkGrey;
pub const COLOR_SECTION_TITLE: Color = Color::Cyan;
pub const COLOR_FIELD_KEY: Color = Color::DarkGrey;
pub const COLOR_FIELD_VALUE: Color = Color::White;
pub const COLOR_ACTIVITY_TEXT: Color = Color::DarkGrey;

pub const COLOR_PROFILE_ACTIVE: Color = Color::Green;
pub const COLOR_PROFILE_NAME: Color = Color::White;
pub const COLOR_PROFILE_HOST: Color = Color::DarkGrey;

pub const COLOR_PICKER_SELECTED: Color = Color::DarkYellow;
pub const COLOR_PICKER_UNSELECTED: Color = Color::DarkGrey;
pub const COLOR_PICKER_OPTION_SELECTED: Color = Color::Yellow;

pub const COLOR_PROMPT_LABEL: Color = Color::Cyan;
pub const COLOR_PROMPT_DEFAULT: Color = Color::DarkGrey;

// ---------------------------------------------------------------------------
// Small helpers
// ---------------------------------------------------------------------------

pub fn picker_marker(is_selected: bool, color: bool) -> &'static str {
    match (is_selected, color) {
        (true, true) => PICKER_SELECTED_COLOR,
        (false, true) => PICKER_UNSELECTED_COLOR,
        (true, false) => PICKER_SELECTED_PLAIN,
        (false, false) => PICKER_UNSELECTED_PLAIN,
    }
}

pub fn active_marker(is_active: bool) -> &'static str {
    if is_active {
        GLYPH_ACTIVE
    } else {
        GLYPH_INACTIVE
    }
}
