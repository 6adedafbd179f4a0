//! Interactive list picker and line prompts.
//!
//! Every entry point has a line-oriented fallback for when stdin or stderr
//! is not a terminal, so the menu and setup flows also work when scripted.

use crate::tui::settings;
use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::{Print, PrintStyledContent, Stylize};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::QueueableCommand;
use std::io::{self, BufRead, IsTerminal, Write};
use std::time::Duration;

/// True when stdin/stderr support interactive terminal UI.
pub fn is_interactive_terminal() -> bool {
    io::stdin().is_terminal() && io::stderr().is_terminal()
}

/// Present an interactive list picker and return the selected index.
///
/// In TTY mode, use arrow keys and Enter to select, or Esc to cancel.
/// In non-interactive mode, a numeric selection prompt is shown.
pub fn pick_from_list(
    color: bool,
    title: &str,
    help: &str,
    options: &[String],
    initial_selection: usize,
) -> io::Result<Option<usize>> {
    if options.is_empty() {
        return Ok(None);
    }

    if !is_interactive_terminal() {
        eprintln!("{} {title}", settings::GLYPH_SECTION_BULLET);
        for (idx, option) in options.iter().enumerate() {
            eprintln!("{}{}. {}", settings::INDENT_1, idx + 1, option);
        }
        eprint!("{}pick (empty to cancel): ", settings::INDENT_1);
        io::stderr().flush()?;
        let line = read_stdin_line()?;
        return Ok(line.and_then(|line| parse_numeric_choice(&line, options.len())));
    }

    pick_from_list_interactive(color, title, help, options, initial_selection)
}

/// Map a 1-based numeric answer onto an option index.
pub fn parse_numeric_choice(input: &str, option_count: usize) -> Option<usize> {
    let index = input.trim().parse::<usize>().ok()?;
    (1..=option_count).contains(&index).then(|| index - 1)
}

/// Ask for one line of text. Empty input yields `default` when given.
/// Returns `None` on end of input.
pub fn prompt_line(color: bool, label: &str, default: Option<&str>) -> io::Result<Option<String>> {
    write_prompt_label(color, label, default)?;
    let Some(line) = read_stdin_line()? else {
        return Ok(None);
    };
    Ok(Some(apply_default(&line, default)))
}

/// Ask for a secret without echo when attached to a terminal.
pub fn prompt_secret(color: bool, label: &str) -> io::Result<Option<String>> {
    if !is_interactive_terminal() {
        write_prompt_label(color, label, None)?;
        return Ok(read_stdin_line()?.map(|line| line.trim().to_string()));
    }
    let prompt = if color {
        format!(
            "{}{}",
            label.with(settings::COLOR_PROMPT_LABEL),
            settings::PROMPT_SUFFIX
        )
    } else {
        format!("{label}{}", settings::PROMPT_SUFFIX)
    };
    let secret = rpassword::prompt_password(prompt)?;
    Ok(Some(secret.trim().to_string()))
}

fn apply_default(line: &str, default: Option<&str>) -> String {
    let trimmed = line.trim();
    match default {
        Some(default) if trimmed.is_empty() => default.to_string(),
        _ => trimmed.to_string(),
    }
}

fn write_prompt_label(color: bool, label: &str, default: Option<&str>) -> io::Result<()> {
    let mut stderr = io::stderr();
    if color {
        stderr.queue(PrintStyledContent(label.with(settings::COLOR_PROMPT_LABEL)))?;
        if let Some(default) = default {
            stderr.queue(PrintStyledContent(
                format!(" [{default}]").with(settings::COLOR_PROMPT_DEFAULT),
            ))?;
        }
        stderr.queue(Print(settings::PROMPT_SUFFIX))?;
    } else {
        match default {
            Some(default) => write!(stderr, "{label} [{default}]{}", settings::PROMPT_SUFFIX)?,
            None => write!(stderr, "{label}{}", settings::PROMPT_SUFFIX)?,
        }
    }
    stderr.flush()
}

/// `None` on EOF.
fn read_stdin_line() -> io::Result<Option<String>> {
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        eprintln!();
        return Ok(None);
    }
    Ok(Some(line))
}

fn pick_from_list_interactive(
    color: bool,
    title: &str,
    help: &str,
    options: &[String],
    initial_selection: usize,
) -> io::Result<Option<usize>> {
    let _guard = RawModeGuard::acquire()?;
    let mut stderr = io::stderr();
    let mut selected = initial_selection.min(options.len().saturating_sub(1));
    let mut previous_rows = 0usize;

    loop {
        previous_rows = render_picker(
            &mut stderr,
            color,
            title,
            help,
            options,
            selected,
            previous_rows,
        )?;

        if !event::poll(Duration::from_millis(settings::PICKER_POLL_MS))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press && key.kind != KeyEventKind::Repeat {
            continue;
        }

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                selected = if selected == 0 {
                    options.len() - 1
                } else {
                    selected - 1
                };
            }
            KeyCode::Down | KeyCode::Char('j') => {
                selected = (selected + 1) % options.len();
            }
            KeyCode::Char(digit @ '1'..='9') => {
                if let Some(index) = parse_numeric_choice(&digit.to_string(), options.len()) {
                    selected = index;
                }
            }
            KeyCode::Enter => {
                clear_picker_surface(&mut stderr, previous_rows)?;
                return Ok(Some(selected));
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                clear_picker_surface(&mut stderr, previous_rows)?;
                return Ok(None);
            }
            KeyCode::Esc | KeyCode::Char('q') => {
                clear_picker_surface(&mut stderr, previous_rows)?;
                return Ok(None);
            }
            _ => {}
        }
    }
}

/// Draw picker chrome/options and return the last drawn row index.
fn render_picker(
    stderr: &mut io::Stderr,
    color: bool,
    title: &str,
    help: &str,
    options: &[String],
    selected: usize,
    previous_rows: usize,
) -> io::Result<usize> {
    if previous_rows > 0 {
        stderr.queue(MoveUp(previous_rows as u16))?;
    }
    stderr.queue(MoveToColumn(0))?;
    stderr.queue(Clear(ClearType::FromCursorDown))?;

    let cols = terminal_columns();
    let bullet = settings::GLYPH_SECTION_BULLET;
    let title_plain = format!("{bullet} {title}");
    let mut total_rows = wrapped_rows(&title_plain, cols);
    if color {
        stderr.queue(PrintStyledContent(bullet.with(settings::COLOR_SECTION_BULLET)))?;
        stderr.queue(Print(" "))?;
        stderr.queue(PrintStyledContent(
            title.with(settings::COLOR_SECTION_TITLE).bold(),
        ))?;
    } else {
        stderr.queue(Print(&title_plain))?;
    }

    let help_plain = format!("{}{help}", settings::INDENT_1);
    stderr.queue(Print("\r\n"))?;
    total_rows += wrapped_rows(&help_plain, cols);
    if color {
        stderr.queue(PrintStyledContent(
            help_plain.as_str().with(settings::COLOR_FIELD_KEY),
        ))?;
    } else {
        stderr.queue(Print(&help_plain))?;
    }

    for (idx, option) in options.iter().enumerate() {
        let active = idx == selected;
        let marker = settings::picker_marker(active, color);
        let line_plain = format!("{}{marker} {option}", settings::INDENT_1);
        stderr.queue(Print("\r\n"))?;
        total_rows += wrapped_rows(&line_plain, cols);
        if color {
            let (marker_color, text_color) = if active {
                (
                    settings::COLOR_PICKER_SELECTED,
                    settings::COLOR_PICKER_OPTION_SELECTED,
                )
            } else {
                (settings::COLOR_PICKER_UNSELECTED, settings::COLOR_FIELD_VALUE)
            };
            stderr.queue(Print(settings::INDENT_1))?;
            stderr.queue(PrintStyledContent(marker.with(marker_color)))?;
            stderr.queue(Print(" "))?;
            stderr.queue(PrintStyledContent(option.as_str().with(text_color)))?;
        } else {
            stderr.queue(Print(&line_plain))?;
        }
    }

    stderr.flush()?;
    Ok(total_rows.saturating_sub(1))
}

fn clear_picker_surface(stderr: &mut io::Stderr, previous_rows: usize) -> io::Result<()> {
    if previous_rows > 0 {
        stderr.queue(MoveUp(previous_rows as u16))?;
    }
    stderr.queue(MoveToColumn(0))?;
    stderr.queue(Clear(ClearType::FromCursorDown))?;
    stderr.flush()
}

/// Read terminal width or fall back to a fixed width.
fn terminal_columns() -> usize {
    terminal::size()
        .ok()
        .map(|(cols, _)| cols as usize)
        .filter(|cols| *cols > 0)
        .unwrap_or(settings::FALLBACK_COLUMNS)
}

/// Rows a single logical line occupies once soft-wrapped at `cols`.
fn wrapped_rows(text: &str, cols: usize) -> usize {
    let cols = cols.max(1);
    let chars = text.chars().count();
    if chars == 0 {
        1
    } else {
        chars.div_ceil(cols)
    }
}

/// Raw mode lifetime guard so terminal state is restored on any return path.
struct RawModeGuard;

impl RawModeGuard {
    fn acquire() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
