//! Terminal user-interface building blocks.
//!
//! Styling constants, stderr/stdout rendering, and the interactive picker
//! used by `claudeswap menu` and `claudeswap setup`.

pub mod picker;
pub mod renderer;
pub mod settings;

pub use picker::{is_interactive_terminal, pick_from_list, prompt_line, prompt_secret};
pub use renderer::Renderer;
