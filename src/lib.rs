//! claudeswap: switch the Claude Code CLI between API providers.
//!
//! Profiles (endpoint, credential, model mapping, extra flags) live in an
//! encrypted store. The [`switch::SwitchEngine`] materializes one of them into
//! the assistant's `settings.json` under a lock, with a snapshot taken first
//! and restored if the write cannot complete.
//!
//! # Quick start
//!
//! ```no_run
//! use claudeswap::config::load_config;
//! use claudeswap::switch::SwitchEngine;
//!
//! # async fn example() {
//! let config = load_config(None).unwrap();
//! let engine = SwitchEngine::from_config(&config, false);
//! let result = engine.switch_to("glm").await;
//! println!("{:?}", result.outcome);
//! # }
//! ```

pub mod backup;
pub mod build_info;
pub mod config;
pub mod error;
pub mod fsutil;
pub mod lock;
pub mod mirror;
pub mod profile;
pub mod switch;
#[cfg(test)]
pub mod testsupport;
pub mod tui;
pub mod validator;
