//! Binary-local application orchestration helpers.
//!
//! The main binary keeps wiring logic in `main.rs`, while this module hosts
//! command dispatch and the interactive flows that sit on top of the
//! switch engine.

pub(crate) mod commands;
pub(crate) mod entry;
pub(crate) mod menu;
pub(crate) mod setup_flow;
