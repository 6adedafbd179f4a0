//! Application entry orchestration for the claudeswap CLI.

use crate::app::{commands, menu, setup_flow};
use crate::cli::{self, Command};
use claudeswap::config::{initialize_config, load_config_with_diagnostics, ConfigInitResult};
use claudeswap::switch::SwitchEngine;
use claudeswap::tui::Renderer;

/// Top-level CLI entrypoint. Returns the process exit code.
pub(crate) async fn run(args: cli::Args) -> i32 {
    let bootstrap_renderer = Renderer::new(!args.no_color);
    if let Some(Command::Init { force }) = args.command.as_ref() {
        return match initialize_config(args.config.as_deref(), *force) {
            Ok(result) => {
                apply_init_result(&bootstrap_renderer, result);
                0
            }
            Err(err) => {
                bootstrap_renderer.error(&format!("failed to initialize config: {err}"));
                1
            }
        };
    }

    let loaded = match load_config_with_diagnostics(args.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(err) => {
            bootstrap_renderer.error(&err.to_string());
            return 1;
        }
    };
    let config = loaded.config;
    let renderer = Renderer::new(config.display.color && !args.no_color);
    for warning in &loaded.diagnostics.warnings {
        renderer.warn(warning);
    }

    let skip_validate = matches!(
        args.command,
        Some(Command::Set {
            skip_validate: true,
            ..
        })
    );
    let engine = SwitchEngine::from_config(&config, skip_validate);
    let validating = config.validator.enabled && !skip_validate;

    match args.command {
        Some(Command::Set { name, .. }) => {
            commands::run_set(&renderer, &engine, &name, validating).await
        }
        Some(Command::Status) => {
            commands::run_status(&renderer, &engine, loaded.source.as_deref())
        }
        Some(Command::Setup { name }) => {
            setup_flow::run_setup(&renderer, &engine, name.as_deref(), validating).await
        }
        Some(Command::List) => commands::run_list(&renderer, &engine),
        Some(Command::Remove { name }) => commands::run_remove(&renderer, &engine, &name),
        Some(Command::Reset) => commands::run_reset(&renderer, &engine),
        Some(Command::Validate { name }) => {
            commands::run_validate(&renderer, &engine, &name).await
        }
        Some(Command::Backups) => commands::run_backups(&renderer, &engine),
        Some(Command::Rollback) => commands::run_rollback(&renderer, &engine),
        Some(Command::Menu) | None => menu::run_menu(&renderer, &engine, validating).await,
        Some(Command::Init { .. }) => 0,
    }
}

/// Render `claudeswap init` output.
fn apply_init_result(renderer: &Renderer, result: ConfigInitResult) {
    match result {
        ConfigInitResult::Created { path } => {
            renderer.section("initialized claudeswap config");
            renderer.field("path", &path.display().to_string());
        }
        ConfigInitResult::Overwritten { path, backup_path } => {
            renderer.section("reinitialized claudeswap config");
            renderer.field("path", &path.display().to_string());
            renderer.field("backup", &backup_path.display().to_string());
        }
        ConfigInitResult::AlreadyInitialized { path } => {
            renderer.section("claudeswap config already initialized");
            renderer.field("path", &path.display().to_string());
            renderer.detail("use `claudeswap init --force` to rewrite it from the template");
        }
    }
}
