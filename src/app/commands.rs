//! One handler per non-interactive subcommand. Each returns the exit code.

use claudeswap::fsutil::now_unix_millis;
use claudeswap::mirror::settings::env_var_for_field;
use claudeswap::switch::{SwitchEngine, SwitchFailure, SwitchOutcome, SwitchResult};
use claudeswap::tui::{settings, Renderer};
use claudeswap::validator::ValidationOutcome;
use std::path::Path;

pub(crate) async fn run_set(
    renderer: &Renderer,
    engine: &SwitchEngine,
    name: &str,
    validating: bool,
) -> i32 {
    if validating {
        if let Ok(profile) = engine.profiles().get(name) {
            if engine.peek_active().as_deref() != Some(name) {
                renderer.activity(&format!("checking {}", profile.host()));
            }
        }
    }
    let result = engine.switch_to(name).await;
    render_switch_result(renderer, &result);
    result.exit_code()
}

pub(crate) fn run_reset(renderer: &Renderer, engine: &SwitchEngine) -> i32 {
    let result = engine.reset_to_default();
    render_switch_result(renderer, &result);
    result.exit_code()
}

/// Print the outcome of a switch, reset or reapply.
pub(crate) fn render_switch_result(renderer: &Renderer, result: &SwitchResult) {
    match (result.outcome, &result.cause) {
        (SwitchOutcome::Committed, _) => {
            match &result.new_profile {
                Some(name) => renderer.success(&format!("switched to {name}")),
                None => renderer.success("reset to the default provider"),
            }
            renderer.field("previous", profile_label(result.previous_profile.as_deref()));
            if let Some(snapshot) = &result.snapshot_path {
                renderer.field("backup", &snapshot.display().to_string());
            }
            renderer.detail("restart Claude Code for the change to take effect");
        }
        (SwitchOutcome::NoOp, _) => {
            renderer.activity(&format!(
                "already using {}",
                profile_label(result.new_profile.as_deref())
            ));
        }
        (SwitchOutcome::RolledBack, Some(cause)) => render_failure(renderer, cause),
        (SwitchOutcome::RolledBack, None) => renderer.error("switch did not complete"),
    }
}

/// `error:` line plus recovery guidance for the failures that need it.
pub(crate) fn render_failure(renderer: &Renderer, failure: &SwitchFailure) {
    renderer.error(&failure.to_string());
    match failure {
        SwitchFailure::RollbackFailed { snapshot, .. } => {
            renderer.error("THE SETTINGS FILE MAY BE INCONSISTENT");
            renderer.field("snapshot", &snapshot.display().to_string());
            renderer.detail("run `claudeswap rollback` or copy the snapshot content back by hand");
        }
        SwitchFailure::NotFound(_) => {
            renderer.detail("run `claudeswap list` to see stored profiles");
        }
        SwitchFailure::Unreachable(_) | SwitchFailure::AuthRejected(_) => {
            renderer.detail("nothing was changed; use --skip-validate to switch anyway");
        }
        _ => {}
    }
}

pub(crate) fn run_status(
    renderer: &Renderer,
    engine: &SwitchEngine,
    config_source: Option<&Path>,
) -> i32 {
    let report = match engine.status() {
        Ok(report) => report,
        Err(failure) => {
            render_failure(renderer, &failure);
            return 0;
        }
    };
    let now = now_unix_millis();

    renderer.section("status");
    renderer.field("active", profile_label(report.active_profile.as_deref()));
    if let Some(at) = report.last_switch_at_millis {
        renderer.field("switched", &describe_age(now, at));
    }
    renderer.field("settings", &report.mirror_path.display().to_string());
    match config_source {
        Some(path) => renderer.field("config", &path.display().to_string()),
        None => renderer.field("config", "built-in defaults"),
    }
    renderer.field("profiles", &report.profile_count.to_string());
    if let Some(snapshot) = &report.latest_snapshot {
        renderer.field("latest backup", &snapshot.display().to_string());
    }

    if report.fields.is_empty() {
        renderer.detail("no provider variables set; Claude Code uses its own login");
    } else {
        renderer.section("provider variables");
        for (field, value) in &report.fields {
            let label = env_var_for_field(field).unwrap_or_else(|| field.clone());
            renderer.field(&label, value);
        }
    }
    0
}

pub(crate) fn run_list(renderer: &Renderer, engine: &SwitchEngine) -> i32 {
    let profiles = match engine.profiles().profiles() {
        Ok(profiles) => profiles,
        Err(err) => {
            let failure = SwitchFailure::from(err);
            render_failure(renderer, &failure);
            return failure.exit_code();
        }
    };
    if profiles.is_empty() {
        renderer.detail("no profiles yet; run `claudeswap setup` to add one");
        return 0;
    }
    let active = engine.peek_active();
    for profile in &profiles {
        renderer.profile_line(
            &profile.name,
            &profile.host(),
            active.as_deref() == Some(profile.name.as_str()),
        );
    }
    0
}

pub(crate) fn run_remove(renderer: &Renderer, engine: &SwitchEngine, name: &str) -> i32 {
    match engine.remove_profile(name) {
        Ok(()) => {
            renderer.success(&format!("removed profile {name}"));
            0
        }
        Err(failure) => {
            render_failure(renderer, &failure);
            failure.exit_code()
        }
    }
}

pub(crate) async fn run_validate(renderer: &Renderer, engine: &SwitchEngine, name: &str) -> i32 {
    if let Ok(profile) = engine.profiles().get(name) {
        renderer.activity(&format!("checking {}", profile.host()));
    }
    match engine.validate_profile(name).await {
        Ok(ValidationOutcome::Reachable) => {
            renderer.success(&format!("{name} is reachable and accepted the credential"));
            0
        }
        Ok(ValidationOutcome::Unreachable(reason)) => {
            let failure = SwitchFailure::Unreachable(reason);
            renderer.error(&failure.to_string());
            failure.exit_code()
        }
        Ok(ValidationOutcome::AuthRejected(reason)) => {
            let failure = SwitchFailure::AuthRejected(reason);
            renderer.error(&failure.to_string());
            failure.exit_code()
        }
        Err(failure) => {
            render_failure(renderer, &failure);
            failure.exit_code()
        }
    }
}

pub(crate) fn run_backups(renderer: &Renderer, engine: &SwitchEngine) -> i32 {
    let snapshots = match engine.backups().list() {
        Ok(snapshots) => snapshots,
        Err(err) => {
            let failure = SwitchFailure::from(err);
            render_failure(renderer, &failure);
            return failure.exit_code();
        }
    };
    renderer.section("backups");
    if snapshots.is_empty() {
        renderer.detail(&format!(
            "no snapshots in {}",
            engine.backups().dir().display()
        ));
        return 0;
    }
    let now = now_unix_millis();
    for snapshot in &snapshots {
        let content = if snapshot.content.is_some() {
            ""
        } else {
            " (no settings file)"
        };
        renderer.field(
            &describe_age(now, snapshot.taken_at_millis),
            &format!(
                "{}{content}",
                profile_label(snapshot.active_profile.as_deref())
            ),
        );
        renderer.detail(&snapshot.path.display().to_string());
    }
    0
}

pub(crate) fn run_rollback(renderer: &Renderer, engine: &SwitchEngine) -> i32 {
    match engine.rollback_latest() {
        Ok(report) => {
            renderer.success(&format!(
                "restored settings from the snapshot taken {}",
                describe_age(now_unix_millis(), report.snapshot_taken_at_millis)
            ));
            renderer.field("active", profile_label(report.restored_profile.as_deref()));
            renderer.field("previous", profile_label(report.previous_profile.as_deref()));
            0
        }
        Err(failure) => {
            render_failure(renderer, &failure);
            failure.exit_code()
        }
    }
}

/// Profile name, or the pristine-default label.
pub(crate) fn profile_label(name: Option<&str>) -> &str {
    name.unwrap_or(settings::LABEL_DEFAULT_PROVIDER)
}

/// Coarse human age of a unix-millis timestamp relative to `now`.
pub(crate) fn describe_age(now_millis: u64, then_millis: u64) -> String {
    let secs = now_millis.saturating_sub(then_millis) / 1000;
    match secs {
        0..=9 => "just now".to_string(),
        10..=59 => format!("{secs}s ago"),
        60..=3_599 => format!("{}m ago", secs / 60),
        3_600..=86_399 => format!("{}h ago", secs / 3_600),
        _ => format!("{}d ago", secs / 86_400),
    }
}
