//! Interactive `claudeswap setup`: create a profile from a preset or edit an
//! existing one.
//!
//! Prompts fall back to plain line reads when stdin is not a terminal, so the
//! flow can also be scripted (`printf 'glm\n...' | claudeswap setup`).

use crate::app::commands::{render_failure, render_switch_result};
use claudeswap::error::StoreError;
use claudeswap::profile::presets::PRESETS;
use claudeswap::profile::{LogicalModel, Profile, UpsertOutcome};
use claudeswap::switch::{SwitchEngine, SwitchFailure};
use claudeswap::tui::{pick_from_list, prompt_line, prompt_secret, Renderer};

/// Typed at a model prompt to drop the mapping for that slot.
const CLEAR_ANSWER: &str = "-";
const CUSTOM_ENDPOINT_LABEL: &str = "Custom Anthropic-compatible endpoint";

pub(crate) async fn run_setup(
    renderer: &Renderer,
    engine: &SwitchEngine,
    name: Option<&str>,
    validating: bool,
) -> i32 {
    let profile = match collect_profile(renderer, engine, name) {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            renderer.detail("setup cancelled; nothing was saved");
            return 0;
        }
        Err(failure) => {
            render_failure(renderer, &failure);
            return failure.exit_code();
        }
    };

    let name = profile.name.trim().to_string();
    let host = profile.host();
    match engine.profiles().upsert(profile) {
        Ok(UpsertOutcome::Created) => renderer.success(&format!("created profile {name}")),
        Ok(UpsertOutcome::Replaced) => renderer.success(&format!("updated profile {name}")),
        Err(err) => {
            let failure = SwitchFailure::from(err);
            render_failure(renderer, &failure);
            return failure.exit_code();
        }
    }

    if engine.peek_active().as_deref() != Some(name.as_str()) {
        renderer.detail(&format!("activate it with `claudeswap set {name}`"));
        return 0;
    }

    // The edited profile is live; push the new values into the settings file.
    if validating {
        renderer.activity(&format!("checking {host}"));
    }
    let result = engine.reapply(&name).await;
    render_switch_result(renderer, &result);
    result.exit_code()
}

/// Walk the prompts. `Ok(None)` means the user backed out.
fn collect_profile(
    renderer: &Renderer,
    engine: &SwitchEngine,
    name: Option<&str>,
) -> Result<Option<Profile>, SwitchFailure> {
    let color = renderer.color();
    let name = match name {
        Some(name) => name.trim().to_string(),
        None => match ask(prompt_line(color, "profile name", None))? {
            Some(name) if !name.is_empty() => name,
            _ => return Ok(None),
        },
    };

    let existing = match engine.profiles().get(&name) {
        Ok(profile) => Some(profile),
        Err(StoreError::NotFound(_)) => None,
        Err(err) => return Err(err.into()),
    };

    let mut draft = match &existing {
        Some(profile) => {
            renderer.section(&format!("editing profile {name}"));
            renderer.detail("press Enter to keep the value in brackets");
            profile.clone()
        }
        None => {
            let options = preset_options();
            let picked = pick_from_list(
                color,
                "provider",
                "Pick a provider preset, Enter to confirm, Esc to cancel.",
                &options,
                0,
            )
            .map_err(|err| SwitchFailure::Io(format!("failed to read selection: {err}")))?;
            match picked {
                None => return Ok(None),
                Some(index) => match PRESETS.get(index) {
                    Some(preset) => {
                        renderer.section(&format!("new {} profile {name}", preset.label));
                        preset.to_profile(&name, "")
                    }
                    None => {
                        renderer.section(&format!("new custom profile {name}"));
                        Profile::new(name.as_str(), "", "")
                    }
                },
            }
        }
    };

    let current_url = non_empty(&draft.base_url);
    let Some(base_url) = ask(prompt_line(color, "base URL", current_url.as_deref()))? else {
        return Ok(None);
    };
    draft.base_url = base_url;

    renderer.detail(&format!(
        "model ids: Enter keeps the bracketed value, `{CLEAR_ANSWER}` clears it"
    ));
    for slot in LogicalModel::ALL {
        let current = draft.model_map.get(&slot).cloned();
        let label = format!("{slot} model ({})", slot.env_var());
        let Some(answer) = ask(prompt_line(color, &label, current.as_deref()))? else {
            return Ok(None);
        };
        apply_model_answer(&mut draft, slot, &answer);
    }

    let label = if existing.is_some() {
        "API key (Enter keeps the stored key)"
    } else {
        "API key"
    };
    let Some(answer) = ask(prompt_secret(color, label))? else {
        return Ok(None);
    };
    draft.credential = resolve_credential(&answer, existing.as_ref())?;

    if !draft.extra_flags.is_empty() {
        let flags = draft
            .extra_flags
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(", ");
        renderer.field("extra flags", &flags);
    }
    Ok(Some(draft))
}

fn ask<T>(answer: std::io::Result<T>) -> Result<T, SwitchFailure> {
    answer.map_err(|err| SwitchFailure::Io(format!("failed to read input: {err}")))
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Preset labels followed by the custom-endpoint entry.
fn preset_options() -> Vec<String> {
    PRESETS
        .iter()
        .map(|preset| format!("{:<10} {}", preset.key, preset.label))
        .chain(std::iter::once(format!(
            "{:<10} {CUSTOM_ENDPOINT_LABEL}",
            "custom"
        )))
        .collect()
}

fn apply_model_answer(draft: &mut Profile, slot: LogicalModel, answer: &str) {
    let answer = answer.trim();
    if answer.is_empty() || answer == CLEAR_ANSWER {
        draft.model_map.remove(&slot);
    } else {
        draft.model_map.insert(slot, answer.to_string());
    }
}

/// An empty answer keeps the stored key when editing, and is an error otherwise.
fn resolve_credential(answer: &str, existing: Option<&Profile>) -> Result<String, SwitchFailure> {
    let answer = answer.trim();
    if !answer.is_empty() {
        return Ok(answer.to_string());
    }
    existing
        .map(|profile| profile.credential.clone())
        .ok_or_else(|| SwitchFailure::Validation("an API key is required".to_string()))
}
