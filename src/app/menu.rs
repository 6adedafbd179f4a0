//! Interactive profile picker (`claudeswap menu`, or no subcommand).
//!
//! Reads state through `status`, mutates only through `switch_to`.

use crate::app::commands::{profile_label, render_failure, render_switch_result};
use claudeswap::profile::Profile;
use claudeswap::switch::{SwitchEngine, SwitchFailure};
use claudeswap::tui::{pick_from_list, settings, Renderer};

const MENU_TITLE: &str = "claudeswap";
const MENU_HELP: &str = "↑/↓ to move, Enter to switch, Esc to cancel.";

pub(crate) async fn run_menu(renderer: &Renderer, engine: &SwitchEngine, validating: bool) -> i32 {
    let active = match engine.status() {
        Ok(report) => report.active_profile,
        Err(failure) => {
            render_failure(renderer, &failure);
            return failure.exit_code();
        }
    };
    let profiles = match engine.profiles().profiles() {
        Ok(profiles) => profiles,
        Err(err) => {
            let failure = SwitchFailure::from(err);
            render_failure(renderer, &failure);
            return failure.exit_code();
        }
    };
    if profiles.is_empty() {
        renderer.section("no profiles");
        renderer.detail("run `claudeswap setup` to add a provider");
        return 0;
    }

    renderer.field("active", profile_label(active.as_deref()));
    let (options, initial) = menu_options(&profiles, active.as_deref());
    let selected = match pick_from_list(renderer.color(), MENU_TITLE, MENU_HELP, &options, initial)
    {
        Ok(selected) => selected,
        Err(err) => {
            renderer.error(&format!("failed to read selection: {err}"));
            return 1;
        }
    };
    let Some(index) = selected else {
        return 0;
    };

    let target = &profiles[index];
    if validating && active.as_deref() != Some(target.name.as_str()) {
        renderer.activity(&format!("checking {}", target.host()));
    }
    let result = engine.switch_to(&target.name).await;
    render_switch_result(renderer, &result);
    result.exit_code()
}

/// Picker rows (`* name  host`) and the row to start on (the active one).
fn menu_options(profiles: &[Profile], active: Option<&str>) -> (Vec<String>, usize) {
    let width = profiles
        .iter()
        .map(|profile| profile.name.chars().count())
        .max()
        .unwrap_or(0);
    let options = profiles
        .iter()
        .map(|profile| {
            let is_active = active == Some(profile.name.as_str());
            format!(
                "{} {:<width$}  {}",
                settings::active_marker(is_active),
                profile.name,
                profile.host()
            )
        })
        .collect();
    let initial = active
        .and_then(|name| profiles.iter().position(|profile| profile.name == name))
        .unwrap_or(0);
    (options, initial)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profiles() -> Vec<Profile> {
        vec![
            Profile::new("anthropic", "https://api.anthropic.com", "k2"),
            Profile::new("glm", "https://api.z.ai/api/anthropic", "k1"),
        ]
    }

    #[test]
    fn active_profile_is_marked_and_preselected() {
        let (options, initial) = menu_options(&profiles(), Some("glm"));
        assert_eq!(initial, 1);
        assert_eq!(options[0], "  anthropic  api.anthropic.com");
        assert_eq!(options[1], "* glm        api.z.ai");
    }

    #[test]
    fn default_provider_starts_at_the_top() {
        let (options, initial) = menu_options(&profiles(), None);
        assert_eq!(initial, 0);
        assert!(options.iter().all(|option| option.starts_with(' ')));
    }
}
