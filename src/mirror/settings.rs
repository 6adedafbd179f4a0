//! Claude settings layout: managed keys live under the top-level `env` object.
//!
//! Field names are stable across providers:
//! - `base_url` -> `ANTHROPIC_BASE_URL`
//! - `credential` -> `ANTHROPIC_AUTH_TOKEN`
//! - `model:<slot>` -> the slot's variable (see [`LogicalModel::env_var`])
//! - `flag:<NAME>` -> `NAME` verbatim
//!
//! Everything else in the file is carried through untouched.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::MirrorError;
use crate::profile::{mask_secret, reserved_env_vars, LogicalModel, Profile};

/// Flattened provider fields, keyed by field name.
pub type MaterializedFields = BTreeMap<String, String>;

pub const FIELD_BASE_URL: &str = "base_url";
pub const FIELD_CREDENTIAL: &str = "credential";
const MODEL_PREFIX: &str = "model:";
const FLAG_PREFIX: &str = "flag:";
const ENV_KEY: &str = "env";

/// Settings content after applying a set of fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSettings {
    pub bytes: Vec<u8>,
    /// Variables now owned by the engine, for the next switch to clear.
    pub managed_keys: Vec<String>,
}

/// Flatten a profile into the fields the Mirror will carry.
pub fn materialize(profile: &Profile) -> MaterializedFields {
    let mut fields = MaterializedFields::new();
    fields.insert(FIELD_BASE_URL.to_string(), profile.base_url.clone());
    fields.insert(FIELD_CREDENTIAL.to_string(), profile.credential.clone());
    for (slot, model) in &profile.model_map {
        fields.insert(format!("{MODEL_PREFIX}{slot}"), model.clone());
    }
    for (name, value) in &profile.extra_flags {
        fields.insert(format!("{FLAG_PREFIX}{name}"), value.clone());
    }
    fields
}

/// Settings variable carrying `field`, if the field name is well formed.
pub fn env_var_for_field(field: &str) -> Option<String> {
    match field {
        FIELD_BASE_URL => Some("ANTHROPIC_BASE_URL".to_string()),
        FIELD_CREDENTIAL => Some("ANTHROPIC_AUTH_TOKEN".to_string()),
        _ => {
            if let Some(slot) = field.strip_prefix(MODEL_PREFIX) {
                return LogicalModel::parse(slot).map(|slot| slot.env_var().to_string());
            }
            field
                .strip_prefix(FLAG_PREFIX)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
        }
    }
}

fn field_for_env_var(var: &str) -> String {
    match var {
        "ANTHROPIC_BASE_URL" => FIELD_BASE_URL.to_string(),
        "ANTHROPIC_AUTH_TOKEN" => FIELD_CREDENTIAL.to_string(),
        _ => LogicalModel::ALL
            .into_iter()
            .find(|slot| slot.env_var() == var)
            .map(|slot| format!("{MODEL_PREFIX}{slot}"))
            .unwrap_or_else(|| format!("{FLAG_PREFIX}{var}")),
    }
}

/// Replace the managed subset of `current` with `fields`.
///
/// Clears every core variable plus `previously_managed`, then writes the new
/// fields. An empty `fields` map yields the pristine default.
pub fn render(
    current: Option<&[u8]>,
    fields: &MaterializedFields,
    previously_managed: &[String],
) -> Result<RenderedSettings, MirrorError> {
    let mut root = parse_root(current)?;
    let had_env = root.contains_key(ENV_KEY);
    let env = root
        .entry(ENV_KEY.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    let Value::Object(env) = env else {
        return Err(MirrorError::Malformed(
            "`env` in settings is not an object".to_string(),
        ));
    };

    let mut cleared_any = false;
    for var in reserved_env_vars() {
        cleared_any |= env.shift_remove(var).is_some();
    }
    for var in previously_managed {
        cleared_any |= env.shift_remove(var).is_some();
    }

    let mut managed_keys = Vec::with_capacity(fields.len());
    for (field, value) in fields {
        let var = env_var_for_field(field).ok_or_else(|| {
            MirrorError::Malformed(format!("unknown materialized field `{field}`"))
        })?;
        env.insert(var.clone(), Value::String(value.clone()));
        managed_keys.push(var);
    }

    if env.is_empty() && (cleared_any || !had_env) {
        root.shift_remove(ENV_KEY);
    }

    let mut bytes = serde_json::to_vec_pretty(&Value::Object(root))
        .map_err(|err| MirrorError::Malformed(format!("failed to serialize settings: {err}")))?;
    bytes.push(b'\n');
    Ok(RenderedSettings {
        bytes,
        managed_keys,
    })
}

/// Read the managed subset back as fields.
///
/// Core variables are always recognized; flags only when listed in
/// `managed_keys`, since any other variable belongs to the user.
pub fn read_fields(
    current: Option<&[u8]>,
    managed_keys: &[String],
) -> Result<MaterializedFields, MirrorError> {
    let root = parse_root(current)?;
    let mut fields = MaterializedFields::new();
    let Some(env) = root.get(ENV_KEY) else {
        return Ok(fields);
    };
    let Value::Object(env) = env else {
        return Err(MirrorError::Malformed(
            "`env` in settings is not an object".to_string(),
        ));
    };

    let vars = reserved_env_vars()
        .map(str::to_string)
        .chain(managed_keys.iter().cloned());
    for var in vars {
        let Some(value) = env.get(&var) else {
            continue;
        };
        let value = match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        fields.insert(field_for_env_var(&var), value);
    }
    Ok(fields)
}

/// Copy of `fields` safe to show on screen.
pub fn masked(fields: &MaterializedFields) -> MaterializedFields {
    fields
        .iter()
        .map(|(field, value)| {
            let shown = if field == FIELD_CREDENTIAL {
                mask_secret(value)
            } else {
                value.clone()
            };
            (field.clone(), shown)
        })
        .collect()
}

fn parse_root(current: Option<&[u8]>) -> Result<Map<String, Value>, MirrorError> {
    let Some(bytes) = current else {
        return Ok(Map::new());
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(MirrorError::Malformed(
            "settings file is not a JSON object".to_string(),
        )),
        Err(err) => Err(MirrorError::Malformed(format!(
            "settings file is not valid JSON: {err}"
        ))),
    }
}
