//! Per-backend settings and their declarative option schema.
//!
//! A schema is plain `'static` data: a front end renders one control per
//! [`OptionSpec`] and reports edits as [`FieldChange`]s, which
//! [`apply_change`] routes into the backend's typed [`GeneratorSettings::set_field`].
pub mod store;

use std::fmt::Debug;
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::error::SettingsError;

pub use store::SettingsStore;

// ————————————————————————————————————————————————————————————————————————————
// SCHEMA
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub label: &'static str,
    pub value: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Boolean,
    String,
    Choice(&'static [Choice]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    pub kind: OptionKind,
    pub label: &'static str,
    pub field: &'static str,
}

impl OptionSpec {
    pub const fn boolean(field: &'static str, label: &'static str) -> Self {
        Self { kind: OptionKind::Boolean, label, field }
    }
    pub const fn string(field: &'static str, label: &'static str) -> Self {
        Self { kind: OptionKind::String, label, field }
    }
    pub const fn choice(field: &'static str, label: &'static str, choices: &'static [Choice]) -> Self {
        Self { kind: OptionKind::Choice(choices), label, field }
    }
}

/// A typed value handed to a settings setter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Text(String),
}

impl OptionValue {
    pub fn into_bool(self, field: &str) -> Result<bool, SettingsError> {
        match self {
            OptionValue::Bool(b) => Ok(b),
            OptionValue::Text(_) => Err(SettingsError::WrongValueKind { field: field.to_string(), expected: "boolean" }),
        }
    }

    pub fn into_text(self, field: &str) -> Result<String, SettingsError> {
        match self {
            OptionValue::Text(s) => Ok(s),
            OptionValue::Bool(_) => Err(SettingsError::WrongValueKind { field: field.to_string(), expected: "text" }),
        }
    }

    /// Parse a choice value into the field's enum.
    pub fn into_choice<T: std::str::FromStr>(self, field: &str) -> Result<T, SettingsError> {
        let raw = self.into_text(field)?;
        raw.parse().map_err(|_| SettingsError::InvalidChoice {
            field: field.to_string(),
            value: raw,
            expected: Vec::new(),
        })
    }
}

/// One edit reported by a settings form: checkbox controls fill `checked`,
/// every other control fills `value`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldChange {
    pub field: String,
    pub checked: bool,
    pub value: String,
}

/// A rendered control: schema entry plus the current value.
#[derive(Debug, Clone, PartialEq)]
pub struct FormControl {
    pub spec: OptionSpec,
    pub current: serde_json::Value,
}

// ————————————————————————————————————————————————————————————————————————————
// SETTINGS CONTRACT
// ————————————————————————————————————————————————————————————————————————————

pub trait GeneratorSettings: Debug + Default + Clone + Serialize + DeserializeOwned {
    /// Key under which a settings store keeps this backend's settings.
    const STORAGE_KEY: &'static str;

    fn options() -> &'static [OptionSpec];

    /// Typed write of one field. `Ok(false)` when the field is not a
    /// setting of this backend.
    fn set_field(&mut self, field: &str, value: OptionValue) -> Result<bool, SettingsError>;
}

/// Route one form edit into `settings`, using the schema's `kind` to decide
/// between `checked` and `value`. Returns whether a field was written.
pub fn apply_change<S: GeneratorSettings>(settings: &mut S, change: &FieldChange) -> Result<bool, SettingsError> {
    let Some(spec) = S::options().iter().find(|o| o.field == change.field) else {
        warn!(field = %change.field, settings = S::STORAGE_KEY, "ignoring change to unknown settings field");
        return Ok(false);
    };
    let value = match spec.kind {
        OptionKind::Boolean => OptionValue::Bool(change.checked),
        OptionKind::String => OptionValue::Text(change.value.clone()),
        OptionKind::Choice(choices) => {
            if !choices.iter().any(|c| c.value == change.value) {
                return Err(SettingsError::InvalidChoice {
                    field: change.field.clone(),
                    value: change.value.clone(),
                    expected: choices.iter().map(|c| c.value.to_string()).collect(),
                });
            }
            OptionValue::Text(change.value.clone())
        }
    };
    settings.set_field(spec.field, value)
}

/// Check that every declared option has a working setter, by writing each
/// option's current value back into a default instance.
pub fn validate_options<S: GeneratorSettings>() -> Result<(), SettingsError> {
    let mut probe = S::default();
    for spec in S::options() {
        let current = current_value(&probe, spec.field);
        let value = match (spec.kind, current) {
            (OptionKind::Boolean, serde_json::Value::Bool(b)) => OptionValue::Bool(b),
            (OptionKind::String | OptionKind::Choice(_), serde_json::Value::String(s)) => OptionValue::Text(s),
            _ => return Err(SettingsError::UnhandledOption { settings: S::STORAGE_KEY, field: spec.field }),
        };
        if !probe.set_field(spec.field, value)? {
            return Err(SettingsError::UnhandledOption { settings: S::STORAGE_KEY, field: spec.field });
        }
    }
    Ok(())
}

/// One control per option, in schema order.
pub fn render_form<S: GeneratorSettings>(settings: &S) -> Vec<FormControl> {
    S::options().iter()
        .map(|spec| FormControl { spec: *spec, current: current_value(settings, spec.field) })
        .collect()
}

/// Build the change a form would report for `field=raw` typed on a command line.
pub fn change_from_text<S: GeneratorSettings>(field: &str, raw: &str) -> Result<FieldChange, SettingsError> {
    let is_bool = S::options().iter().any(|o| o.field == field && o.kind == OptionKind::Boolean);
    let checked = if is_bool {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => true,
            "false" | "0" | "no" | "off" => false,
            _ => return Err(SettingsError::ExpectedBool { field: field.to_string(), value: raw.to_string() }),
        }
    } else {
        false
    };
    Ok(FieldChange { field: field.to_string(), checked, value: raw.to_string() })
}

fn current_value<S: Serialize>(settings: &S, field: &str) -> serde_json::Value {
    serde_json::to_value(settings)
        .ok()
        .and_then(|v| v.get(field).cloned())
        .unwrap_or(serde_json::Value::Null)
}
