//! Flat JSON file of backend settings, keyed by storage key
//! (`Pages.GenerateCode.<Backend>`).
use std::path::Path;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use super::GeneratorSettings;
use crate::error::SettingsError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsStore {
    entries: IndexMap<String, Value>,
}

impl SettingsStore {
    pub fn new() -> Self { Self::default() }

    /// A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let src = match std::fs::read_to_string(path) {
            Ok(src) => src,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings store yet");
                return Ok(Self::new());
            }
            Err(source) => return Err(SettingsError::Io { path: path.to_path_buf(), source }),
        };
        let entries = serde_json::from_str(&src)
            .map_err(|source| SettingsError::Json { path: path.to_path_buf(), source })?;
        Ok(Self { entries })
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io { path: path.to_path_buf(), source };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let src = serde_json::to_string_pretty(&self.entries)
            .map_err(|source| SettingsError::Json { path: path.to_path_buf(), source })?;
        std::fs::write(path, src).map_err(io_err)
    }

    /// Stored settings for `S`, or defaults when absent or unreadable
    /// (e.g. left behind by an older version of the backend).
    pub fn get<S: GeneratorSettings>(&self) -> S {
        let Some(raw) = self.entries.get(S::STORAGE_KEY) else {
            return S::default();
        };
        match serde_json::from_value(raw.clone()) {
            Ok(settings) => settings,
            Err(error) => {
                warn!(key = S::STORAGE_KEY, %error, "stored settings unreadable, using defaults");
                S::default()
            }
        }
    }

    pub fn put<S: GeneratorSettings>(&mut self, settings: &S) {
        // Serialize of a flat struct of primitives cannot fail
        let value = serde_json::to_value(settings).unwrap_or(Value::Null);
        self.entries.insert(S::STORAGE_KEY.to_string(), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::cpp::{CppSettings, FunctionStyle};

    #[test]
    fn missing_entries_fall_back_to_defaults() {
        let store = SettingsStore::new();
        let settings: CppSettings = store.get();
        assert_eq!(settings.function_style, FunctionStyle::Declaration);
    }

    #[test]
    fn put_then_get_returns_the_stored_settings() {
        let mut store = SettingsStore::new();
        let settings = CppSettings { generate_comments: true, ..CppSettings::default() };
        store.put(&settings);
        assert!(store.contains("Pages.GenerateCode.Cpp"));
        let back: CppSettings = store.get();
        assert!(back.generate_comments);
    }

    #[test]
    fn stale_fields_are_dropped_and_bad_entries_reset() {
        let mut store = SettingsStore::new();
        store.entries.insert(
            "Pages.GenerateCode.Cpp".into(),
            serde_json::json!({ "generate_comments": true, "someOldField": 3 }),
        );
        let settings: CppSettings = store.get();
        assert!(settings.generate_comments);

        store.entries.insert("Pages.GenerateCode.Cpp".into(), serde_json::json!({ "generate_comments": "yes" }));
        let settings: CppSettings = store.get();
        assert!(!settings.generate_comments);
    }

    #[test]
    fn load_of_missing_file_is_empty_and_save_round_trips() {
        let dir = std::env::temp_dir().join(format!("native-export-store-{}", std::process::id()));
        let path = dir.join("settings.json");
        let empty = SettingsStore::load(&path).unwrap();
        assert_eq!(empty, SettingsStore::new());

        let mut store = SettingsStore::new();
        store.put(&CppSettings { emit_header: true, ..CppSettings::default() });
        store.save(&path).unwrap();
        let loaded = SettingsStore::load(&path).unwrap();
        assert_eq!(loaded, store);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
