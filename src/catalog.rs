//! Native catalog: raw records and namespace groupings, loaded from the
//! grouped "nativedb" JSON layout:
//!
//! ```json
//! { "NATIVE": { "0xD49F9B0955C367DE": { "name": "GET_LABEL_TEXT", ... } } }
//! ```
//!
//! Namespace order and the order of natives inside a namespace follow the
//! input documents (`serde_json` is built with `preserve_order`).
use std::path::{Path, PathBuf};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::CatalogError;
use crate::types::normalize_hash;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Raw native record as published by the catalog. Only the fields a
/// generator consumes are typed; everything else is carried loosely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Native {
    pub hash: String,
    pub jhash: Option<String>,
    pub name: String,
    pub params: Vec<NativeParam>,
    #[serde(alias = "returnType")]
    pub return_type: String,
    pub comment: String,
    #[serde(alias = "schComment")]
    pub sch_comment: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub build: Option<String>,
    #[serde(alias = "oldNames")]
    pub old_names: Option<Vec<String>>,
    pub examples: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeParam {
    #[serde(rename = "type")]
    pub ty: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    pub name: String,
    pub natives: Vec<String>, // hashes, listed order is emitted order
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub namespaces: IndexMap<String, Namespace>,
    pub natives: IndexMap<String, Native>,
}

/// On-disk layout: namespace → hash → record.
pub type GroupedNatives = IndexMap<String, IndexMap<String, Native>>;

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Catalog {
    pub fn new() -> Self { Self::default() }

    /// Append `native` to `namespace`, creating the namespace on first use.
    /// Hashes are keyed by their canonical spelling, so `0xab` and `0xAB`
    /// are the same native. A hash already listed in the namespace is not
    /// listed twice; a hash already known keeps its first record.
    pub fn insert(&mut self, namespace: &str, mut native: Native) {
        if native.hash.is_empty() {
            return;
        }
        let hash = catalog_key(&native.hash);
        let ns = self.namespaces
            .entry(namespace.to_string())
            .or_insert_with(|| Namespace { name: namespace.to_string(), natives: Vec::new() });
        if !ns.natives.contains(&hash) {
            ns.natives.push(hash.clone());
        }
        native.hash = hash.clone();
        self.natives.entry(hash).or_insert(native);
    }

    pub fn from_grouped(grouped: GroupedNatives) -> Self {
        let mut catalog = Self::new();
        for (namespace, natives) in grouped {
            // empty namespaces still take part in the output
            catalog.namespaces
                .entry(namespace.clone())
                .or_insert_with(|| Namespace { name: namespace.clone(), natives: Vec::new() });
            for (hash, mut native) in natives {
                if native.hash.is_empty() {
                    native.hash = hash;
                }
                catalog.insert(&namespace, native);
            }
        }
        catalog
    }

    pub fn extend(&mut self, other: Catalog) {
        let Catalog { namespaces, mut natives } = other;
        for (name, namespace) in namespaces {
            self.namespaces
                .entry(name.clone())
                .or_insert_with(|| Namespace { name: name.clone(), natives: Vec::new() });
            for hash in namespace.natives {
                match natives.swap_remove(&hash) {
                    Some(native) => self.insert(&name, native),
                    // dangling reference: keep it so the exporter reports it
                    None => {
                        let hash = catalog_key(&hash);
                        if let Some(ns) = self.namespaces.get_mut(&name) {
                            if !ns.natives.contains(&hash) {
                                ns.natives.push(hash);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Parse one grouped document; `path` only labels errors.
    pub fn from_json_str(src: &str, path: &Path) -> Result<Self, CatalogError> {
        let de = &mut serde_json::Deserializer::from_str(src);
        match serde_path_to_error::deserialize::<_, GroupedNatives>(de) {
            Ok(grouped) => Ok(Self::from_grouped(grouped)),
            Err(err) => Err(CatalogError::Parse {
                path: path.to_path_buf(),
                json_path: err.path().to_string(),
                message: err.into_inner().to_string(),
            }),
        }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let src = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&src, path)?;
        debug!(
            path = %path.display(),
            namespaces = catalog.namespaces.len(),
            natives = catalog.natives.len(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    /// Load and merge every input, in the order given.
    pub fn load_all<I>(patterns: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let paths = resolve_file_path_patterns(patterns)?;
        if paths.is_empty() {
            return Err(CatalogError::NoInputs);
        }
        let mut catalog = Self::new();
        for path in paths {
            catalog.extend(Self::load(&path)?);
        }
        Ok(catalog)
    }

    /// Keep only the named namespaces, in catalog order.
    pub fn retain_namespaces(&mut self, names: &[String]) -> Result<(), CatalogError> {
        if let Some(unknown) = names.iter().find(|n| !self.namespaces.contains_key(*n)) {
            return Err(CatalogError::UnknownNamespace(unknown.clone()));
        }
        self.namespaces.retain(|name, _| names.contains(name));
        Ok(())
    }

    pub fn native_count(&self) -> usize {
        self.namespaces.values().map(|ns| ns.natives.len()).sum()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// `build` is a string in newer dumps and a bare number in older ones.
/// Canonical hash, or the raw text when it is malformed so the exporter can
/// still report it.
fn catalog_key(raw: &str) -> String {
    normalize_hash(raw).unwrap_or_else(|| raw.to_string())
}

fn string_or_number<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Build {
        Text(String),
        Number(u64),
    }
    Ok(match Option::<Build>::deserialize(de)? {
        Some(Build::Text(s)) => Some(s),
        Some(Build::Number(n)) => Some(n.to_string()),
        None => None,
    })
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>, CatalogError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let entries = glob::glob(pattern).map_err(|e| CatalogError::GlobPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;
            let mut matched = Vec::new();
            for entry in entries {
                let path = entry.map_err(|e| CatalogError::Io {
                    path: e.path().to_path_buf(),
                    source: std::io::Error::new(e.error().kind(), e.error().to_string()),
                })?;
                matched.push(path);
            }
            if matched.is_empty() {
                return Err(CatalogError::NoMatches(pattern.to_string()));
            }
            // glob yields alphabetical order; keep it for stable merges
            out.extend(matched);
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "PLAYER": {
            "0x4F8644AF03D0E0D6": {
                "name": "PLAYER_ID",
                "jhash": "0x8AEDD8BB",
                "comment": "",
                "params": [],
                "return_type": "Player",
                "build": "323"
            }
        },
        "HUD": {
            "0xD49F9B0955C367DE": {
                "name": "GET_LABEL_TEXT",
                "comment": "Gets a localized string literal from a label name.",
                "params": [{ "type": "const char*", "name": "labelName" }],
                "returnType": "const char*",
                "build": 323,
                "oldNames": ["_GET_LABEL_TEXT"]
            },
            "0x3A77DAE8B4FD7586": {
                "name": "DOES_TEXT_LABEL_EXIST",
                "params": [{ "type": "const char*", "name": "gxt" }],
                "return_type": "BOOL"
            }
        }
    }"#;

    #[test]
    fn grouped_layout_preserves_document_order() {
        let catalog = Catalog::from_json_str(SAMPLE, Path::new("sample.json")).unwrap();
        assert_eq!(catalog.namespaces.keys().collect::<Vec<_>>(), ["PLAYER", "HUD"]);
        assert_eq!(
            catalog.namespaces["HUD"].natives,
            ["0xD49F9B0955C367DE", "0x3A77DAE8B4FD7586"]
        );
        let label = &catalog.natives["0xD49F9B0955C367DE"];
        assert_eq!(label.hash, "0xD49F9B0955C367DE");
        assert_eq!(label.return_type, "const char*");
        assert_eq!(label.build.as_deref(), Some("323"));
        assert_eq!(label.old_names.as_deref(), Some(&["_GET_LABEL_TEXT".to_string()][..]));
    }

    #[test]
    fn parse_errors_carry_json_path() {
        let src = r#"{ "HUD": { "0x1": { "name": "X", "params": [{ "type": 5, "name": "a" }] } } }"#;
        let err = Catalog::from_json_str(src, Path::new("bad.json")).unwrap_err();
        match err {
            CatalogError::Parse { json_path, .. } => assert_eq!(json_path, "HUD.0x1.params[0].type"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn extend_appends_namespaces_and_skips_duplicates() {
        let mut a = Catalog::new();
        a.insert("HUD", Native { hash: "0x1".into(), name: "A".into(), ..Native::default() });
        let mut b = Catalog::new();
        b.insert("HUD", Native { hash: "0x1".into(), name: "A_AGAIN".into(), ..Native::default() });
        b.insert("HUD", Native { hash: "0x2".into(), name: "B".into(), ..Native::default() });
        b.insert("CAM", Native { hash: "0x3".into(), name: "C".into(), ..Native::default() });

        a.extend(b);
        assert_eq!(a.namespaces.keys().collect::<Vec<_>>(), ["HUD", "CAM"]);
        assert_eq!(a.namespaces["HUD"].natives, ["0x1", "0x2"]);
        assert_eq!(a.natives["0x1"].name, "A");
        assert_eq!(a.native_count(), 3);
    }

    #[test]
    fn hashes_differing_only_in_case_are_one_native() {
        let lower = r#"{ "PLAYER": { "0x4f8644af03d0e0d6": { "name": "PLAYER_ID", "return_type": "Player" } } }"#;
        let upper = r#"{ "PLAYER": { "0x4F8644AF03D0E0D6": { "name": "PLAYER_ID_AGAIN", "return_type": "Player" } } }"#;
        let mut catalog = Catalog::from_json_str(lower, Path::new("lower.json")).unwrap();
        catalog.extend(Catalog::from_json_str(upper, Path::new("upper.json")).unwrap());

        assert_eq!(catalog.namespaces["PLAYER"].natives, ["0x4F8644AF03D0E0D6"]);
        assert_eq!(catalog.natives.len(), 1);
        let native = &catalog.natives["0x4F8644AF03D0E0D6"];
        assert_eq!(native.name, "PLAYER_ID");
        assert_eq!(native.hash, "0x4F8644AF03D0E0D6");
    }

    #[test]
    fn malformed_hashes_keep_their_raw_key() {
        let mut catalog = Catalog::new();
        catalog.insert("MISC", Native { hash: "D49F9B0955C367DE".into(), name: "X".into(), ..Native::default() });
        assert_eq!(catalog.namespaces["MISC"].natives, ["D49F9B0955C367DE"]);
        assert_eq!(catalog.natives["D49F9B0955C367DE"].hash, "D49F9B0955C367DE");
    }

    #[test]
    fn retain_namespaces_rejects_unknown_names() {
        let mut catalog = Catalog::from_json_str(SAMPLE, Path::new("sample.json")).unwrap();
        let err = catalog.retain_namespaces(&["NOPE".to_string()]).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownNamespace(ref n) if n == "NOPE"));

        catalog.retain_namespaces(&["HUD".to_string()]).unwrap();
        assert_eq!(catalog.namespaces.keys().collect::<Vec<_>>(), ["HUD"]);
    }

    #[test]
    fn glob_without_matches_is_an_error() {
        let err = Catalog::load_all(["/definitely/not/here/*.json"]).unwrap_err();
        assert!(matches!(err, CatalogError::NoMatches(_)));
    }
}
