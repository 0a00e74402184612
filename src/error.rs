//! Error types shared by the catalog loader, the settings glue and the exporter.
use std::path::PathBuf;
use thiserror::Error;

/// Lifecycle phase of one generator instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Fresh,
    Started,
    Ended,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Fresh => f.write_str("fresh"),
            Phase::Started => f.write_str("started"),
            Phase::Ended => f.write_str("ended"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    /// A lifecycle method was called out of order.
    #[error("contract violation: `{operation}` called while the generator is {phase}")]
    OutOfOrder { operation: &'static str, phase: Phase },

    #[error("contract violation: `pop_namespace` called with no open namespace")]
    NoOpenNamespace,

    #[error("contract violation: `add_native` for `{native}` called outside any namespace")]
    NativeOutsideNamespace { native: String },

    #[error("contract violation: `end` called with {} unclosed namespace(s): {}", open.len(), open.join(", "))]
    UnclosedNamespaces { open: Vec<String> },

    #[error("contract violation: extra file `{file}` was already submitted in this run")]
    DuplicateExtraFile { file: String },

    /// A namespace lists a hash that is absent from the native map.
    #[error("namespace `{namespace}` references native {hash} which is not in the catalog")]
    MissingNative { namespace: String, hash: String },

    #[error("native `{native}`: cannot parse type `{ty}`")]
    InvalidType { native: String, ty: String },

    #[error("native `{native}`: malformed hash `{hash}`")]
    InvalidHash { native: String, hash: String },

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("option `{field}` does not accept `{value}` (expected one of: {})", expected.join(", "))]
    InvalidChoice { field: String, value: String, expected: Vec<String> },

    #[error("option `{field}` expects true/false, got `{value}`")]
    ExpectedBool { field: String, value: String },

    #[error("option `{field}` expects a {expected} value")]
    WrongValueKind { field: String, expected: &'static str },

    /// The schema declares a field that the settings type has no setter for.
    #[error("settings `{settings}` declare option `{field}` but do not handle it")]
    UnhandledOption { settings: &'static str, field: &'static str },

    #[error("failed to access settings store {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("settings store {path} is not valid JSON: {source}")]
    Json { path: PathBuf, source: serde_json::Error },
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    /// Parse failure with the JSON path of the offending node.
    #[error("catalog {path}: at JSON path {json_path} → {message}")]
    Parse { path: PathBuf, json_path: String, message: String },

    #[error("no catalog inputs given")]
    NoInputs,

    #[error("invalid glob pattern `{pattern}`: {message}")]
    GlobPattern { pattern: String, message: String },

    #[error("glob pattern matched no files: {0}")]
    NoMatches(String),

    #[error("namespace `{0}` does not exist in the catalog")]
    UnknownNamespace(String),
}
