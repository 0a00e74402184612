//! Runs every backend over the fixture catalog and checks the properties
//! that must hold for any backend: repeatable output, one open and one close
//! marker per namespace, and input order.
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use native_export::{BackendKind, Catalog};
use native_export::settings::SettingsStore;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static HASH_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"0x[0-9A-F]{1,16}\b").unwrap());

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Per-backend namespace markers, keyed by backend id in `markers.json`.
#[derive(Debug, Deserialize)]
struct Markers {
    open: String,
    close: Option<String>,
    carries_hashes: bool,
}

#[derive(Debug, Default, Serialize)]
struct Report {
    backend: String,
    bytes: usize,
    extra_files: Vec<String>,
    failures: Vec<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

fn main() -> ExitCode {
    let fixtures = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures"));

    let catalog = match Catalog::load(&fixtures.join("natives.json")) {
        Ok(x) => x,
        Err(error) => {
            eprintln!("❌ failed to load fixture catalog: {error}");
            return ExitCode::FAILURE;
        }
    };
    let markers = match load_markers(&fixtures.join("markers.json")) {
        Ok(x) => x,
        Err(error) => {
            eprintln!("❌ {error}");
            return ExitCode::FAILURE;
        }
    };

    let mut reports = Vec::new();
    for kind in BackendKind::ALL {
        let report = match markers.get(kind.id()) {
            Some(markers) => check_backend(kind, &catalog, markers),
            None => Report {
                backend: kind.id().to_string(),
                failures: vec!["no markers declared in markers.json".to_string()],
                ..Report::default()
            },
        };
        let status = if report.failures.is_empty() { "✅" } else { "❌" };
        eprintln!("{status} {:<8} {} bytes, {} extra file(s)", report.backend, report.bytes, report.extra_files.len());
        for failure in &report.failures {
            eprintln!("     - {failure}");
        }
        reports.push(report);
    }

    match serde_json::to_string_pretty(&reports) {
        Ok(src) => println!("{src}"),
        Err(error) => eprintln!("failed to render report: {error}"),
    }
    if reports.iter().all(|r| r.failures.is_empty()) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn load_markers(path: &Path) -> Result<serde_json::Map<String, serde_json::Value>, String> {
    let src = std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let de = &mut serde_json::Deserializer::from_str(&src);
    serde_path_to_error::deserialize(de).map_err(|e| format!("{} at {}: {}", path.display(), e.path(), e.inner()))
}

fn check_backend(kind: BackendKind, catalog: &Catalog, raw_markers: &serde_json::Value) -> Report {
    let mut report = Report { backend: kind.id().to_string(), ..Report::default() };

    let markers: Markers = match serde_path_to_error::deserialize(raw_markers) {
        Ok(x) => x,
        Err(error) => {
            report.failures.push(format!("bad markers at {}: {}", error.path(), error.inner()));
            return report;
        }
    };

    // 1) two independent runs
    let mut store = SettingsStore::new();
    let first = kind.export(catalog, &mut store, &[]);
    let second = kind.export(catalog, &mut store, &[]);
    let (first, second) = match (first, second) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(error), _) | (_, Err(error)) => {
            report.failures.push(format!("export failed: {error}"));
            return report;
        }
    };
    report.bytes = first.text.len();
    report.extra_files = first.extra_files.iter().map(|f| f.file_name()).collect();
    if first != second {
        report.failures.push("repeated runs differ".to_string());
    }

    // 2) namespace balance
    let expected = catalog.namespaces.len();
    let count = |pattern: &str| -> Result<usize, String> {
        let re = Regex::new(&format!("(?m){pattern}")).map_err(|e| e.to_string())?;
        Ok(re.find_iter(&first.text).count())
    };
    match count(&markers.open) {
        Ok(n) if n == expected => {}
        Ok(n) => report.failures.push(format!("{n} namespace opens, expected {expected}")),
        Err(error) => report.failures.push(format!("bad open pattern: {error}")),
    }
    if let Some(close) = markers.close.as_deref() {
        match count(close) {
            Ok(n) if n == expected => {}
            Ok(n) => report.failures.push(format!("{n} namespace closes, expected {expected}")),
            Err(error) => report.failures.push(format!("bad close pattern: {error}")),
        }
    }

    // 3) order
    if markers.carries_hashes {
        let seen: Vec<&str> = HASH_LITERAL.find_iter(&first.text).map(|m| m.as_str()).collect();
        let expected = ordered_hashes(catalog);
        if seen != expected {
            report.failures.push(format!("hash order {seen:?}, expected {expected:?}"));
        }
    }

    report
}

/// Every listed hash, namespaces in catalog order.
fn ordered_hashes(catalog: &Catalog) -> Vec<&str> {
    catalog.namespaces
        .values()
        .flat_map(|ns| ns.natives.iter().map(String::as_str))
        .collect()
}
