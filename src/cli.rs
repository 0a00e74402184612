//! CLI: catalog → (generated source | settings form | backend list)
use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::catalog::Catalog;
use crate::registry::BackendKind;
use crate::settings::{FieldChange, OptionKind, SettingsStore};
use crate::types::CodeGeneratorFile;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// render native function catalogs as C++, C#, Lua or Rust bindings
#[derive(Parser, Debug)]
#[command(version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,

    /// log debug events to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// export a catalog with one backend
    Generate(GenerateOut),
    /// print a backend's settings form with its current values
    Options(OptionsOut),
    /// list the available backends
    Backends,
}

#[derive(Args, Debug, Clone)]
struct SettingsInput {
    /// target backend
    #[arg(long, short, value_enum, default_value_t = BackendKind::Cpp)]
    backend: BackendKind,

    /// settings store (JSON object keyed by `Pages.GenerateCode.<Backend>`)
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    /// One or more catalog files. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    #[command(flatten)]
    settings_input: SettingsInput,

    /// only export these namespaces (repeatable)
    #[arg(long = "namespace", short = 'n')]
    namespaces: Vec<String>,

    /// override one setting, `field=value` (repeatable)
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    changes: Vec<String>,

    /// write the edited settings back to the store
    #[arg(long, requires = "settings")]
    save: bool,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// directory for extra files (defaults to the output file's directory)
    #[arg(long)]
    extra_dir: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct OptionsOut {
    #[command(flatten)]
    settings_input: SettingsInput,

    /// print the form as JSON
    #[arg(long)]
    json: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SettingsInput {
    fn load_store(&self) -> Result<SettingsStore> {
        match self.settings.as_ref() {
            Some(path) => SettingsStore::load(path)
                .with_context(|| format!("failed to load settings store {}", path.display())),
            None => Ok(SettingsStore::new()),
        }
    }
}

impl GenerateOut {
    fn parse_changes(&self, backend: BackendKind) -> Result<Vec<FieldChange>> {
        self.changes
            .iter()
            .map(|raw| {
                let Some((field, value)) = raw.split_once('=') else {
                    bail!("expected `field=value`, got `{raw}`");
                };
                backend
                    .change_from_text(field.trim(), value)
                    .with_context(|| format!("invalid setting `{raw}`"))
            })
            .collect()
    }

    fn extra_dir(&self) -> PathBuf {
        if let Some(dir) = self.extra_dir.as_ref() {
            return dir.clone();
        }
        self.out
            .as_deref()
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn run(&self) -> Result<()> {
        let backend = self.settings_input.backend;
        let changes = self.parse_changes(backend)?;

        // 1) catalog
        let mut catalog = Catalog::load_all(&self.input).context("failed to load catalog")?;
        if !self.namespaces.is_empty() {
            catalog.retain_namespaces(&self.namespaces)?;
        }

        // 2) export
        let mut store = self.settings_input.load_store()?;
        let output = backend
            .export(&catalog, &mut store, &changes)
            .with_context(|| format!("{} export failed", backend.name()))?;

        // 3) write
        match self.out.as_ref() {
            Some(out) => write_file(out, &output.text)?,
            None => print!("{}", output.text),
        }
        let extra_dir = self.extra_dir();
        for file in &output.extra_files {
            write_extra_file(&extra_dir, file)?;
        }
        if self.save {
            if let Some(path) = self.settings_input.settings.as_ref() {
                store.save(path).with_context(|| format!("failed to save settings store {}", path.display()))?;
                info!(path = %path.display(), key = backend.storage_key(), "settings saved");
            }
        }
        Ok(())
    }
}

impl OptionsOut {
    fn run(&self) -> Result<()> {
        let backend = self.settings_input.backend;
        let store = self.settings_input.load_store()?;
        let form = backend.render_form(&store);
        if self.json {
            let controls: Vec<serde_json::Value> = form
                .iter()
                .map(|control| {
                    let (kind, choices) = match control.spec.kind {
                        OptionKind::Boolean => ("boolean", Vec::new()),
                        OptionKind::String => ("string", Vec::new()),
                        OptionKind::Choice(choices) => ("choice", choices.iter().map(|c| {
                            serde_json::json!({ "label": c.label, "value": c.value })
                        }).collect()),
                    };
                    serde_json::json!({
                        "field": control.spec.field,
                        "label": control.spec.label,
                        "type": kind,
                        "choices": choices,
                        "current": control.current,
                    })
                })
                .collect();
            let src = serde_json::to_string_pretty(&serde_json::json!({
                "backend": backend.id(),
                "storage_key": backend.storage_key(),
                "options": controls,
            }))?;
            println!("{src}");
            return Ok(());
        }
        println!("{} ({})", backend.name().bold(), backend.storage_key().dimmed());
        for control in &form {
            println!("  {:<20} {} = {}", control.spec.field.cyan(), control.spec.label, control.current);
            if let OptionKind::Choice(choices) = control.spec.kind {
                for choice in choices {
                    println!("  {:<20}   {} {}", "", choice.value.green(), choice.label.dimmed());
                }
            }
        }
        Ok(())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// Install the stderr subscriber. `RUST_LOG` wins over `--verbose`.
    pub fn init_tracing(&self) {
        let default = if self.verbose { "native_export=debug" } else { "native_export=warn" };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(filter);
        if tracing_subscriber::registry().with(fmt_layer).try_init().is_err() {
            eprintln!("{} tracing subscriber already initialized", "warning:".yellow());
        }
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Generate(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                target.run()
            }
            Command::Options(target) => target.run(),
            Command::Backends => {
                for kind in BackendKind::ALL {
                    println!("{:<8} {:<8} {}", kind.id().bold(), kind.name(), kind.storage_key().dimmed());
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

fn write_extra_file(dir: &Path, file: &CodeGeneratorFile) -> Result<()> {
    let path = dir.join(file.file_name());
    write_file(&path, &file.content)?;
    info!(path = %path.display(), mime_type = %file.mime_type, "wrote extra file");
    Ok(())
}
