//! Closed set of backends. Each variant maps to one generator type; the
//! methods here dispatch to generic code over that type.
use clap::ValueEnum;

use crate::catalog::Catalog;
use crate::error::{ExportError, SettingsError};
use crate::exporter::{ExportOutput, Exporter};
use crate::generator::cpp::CppGenerator;
use crate::generator::csharp::CSharpGenerator;
use crate::generator::lua::LuaGenerator;
use crate::generator::rust::RustGenerator;
use crate::generator::CodeGenerator;
use crate::settings::{self, FieldChange, FormControl, GeneratorSettings, OptionSpec, SettingsStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum BackendKind {
    Cpp,
    #[value(name = "csharp")]
    CSharp,
    Lua,
    Rust,
}

/// Expand `$body` once per backend with `$g` bound to its generator type.
macro_rules! dispatch {
    ($kind:expr, $g:ident => $body:expr) => {
        match $kind {
            BackendKind::Cpp => { type $g = CppGenerator; $body }
            BackendKind::CSharp => { type $g = CSharpGenerator; $body }
            BackendKind::Lua => { type $g = LuaGenerator; $body }
            BackendKind::Rust => { type $g = RustGenerator; $body }
        }
    };
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [BackendKind::Cpp, BackendKind::CSharp, BackendKind::Lua, BackendKind::Rust];

    /// Command-line identifier (`cpp`, `csharp`, ...).
    pub fn id(self) -> &'static str {
        match self {
            BackendKind::Cpp => "cpp",
            BackendKind::CSharp => "csharp",
            BackendKind::Lua => "lua",
            BackendKind::Rust => "rust",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id().eq_ignore_ascii_case(id))
    }

    /// Display name of the generator.
    pub fn name(self) -> &'static str {
        dispatch!(self, G => G::NAME)
    }

    pub fn storage_key(self) -> &'static str {
        dispatch!(self, G => <<G as CodeGenerator>::Settings as GeneratorSettings>::STORAGE_KEY)
    }

    pub fn options(self) -> &'static [OptionSpec] {
        dispatch!(self, G => <<G as CodeGenerator>::Settings as GeneratorSettings>::options())
    }

    /// Settings form for the settings currently held by `store`.
    pub fn render_form(self, store: &SettingsStore) -> Vec<FormControl> {
        dispatch!(self, G => settings::render_form(&store.get::<<G as CodeGenerator>::Settings>()))
    }

    /// Turn a `field=value` pair typed on a command line into a form change.
    pub fn change_from_text(self, field: &str, raw: &str) -> Result<FieldChange, SettingsError> {
        dispatch!(self, G => settings::change_from_text::<<G as CodeGenerator>::Settings>(field, raw))
    }

    /// Apply `changes` to the stored settings, write them back into `store`
    /// and run one export with the result.
    pub fn export(
        self,
        catalog: &Catalog,
        store: &mut SettingsStore,
        changes: &[FieldChange],
    ) -> Result<ExportOutput, ExportError> {
        dispatch!(self, G => export_with::<G>(catalog, store, changes))
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

fn export_with<G: CodeGenerator>(
    catalog: &Catalog,
    store: &mut SettingsStore,
    changes: &[FieldChange],
) -> Result<ExportOutput, ExportError> {
    let mut edited: G::Settings = store.get();
    for change in changes {
        settings::apply_change(&mut edited, change)?;
    }
    store.put(&edited);
    Exporter::<G>::new(edited)?.export(catalog)
}
