//! Render native function catalogs into source text for several target
//! languages.
//!
//! A [`registry::BackendKind`] picks the generator; an [`exporter::Exporter`]
//! drives it through one complete run over a [`catalog::Catalog`].
pub mod catalog;
pub mod cli;
pub mod error;
pub mod exporter;
pub mod generator;
pub mod naming;
pub mod registry;
pub mod settings;
pub mod types;

pub use catalog::Catalog;
pub use error::{CatalogError, ExportError, SettingsError};
pub use exporter::{ExportOutput, Exporter};
pub use generator::CodeGenerator;
pub use registry::BackendKind;
