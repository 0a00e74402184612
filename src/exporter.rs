//! Export driver: one fresh generator, one complete lifecycle per run.
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::error::ExportError;
use crate::generator::CodeGenerator;
use crate::settings::validate_options;
use crate::types::CodeGeneratorFile;

/// Main text plus the extra files submitted during the same run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOutput {
    pub text: String,
    pub extra_files: Vec<CodeGeneratorFile>,
}

#[derive(Debug)]
pub struct Exporter<G: CodeGenerator> {
    settings: G::Settings,
    last_run: Option<G>,
}

impl<G: CodeGenerator> Exporter<G> {
    /// Fails when the backend declares an option its settings cannot take.
    pub fn new(settings: G::Settings) -> Result<Self, ExportError> {
        validate_options::<G::Settings>()?;
        Ok(Self { settings, last_run: None })
    }

    pub fn settings(&self) -> &G::Settings { &self.settings }

    /// Render every namespace of `catalog`, in catalog order.
    ///
    /// Any failure aborts the run; the previous run's generator is dropped
    /// either way, so no partial text or extra files are observable.
    pub fn export_natives(&mut self, catalog: &Catalog) -> Result<String, ExportError> {
        self.last_run = None;
        let mut generator = G::new(self.settings.clone());
        generator.start()?;
        for (name, namespace) in &catalog.namespaces {
            generator.push_namespace(name)?;
            for hash in &namespace.natives {
                let raw = catalog.natives.get(hash).ok_or_else(|| ExportError::MissingNative {
                    namespace: name.clone(),
                    hash: hash.clone(),
                })?;
                let native = generator.native_to_codegen(raw)?;
                generator.add_native(&native)?;
            }
            generator.pop_namespace()?;
            debug!(generator = G::NAME, namespace = %name, natives = namespace.natives.len(), "namespace exported");
        }
        let text = generator.end()?.get()?.to_string();
        info!(
            generator = G::NAME,
            namespaces = catalog.namespaces.len(),
            natives = catalog.native_count(),
            extra_files = generator.extra_files().len(),
            bytes = text.len(),
            "export finished"
        );
        self.last_run = Some(generator);
        Ok(text)
    }

    /// Extra files of the last successful run.
    pub fn extra_files(&self) -> &[CodeGeneratorFile] {
        self.last_run.as_ref().map(|g| g.extra_files()).unwrap_or(&[])
    }

    pub fn clear_extra_files(&mut self) {
        if let Some(generator) = self.last_run.as_mut() {
            generator.clear_extra_files();
        }
    }

    pub fn export(&mut self, catalog: &Catalog) -> Result<ExportOutput, ExportError> {
        let text = self.export_natives(catalog)?;
        Ok(ExportOutput { text, extra_files: self.extra_files().to_vec() })
    }
}
