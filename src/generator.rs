//! Generator contract shared by every target-language backend.
//!
//! A run is an ordered protocol:
//!
//! ```text
//! start → (push_namespace | add_native | pop_namespace)* → end → get
//! ```
//!
//! The provided methods of [`CodeGenerator`] enforce that order on the
//! backend's [`CodeBuffer`] and call the backend's emission hooks. A backend
//! only writes text; it never tracks the lifecycle itself.
//!
//! Decisions:
//! - `start` on a started generator resets the buffer and namespace stack.
//! - `add_native` outside any namespace is a contract violation.
//! - `end` requires every pushed namespace to be popped.
//! - `get` before `end` is a contract violation.
//! - The extra-file list is independent of the lifecycle and survives `start`.
pub mod cpp;
pub mod csharp;
pub mod lua;
pub mod rust;

use tracing::debug;

use crate::catalog::Native;
use crate::error::{ExportError, Phase};
use crate::settings::GeneratorSettings;
use crate::types::{CodeGenNative, CodeGenType, CodeGeneratorFile};

// ————————————————————————————————————————————————————————————————————————————
// EMISSION BUFFER
// ————————————————————————————————————————————————————————————————————————————

/// Text accumulator owned by one generator for one run.
#[derive(Debug, Clone)]
pub struct CodeBuffer {
    text: String,
    phase: Phase,
    namespaces: Vec<String>,
    depth: usize,
    indent_unit: String,
    extra_files: Vec<CodeGeneratorFile>,
}

impl CodeBuffer {
    pub fn new(indent_unit: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            phase: Phase::Fresh,
            namespaces: Vec::new(),
            depth: 0,
            indent_unit: indent_unit.into(),
            extra_files: Vec::new(),
        }
    }

    /// Write one line at the current indentation. Empty lines carry no
    /// trailing whitespace.
    pub fn line(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref();
        if !line.is_empty() {
            for _ in 0..self.depth {
                self.text.push_str(&self.indent_unit);
            }
            self.text.push_str(line);
        }
        self.text.push('\n');
    }

    pub fn blank_line(&mut self) {
        self.text.push('\n');
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn depth(&self) -> usize { self.depth }
    pub fn is_empty(&self) -> bool { self.text.is_empty() }
    pub fn phase(&self) -> Phase { self.phase }

    /// Open namespaces, outermost first.
    pub fn namespaces(&self) -> &[String] { &self.namespaces }

    /// Raw text, for buffers used outside a generator lifecycle.
    pub fn into_text(self) -> String { self.text }

    fn reset(&mut self) {
        self.text.clear();
        self.namespaces.clear();
        self.depth = 0;
        self.phase = Phase::Started;
    }

    fn expect_phase(&self, expected: Phase, operation: &'static str) -> Result<(), ExportError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(ExportError::OutOfOrder { operation, phase: self.phase })
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CONTRACT
// ————————————————————————————————————————————————————————————————————————————

pub trait CodeGenerator: Sized {
    type Settings: GeneratorSettings;

    /// Display name, also the suffix of the settings storage key.
    const NAME: &'static str;

    fn new(settings: Self::Settings) -> Self;
    fn settings(&self) -> &Self::Settings;
    fn buffer(&self) -> &CodeBuffer;
    fn buffer_mut(&mut self) -> &mut CodeBuffer;

    /// Catalog record → normalized native. Backends override this to pick
    /// their own hash spelling or base-type names.
    fn native_to_codegen(&self, native: &Native) -> Result<CodeGenNative, ExportError> {
        CodeGenNative::from_native(native)
    }

    /// Type expression in the target language.
    fn render_type(&self, ty: &CodeGenType) -> String;

    // -- emission hooks ----------------------------------------------------- //

    fn on_start(&mut self) -> Result<(), ExportError> { Ok(()) }
    /// Called before `name` is pushed; `buffer().namespaces()` are its parents.
    fn on_push_namespace(&mut self, name: &str) -> Result<(), ExportError>;
    /// Called after `name` is popped.
    fn on_pop_namespace(&mut self, name: &str) -> Result<(), ExportError>;
    fn on_add_native(&mut self, native: &CodeGenNative) -> Result<(), ExportError>;
    fn on_end(&mut self) -> Result<(), ExportError> { Ok(()) }

    // -- lifecycle ---------------------------------------------------------- //

    fn start(&mut self) -> Result<&mut Self, ExportError> {
        self.buffer_mut().reset();
        self.on_start()?;
        Ok(self)
    }

    fn push_namespace(&mut self, name: &str) -> Result<&mut Self, ExportError> {
        self.buffer().expect_phase(Phase::Started, "push_namespace")?;
        self.on_push_namespace(name)?;
        self.buffer_mut().namespaces.push(name.to_string());
        Ok(self)
    }

    fn pop_namespace(&mut self) -> Result<&mut Self, ExportError> {
        self.buffer().expect_phase(Phase::Started, "pop_namespace")?;
        let name = self.buffer_mut().namespaces.pop().ok_or(ExportError::NoOpenNamespace)?;
        self.on_pop_namespace(&name)?;
        Ok(self)
    }

    fn add_native(&mut self, native: &CodeGenNative) -> Result<&mut Self, ExportError> {
        self.buffer().expect_phase(Phase::Started, "add_native")?;
        if self.buffer().namespaces.is_empty() {
            return Err(ExportError::NativeOutsideNamespace { native: native.name.clone() });
        }
        self.on_add_native(native)?;
        Ok(self)
    }

    fn end(&mut self) -> Result<&mut Self, ExportError> {
        self.buffer().expect_phase(Phase::Started, "end")?;
        if !self.buffer().namespaces.is_empty() {
            return Err(ExportError::UnclosedNamespaces { open: self.buffer().namespaces.clone() });
        }
        self.on_end()?;
        self.buffer_mut().phase = Phase::Ended;
        Ok(self)
    }

    fn get(&self) -> Result<&str, ExportError> {
        self.buffer().expect_phase(Phase::Ended, "get")?;
        Ok(&self.buffer().text)
    }

    // -- extra files -------------------------------------------------------- //

    fn submit_extra_file(&mut self, file: CodeGeneratorFile) -> Result<&mut Self, ExportError> {
        let file_name = file.file_name();
        if self.buffer().extra_files.iter().any(|f| f.file_name() == file_name) {
            return Err(ExportError::DuplicateExtraFile { file: file_name });
        }
        debug!(generator = Self::NAME, file = %file_name, bytes = file.content.len(), "extra file submitted");
        self.buffer_mut().extra_files.push(file);
        Ok(self)
    }

    fn extra_files(&self) -> &[CodeGeneratorFile] {
        &self.buffer().extra_files
    }

    fn clear_extra_files(&mut self) -> &mut Self {
        self.buffer_mut().extra_files.clear();
        self
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SHARED HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Comment text split into lines, trailing whitespace and blank edges removed.
pub(crate) fn comment_lines(comment: &str) -> Vec<&str> {
    let lines: Vec<&str> = comment.lines().map(str::trim_end).collect();
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(s), Some(e)) => lines[s..=e].to_vec(),
        _ => Vec::new(),
    }
}

/// `"a, b, c"` over the rendered items.
pub(crate) fn join_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(item.as_ref());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::cpp::{CppGenerator, CppSettings};
    use crate::types::CodeGenParam;

    fn generator() -> CppGenerator {
        CppGenerator::new(CppSettings::default())
    }

    fn native(name: &str) -> CodeGenNative {
        CodeGenNative {
            hash: "0x1".into(),
            jhash: None,
            name: name.into(),
            params: vec![CodeGenParam { ty: CodeGenType::new("int", 0, false), name: "a".into() }],
            return_type: CodeGenType::new("void", 0, false),
            comment: String::new(),
            build: None,
            old_names: None,
        }
    }

    #[test]
    fn calls_before_start_fail_fast() {
        let mut g = generator();
        let err = g.push_namespace("A").unwrap_err();
        assert!(matches!(err, ExportError::OutOfOrder { operation: "push_namespace", phase: Phase::Fresh }));
        assert!(matches!(g.add_native(&native("X")), Err(ExportError::OutOfOrder { .. })));
        assert!(matches!(g.end(), Err(ExportError::OutOfOrder { .. })));
    }

    #[test]
    fn get_before_end_fails() {
        let mut g = generator();
        g.start().unwrap();
        let err = g.get().unwrap_err();
        assert!(matches!(err, ExportError::OutOfOrder { operation: "get", phase: Phase::Started }));
    }

    #[test]
    fn pop_without_open_namespace_fails() {
        let mut g = generator();
        g.start().unwrap();
        assert!(matches!(g.pop_namespace(), Err(ExportError::NoOpenNamespace)));
    }

    #[test]
    fn natives_outside_a_namespace_fail() {
        let mut g = generator();
        g.start().unwrap();
        let err = g.add_native(&native("X")).unwrap_err();
        assert!(matches!(err, ExportError::NativeOutsideNamespace { ref native } if native == "X"));
    }

    #[test]
    fn end_requires_balanced_namespaces() {
        let mut g = generator();
        g.start().unwrap().push_namespace("A").unwrap().push_namespace("B").unwrap();
        let err = g.end().unwrap_err();
        assert!(matches!(err, ExportError::UnclosedNamespaces { ref open } if open == &["A", "B"]));
    }

    #[test]
    fn lifecycle_chains_and_restart_resets() {
        let mut g = generator();
        g.start().unwrap()
            .push_namespace("A").unwrap()
            .add_native(&native("X")).unwrap();
        // restart mid-run discards the partial text and stack
        g.start().unwrap()
            .push_namespace("B").unwrap()
            .pop_namespace().unwrap()
            .end().unwrap();
        let text = g.get().unwrap();
        assert!(text.contains("namespace B"));
        assert!(!text.contains("namespace A"));
        assert!(matches!(g.push_namespace("C"), Err(ExportError::OutOfOrder { phase: Phase::Ended, .. })));
    }

    #[test]
    fn extra_files_accumulate_in_order_and_clear() {
        let mut g = generator();
        for name in ["a", "b", "c"] {
            g.submit_extra_file(CodeGeneratorFile::new(name, "txt", name, "text/plain")).unwrap();
        }
        let names: Vec<_> = g.extra_files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);

        let dup = g.submit_extra_file(CodeGeneratorFile::new("a", "txt", "", "text/plain"));
        assert!(matches!(dup, Err(ExportError::DuplicateExtraFile { ref file }) if file == "a.txt"));
        // same name, different extension is a different file
        g.submit_extra_file(CodeGeneratorFile::new("a", "md", "", "text/markdown")).unwrap();
        assert_eq!(g.extra_files().len(), 4);

        assert!(g.clear_extra_files().extra_files().is_empty());
    }

    #[test]
    fn buffer_indents_non_empty_lines_only() {
        let mut b = CodeBuffer::new("  ");
        b.line("a");
        b.indent();
        b.line("b");
        b.line("");
        b.dedent();
        b.dedent();
        b.line("c");
        assert_eq!(b.text, "a\n  b\n\nc\n");
    }

    #[test]
    fn comment_lines_trim_blank_edges() {
        assert_eq!(comment_lines("\n  first  \nsecond\n\n"), ["  first", "second"]);
        assert!(comment_lines("   ").is_empty());
    }
}
