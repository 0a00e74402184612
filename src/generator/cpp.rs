//! C/C++ backend.
//!
//! Default output, one block per namespace:
//!
//! ```text
//! namespace NATIVE
//! {
//!   const char* GET_LABEL_TEXT(const char* labelName);
//! }
//! ```
//!
//! Top-level namespaces after the first are separated by one blank line.
use std::str::FromStr;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{comment_lines, join_list, CodeBuffer, CodeGenerator};
use crate::error::{ExportError, SettingsError};
use crate::naming::escape_reserved;
use crate::settings::{Choice, GeneratorSettings, OptionSpec, OptionValue};
use crate::types::{CodeGenNative, CodeGenParam, CodeGenType, CodeGeneratorFile};

const RESERVED: &[&str] = &[
    "alignas", "alignof", "and", "asm", "auto", "bool", "break", "case", "catch", "char",
    "class", "const", "constexpr", "continue", "default", "delete", "do", "double", "else",
    "enum", "explicit", "export", "extern", "false", "float", "for", "friend", "goto", "if",
    "inline", "int", "long", "mutable", "namespace", "new", "not", "operator", "or", "private",
    "protected", "public", "register", "return", "short", "signed", "sizeof", "static",
    "struct", "switch", "template", "this", "throw", "true", "try", "typedef", "typename",
    "union", "unsigned", "using", "virtual", "void", "volatile", "while", "xor",
];

// ————————————————————————————————————————————————————————————————————————————
// SETTINGS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionStyle {
    /// `R NAME(args);`
    #[default]
    Declaration,
    /// `static R NAME(args) { return invoke<R>(HASH, args); }`
    Invoker,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndentStyle {
    #[default]
    TwoSpaces,
    FourSpaces,
    Tab,
}

impl IndentStyle {
    pub fn unit(self) -> &'static str {
        match self {
            IndentStyle::TwoSpaces => "  ",
            IndentStyle::FourSpaces => "    ",
            IndentStyle::Tab => "\t",
        }
    }
}

impl FromStr for FunctionStyle {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "declaration" => Ok(FunctionStyle::Declaration),
            "invoker" => Ok(FunctionStyle::Invoker),
            other => Err(format!("unknown function style `{other}`")),
        }
    }
}

impl FromStr for IndentStyle {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "two_spaces" => Ok(IndentStyle::TwoSpaces),
            "four_spaces" => Ok(IndentStyle::FourSpaces),
            "tab" => Ok(IndentStyle::Tab),
            other => Err(format!("unknown indent style `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CppSettings {
    pub generate_comments: bool,
    pub function_style: FunctionStyle,
    pub indent: IndentStyle,
    pub emit_header: bool,
}

const FUNCTION_STYLES: &[Choice] = &[
    Choice { label: "Declarations", value: "declaration" },
    Choice { label: "Invoker wrappers", value: "invoker" },
];

const INDENT_STYLES: &[Choice] = &[
    Choice { label: "Two spaces", value: "two_spaces" },
    Choice { label: "Four spaces", value: "four_spaces" },
    Choice { label: "Tab", value: "tab" },
];

const OPTIONS: &[OptionSpec] = &[
    OptionSpec::boolean("generate_comments", "Generate comments"),
    OptionSpec::choice("function_style", "Function style", FUNCTION_STYLES),
    OptionSpec::choice("indent", "Indentation", INDENT_STYLES),
    OptionSpec::boolean("emit_header", "Emit natives.hpp header"),
];

impl GeneratorSettings for CppSettings {
    const STORAGE_KEY: &'static str = "Pages.GenerateCode.Cpp";

    fn options() -> &'static [OptionSpec] { OPTIONS }

    fn set_field(&mut self, field: &str, value: OptionValue) -> Result<bool, SettingsError> {
        match field {
            "generate_comments" => self.generate_comments = value.into_bool(field)?,
            "function_style" => self.function_style = value.into_choice(field)?,
            "indent" => self.indent = value.into_choice(field)?,
            "emit_header" => self.emit_header = value.into_bool(field)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// GENERATOR
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone)]
pub struct CppGenerator {
    settings: CppSettings,
    buffer: CodeBuffer,
    /// Declarations per qualified namespace, for `natives.hpp`. Invoker
    /// mode declares them `static`, like the wrappers.
    header: IndexMap<String, Vec<String>>,
}

impl CppGenerator {
    fn param(&self, param: &CodeGenParam) -> String {
        let name = escape_reserved(&param.name, RESERVED, |n| format!("{n}_"));
        format!("{} {}", self.render_type(&param.ty), name)
    }

    fn declaration(&self, native: &CodeGenNative) -> String {
        let params = join_list(native.params.iter().map(|p| self.param(p)));
        format!("{} {}({});", self.render_type(&native.return_type), native.name, params)
    }

    fn invoker(&self, native: &CodeGenNative) -> String {
        let ret = self.render_type(&native.return_type);
        let params = join_list(native.params.iter().map(|p| self.param(p)));
        let args = std::iter::once(native.hash.clone())
            .chain(native.params.iter().map(|p| escape_reserved(&p.name, RESERVED, |n| format!("{n}_"))));
        let args = join_list(args);
        if native.return_type.is_void() {
            format!("static void {}({params}) {{ invoke<Void>({args}); }}", native.name)
        } else {
            format!("static {ret} {}({params}) {{ return invoke<{ret}>({args}); }}", native.name)
        }
    }

    fn qualified_namespace(&self) -> String {
        self.buffer.namespaces().join("::")
    }

    fn render_header(&self) -> String {
        let mut out = CodeBuffer::new(self.settings.indent.unit());
        out.line("#pragma once");
        for (namespace, declarations) in &self.header {
            out.blank_line();
            out.line(format!("namespace {namespace}"));
            out.line("{");
            out.indent();
            for declaration in declarations {
                out.line(declaration);
            }
            out.dedent();
            out.line("}");
        }
        out.into_text()
    }
}

impl CodeGenerator for CppGenerator {
    type Settings = CppSettings;
    const NAME: &'static str = "Cpp";

    fn new(settings: CppSettings) -> Self {
        let buffer = CodeBuffer::new(settings.indent.unit());
        Self { settings, buffer, header: IndexMap::new() }
    }

    fn settings(&self) -> &CppSettings { &self.settings }
    fn buffer(&self) -> &CodeBuffer { &self.buffer }
    fn buffer_mut(&mut self) -> &mut CodeBuffer { &mut self.buffer }

    /// `const` first, then the base name, then one `*` per level.
    fn render_type(&self, ty: &CodeGenType) -> String {
        let mut out = String::new();
        if ty.is_const() {
            out.push_str("const ");
        }
        out.push_str(ty.base_type());
        out.push_str(&"*".repeat(ty.pointers() as usize));
        out
    }

    fn on_start(&mut self) -> Result<(), ExportError> {
        self.header.clear();
        Ok(())
    }

    fn on_push_namespace(&mut self, name: &str) -> Result<(), ExportError> {
        if self.buffer.depth() == 0 && !self.buffer.is_empty() {
            self.buffer.blank_line();
        }
        self.buffer.line(format!("namespace {name}"));
        self.buffer.line("{");
        self.buffer.indent();

        let mut qualified = self.qualified_namespace();
        if !qualified.is_empty() {
            qualified.push_str("::");
        }
        qualified.push_str(name);
        self.header.entry(qualified).or_default();
        Ok(())
    }

    fn on_pop_namespace(&mut self, _name: &str) -> Result<(), ExportError> {
        self.buffer.dedent();
        self.buffer.line("}");
        Ok(())
    }

    fn on_add_native(&mut self, native: &CodeGenNative) -> Result<(), ExportError> {
        if self.settings.generate_comments {
            for line in comment_lines(&native.comment) {
                self.buffer.line(format!("// {line}").trim_end());
            }
            if let Some(old_names) = &native.old_names {
                self.buffer.line(format!("// Old names: {}", join_list(old_names)));
            }
        }
        let declaration = self.declaration(native);
        let (text, header_line) = match self.settings.function_style {
            FunctionStyle::Declaration => (declaration.clone(), declaration),
            // header declarations must match the wrappers' internal linkage
            FunctionStyle::Invoker => (self.invoker(native), format!("static {declaration}")),
        };
        self.buffer.line(text);

        let qualified = self.qualified_namespace();
        self.header.entry(qualified).or_default().push(header_line);
        Ok(())
    }

    fn on_end(&mut self) -> Result<(), ExportError> {
        if self.settings.emit_header {
            let content = self.render_header();
            self.submit_extra_file(CodeGeneratorFile::new("natives", "hpp", content, "text/x-c++hdr"))?;
        }
        Ok(())
    }
}
