//! Lua backend for script runtimes that expose a native invoker.
//!
//! Namespaces become global tables and have no closing syntax:
//!
//! ```text
//! NATIVE = NATIVE or {}
//!
//! function NATIVE.GET_LABEL_TEXT(labelName)
//!   return Citizen.InvokeNative(0xD49F9B0955C367DE, labelName)
//! end
//! ```
//!
//! Types only appear in LuaLS annotations, so pointer and const decoration
//! is not rendered; pointers other than strings annotate as `userdata`.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{comment_lines, join_list, CodeBuffer, CodeGenerator};
use crate::error::{ExportError, SettingsError};
use crate::naming::{escape_reserved, NamingConvention};
use crate::settings::{Choice, GeneratorSettings, OptionSpec, OptionValue};
use crate::types::{CodeGenNative, CodeGenType, CodeGeneratorFile};

const RESERVED: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if",
    "in", "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

// ————————————————————————————————————————————————————————————————————————————
// SETTINGS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LuaSettings {
    pub naming: NamingConvention,
    pub invoke_function: String,
    pub generate_comments: bool,
    pub emit_old_name_aliases: bool,
    pub emit_manifest: bool,
}

impl Default for LuaSettings {
    fn default() -> Self {
        Self {
            naming: NamingConvention::Original,
            invoke_function: "Citizen.InvokeNative".to_string(),
            generate_comments: true,
            emit_old_name_aliases: false,
            emit_manifest: true,
        }
    }
}

const NAMING: &[Choice] = &[
    Choice { label: "Original (GET_LABEL_TEXT)", value: "original" },
    Choice { label: "PascalCase (GetLabelText)", value: "pascal_case" },
    Choice { label: "camelCase (getLabelText)", value: "camel_case" },
];

const OPTIONS: &[OptionSpec] = &[
    OptionSpec::choice("naming", "Naming convention", NAMING),
    OptionSpec::string("invoke_function", "Invoke function"),
    OptionSpec::boolean("generate_comments", "Generate LuaLS annotations"),
    OptionSpec::boolean("emit_old_name_aliases", "Alias old names"),
    OptionSpec::boolean("emit_manifest", "Emit natives_manifest.json"),
];

impl GeneratorSettings for LuaSettings {
    const STORAGE_KEY: &'static str = "Pages.GenerateCode.Lua";

    fn options() -> &'static [OptionSpec] { OPTIONS }

    fn set_field(&mut self, field: &str, value: OptionValue) -> Result<bool, SettingsError> {
        match field {
            "naming" => self.naming = value.into_choice(field)?,
            "invoke_function" => self.invoke_function = value.into_text(field)?.trim().to_string(),
            "generate_comments" => self.generate_comments = value.into_bool(field)?,
            "emit_old_name_aliases" => self.emit_old_name_aliases = value.into_bool(field)?,
            "emit_manifest" => self.emit_manifest = value.into_bool(field)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// GENERATOR
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone)]
pub struct LuaGenerator {
    settings: LuaSettings,
    buffer: CodeBuffer,
    /// namespace → native name → hash
    manifest: IndexMap<String, IndexMap<String, String>>,
    /// Table path of each open namespace.
    tables: Vec<String>,
}

impl LuaGenerator {
    fn identifier(&self, name: &str) -> String {
        let name = self.settings.naming.apply(name);
        escape_reserved(&name, RESERVED, |n| format!("{n}_"))
    }

    fn param_name(name: &str) -> String {
        escape_reserved(name, RESERVED, |n| format!("{n}_"))
    }

    fn annotations(&mut self, native: &CodeGenNative) {
        for line in comment_lines(&native.comment) {
            self.buffer.line(format!("---{}", line.trim()).trim_end());
        }
        for param in &native.params {
            let ty = self.render_type(&param.ty);
            self.buffer.line(format!("---@param {} {ty}", Self::param_name(&param.name)));
        }
        if !native.return_type.is_void() {
            let ty = self.render_type(&native.return_type);
            self.buffer.line(format!("---@return {ty}"));
        }
    }
}

impl CodeGenerator for LuaGenerator {
    type Settings = LuaSettings;
    const NAME: &'static str = "Lua";

    fn new(settings: LuaSettings) -> Self {
        Self { settings, buffer: CodeBuffer::new("  "), manifest: IndexMap::new(), tables: Vec::new() }
    }

    fn settings(&self) -> &LuaSettings { &self.settings }
    fn buffer(&self) -> &CodeBuffer { &self.buffer }
    fn buffer_mut(&mut self) -> &mut CodeBuffer { &mut self.buffer }

    /// LuaLS annotation type.
    fn render_type(&self, ty: &CodeGenType) -> String {
        let text = match (ty.base_type(), ty.pointers()) {
            ("char", 1) => "string",
            (_, p) if p > 0 => "userdata",
            ("void", _) => "nil",
            ("BOOL" | "bool", _) => "boolean",
            ("float" | "double", _) => "number",
            ("Vector3", _) => "vector3",
            // handles and hashes are plain integers at runtime
            _ => "integer",
        };
        text.to_string()
    }

    fn on_start(&mut self) -> Result<(), ExportError> {
        self.manifest.clear();
        self.tables.clear();
        Ok(())
    }

    fn on_push_namespace(&mut self, name: &str) -> Result<(), ExportError> {
        let table = match self.tables.last() {
            Some(parent) => format!("{parent}.{}", self.identifier(name)),
            None => self.identifier(name),
        };
        if !self.buffer.is_empty() {
            self.buffer.blank_line();
        }
        self.buffer.line(format!("{table} = {table} or {{}}"));
        self.tables.push(table);
        Ok(())
    }

    fn on_pop_namespace(&mut self, _name: &str) -> Result<(), ExportError> {
        self.tables.pop();
        Ok(())
    }

    fn on_add_native(&mut self, native: &CodeGenNative) -> Result<(), ExportError> {
        let table = self.tables.last().cloned().unwrap_or_default();
        let function = format!("{table}.{}", self.identifier(&native.name));
        let params: Vec<String> = native.params.iter().map(|p| Self::param_name(&p.name)).collect();
        let args = join_list(std::iter::once(native.hash.clone()).chain(params.iter().cloned()));
        let call = format!("{}({args})", self.settings.invoke_function);

        self.buffer.blank_line();
        if self.settings.generate_comments {
            self.annotations(native);
        }
        self.buffer.line(format!("function {function}({})", join_list(&params)));
        self.buffer.indent();
        if native.return_type.is_void() {
            self.buffer.line(call);
        } else {
            self.buffer.line(format!("return {call}"));
        }
        self.buffer.dedent();
        self.buffer.line("end");

        if self.settings.emit_old_name_aliases {
            for old in native.old_names.iter().flatten() {
                let alias = self.identifier(old);
                self.buffer.line(format!("{table}.{alias} = {function}"));
            }
        }

        let namespace = self.buffer.namespaces().join(".");
        self.manifest
            .entry(namespace)
            .or_default()
            .insert(native.name.clone(), native.hash.clone());
        Ok(())
    }

    fn on_end(&mut self) -> Result<(), ExportError> {
        if self.settings.emit_manifest {
            let mut content = serde_json::to_string_pretty(&self.manifest).unwrap_or_default();
            content.push('\n');
            self.submit_extra_file(CodeGeneratorFile::new(
                "natives_manifest",
                "json",
                content,
                "application/json",
            ))?;
        }
        Ok(())
    }
}
