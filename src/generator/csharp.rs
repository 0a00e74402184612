//! C# backend: one static class per namespace inside a root namespace.
//!
//! ```text
//! namespace Natives
//! {
//!   public static class Native
//!   {
//!     public static string GetLabelText(string labelName) => Function.Call<string>((Hash)0xD49F9B0955C367DE, labelName);
//!   }
//! }
//! ```
//!
//! C# has no const-qualified types, so the qualifier is dropped. `char*` is
//! marshalled as `string`; every other pointer renders as `T*` and makes the
//! method `unsafe`.
use serde::{Deserialize, Serialize};

use super::{comment_lines, join_list, CodeBuffer, CodeGenerator};
use crate::catalog::Native;
use crate::error::{ExportError, SettingsError};
use crate::naming::{escape_reserved, NamingConvention};
use crate::settings::{Choice, GeneratorSettings, OptionSpec, OptionValue};
use crate::types::{CodeGenNative, CodeGenType, CodeGeneratorFile};

const RESERVED: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

/// Script handle types passed around as plain integers.
const HANDLE_TYPES: &[&str] = &[
    "Any", "Blip", "Cam", "Entity", "FireId", "Interior", "Object", "Ped", "Pickup",
    "Player", "ScrHandle", "Train", "Vehicle",
];

// ————————————————————————————————————————————————————————————————————————————
// SETTINGS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CSharpSettings {
    pub naming: NamingConvention,
    pub root_namespace: String,
    pub generate_comments: bool,
    pub emit_hash_enum: bool,
}

impl Default for CSharpSettings {
    fn default() -> Self {
        Self {
            naming: NamingConvention::PascalCase,
            root_namespace: "Natives".to_string(),
            generate_comments: true,
            emit_hash_enum: false,
        }
    }
}

const NAMING: &[Choice] = &[
    Choice { label: "Original (GET_LABEL_TEXT)", value: "original" },
    Choice { label: "PascalCase (GetLabelText)", value: "pascal_case" },
];

const OPTIONS: &[OptionSpec] = &[
    OptionSpec::choice("naming", "Naming convention", NAMING),
    OptionSpec::string("root_namespace", "Root namespace"),
    OptionSpec::boolean("generate_comments", "Generate XML doc comments"),
    OptionSpec::boolean("emit_hash_enum", "Emit Hash.cs enum"),
];

impl GeneratorSettings for CSharpSettings {
    const STORAGE_KEY: &'static str = "Pages.GenerateCode.CSharp";

    fn options() -> &'static [OptionSpec] { OPTIONS }

    fn set_field(&mut self, field: &str, value: OptionValue) -> Result<bool, SettingsError> {
        match field {
            "naming" => self.naming = value.into_choice(field)?,
            "root_namespace" => self.root_namespace = value.into_text(field)?.trim().to_string(),
            "generate_comments" => self.generate_comments = value.into_bool(field)?,
            "emit_hash_enum" => self.emit_hash_enum = value.into_bool(field)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// GENERATOR
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone)]
pub struct CSharpGenerator {
    settings: CSharpSettings,
    buffer: CodeBuffer,
    /// (name, hash) of every native seen, for `Hash.cs`.
    hashes: Vec<(String, String)>,
    /// A class was just closed at the current depth.
    needs_gap: bool,
}

impl CSharpGenerator {
    fn has_root(&self) -> bool {
        !self.settings.root_namespace.is_empty()
    }

    fn param_name(name: &str) -> String {
        escape_reserved(name, RESERVED, |n| format!("@{n}"))
    }

    fn is_unsafe(&self, native: &CodeGenNative) -> bool {
        native.types().any(|ty| ty.pointers() > 0 && !is_string(ty))
    }

    fn doc_comment(&mut self, native: &CodeGenNative) {
        let lines = comment_lines(&native.comment);
        if !lines.is_empty() {
            self.buffer.line("/// <summary>");
            for line in lines {
                self.buffer.line(format!("/// {}", escape_xml(line.trim())).trim_end());
            }
            self.buffer.line("/// </summary>");
        }
        if let Some(old_names) = &native.old_names {
            self.buffer.line(format!("/// <remarks>Old names: {}</remarks>", join_list(old_names)));
        }
    }

    fn render_hash_enum(&self) -> String {
        let mut out = CodeBuffer::new("  ");
        if self.has_root() {
            out.line(format!("namespace {}", self.settings.root_namespace));
            out.line("{");
            out.indent();
        }
        out.line("public enum Hash : ulong");
        out.line("{");
        out.indent();
        for (name, hash) in &self.hashes {
            out.line(format!("{name} = {hash},"));
        }
        out.dedent();
        out.line("}");
        if self.has_root() {
            out.dedent();
            out.line("}");
        }
        out.into_text()
    }
}

impl CodeGenerator for CSharpGenerator {
    type Settings = CSharpSettings;
    const NAME: &'static str = "CSharp";

    fn new(settings: CSharpSettings) -> Self {
        Self { settings, buffer: CodeBuffer::new("  "), hashes: Vec::new(), needs_gap: false }
    }

    fn settings(&self) -> &CSharpSettings { &self.settings }
    fn buffer(&self) -> &CodeBuffer { &self.buffer }
    fn buffer_mut(&mut self) -> &mut CodeBuffer { &mut self.buffer }

    fn native_to_codegen(&self, native: &Native) -> Result<CodeGenNative, ExportError> {
        let native = CodeGenNative::from_native(native)?;
        Ok(native.map_base_types(|ty| match ty.base_type() {
            "BOOL" => Some("bool"),
            "Hash" => Some("uint"),
            base if HANDLE_TYPES.contains(&base) => Some("int"),
            _ => None,
        }))
    }

    fn render_type(&self, ty: &CodeGenType) -> String {
        if is_string(ty) {
            return "string".to_string();
        }
        format!("{}{}", ty.base_type(), "*".repeat(ty.pointers() as usize))
    }

    fn on_start(&mut self) -> Result<(), ExportError> {
        self.hashes.clear();
        self.needs_gap = false;
        if self.has_root() {
            let root = self.settings.root_namespace.clone();
            self.buffer.line(format!("namespace {root}"));
            self.buffer.line("{");
            self.buffer.indent();
        }
        Ok(())
    }

    fn on_push_namespace(&mut self, name: &str) -> Result<(), ExportError> {
        if self.needs_gap {
            self.buffer.blank_line();
            self.needs_gap = false;
        }
        let class = self.settings.naming.apply(name);
        self.buffer.line(format!("public static class {class}"));
        self.buffer.line("{");
        self.buffer.indent();
        Ok(())
    }

    fn on_pop_namespace(&mut self, _name: &str) -> Result<(), ExportError> {
        self.buffer.dedent();
        self.buffer.line("}");
        self.needs_gap = true;
        Ok(())
    }

    fn on_add_native(&mut self, native: &CodeGenNative) -> Result<(), ExportError> {
        self.needs_gap = false;
        if self.settings.generate_comments {
            self.doc_comment(native);
        }

        let ret = self.render_type(&native.return_type);
        let name = self.settings.naming.apply(&native.name);
        let params = join_list(native.params.iter().map(|p| {
            format!("{} {}", self.render_type(&p.ty), Self::param_name(&p.name))
        }));
        let args = join_list(
            std::iter::once(format!("(Hash){}", native.hash))
                .chain(native.params.iter().map(|p| Self::param_name(&p.name))),
        );
        let modifiers = if self.is_unsafe(native) { "public static unsafe" } else { "public static" };
        let call = if native.return_type.is_void() {
            format!("Function.Call({args})")
        } else {
            format!("Function.Call<{ret}>({args})")
        };
        self.buffer.line(format!("{modifiers} {ret} {name}({params}) => {call};"));

        self.hashes.push((native.name.clone(), native.hash.clone()));
        Ok(())
    }

    fn on_end(&mut self) -> Result<(), ExportError> {
        if self.has_root() {
            self.buffer.dedent();
            self.buffer.line("}");
        }
        if self.settings.emit_hash_enum {
            let content = self.render_hash_enum();
            self.submit_extra_file(CodeGeneratorFile::new("Hash", "cs", content, "text/x-csharp"))?;
        }
        Ok(())
    }
}

fn is_string(ty: &CodeGenType) -> bool {
    ty.base_type() == "char" && ty.pointers() == 1
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::catalog::NativeParam;
    use crate::settings::validate_options;

    fn raw(name: &str, hash: &str, ret: &str, params: &[(&str, &str)]) -> Native {
        Native {
            hash: hash.into(),
            name: name.into(),
            return_type: ret.into(),
            params: params.iter()
                .map(|(ty, name)| NativeParam { ty: ty.to_string(), name: name.to_string() })
                .collect(),
            ..Native::default()
        }
    }

    fn export(settings: CSharpSettings, namespace: &str, natives: &[Native]) -> CSharpGenerator {
        let mut g = CSharpGenerator::new(settings);
        g.start().unwrap().push_namespace(namespace).unwrap();
        for native in natives {
            let cg = g.native_to_codegen(native).unwrap();
            g.add_native(&cg).unwrap();
        }
        g.pop_namespace().unwrap().end().unwrap();
        g
    }

    #[test]
    fn pascal_case_wrappers_inside_root_namespace() {
        let mut label = raw("GET_LABEL_TEXT", "0xd49f9b0955c367de", "const char*", &[("const char*", "labelName")]);
        label.comment = "Gets a localized string <label>.".into();
        label.old_names = Some(vec!["_GET_LABEL_TEXT".into()]);
        let g = export(CSharpSettings::default(), "HUD", &[label]);
        assert_eq!(
            g.get().unwrap(),
            "namespace Natives\n\
             {\n  \
               public static class Hud\n  \
               {\n    \
                 /// <summary>\n    \
                 /// Gets a localized string &lt;label&gt;.\n    \
                 /// </summary>\n    \
                 /// <remarks>Old names: _GET_LABEL_TEXT</remarks>\n    \
                 public static string GetLabelText(string labelName) => Function.Call<string>((Hash)0xD49F9B0955C367DE, labelName);\n  \
               }\n\
             }\n"
        );
    }

    #[test]
    fn handle_types_map_to_int_and_pointers_are_unsafe() {
        let settings = CSharpSettings {
            naming: NamingConvention::Original,
            root_namespace: String::new(),
            generate_comments: false,
            emit_hash_enum: false,
        };
        let natives = [
            raw("GET_ENTITY_SPEED", "0xD5037BA82E12416F", "float", &[("Entity", "entity")]),
            raw("GET_GROUND_Z", "0xC906A7DAB05C8D2B", "BOOL", &[("float*", "out"), ("BOOL", "object")]),
            raw("WAIT", "0x4EDE34FBADD967A6", "void", &[("int", "ms")]),
        ];
        let g = export(settings, "MISC", &natives);
        assert_eq!(
            g.get().unwrap(),
            "public static class MISC\n\
             {\n  \
               public static float GET_ENTITY_SPEED(int entity) => Function.Call<float>((Hash)0xD5037BA82E12416F, entity);\n  \
               public static unsafe bool GET_GROUND_Z(float* @out, bool @object) => Function.Call<bool>((Hash)0xC906A7DAB05C8D2B, @out, @object);\n  \
               public static void WAIT(int ms) => Function.Call((Hash)0x4EDE34FBADD967A6, ms);\n\
             }\n"
        );
    }

    #[test]
    fn hash_enum_lists_every_native_in_order() {
        let settings = CSharpSettings { emit_hash_enum: true, generate_comments: false, ..CSharpSettings::default() };
        let mut g = CSharpGenerator::new(settings);
        g.start().unwrap();
        for (ns, native) in [
            ("PLAYER", raw("PLAYER_ID", "0x4F8644AF03D0E0D6", "Player", &[])),
            ("SYSTEM", raw("WAIT", "0x4EDE34FBADD967A6", "void", &[("int", "ms")])),
        ] {
            let cg = g.native_to_codegen(&native).unwrap();
            g.push_namespace(ns).unwrap().add_native(&cg).unwrap().pop_namespace().unwrap();
        }
        g.end().unwrap();

        assert!(g.get().unwrap().contains("  }\n\n  public static class System\n"));
        let files = g.extra_files();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name(), "Hash.cs");
        assert_eq!(
            files[0].content,
            "namespace Natives\n{\n  public enum Hash : ulong\n  {\n    PLAYER_ID = 0x4F8644AF03D0E0D6,\n    WAIT = 0x4EDE34FBADD967A6,\n  }\n}\n"
        );
    }

    #[test]
    fn const_is_dropped_and_pointers_kept() {
        let g = CSharpGenerator::new(CSharpSettings::default());
        assert_eq!(g.render_type(&CodeGenType::new("int", 2, true)), "int**");
        assert_eq!(g.render_type(&CodeGenType::new("char", 1, true)), "string");
        assert_eq!(g.render_type(&CodeGenType::new("char", 2, false)), "char**");
    }

    #[test]
    fn schema_matches_setters() {
        validate_options::<CSharpSettings>().unwrap();
    }
}
