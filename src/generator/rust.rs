//! Rust backend: one module per namespace, one `unsafe fn` per native.
//!
//! ```text
//! pub mod native {
//!     use super::*;
//!
//!     pub unsafe fn get_label_text(label_name: *const c_char) -> *const c_char {
//!         invoke!(0xD49F9B0955C367DE, label_name)
//!     }
//! }
//! ```
//!
//! Pointers render outermost first; only the innermost one carries the
//! const qualifier (`const char**` → `*mut *const c_char`). Value types have
//! no const form in Rust, so a const value renders bare (`const int` → `i32`).
use serde::{Deserialize, Serialize};

use super::{comment_lines, join_list, CodeBuffer, CodeGenerator};
use crate::catalog::Native;
use crate::error::{ExportError, SettingsError};
use crate::naming::NamingConvention;
use crate::settings::{Choice, GeneratorSettings, OptionSpec, OptionValue};
use crate::types::{CodeGenNative, CodeGenType};

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe",
    "unsized", "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be raw identifiers.
const NOT_RAW: &[&str] = &["self", "Self", "super", "crate", "_"];

// ————————————————————————————————————————————————————————————————————————————
// SETTINGS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RustSettings {
    pub naming: NamingConvention,
    pub invoke_macro: String,
    pub generate_comments: bool,
}

impl Default for RustSettings {
    fn default() -> Self {
        Self {
            naming: NamingConvention::SnakeCase,
            invoke_macro: "invoke".to_string(),
            generate_comments: true,
        }
    }
}

const NAMING: &[Choice] = &[
    Choice { label: "snake_case (get_label_text)", value: "snake_case" },
    Choice { label: "Original (GET_LABEL_TEXT)", value: "original" },
];

const OPTIONS: &[OptionSpec] = &[
    OptionSpec::choice("naming", "Naming convention", NAMING),
    OptionSpec::string("invoke_macro", "Invoke macro"),
    OptionSpec::boolean("generate_comments", "Generate doc comments"),
];

impl GeneratorSettings for RustSettings {
    const STORAGE_KEY: &'static str = "Pages.GenerateCode.Rust";

    fn options() -> &'static [OptionSpec] { OPTIONS }

    fn set_field(&mut self, field: &str, value: OptionValue) -> Result<bool, SettingsError> {
        match field {
            "naming" => self.naming = value.into_choice(field)?,
            "invoke_macro" => {
                let name = value.into_text(field)?;
                self.invoke_macro = name.trim().trim_end_matches('!').to_string();
            }
            "generate_comments" => self.generate_comments = value.into_bool(field)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// GENERATOR
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone)]
pub struct RustGenerator {
    settings: RustSettings,
    buffer: CodeBuffer,
}

impl RustGenerator {
    fn identifier(&self, name: &str) -> String {
        escape_keyword(&self.settings.naming.apply(name))
    }

    fn allow_non_snake_case(&mut self, name: &str) {
        if name.chars().any(|c| c.is_ascii_uppercase()) {
            self.buffer.line("#[allow(non_snake_case)]");
        }
    }
}

impl CodeGenerator for RustGenerator {
    type Settings = RustSettings;
    const NAME: &'static str = "Rust";

    fn new(settings: RustSettings) -> Self {
        Self { settings, buffer: CodeBuffer::new("    ") }
    }

    fn settings(&self) -> &RustSettings { &self.settings }
    fn buffer(&self) -> &CodeBuffer { &self.buffer }
    fn buffer_mut(&mut self) -> &mut CodeBuffer { &mut self.buffer }

    fn native_to_codegen(&self, native: &Native) -> Result<CodeGenNative, ExportError> {
        let native = CodeGenNative::from_native(native)?;
        Ok(native.map_base_types(|ty| match ty.base_type() {
            "int" => Some("i32"),
            "unsigned int" => Some("u32"),
            "float" => Some("f32"),
            "double" => Some("f64"),
            "char" => Some("c_char"),
            _ => None,
        }))
    }

    fn render_type(&self, ty: &CodeGenType) -> String {
        let base = match (ty.base_type(), ty.pointers()) {
            ("void", 0) => "()",
            ("void", _) => "c_void",
            (base, _) => base,
        };
        let mut out = String::new();
        for level in (0..ty.pointers()).rev() {
            // level 0 is the innermost pointer
            if level == 0 && ty.is_const() {
                out.push_str("*const ");
            } else {
                out.push_str("*mut ");
            }
        }
        out.push_str(base);
        out
    }

    fn on_push_namespace(&mut self, name: &str) -> Result<(), ExportError> {
        let module = self.identifier(name);
        if !self.buffer.is_empty() {
            self.buffer.blank_line();
        }
        self.allow_non_snake_case(&module);
        self.buffer.line(format!("pub mod {module} {{"));
        self.buffer.indent();
        self.buffer.line("use super::*;");
        Ok(())
    }

    fn on_pop_namespace(&mut self, _name: &str) -> Result<(), ExportError> {
        self.buffer.dedent();
        self.buffer.line("}");
        Ok(())
    }

    fn on_add_native(&mut self, native: &CodeGenNative) -> Result<(), ExportError> {
        let name = self.identifier(&native.name);
        let params: Vec<String> = native.params.iter().map(|p| self.identifier(&p.name)).collect();
        let signature = join_list(native.params.iter().zip(&params).map(|(p, ident)| {
            format!("{ident}: {}", self.render_type(&p.ty))
        }));
        let args = join_list(std::iter::once(native.hash.clone()).chain(params.iter().cloned()));
        let call = format!("{}!({args})", self.settings.invoke_macro);

        self.buffer.blank_line();
        if self.settings.generate_comments {
            let lines = comment_lines(&native.comment);
            for line in &lines {
                self.buffer.line(format!("/// {}", line.trim()).trim_end());
            }
            if let Some(old_names) = &native.old_names {
                if !lines.is_empty() {
                    self.buffer.line("///");
                }
                self.buffer.line(format!("/// Old names: {}", join_list(old_names)));
            }
        }
        self.allow_non_snake_case(&name);
        if native.return_type.is_void() {
            self.buffer.line(format!("pub unsafe fn {name}({signature}) {{"));
            self.buffer.indent();
            self.buffer.line(format!("{call};"));
        } else {
            let ret = self.render_type(&native.return_type);
            self.buffer.line(format!("pub unsafe fn {name}({signature}) -> {ret} {{"));
            self.buffer.indent();
            self.buffer.line(call);
        }
        self.buffer.dedent();
        self.buffer.line("}");
        Ok(())
    }
}

fn escape_keyword(name: &str) -> String {
    if NOT_RAW.contains(&name) {
        format!("{name}_")
    } else if KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
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

    fn export(settings: RustSettings, namespace: &str, natives: &[Native]) -> String {
        let mut g = RustGenerator::new(settings);
        g.start().unwrap().push_namespace(namespace).unwrap();
        for native in natives {
            let cg = g.native_to_codegen(native).unwrap();
            g.add_native(&cg).unwrap();
        }
        g.pop_namespace().unwrap().end().unwrap();
        g.get().unwrap().to_string()
    }

    #[test]
    fn snake_case_module_with_mapped_types() {
        let mut label = raw("GET_LABEL_TEXT", "0xD49F9B0955C367DE", "const char*", &[("const char*", "labelName")]);
        label.comment = "Gets a localized string.".into();
        label.old_names = Some(vec!["_GET_LABEL_TEXT".into()]);
        let natives = [
            label,
            raw("SET_THING", "0x1", "void", &[("int", "type"), ("float*", "self")]),
        ];
        assert_eq!(
            export(RustSettings::default(), "NATIVE", &natives),
            "pub mod native {\n\
             \x20   use super::*;\n\
             \n\
             \x20   /// Gets a localized string.\n\
             \x20   ///\n\
             \x20   /// Old names: _GET_LABEL_TEXT\n\
             \x20   pub unsafe fn get_label_text(label_name: *const c_char) -> *const c_char {\n\
             \x20       invoke!(0xD49F9B0955C367DE, label_name)\n\
             \x20   }\n\
             \n\
             \x20   pub unsafe fn set_thing(r#type: i32, self_: *mut f32) {\n\
             \x20       invoke!(0x1, r#type, self_);\n\
             \x20   }\n\
             }\n"
        );
    }

    #[test]
    fn original_names_get_allow_attributes() {
        let settings = RustSettings {
            naming: NamingConvention::Original,
            invoke_macro: "native_call!".into(),
            generate_comments: false,
        };
        let mut g = RustGenerator::new(RustSettings::default());
        crate::settings::apply_change(&mut g.settings, &crate::settings::FieldChange {
            field: "invoke_macro".into(),
            checked: false,
            value: settings.invoke_macro.clone(),
        }).unwrap();
        assert_eq!(g.settings().invoke_macro, "native_call");

        let text = export(
            RustSettings { invoke_macro: "native_call".into(), ..settings },
            "PLAYER",
            &[raw("PLAYER_ID", "0x4F8644AF03D0E0D6", "Player", &[])],
        );
        assert_eq!(
            text,
            "#[allow(non_snake_case)]\n\
             pub mod PLAYER {\n\
             \x20   use super::*;\n\
             \n\
             \x20   #[allow(non_snake_case)]\n\
             \x20   pub unsafe fn PLAYER_ID() -> Player {\n\
             \x20       native_call!(0x4F8644AF03D0E0D6)\n\
             \x20   }\n\
             }\n"
        );
    }

    #[test]
    fn const_applies_to_innermost_pointer_only() {
        let g = RustGenerator::new(RustSettings::default());
        assert_eq!(g.render_type(&CodeGenType::new("c_char", 2, true)), "*mut *const c_char");
        assert_eq!(g.render_type(&CodeGenType::new("i32", 1, false)), "*mut i32");
        assert_eq!(g.render_type(&CodeGenType::new("void", 1, false)), "*mut c_void");
        assert_eq!(g.render_type(&CodeGenType::new("void", 0, false)), "()");
        assert_eq!(g.render_type(&CodeGenType::new("i32", 0, true)), "i32");
        for k in 0..4u8 {
            let text = g.render_type(&CodeGenType::new("Any", k, true));
            assert_eq!(text.matches('*').count(), k as usize);
            assert_eq!(text.matches("const").count(), usize::from(k > 0));
        }
    }

    #[test]
    fn schema_matches_setters() {
        validate_options::<RustSettings>().unwrap();
    }
}
