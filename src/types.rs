//! Language-agnostic type model fed to every generator backend.
//!
//! A catalog record carries C-like type strings (`"const char*"`, `"Any*"`);
//! they are parsed once into [`CodeGenType`] and each backend renders them
//! in its own syntax.
use crate::catalog::Native;
use crate::error::ExportError;

/// A C-like type: base name, pointer depth and const qualifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CodeGenType {
    base_type: String,
    pointers: u8,
    is_const: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeGenParam {
    pub ty: CodeGenType,
    pub name: String,
}

/// Normalized native record, the unit a backend emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeGenNative {
    pub hash: String,              // canonical `0x` + upper-case hex
    pub jhash: Option<String>,
    pub name: String,
    pub params: Vec<CodeGenParam>, // catalog order, never reordered
    pub return_type: CodeGenType,
    pub comment: String,
    pub build: Option<String>,
    pub old_names: Option<Vec<String>>,
}

/// Auxiliary artifact emitted next to the main text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeGeneratorFile {
    pub name: String,
    pub extension: String,
    pub content: String,
    pub mime_type: String,
}

impl CodeGenType {
    pub fn new(base_type: impl Into<String>, pointers: u8, is_const: bool) -> Self {
        Self { base_type: base_type.into(), pointers, is_const }
    }

    pub fn base_type(&self) -> &str { &self.base_type }
    pub fn pointers(&self) -> u8 { self.pointers }
    pub fn is_const(&self) -> bool { self.is_const }

    pub fn is_void(&self) -> bool {
        self.pointers == 0 && self.base_type == "void"
    }

    /// Same decoration, different base name.
    pub fn with_base(&self, base_type: impl Into<String>) -> Self {
        Self { base_type: base_type.into(), ..self.clone() }
    }

    /// Parse a catalog type string.
    ///
    /// `const` may appear anywhere; every `*` or `&` adds one level of
    /// indirection; the remaining words form the base name.
    pub fn parse(src: &str) -> Option<Self> {
        let mut pointers: u8 = 0;
        let mut is_const = false;
        let mut words: Vec<&str> = Vec::new();

        for chunk in src.split_whitespace() {
            let mut rest = chunk;
            while !rest.is_empty() {
                let end = rest.find(['*', '&']).unwrap_or(rest.len());
                let (word, tail) = rest.split_at(end);
                match word {
                    "" => {}
                    "const" => is_const = true,
                    w => words.push(w),
                }
                if let Some(stripped) = tail.strip_prefix(['*', '&']) {
                    pointers = pointers.checked_add(1)?;
                    rest = stripped;
                } else {
                    rest = tail;
                }
            }
        }

        let base_type = words.join(" ");
        let valid = !base_type.is_empty()
            && base_type.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ' ');
        valid.then_some(Self { base_type, pointers, is_const })
    }
}

impl std::fmt::Display for CodeGenType {
    /// Catalog spelling, e.g. `const char*`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_const {
            f.write_str("const ")?;
        }
        f.write_str(&self.base_type)?;
        for _ in 0..self.pointers {
            f.write_str("*")?;
        }
        Ok(())
    }
}

/// Canonical hash spelling: `0x` followed by 1-16 upper-case hex digits.
pub fn normalize_hash(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let digits = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X"))?;
    let valid = (1..=16).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_hexdigit());
    valid.then(|| format!("0x{}", digits.to_ascii_uppercase()))
}

impl CodeGenNative {
    /// Backend-neutral conversion from the raw catalog record.
    pub fn from_native(native: &Native) -> Result<Self, ExportError> {
        let parse_ty = |ty: &str| {
            CodeGenType::parse(ty).ok_or_else(|| ExportError::InvalidType {
                native: native.name.clone(),
                ty: ty.to_string(),
            })
        };
        let hash = normalize_hash(&native.hash).ok_or_else(|| ExportError::InvalidHash {
            native: native.name.clone(),
            hash: native.hash.clone(),
        })?;
        let params = native.params.iter()
            .map(|p| Ok(CodeGenParam { ty: parse_ty(&p.ty)?, name: p.name.clone() }))
            .collect::<Result<Vec<_>, ExportError>>()?;
        let old_names = native.old_names.as_ref().filter(|names| !names.is_empty()).cloned();

        Ok(Self {
            hash,
            jhash: native.jhash.as_deref().and_then(normalize_hash),
            name: native.name.clone(),
            params,
            return_type: parse_ty(&native.return_type)?,
            comment: native.comment.trim().to_string(),
            build: native.build.clone(),
            old_names,
        })
    }

    /// Every type in the signature, return type first.
    pub fn types(&self) -> impl Iterator<Item = &CodeGenType> {
        std::iter::once(&self.return_type).chain(self.params.iter().map(|p| &p.ty))
    }

    /// Rewrite every base type name through `map`.
    pub fn map_base_types(mut self, map: impl Fn(&CodeGenType) -> Option<&'static str>) -> Self {
        if let Some(base) = map(&self.return_type) {
            self.return_type = self.return_type.with_base(base);
        }
        for param in &mut self.params {
            if let Some(base) = map(&param.ty) {
                param.ty = param.ty.with_base(base);
            }
        }
        self
    }
}

impl CodeGeneratorFile {
    pub fn new(
        name: impl Into<String>,
        extension: impl Into<String>,
        content: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            extension: extension.into(),
            content: content.into(),
            mime_type: mime_type.into(),
        }
    }

    /// `${name}.${extension}`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Native, NativeParam};

    #[test]
    fn parses_const_pointer_types() {
        let ty = CodeGenType::parse("const char*").unwrap();
        assert_eq!(ty.base_type(), "char");
        assert_eq!(ty.pointers(), 1);
        assert!(ty.is_const());

        let ty = CodeGenType::parse("char const **").unwrap();
        assert_eq!(ty.base_type(), "char");
        assert_eq!(ty.pointers(), 2);
        assert!(ty.is_const());

        let ty = CodeGenType::parse("Vector3&").unwrap();
        assert_eq!(ty.pointers(), 1);
        assert!(!ty.is_const());
    }

    #[test]
    fn keeps_multi_word_base_types() {
        let ty = CodeGenType::parse("  unsigned   int*").unwrap();
        assert_eq!(ty.base_type(), "unsigned int");
        assert_eq!(ty.to_string(), "unsigned int*");
    }

    #[test]
    fn rejects_garbage_types() {
        assert!(CodeGenType::parse("").is_none());
        assert!(CodeGenType::parse("const *").is_none());
        assert!(CodeGenType::parse("int[4]").is_none());
    }

    #[test]
    fn hashes_are_canonicalized() {
        assert_eq!(normalize_hash("0xd49f9b0955c367de").as_deref(), Some("0xD49F9B0955C367DE"));
        assert_eq!(normalize_hash("0X1").as_deref(), Some("0x1"));
        assert!(normalize_hash("D49F9B0955C367DE").is_none());
        assert!(normalize_hash("0x").is_none());
        assert!(normalize_hash("0xZZ").is_none());
        assert!(normalize_hash("0x11112222333344445").is_none());
    }

    #[test]
    fn native_conversion_keeps_param_order_and_reports_bad_types() {
        let mut native = Native {
            hash: "0xabc".into(),
            name: "SET_THING".into(),
            params: vec![
                NativeParam { ty: "int".into(), name: "b".into() },
                NativeParam { ty: "float".into(), name: "a".into() },
            ],
            return_type: "void".into(),
            old_names: Some(vec![]),
            ..Native::default()
        };
        let cg = CodeGenNative::from_native(&native).unwrap();
        assert_eq!(cg.hash, "0xABC");
        assert_eq!(cg.params.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(), ["b", "a"]);
        assert!(cg.return_type.is_void());
        assert_eq!(cg.old_names, None);

        native.params[1].ty = "float[]".into();
        let err = CodeGenNative::from_native(&native).unwrap_err();
        assert!(matches!(err, ExportError::InvalidType { ref ty, .. } if ty == "float[]"));
    }

    #[test]
    fn native_conversion_reports_malformed_hashes() {
        let native = Native {
            hash: "D49F9B0955C367DE".into(),
            name: "GET_LABEL_TEXT".into(),
            return_type: "const char*".into(),
            ..Native::default()
        };
        let err = CodeGenNative::from_native(&native).unwrap_err();
        assert!(matches!(err, ExportError::InvalidHash { ref native, ref hash }
            if native == "GET_LABEL_TEXT" && hash == "D49F9B0955C367DE"));
    }
}
