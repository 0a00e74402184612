//! Naming conventions applied by the backends. Every transform is pure and
//! only depends on the input string.
use std::str::FromStr;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A digit run keeps the letters that follow it, so `3D` and `1ST` stay whole.
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]+[a-z0-9]*|[0-9]+[A-Z]*[a-z0-9]*|[a-z0-9]+").unwrap());
/// Unnamed natives are published as their hash, e.g. `_0x4F8644AF03D0E0D6`.
static HASH_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^_?0x[0-9A-Fa-f]+$").unwrap());

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingConvention {
    #[default]
    Original,
    PascalCase,
    CamelCase,
    SnakeCase,
}

impl NamingConvention {
    pub fn as_str(self) -> &'static str {
        match self {
            NamingConvention::Original => "original",
            NamingConvention::PascalCase => "pascal_case",
            NamingConvention::CamelCase => "camel_case",
            NamingConvention::SnakeCase => "snake_case",
        }
    }

    pub fn apply(self, name: &str) -> String {
        match self {
            NamingConvention::Original => name.to_string(),
            NamingConvention::PascalCase => to_pascal_case(name),
            NamingConvention::CamelCase => to_camel_case(name),
            NamingConvention::SnakeCase => to_snake_case(name),
        }
    }
}

impl FromStr for NamingConvention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "original" => Ok(NamingConvention::Original),
            "pascal_case" => Ok(NamingConvention::PascalCase),
            "camel_case" => Ok(NamingConvention::CamelCase),
            "snake_case" => Ok(NamingConvention::SnakeCase),
            other => Err(format!("unknown naming convention `{other}`")),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TRANSFORMS
// ————————————————————————————————————————————————————————————————————————————

/// `GET_LABEL_TEXT` → `GetLabelText`, `_GET_X` → `_GetX`
pub fn to_pascal_case(name: &str) -> String {
    convert(name, |words| words.iter().map(|w| capitalize(w)).collect())
}

/// `GET_LABEL_TEXT` → `getLabelText`
pub fn to_camel_case(name: &str) -> String {
    convert(name, |words| {
        let mut out = String::new();
        for (i, w) in words.iter().enumerate() {
            if i == 0 {
                out.push_str(&w.to_lowercase());
            } else {
                out.push_str(&capitalize(w));
            }
        }
        out
    })
}

/// `labelName` → `label_name`, `GET_LABEL_TEXT` → `get_label_text`
pub fn to_snake_case(name: &str) -> String {
    convert(name, |words| {
        words.iter().map(|w| w.to_lowercase()).collect::<Vec<_>>().join("_")
    })
}

/// Rename `name` through `escape` when it collides with a reserved word.
pub fn escape_reserved(name: &str, reserved: &[&str], escape: impl Fn(&str) -> String) -> String {
    if reserved.contains(&name) {
        escape(name)
    } else {
        name.to_string()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn convert(name: &str, join: impl Fn(&[&str]) -> String) -> String {
    if HASH_NAME.is_match(name) {
        return name.to_string();
    }
    let words: Vec<&str> = WORD.find_iter(name).map(|m| m.as_str()).collect();
    if words.is_empty() {
        return name.to_string();
    }
    let mut out = join(&words);
    if name.starts_with('_') {
        out.insert(0, '_');
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

fn capitalize(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screaming_snake_names() {
        assert_eq!(to_pascal_case("GET_LABEL_TEXT"), "GetLabelText");
        assert_eq!(to_camel_case("GET_LABEL_TEXT"), "getLabelText");
        assert_eq!(to_snake_case("GET_LABEL_TEXT"), "get_label_text");
    }

    #[test]
    fn camel_case_params() {
        assert_eq!(to_snake_case("labelName"), "label_name");
        assert_eq!(to_pascal_case("labelName"), "LabelName");
        assert_eq!(to_snake_case("p0"), "p0");
        assert_eq!(to_snake_case("vehicle2Handle"), "vehicle2_handle");
    }

    #[test]
    fn leading_underscore_and_digits_survive() {
        assert_eq!(to_pascal_case("_GET_X"), "_GetX");
        assert_eq!(to_pascal_case("2D_POS"), "_2dPos");
        assert_eq!(to_snake_case("3D_COORD"), "_3d_coord");
    }

    #[test]
    fn digit_runs_keep_their_suffix() {
        assert_eq!(to_snake_case("GET_GROUND_Z_FOR_3D_COORD"), "get_ground_z_for_3d_coord");
        assert_eq!(to_pascal_case("GET_GROUND_Z_FOR_3D_COORD"), "GetGroundZFor3dCoord");
        assert_eq!(to_camel_case("DRAW_MARKER_2"), "drawMarker2");
        assert_eq!(to_snake_case("IS_1ST_PERSON"), "is_1st_person");
    }

    #[test]
    fn hash_names_are_left_alone() {
        for convention in [NamingConvention::PascalCase, NamingConvention::SnakeCase] {
            assert_eq!(convention.apply("_0x4F8644AF03D0E0D6"), "_0x4F8644AF03D0E0D6");
        }
    }

    #[test]
    fn conventions_round_trip_through_their_names() {
        for convention in [
            NamingConvention::Original,
            NamingConvention::PascalCase,
            NamingConvention::CamelCase,
            NamingConvention::SnakeCase,
        ] {
            assert_eq!(convention.as_str().parse::<NamingConvention>(), Ok(convention));
        }
        assert!("kebab".parse::<NamingConvention>().is_err());
    }

    #[test]
    fn reserved_words_are_escaped() {
        assert_eq!(escape_reserved("end", &["end"], |n| format!("{n}_")), "end_");
        assert_eq!(escape_reserved("ped", &["end"], |n| format!("{n}_")), "ped");
    }
}
