//! Line codec for the flat configuration format.
//!
//! Line format:
//! ```text
//! DATATYPE -- SCOPE :: FIELD = LITERAL
//! ```
//! Whitespace outside quoted literals is insignificant.  Inside SCOPE and
//! FIELD a backslash escapes the next character; the writer escapes `\`,
//! `:`, `=` and `"`.
//!
//! Value literals are handled through [`CODECS`], a table with one
//! [`LiteralCodec`] per [`DataType`] in declaration order.

use tracing::debug;

use crate::domain::key::Key;
use crate::domain::value::{DataType, Value};
use crate::text::literal::{self, LiteralError};
use crate::text::path::{self, FileSystem, PathKind};
use crate::text::scanner;

/// Separator between the datatype name and the scope.
pub const TYPE_DELIMITER: &str = "--";
/// Separator between the scope and the field.
pub const SCOPE_DELIMITER: &str = "::";
/// Separator between the field and the value literal.
pub const VALUE_DELIMITER: &str = "=";

/// Characters escaped in scopes and fields on write (the backslash is always
/// escaped as well).
const KEY_SPECIALS: &[char] = &[':', '=', '"'];

/// Collaborators a literal parser may consult.
#[derive(Clone, Copy)]
pub struct ParseContext<'a> {
    pub fs: &'a dyn FileSystem,
}

impl<'a> ParseContext<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs }
    }
}

/// Parser and serializer for one datatype's literal form.
pub struct LiteralCodec {
    pub datatype: DataType,
    pub parse: fn(&str, &ParseContext<'_>) -> Result<Value, LiteralError>,
    pub serialize: fn(&Value) -> Result<String, LiteralError>,
}

/// One codec per datatype, indexed by the `DataType` discriminant.
pub static CODECS: [LiteralCodec; 8] = [
    LiteralCodec {
        datatype: DataType::String,
        parse: parse_string,
        serialize: serialize_string,
    },
    LiteralCodec {
        datatype: DataType::Bool,
        parse: parse_bool,
        serialize: serialize_bool,
    },
    LiteralCodec {
        datatype: DataType::Int,
        parse: parse_int,
        serialize: serialize_int,
    },
    LiteralCodec {
        datatype: DataType::Double,
        parse: parse_double,
        serialize: serialize_double,
    },
    LiteralCodec {
        datatype: DataType::Vec4,
        parse: parse_vec4,
        serialize: serialize_vec4,
    },
    LiteralCodec {
        datatype: DataType::Color,
        parse: parse_color,
        serialize: serialize_color,
    },
    LiteralCodec {
        datatype: DataType::Filename,
        parse: parse_filename,
        serialize: serialize_path,
    },
    LiteralCodec {
        datatype: DataType::Directory,
        parse: parse_directory,
        serialize: serialize_path,
    },
];

/// Returns the codec for `datatype`.
pub fn codec(datatype: DataType) -> &'static LiteralCodec {
    &CODECS[datatype as usize]
}

// ── Table entries ─────────────────────────────────────────────────────────────

fn wrong_variant(expected: DataType, value: &Value) -> LiteralError {
    LiteralError::Unrepresentable(format!(
        "{expected} codec given a {} value",
        value.datatype()
    ))
}

fn parse_string(s: &str, _: &ParseContext<'_>) -> Result<Value, LiteralError> {
    literal::parse_wstring(s).map(Value::String)
}

fn serialize_string(value: &Value) -> Result<String, LiteralError> {
    match value {
        Value::String(s) => literal::serialize_wstring(s),
        other => Err(wrong_variant(DataType::String, other)),
    }
}

fn parse_bool(s: &str, _: &ParseContext<'_>) -> Result<Value, LiteralError> {
    literal::parse_bool(s).map(Value::Bool)
}

fn serialize_bool(value: &Value) -> Result<String, LiteralError> {
    match value {
        Value::Bool(b) => Ok(literal::serialize_bool(*b)),
        other => Err(wrong_variant(DataType::Bool, other)),
    }
}

fn parse_int(s: &str, _: &ParseContext<'_>) -> Result<Value, LiteralError> {
    literal::parse_int(s).map(Value::Int)
}

fn serialize_int(value: &Value) -> Result<String, LiteralError> {
    match value {
        Value::Int(i) => Ok(literal::serialize_int(*i)),
        other => Err(wrong_variant(DataType::Int, other)),
    }
}

fn parse_double(s: &str, _: &ParseContext<'_>) -> Result<Value, LiteralError> {
    literal::parse_double(s).map(Value::Double)
}

fn serialize_double(value: &Value) -> Result<String, LiteralError> {
    match value {
        Value::Double(d) => literal::serialize_double(*d),
        other => Err(wrong_variant(DataType::Double, other)),
    }
}

fn parse_vec4(s: &str, _: &ParseContext<'_>) -> Result<Value, LiteralError> {
    literal::parse_vec4(s).map(Value::Vec4)
}

fn serialize_vec4(value: &Value) -> Result<String, LiteralError> {
    match value {
        Value::Vec4(v) => literal::serialize_vec4(*v),
        other => Err(wrong_variant(DataType::Vec4, other)),
    }
}

fn parse_color(s: &str, _: &ParseContext<'_>) -> Result<Value, LiteralError> {
    literal::parse_color(s).map(Value::Color)
}

fn serialize_color(value: &Value) -> Result<String, LiteralError> {
    match value {
        Value::Color(v) => literal::serialize_color(*v),
        other => Err(wrong_variant(DataType::Color, other)),
    }
}

fn parse_checked_path(s: &str, kind: PathKind, ctx: &ParseContext<'_>) -> Result<String, LiteralError> {
    let name = literal::parse_path_literal(s)?;
    path::validate_name(&name, kind)?;
    if let Some(note) = path::check_plausible(&name, kind, ctx.fs)? {
        debug!(path = %name, "{note}");
    }
    Ok(name)
}

fn parse_filename(s: &str, ctx: &ParseContext<'_>) -> Result<Value, LiteralError> {
    parse_checked_path(s, PathKind::File, ctx).map(Value::Filename)
}

fn parse_directory(s: &str, ctx: &ParseContext<'_>) -> Result<Value, LiteralError> {
    parse_checked_path(s, PathKind::Directory, ctx).map(Value::Directory)
}

fn serialize_path(value: &Value) -> Result<String, LiteralError> {
    match value {
        Value::Filename(p) | Value::Directory(p) => literal::serialize_path_literal(p),
        other => Err(wrong_variant(DataType::Filename, other)),
    }
}

// ── Lines ─────────────────────────────────────────────────────────────────────

/// Classification of one cleaned line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineParse {
    Blank,
    Comment,
    Entry(Key, Value),
    /// The line could not be used; the string says why.
    Rejected(String),
}

/// Parses a line already passed through
/// [`scanner::remove_control_and_whitespace`].
///
/// # Examples
///
/// ```rust
/// use scopecfg_core::format::codec::{parse_entry, LineParse, ParseContext};
/// use scopecfg_core::text::StdFileSystem;
/// use scopecfg_core::{Key, Value};
///
/// let ctx = ParseContext::new(&StdFileSystem);
/// let parsed = parse_entry("INT--MyScope::Count=42", &ctx);
/// assert_eq!(parsed, LineParse::Entry(Key::new("MyScope", "Count").unwrap(), Value::Int(42)));
/// ```
pub fn parse_entry(cleaned: &str, ctx: &ParseContext<'_>) -> LineParse {
    if cleaned.is_empty() {
        return LineParse::Blank;
    }
    if cleaned.starts_with('#') {
        return LineParse::Comment;
    }

    let Some(type_end) = scanner::find_unescaped(cleaned, TYPE_DELIMITER, 0) else {
        return LineParse::Rejected(format!("missing '{TYPE_DELIMITER}' after the datatype"));
    };
    let scope_start = type_end + TYPE_DELIMITER.len();
    let Some(scope_end) = scanner::find_unescaped(cleaned, SCOPE_DELIMITER, scope_start) else {
        return LineParse::Rejected(format!("missing '{SCOPE_DELIMITER}' after the scope"));
    };
    let field_start = scope_end + SCOPE_DELIMITER.len();
    let Some(field_end) = scanner::find_unescaped(cleaned, VALUE_DELIMITER, field_start) else {
        return LineParse::Rejected(format!("missing '{VALUE_DELIMITER}' after the field"));
    };

    let type_name = &cleaned[..type_end];
    let Some(datatype) = DataType::from_name(type_name) else {
        return LineParse::Rejected(format!("unknown datatype '{type_name}'"));
    };

    let scope = scanner::unescape(&cleaned[scope_start..scope_end]);
    let field = scanner::unescape(&cleaned[field_start..field_end]);
    let key = match Key::new(scope, field) {
        Ok(key) => key,
        Err(_) => return LineParse::Rejected("empty field name".to_string()),
    };

    let literal = &cleaned[field_end + VALUE_DELIMITER.len()..];
    match (codec(datatype).parse)(literal, ctx) {
        Ok(value) => LineParse::Entry(key, value),
        Err(e) => LineParse::Rejected(format!("{datatype} value for {key}: {e}")),
    }
}

/// Escapes a scope or field for writing.
///
/// # Errors
///
/// Returns [`LiteralError::Unrepresentable`] for characters the reader would
/// strip: whitespace, control characters and anything outside ASCII.
fn escape_key_part(part: &str) -> Result<String, LiteralError> {
    if let Some(c) = part.chars().find(|c| !c.is_ascii_graphic()) {
        return Err(LiteralError::Unrepresentable(format!(
            "character U+{:04X} in key part {part:?}",
            c as u32
        )));
    }
    Ok(scanner::escape_chars(part, KEY_SPECIALS))
}

/// Formats one entry as a tab-separated line without a trailing newline.
pub fn format_entry(key: &Key, value: &Value) -> Result<String, LiteralError> {
    let scope = escape_key_part(key.scope())?;
    let field = escape_key_part(key.field())?;
    let literal = (codec(value.datatype()).serialize)(value)?;
    Ok(format!(
        "{}\t{TYPE_DELIMITER}\t{scope}\t{SCOPE_DELIMITER}\t{field}\t{VALUE_DELIMITER}\t{literal}",
        value.datatype()
    ))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
