//! Parsers and serializers for value literals.
//!
//! Every parser takes a literal that has already been through
//! [`super::scanner::remove_control_and_whitespace`], so plain whitespace is
//! gone and only quoted text keeps its spaces and tabs.
//!
//! Literal forms:
//!
//! ```text
//! STRING     L"text"      only \"  \t  \n are escapes
//! BOOL       true | false
//! INT        [+-]digits   no hex, no exponent
//! DOUBLE     [+-]digits[.digits][e[+-]digits]
//! VEC4       (x,y,z,w)
//! COLOR      (r,g,b,a)    each 0-255
//! FILENAME   "path"
//! DIRECTORY  "path"
//! ```

use thiserror::Error;

use crate::domain::value::Vec4;

/// Why a literal could not be parsed or produced.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LiteralError {
    /// The text does not have the shape the datatype requires.
    #[error("malformed literal: {0}")]
    Syntax(String),

    /// The text is well formed but the number is outside the allowed range.
    #[error("value out of range: {0}")]
    Range(String),

    /// A file or directory name failed validation.
    #[error("invalid path: {0}")]
    Path(String),

    /// The value has no representation in the file format.
    #[error("not representable: {0}")]
    Unrepresentable(String),
}

// ── Strings ───────────────────────────────────────────────────────────────────

/// Finds the end of a quoted body starting at byte `open + 1`.
///
/// Walks escape pairs the same way the scanner does and returns the byte
/// offset of the first unescaped `"`.
fn closing_quote(s: &str, open: usize) -> Option<usize> {
    let mut chars = s[open + 1..].char_indices();
    while let Some((i, ch)) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '"' => return Some(open + 1 + i),
            _ => {}
        }
    }
    None
}

/// Extracts the body of a literal that must be exactly `prefix"body"`.
fn quoted_body<'a>(s: &'a str, prefix: &str, what: &str) -> Result<&'a str, LiteralError> {
    if !s.starts_with(prefix) || !s[prefix.len()..].starts_with('"') {
        return Err(LiteralError::Syntax(format!(
            "{what} must start with {prefix}\", got '{s}'"
        )));
    }
    let open = prefix.len();
    let close = closing_quote(s, open)
        .ok_or_else(|| LiteralError::Syntax(format!("unterminated {what} '{s}'")))?;
    if close + 1 != s.len() {
        return Err(LiteralError::Syntax(format!(
            "unexpected text after closing quote of {what}: '{}'",
            &s[close + 1..]
        )));
    }
    Ok(&s[open + 1..close])
}

/// Parses `L"..."`.
///
/// `\"`, `\t` and `\n` are decoded; any other backslash pair is kept as
/// written.
///
/// # Examples
///
/// ```rust
/// use scopecfg_core::text::literal::parse_wstring;
///
/// assert_eq!(parse_wstring(r#"L"say \"hi\"""#).unwrap(), "say \"hi\"");
/// assert!(parse_wstring(r#""no prefix""#).is_err());
/// ```
pub fn parse_wstring(s: &str) -> Result<String, LiteralError> {
    let body = quoted_body(s, "L", "string literal")?;
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    Ok(out)
}

/// Serializes a string as `L"..."`.
///
/// # Errors
///
/// Returns [`LiteralError::Unrepresentable`] for characters the file format
/// cannot carry: non-ASCII, control characters other than tab and newline,
/// and a backslash that would read back as an escape.
pub fn serialize_wstring(value: &str) -> Result<String, LiteralError> {
    let mut out = String::with_capacity(value.len() + 3);
    out.push_str("L\"");
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => out.push_str("\\\""),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\\' => match chars.next() {
                Some(next) if !matches!(next, '"' | 't' | 'n') && is_literal_char(next) => {
                    out.push('\\');
                    out.push(next);
                }
                _ => {
                    return Err(LiteralError::Unrepresentable(format!(
                        "backslash sequence in {value:?} would read back as an escape"
                    )));
                }
            },
            c if is_literal_char(c) => out.push(c),
            c => {
                return Err(LiteralError::Unrepresentable(format!(
                    "character U+{:04X} in {value:?}",
                    c as u32
                )));
            }
        }
    }
    out.push('"');
    Ok(out)
}

/// Printable ASCII including space.
fn is_literal_char(ch: char) -> bool {
    (' '..='~').contains(&ch)
}

/// Parses a `"..."` path literal and returns the raw body.
///
/// Backslashes are kept, so Windows paths need no escaping.
pub fn parse_path_literal(s: &str) -> Result<String, LiteralError> {
    quoted_body(s, "", "path literal").map(str::to_string)
}

/// Serializes a path as `"..."`.
///
/// # Errors
///
/// Returns [`LiteralError::Unrepresentable`] if the path contains a quote,
/// a character outside printable ASCII, or ends with a backslash.
pub fn serialize_path_literal(value: &str) -> Result<String, LiteralError> {
    if let Some(c) = value.chars().find(|c| *c == '"' || !is_literal_char(*c)) {
        return Err(LiteralError::Unrepresentable(format!(
            "character U+{:04X} in path {value:?}",
            c as u32
        )));
    }
    if value.ends_with('\\') {
        return Err(LiteralError::Unrepresentable(format!(
            "path {value:?} ends with a backslash"
        )));
    }
    Ok(format!("\"{value}\""))
}

// ── Booleans ──────────────────────────────────────────────────────────────────

pub fn parse_bool(s: &str) -> Result<bool, LiteralError> {
    match s {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(LiteralError::Syntax(format!(
            "expected 'true' or 'false', got '{s}'"
        ))),
    }
}

pub fn serialize_bool(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

// ── Numbers ───────────────────────────────────────────────────────────────────

/// Parses a decimal `i32`.  Hex, exponents and fractions are rejected.
pub fn parse_int(s: &str) -> Result<i32, LiteralError> {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LiteralError::Syntax(format!("expected a decimal integer, got '{s}'")));
    }
    s.parse::<i32>()
        .map_err(|_| LiteralError::Range(format!("'{s}' does not fit in a 32-bit integer")))
}

pub fn serialize_int(value: i32) -> String {
    value.to_string()
}

/// Checks the shape `[+-]digits[.digits][(e|E)[+-]digits]`, also allowing
/// `.5` and `5.`.
fn is_decimal_number(s: &str) -> bool {
    let body = s.strip_prefix(['+', '-']).unwrap_or(s);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    };
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    let mantissa_ok = (!int_part.is_empty() || !frac_part.is_empty())
        && all_digits(int_part)
        && all_digits(frac_part);
    let exponent_ok = match exponent {
        None => true,
        Some(e) => {
            let e = e.strip_prefix(['+', '-']).unwrap_or(e);
            !e.is_empty() && all_digits(e)
        }
    };
    mantissa_ok && exponent_ok
}

/// Parses a finite decimal `f64`.  `inf`, `nan` and hex forms are rejected.
pub fn parse_double(s: &str) -> Result<f64, LiteralError> {
    if !is_decimal_number(s) {
        return Err(LiteralError::Syntax(format!("expected a decimal number, got '{s}'")));
    }
    let value = s
        .parse::<f64>()
        .map_err(|e| LiteralError::Syntax(format!("'{s}': {e}")))?;
    if !value.is_finite() {
        return Err(LiteralError::Range(format!("'{s}' overflows a double")));
    }
    Ok(value)
}

/// Serializes with the shortest text that reads back to the same `f64`.
pub fn serialize_double(value: f64) -> Result<String, LiteralError> {
    if !value.is_finite() {
        return Err(LiteralError::Unrepresentable(format!("non-finite number {value}")));
    }
    Ok(format!("{value:?}"))
}

fn parse_f32(s: &str) -> Result<f32, LiteralError> {
    if !is_decimal_number(s) {
        return Err(LiteralError::Syntax(format!("expected a decimal number, got '{s}'")));
    }
    let value = s
        .parse::<f32>()
        .map_err(|e| LiteralError::Syntax(format!("'{s}': {e}")))?;
    if !value.is_finite() {
        return Err(LiteralError::Range(format!("'{s}' overflows a float")));
    }
    Ok(value)
}

// ── Vectors ───────────────────────────────────────────────────────────────────

fn split_components(s: &str) -> Result<[&str; 4], LiteralError> {
    let inner = s
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| LiteralError::Syntax(format!("expected '(x,y,z,w)', got '{s}'")))?;
    let parts: Vec<&str> = inner.split(',').collect();
    <[&str; 4]>::try_from(parts.as_slice()).map_err(|_| {
        LiteralError::Syntax(format!(
            "expected 4 components, got {} in '{s}'",
            parts.len()
        ))
    })
}

/// Parses `(a,b,c,d)`.
pub fn parse_vec4(s: &str) -> Result<Vec4, LiteralError> {
    let mut components = [0.0f32; 4];
    for (slot, part) in components.iter_mut().zip(split_components(s)?) {
        *slot = parse_f32(part)?;
    }
    Ok(Vec4::from(components))
}

pub fn serialize_vec4(value: Vec4) -> Result<String, LiteralError> {
    let mut parts = Vec::with_capacity(4);
    for c in value.to_array() {
        if !c.is_finite() {
            return Err(LiteralError::Unrepresentable(format!("non-finite component {c}")));
        }
        parts.push(format!("{c:?}"));
    }
    Ok(format!("({})", parts.join(",")))
}

/// Parses `(r,g,b,a)` with components in 0–255 and normalises them to 0–1.
///
/// Components are read as `f64` and divided before narrowing, so every `f32`
/// colour has a literal that reads back to exactly that colour.
///
/// # Examples
///
/// ```rust
/// use scopecfg_core::text::literal::parse_color;
///
/// let tint = parse_color("(255,128,0,255)").unwrap();
/// assert_eq!(tint.x, 1.0);
/// assert!((tint.y - 0.50196).abs() < 1e-4);
/// ```
pub fn parse_color(s: &str) -> Result<Vec4, LiteralError> {
    let mut out = [0.0f32; 4];
    for (slot, part) in out.iter_mut().zip(split_components(s)?) {
        let c = parse_double(part)?;
        if !(0.0..=255.0).contains(&c) {
            return Err(LiteralError::Range(format!(
                "colour component {c} outside 0-255 in '{s}'"
            )));
        }
        *slot = normalise_component(c);
    }
    Ok(Vec4::from(out))
}

fn normalise_component(scaled: f64) -> f32 {
    (scaled / 255.0) as f32
}

/// Serializes a normalised colour back to 0–255 components.
///
/// A component is written as an integer only when that integer reads back to
/// the same value.  Otherwise the exact scaled value is written, which
/// [`parse_color`] turns back into the original component.
pub fn serialize_color(value: Vec4) -> Result<String, LiteralError> {
    let mut parts = Vec::with_capacity(4);
    for c in value.to_array() {
        if !c.is_finite() || !(0.0..=1.0).contains(&c) {
            return Err(LiteralError::Unrepresentable(format!(
                "colour component {c} outside 0.0-1.0"
            )));
        }
        // Exact: an f32 mantissa times 255 fits in an f64 mantissa.
        let scaled = f64::from(c) * 255.0;
        let rounded = scaled.round();
        if normalise_component(rounded) == c {
            parts.push(format!("{}", rounded as u32));
        } else {
            parts.push(format!("{scaled:?}"));
        }
    }
    Ok(format!("({})", parts.join(",")))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
