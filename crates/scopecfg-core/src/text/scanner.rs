//! Quote- and escape-aware character scanning.
//!
//! # Zones and escapes
//!
//! A configuration line has two kinds of zone:
//!
//! - **plain** text, where every whitespace or control character is noise;
//! - **quoted** text between a matched pair of unescaped `"`, where spaces
//!   and tabs are part of the literal.
//!
//! A backslash escapes the character that follows it, so `\"` never opens or
//! closes a quoted zone and `\\` is a literal backslash pair.  Equivalently, a
//! delimiter is escaped exactly when it is preceded by an odd run of
//! backslashes.
//!
//! [`Scanner`] walks an immutable `&str` with an explicit state machine and
//! yields one [`Scanned`] token per character; everything else in this module
//! is built on it.

/// Characters that survive inside a quoted zone even though they are
/// whitespace.
pub const QUOTED_IGNORABLES: &[char] = &[' ', '\t'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    Escaped,
    InQuotes,
    InQuotesEscaped,
}

/// One character together with the zone it was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scanned {
    /// Byte offset of `ch` in the scanned string.
    pub index: usize,
    pub ch: char,
    /// `true` strictly between an opening and a closing quote.  The quote
    /// marks themselves are not quoted.
    pub quoted: bool,
    /// `true` if the preceding character was an escaping backslash.
    pub escaped: bool,
    /// `true` if this character is a backslash that escapes the next one.
    pub escapes_next: bool,
}

/// Lazy token stream over a string.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    chars: std::str::CharIndices<'a>,
    state: State,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices(),
            state: State::Normal,
        }
    }
}

impl Iterator for Scanner<'_> {
    type Item = Scanned;

    fn next(&mut self) -> Option<Scanned> {
        let (index, ch) = self.chars.next()?;
        let (quoted, escaped, escapes_next, next_state) = match (self.state, ch) {
            (State::Normal, '\\') => (false, false, true, State::Escaped),
            (State::Normal, '"') => (false, false, false, State::InQuotes),
            (State::Normal, _) => (false, false, false, State::Normal),
            (State::Escaped, _) => (false, true, false, State::Normal),
            (State::InQuotes, '\\') => (true, false, true, State::InQuotesEscaped),
            (State::InQuotes, '"') => (false, false, false, State::Normal),
            (State::InQuotes, _) => (true, false, false, State::InQuotes),
            (State::InQuotesEscaped, _) => (true, true, false, State::InQuotes),
        };
        self.state = next_state;
        Some(Scanned {
            index,
            ch,
            quoted,
            escaped,
            escapes_next,
        })
    }
}

/// Returns `true` for printable ASCII other than space.
fn is_visible(ch: char) -> bool {
    ('\u{21}'..='\u{7e}').contains(&ch)
}

/// Strips whitespace, ASCII control characters and everything at or above
/// code point 127.
///
/// Inside quoted zones the characters listed in `ignorables` are kept as
/// well.  An escaping backslash is dropped together with the character it
/// escapes when that character is stripped, which keeps the zone structure
/// of the output identical to the input and makes the function idempotent.
///
/// # Examples
///
/// ```rust
/// use scopecfg_core::text::scanner::{remove_control_and_whitespace, QUOTED_IGNORABLES};
///
/// let cleaned = remove_control_and_whitespace("STRING -- UI :: Title = L\"Main Menu\"\r", QUOTED_IGNORABLES);
/// assert_eq!(cleaned, "STRING--UI::Title=L\"Main Menu\"");
/// ```
pub fn remove_control_and_whitespace(input: &str, ignorables: &[char]) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_escape: Option<char> = None;

    for token in Scanner::new(input) {
        let keep = is_visible(token.ch) || (token.quoted && ignorables.contains(&token.ch));

        if token.escapes_next {
            // Decide once the escaped character is known.
            pending_escape = Some(token.ch);
            continue;
        }

        if let Some(backslash) = pending_escape.take() {
            if keep {
                out.push(backslash);
            }
        }
        if keep {
            out.push(token.ch);
        }
    }

    // A trailing backslash escapes nothing; keep it.
    if let Some(backslash) = pending_escape {
        out.push(backslash);
    }
    out
}

/// Returns `true` if the byte at `at` is preceded by an odd run of
/// backslashes.
pub fn is_escaped_at(haystack: &str, at: usize) -> bool {
    let run = haystack.as_bytes()[..at.min(haystack.len())]
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count();
    run % 2 == 1
}

/// Finds the first occurrence of `needle` at or after byte offset `from`
/// that is not escaped.
///
/// Returns the byte offset of the match in `haystack`.
pub fn find_unescaped(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let step = needle.chars().next()?.len_utf8();
    let mut start = from;
    loop {
        let rel = haystack.get(start..)?.find(needle)?;
        let at = start + rel;
        if !is_escaped_at(haystack, at) {
            return Some(at);
        }
        start = at + step;
    }
}

/// Prefixes every character of `input` listed in `special`, and every
/// backslash, with a backslash.
pub fn escape_chars(input: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch == '\\' || special.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Removes escaping backslashes: `\x` becomes `x`.  A trailing lone
/// backslash is kept.
pub fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
