//! Reading and writing configuration files.
//!
//! A read never fails because of file content.  Lines that cannot be used
//! become [`Diagnostic`]s, the report carries [`Outcome::DataIncomplete`], and
//! the diagnostics are appended to the file as comments so the author sees
//! them next time the file is opened.  Only I/O failures return `Err`.
//!
//! Writes do not lock the destination; the last writer wins.
//!
//! # What is a diagnostics block? (for beginners)
//!
//! Configuration files are usually edited by hand, so a typo should not stop
//! the program from starting.  Instead the reader skips the line and remembers
//! why.  After the read those reasons are written to the end of the same file
//! as comments, so whoever edits it next sees them right below their entries:
//!
//! ```text
//! INT  --  Window  ::  Width   =  1280
//! INT  --  Window  ::  Height  =  tall
//! # --- end of configuration ---
//!
//! # --- problems found while reading this file ---
//! # line 2: INT value for Window::Height: malformed literal: expected a decimal integer, got 'tall': INT  --  Window  ::  Height  =  tall
//! ```
//!
//! Comments are ignored on the next read, so the block never causes problems
//! itself.  Each comment line is cut to [`MAX_LINE_LEN`] characters.
//!
//! # Overwrite or append
//!
//! [`WriteMode::overwrite`] replaces the whole file with the canonical form of
//! the configuration.  With `overwrite: false` the rendered block (end marker
//! included) is added after whatever the file already holds, and entries
//! already present win on the next read because the first occurrence of a key
//! is kept.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::{debug, info, warn};

use super::codec::{self, LineParse, ParseContext};
use crate::domain::store::{Config, ConfigError, Outcome};
use crate::text::path::{FileSystem, StdFileSystem};
use crate::text::scanner::{remove_control_and_whitespace, QUOTED_IGNORABLES};

/// Longest cleaned line the reader accepts.
pub const MAX_LINE_LEN: usize = 255;

/// Comment written after the last entry.
pub const END_MARKER: &str = "# --- end of configuration ---";

const DIAGNOSTICS_HEADER: &str = "# --- problems found while reading this file ---";

const FORMAT_SPEC: &[&str] = &[
    "# Format: DATATYPE -- SCOPE :: FIELD = VALUE",
    "# Datatypes: STRING BOOL INT DOUBLE VEC4 COLOR FILENAME DIRECTORY",
    "#   STRING     L\"text\"  (escapes: \\\" \\t \\n)",
    "#   BOOL       true | false",
    "#   INT        decimal 32-bit integer",
    "#   DOUBLE     decimal number, exponent allowed",
    "#   VEC4       (x,y,z,w)",
    "#   COLOR      (r,g,b,a) with components 0-255",
    "#   FILENAME   \"path/name.ext\"",
    "#   DIRECTORY  \"path/name\"",
    "# In SCOPE and FIELD escape \\ : = and \" with a backslash.",
    "# Whitespace outside quotes is ignored. Lines starting with # are comments.",
    "# Cleaned lines may not exceed 255 characters.",
];

// ── Reports ───────────────────────────────────────────────────────────────────

/// One problem found while reading or writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based line number in the source file, when there is one.
    pub line: Option<usize>,
    pub message: String,
    /// The offending line, or the key of the entry that could not be written.
    pub text: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {line}: {}: {}", self.message, self.text),
            None => write!(f, "{}: {}", self.message, self.text),
        }
    }
}

impl Diagnostic {
    /// Renders the diagnostic as a single comment line that the reader will
    /// accept again.
    fn to_comment(&self) -> String {
        let sanitized: String = format!("# {self}")
            .chars()
            .map(|c| if c.is_ascii_graphic() { c } else { ' ' })
            .collect();
        sanitized.chars().take(MAX_LINE_LEN).collect()
    }
}

/// Result of a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadReport {
    pub outcome: Outcome,
    /// Entries newly inserted into the target config.
    pub inserted: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub outcome: Outcome,
    /// Entries written.
    pub written: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// How [`ConfigIo::write`] treats the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteMode {
    /// Truncate the file instead of appending to it.
    pub overwrite: bool,
    /// Emit the format description comment block.
    pub format_spec: bool,
}

impl Default for WriteMode {
    fn default() -> Self {
        Self {
            overwrite: true,
            format_spec: false,
        }
    }
}

// ── ConfigIo ──────────────────────────────────────────────────────────────────

/// Reader and writer for the flat configuration format.
///
/// # Examples
///
/// ```rust
/// use scopecfg_core::{Config, ConfigIo, DataType, Outcome};
///
/// let io = ConfigIo::new();
/// let mut config = Config::new();
/// let report = io.read_str("INT -- MyScope :: Count = 42\n", &mut config);
/// assert_eq!(report.outcome, Outcome::Success);
/// assert_eq!(config.retrieve::<i32>("MyScope", "Count", DataType::Int), Some(&42));
/// ```
pub struct ConfigIo {
    fs: Box<dyn FileSystem>,
}

impl Default for ConfigIo {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConfigIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigIo").finish_non_exhaustive()
    }
}

impl ConfigIo {
    /// Creates a reader/writer that validates paths against the real
    /// filesystem.
    pub fn new() -> Self {
        Self::with_filesystem(Box::new(StdFileSystem))
    }

    /// Creates a reader/writer that validates paths against `fs`.
    pub fn with_filesystem(fs: Box<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Reads `path` into `config`, appending any diagnostics to the file.
    ///
    /// Entries already present in `config` are kept; lines that repeat their
    /// keys are reported as duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or if the
    /// diagnostics cannot be appended to it.
    pub fn read(&self, path: &Path, config: &mut Config) -> Result<ReadReport, ConfigError> {
        let bytes = fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        // Bytes outside ASCII are stripped by line cleaning anyway.
        let text = String::from_utf8_lossy(&bytes);

        let report = self.read_str(&text, config);

        info!(
            path = %path.display(),
            inserted = report.inserted,
            problems = report.diagnostics.len(),
            "configuration read"
        );
        if !report.diagnostics.is_empty() {
            append_diagnostics(path, text.ends_with('\n') || text.is_empty(), &report.diagnostics)?;
        }
        Ok(report)
    }

    /// Parses configuration text into `config`.
    pub fn read_str(&self, text: &str, config: &mut Config) -> ReadReport {
        let ctx = ParseContext::new(self.fs.as_ref());
        let mut report = ReadReport {
            outcome: Outcome::Success,
            inserted: 0,
            diagnostics: Vec::new(),
        };

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let cleaned = remove_control_and_whitespace(raw, QUOTED_IGNORABLES);

            if cleaned.chars().count() > MAX_LINE_LEN {
                warn!(line, length = cleaned.len(), "line exceeds {MAX_LINE_LEN} characters; reading stopped");
                report.diagnostics.push(Diagnostic {
                    line: Some(line),
                    message: format!(
                        "line exceeds {MAX_LINE_LEN} characters; the rest of the file was not read"
                    ),
                    text: raw.to_string(),
                });
                break;
            }

            match codec::parse_entry(&cleaned, &ctx) {
                LineParse::Blank | LineParse::Comment => {}
                LineParse::Entry(key, value) => match config.insert_value(key.clone(), value) {
                    Outcome::Success => {
                        debug!(line, key = %key, "entry read");
                        report.inserted += 1;
                    }
                    _ => {
                        warn!(line, key = %key, "duplicate key; keeping the first value");
                        report.diagnostics.push(Diagnostic {
                            line: Some(line),
                            message: format!("{key} is already assigned; value ignored"),
                            text: raw.to_string(),
                        });
                    }
                },
                LineParse::Rejected(message) => {
                    warn!(line, "{message}");
                    report.diagnostics.push(Diagnostic {
                        line: Some(line),
                        message,
                        text: raw.to_string(),
                    });
                }
            }
        }

        if !report.diagnostics.is_empty() {
            report.outcome = Outcome::DataIncomplete;
        }
        report
    }

    /// Reads `path` into a fresh [`Config`].
    pub fn load(&self, path: &Path) -> Result<(Config, ReadReport), ConfigError> {
        let mut config = Config::new();
        let report = self.read(path, &mut config)?;
        Ok((config, report))
    }

    /// Renders `config` as file text.
    ///
    /// Entries come out in key order, one blank line between scopes.
    /// Entries that cannot be represented are left out and reported.
    pub fn render(&self, config: &Config, format_spec: bool) -> (String, WriteReport) {
        let mut out = String::new();
        let mut report = WriteReport {
            outcome: Outcome::Success,
            written: 0,
            diagnostics: Vec::new(),
        };
        let mut current_scope: Option<&str> = None;

        for (key, value) in config {
            let line = match codec::format_entry(key, value) {
                Ok(line) => line,
                Err(e) => {
                    warn!(key = %key, "entry not written: {e}");
                    report.diagnostics.push(Diagnostic {
                        line: None,
                        message: e.to_string(),
                        text: key.to_string(),
                    });
                    continue;
                }
            };
            let cleaned_len = remove_control_and_whitespace(&line, QUOTED_IGNORABLES).len();
            if cleaned_len > MAX_LINE_LEN {
                warn!(key = %key, length = cleaned_len, "entry not written: line too long");
                report.diagnostics.push(Diagnostic {
                    line: None,
                    message: format!("line would exceed {MAX_LINE_LEN} characters"),
                    text: key.to_string(),
                });
                continue;
            }

            if current_scope.is_some_and(|scope| scope != key.scope()) {
                out.push('\n');
            }
            current_scope = Some(key.scope());
            out.push_str(&line);
            out.push('\n');
            report.written += 1;
        }

        if format_spec {
            out.push('\n');
            for line in FORMAT_SPEC {
                out.push_str(line);
                out.push('\n');
            }
        }
        out.push_str(END_MARKER);
        out.push('\n');

        if !report.diagnostics.is_empty() {
            report.outcome = Outcome::DataIncomplete;
        }
        (out, report)
    }

    /// Writes `config` to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be opened or written.
    pub fn write(&self, path: &Path, config: &Config, mode: WriteMode) -> Result<WriteReport, ConfigError> {
        let (text, report) = self.render(config, mode.format_spec);
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut options = OpenOptions::new();
        options.create(true);
        if mode.overwrite {
            options.write(true).truncate(true);
        } else {
            options.append(true);
        }
        let mut file = options.open(path).map_err(io_err)?;
        file.write_all(text.as_bytes()).map_err(io_err)?;

        info!(
            path = %path.display(),
            written = report.written,
            skipped = report.diagnostics.len(),
            overwrite = mode.overwrite,
            "configuration written"
        );
        Ok(report)
    }
}

/// Appends `diagnostics` to `path` as a comment block.
fn append_diagnostics(path: &Path, ends_with_newline: bool, diagnostics: &[Diagnostic]) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut block = String::new();
    if !ends_with_newline {
        block.push('\n');
    }
    block.push_str(DIAGNOSTICS_HEADER);
    block.push('\n');
    for diagnostic in diagnostics {
        block.push_str(&diagnostic.to_comment());
        block.push('\n');
    }

    let mut file = OpenOptions::new().append(true).open(path).map_err(io_err)?;
    file.write_all(block.as_bytes()).map_err(io_err)?;
    debug!(path = %path.display(), count = diagnostics.len(), "diagnostics appended");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value::{DataType, Value, Vec4};
    use crate::domain::Key;
    use crate::text::path::{MockFileSystem, PathInfo};

    fn io_without_disk() -> ConfigIo {
        let mut fs = MockFileSystem::new();
        fs.expect_inspect().returning(|_| PathInfo::default());
        ConfigIo::with_filesystem(Box::new(fs))
    }

    #[test]
    fn test_read_str_inserts_entries_and_skips_comments() {
        // Arrange
        let io = io_without_disk();
        let mut config = Config::new();
        let text = "# header\n\nINT -- MyScope :: Count = 42\r\nBOOL -- :: Debug = false\n";

        // Act
        let report = io.read_str(text, &mut config);

        // Assert
        assert_eq!(report.outcome, Outcome::Success);
        assert_eq!(report.inserted, 2);
        assert_eq!(config.retrieve::<i32>("MyScope", "Count", DataType::Int), Some(&42));
        assert_eq!(config.retrieve::<bool>("", "Debug", DataType::Bool), Some(&false));
    }

    #[test]
    fn test_read_str_reports_bad_lines_and_keeps_going() {
        let io = io_without_disk();
        let mut config = Config::new();

        let report = io.read_str("garbage\nINT -- S :: F = 1\nINT -- S :: G = x\n", &mut config);

        assert_eq!(report.outcome, Outcome::DataIncomplete);
        assert_eq!(report.inserted, 1);
        let lines: Vec<Option<usize>> = report.diagnostics.iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![Some(1), Some(3)]);
    }

    #[test]
    fn test_read_str_duplicate_keeps_first_value() {
        let io = io_without_disk();
        let mut config = Config::new();

        let report = io.read_str("INT -- S :: F = 1\nINT -- S :: F = 2\n", &mut config);

        assert_eq!(report.outcome, Outcome::DataIncomplete);
        assert_eq!(config.retrieve::<i32>("S", "F", DataType::Int), Some(&1));
        assert!(report.diagnostics[0].message.contains("already assigned"));
        assert_eq!(report.diagnostics[0].line, Some(2));
    }

    #[test]
    fn test_read_str_line_at_ceiling_parses() {
        // "STRING--S::F=L\"" + body + "\"" must be exactly 255 characters.
        let prefix = "STRING--S::F=L\"";
        let body = "x".repeat(MAX_LINE_LEN - prefix.len() - 1);
        let line = format!("{prefix}{body}\"");
        assert_eq!(line.len(), MAX_LINE_LEN);

        let io = io_without_disk();
        let mut config = Config::new();
        let report = io.read_str(&line, &mut config);

        assert_eq!(report.outcome, Outcome::Success);
        assert_eq!(config.len(), 1);
    }

    #[test]
    fn test_read_str_stops_at_oversized_line() {
        // Arrange
        let long = format!("STRING -- S :: Long = L\"{}\"", "y".repeat(300));
        let text = format!("INT -- S :: Before = 1\n{long}\nINT -- S :: After = 2\n");
        let io = io_without_disk();
        let mut config = Config::new();

        // Act
        let report = io.read_str(&text, &mut config);

        // Assert
        assert_eq!(report.outcome, Outcome::DataIncomplete);
        assert!(config.contains("S", "Before"));
        assert!(!config.contains("S", "Long"));
        assert!(!config.contains("S", "After"));
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].line, Some(2));
    }

    #[test]
    fn test_ceiling_counts_cleaned_characters() {
        // Padding outside quotes is stripped before the length check.
        let line = format!("INT -- S :: F = 1{}", " ".repeat(400));
        let io = io_without_disk();
        let mut config = Config::new();
        assert_eq!(io.read_str(&line, &mut config).outcome, Outcome::Success);
    }

    #[test]
    fn test_render_groups_scopes_and_ends_with_marker() {
        // Arrange
        let mut config = Config::new();
        config.insert("B", "x", DataType::Int, 2).unwrap();
        config.insert("A", "y", DataType::Int, 1).unwrap();
        config.insert("A", "z", DataType::Bool, true).unwrap();

        // Act
        let (text, report) = ConfigIo::new().render(&config, false);

        // Assert
        assert_eq!(report.written, 3);
        assert_eq!(
            text,
            "INT\t--\tA\t::\ty\t=\t1\nBOOL\t--\tA\t::\tz\t=\ttrue\n\nINT\t--\tB\t::\tx\t=\t2\n# --- end of configuration ---\n"
        );
    }

    #[test]
    fn test_render_with_format_spec_includes_description() {
        let (text, _) = ConfigIo::new().render(&Config::new(), true);
        assert!(text.contains("# Format: DATATYPE -- SCOPE :: FIELD = VALUE"));
        assert!(text.ends_with(&format!("{END_MARKER}\n")));
    }

    #[test]
    fn test_render_skips_unrepresentable_entries() {
        let mut config = Config::new();
        config
            .insert("S", "Name", DataType::String, "caf\u{e9}".to_string())
            .unwrap();
        config.insert("S", "Ok", DataType::Int, 5).unwrap();
        config
            .insert("S", "Huge", DataType::String, "z".repeat(300))
            .unwrap();

        let (text, report) = ConfigIo::new().render(&config, false);

        assert_eq!(report.outcome, Outcome::DataIncomplete);
        assert_eq!(report.written, 1);
        assert_eq!(report.diagnostics.len(), 2);
        assert!(text.contains("Ok"));
        assert!(!text.contains("Name"));
    }

    #[test]
    fn test_render_then_read_reproduces_config() {
        // Arrange
        let mut original = Config::new();
        original
            .insert("UI", "Title", DataType::String, "Main \"Menu\"".to_string())
            .unwrap();
        original
            .insert("UI", "Tint", DataType::Color, Vec4::new(1.0, 0.0, 0.0, 1.0))
            .unwrap();
        original.insert("Physics", "Gravity", DataType::Double, -9.81).unwrap();
        let io = io_without_disk();

        // Act
        let (text, _) = io.render(&original, true);
        let mut restored = Config::new();
        let report = io.read_str(&text, &mut restored);

        // Assert
        assert_eq!(report.outcome, Outcome::Success);
        assert_eq!(restored, original);
    }

    #[test]
    fn test_diagnostic_comment_is_capped_and_single_line() {
        let diagnostic = Diagnostic {
            line: Some(7),
            message: "bad\nthing".to_string(),
            text: "q".repeat(600),
        };

        let comment = diagnostic.to_comment();

        assert!(comment.starts_with("# line 7: bad thing: "));
        assert_eq!(comment.len(), MAX_LINE_LEN);
        assert!(!comment.contains('\n'));
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let path = std::env::temp_dir().join(format!("scopecfg-missing-{}.cfg", uuid::Uuid::new_v4()));
        let mut config = Config::new();
        let result = ConfigIo::new().read(&path, &mut config);
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_key_with_empty_scope_renders_and_reads_back() {
        let io = io_without_disk();
        let mut config = Config::new();
        config.insert_value(Key::new("", "Root").unwrap(), Value::Int(3));
        let (text, _) = io.render(&config, false);
        let mut back = Config::new();
        io.read_str(&text, &mut back);
        assert_eq!(back, config);
    }
}
