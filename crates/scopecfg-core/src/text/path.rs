//! Filesystem-name validation for `FILENAME` and `DIRECTORY` literals.
//!
//! Validation happens in two passes.  [`validate_name`] checks the text
//! alone; [`check_plausible`] then asks a [`FileSystem`] whether the name can
//! refer to something of the right kind.  Both return human-readable
//! messages that the reader copies into its diagnostics verbatim.
//!
//! # Testability
//!
//! The [`FileSystem`] trait lets unit tests describe an imaginary directory
//! tree without touching the disk.

use std::path::Path;

use super::literal::LiteralError;

/// Characters that may not appear anywhere in a name.
const RESERVED: &[char] = &['<', '>', '"', '|', '?', '*'];

/// What a [`FileSystem`] knows about a path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathInfo {
    pub exists: bool,
    /// Meaningful only when `exists` is `true`.
    pub is_file: bool,
    /// `true` if the path has a non-empty parent component.
    pub has_parent_path: bool,
    /// Short description suitable for a diagnostic.
    pub message: String,
}

/// Inspection of paths on some filesystem.
#[cfg_attr(test, mockall::automock)]
pub trait FileSystem {
    fn inspect(&self, path: &Path) -> PathInfo;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn inspect(&self, path: &Path) -> PathInfo {
        let has_parent_path = path
            .parent()
            .map(|p| !p.as_os_str().is_empty())
            .unwrap_or(false);
        match std::fs::metadata(path) {
            Ok(meta) => PathInfo {
                exists: true,
                is_file: meta.is_file(),
                has_parent_path,
                message: if meta.is_file() {
                    format!("'{}' is an existing file", path.display())
                } else {
                    format!("'{}' is an existing directory", path.display())
                },
            },
            Err(e) => PathInfo {
                exists: false,
                is_file: false,
                has_parent_path,
                message: format!("'{}' is not accessible: {e}", path.display()),
            },
        }
    }
}

/// Kind of filesystem object a name must denote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
}

impl PathKind {
    fn noun(self) -> &'static str {
        match self {
            PathKind::File => "file",
            PathKind::Directory => "directory",
        }
    }
}

/// Checks the textual form of a file or directory name.
///
/// Rules:
/// - not empty, no control characters, none of `< > " | ? *`;
/// - no path segment starts or ends with `_` (`.` and `..` are exempt);
/// - a file's last segment contains exactly one `.`, with text on both sides;
/// - a directory's last segment contains no `.` unless it is `.` or `..`.
///
/// # Errors
///
/// Returns [`LiteralError::Path`] describing the first violated rule.
pub fn validate_name(name: &str, kind: PathKind) -> Result<(), LiteralError> {
    if name.is_empty() {
        return Err(LiteralError::Path(format!("empty {} name", kind.noun())));
    }
    if let Some((pos, ch)) = name.char_indices().find(|(_, c)| c.is_control()) {
        return Err(LiteralError::Path(format!(
            "control character U+{:04X} at offset {pos} in '{}'",
            ch as u32,
            name.escape_debug()
        )));
    }
    if let Some(ch) = name.chars().find(|c| RESERVED.contains(c)) {
        return Err(LiteralError::Path(format!("reserved character '{ch}' in '{name}'")));
    }

    let segments: Vec<&str> = name.split(['/', '\\']).collect();
    for segment in segments.iter().filter(|s| !s.is_empty() && **s != "." && **s != "..") {
        if segment.starts_with('_') || segment.ends_with('_') {
            return Err(LiteralError::Path(format!(
                "segment '{segment}' of '{name}' starts or ends with an underscore"
            )));
        }
    }

    let last = segments.last().copied().unwrap_or_default();
    match kind {
        PathKind::File => {
            if last.is_empty() {
                return Err(LiteralError::Path(format!(
                    "'{name}' ends with a separator; expected a file name"
                )));
            }
            let dots = last.matches('.').count();
            if dots != 1 || last.starts_with('.') || last.ends_with('.') {
                return Err(LiteralError::Path(format!(
                    "file name '{last}' must contain exactly one dot between name and extension"
                )));
            }
        }
        PathKind::Directory => {
            if last != "." && last != ".." && last.contains('.') {
                return Err(LiteralError::Path(format!(
                    "directory name '{last}' must not contain a dot"
                )));
            }
        }
    }
    Ok(())
}

/// Checks that `name` can plausibly denote a `kind` on `fs`.
///
/// An existing path must have the right kind, and when the path does not
/// exist its parent, if it exists, must be a directory.  Names that merely do
/// not exist yet are accepted; the returned note says so.
///
/// # Errors
///
/// Returns [`LiteralError::Path`] carrying the filesystem's own message when
/// the path, or its parent, exists with the wrong kind.
pub fn check_plausible(
    name: &str,
    kind: PathKind,
    fs: &dyn FileSystem,
) -> Result<Option<String>, LiteralError> {
    let path = Path::new(name);
    let info = fs.inspect(path);

    if info.exists {
        return match (kind, info.is_file) {
            (PathKind::File, true) | (PathKind::Directory, false) => Ok(None),
            _ => Err(LiteralError::Path(format!(
                "expected a {}: {}",
                kind.noun(),
                info.message
            ))),
        };
    }

    if info.has_parent_path {
        if let Some(parent) = path.parent() {
            let parent_info = fs.inspect(parent);
            if parent_info.exists && parent_info.is_file {
                return Err(LiteralError::Path(format!(
                    "parent of '{name}' is not a directory: {}",
                    parent_info.message
                )));
            }
            if !parent_info.exists {
                return Ok(Some(format!(
                    "{} '{name}' does not exist yet: {}",
                    kind.noun(),
                    parent_info.message
                )));
            }
        }
    }
    Ok(Some(format!("{} '{name}' does not exist yet: {}", kind.noun(), info.message)))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
