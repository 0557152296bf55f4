//! Implementations of the `scopecfg` subcommands.
//!
//! Each command writes its report to `out` and returns a [`Status`] that
//! `main` turns into the process exit code.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use tracing::{info, warn};

use scopecfg_core::format::codec;
use scopecfg_core::{Config, ConfigIo, DataType, Diagnostic, Key, Outcome, Value, WriteMode};

use crate::cli::Command;
use crate::settings::ToolSettings;

/// How a command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Everything was read (and written) without problems.
    Complete,
    /// Some lines or entries were skipped.
    Incomplete,
    /// The requested entry does not exist.
    NotFound,
}

impl Status {
    pub fn exit_code(self) -> u8 {
        match self {
            Status::Complete => 0,
            Status::Incomplete | Status::NotFound => 1,
        }
    }

    fn from_outcome(outcome: Outcome) -> Self {
        if outcome.is_success() {
            Status::Complete
        } else {
            Status::Incomplete
        }
    }
}

/// Runs `command`, writing human-readable output to `out`.
///
/// # Errors
///
/// Returns an error if a file cannot be read or written, or if `out` fails.
pub fn run(command: &Command, settings: &ToolSettings, out: &mut dyn Write) -> anyhow::Result<Status> {
    let io = ConfigIo::new();
    match command {
        Command::Check { file } => check(&io, file, out),
        Command::Normalize { file, format_spec } => {
            normalize(&io, file, *format_spec || settings.format_spec, settings.backup, out)
        }
        Command::Get {
            file,
            datatype,
            scope,
            field,
        } => get(&io, file, *datatype, scope, field, out),
        Command::Dump { file, json } => dump(&io, file, *json, out),
    }
}

fn load(io: &ConfigIo, file: &Path) -> anyhow::Result<(Config, Vec<Diagnostic>, Outcome)> {
    let (config, report) = io
        .load(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    Ok((config, report.diagnostics, report.outcome))
}

fn print_diagnostics(out: &mut dyn Write, diagnostics: &[Diagnostic]) -> anyhow::Result<()> {
    for diagnostic in diagnostics {
        writeln!(out, "  {diagnostic}")?;
    }
    Ok(())
}

fn check(io: &ConfigIo, file: &Path, out: &mut dyn Write) -> anyhow::Result<Status> {
    let (config, diagnostics, outcome) = load(io, file)?;
    writeln!(out, "{}: {} entries", file.display(), config.len())?;
    if !diagnostics.is_empty() {
        writeln!(out, "{} problem(s):", diagnostics.len())?;
        print_diagnostics(out, &diagnostics)?;
    }
    Ok(Status::from_outcome(outcome))
}

fn backup_path(file: &Path) -> PathBuf {
    let mut name = OsString::from(file.as_os_str());
    name.push(".bak");
    PathBuf::from(name)
}

fn normalize(
    io: &ConfigIo,
    file: &Path,
    format_spec: bool,
    backup: bool,
    out: &mut dyn Write,
) -> anyhow::Result<Status> {
    // The read below appends its diagnostics to the file, so copy first.
    let backup_file = if backup {
        let target = backup_path(file);
        fs::copy(file, &target)
            .with_context(|| format!("failed to back up {} to {}", file.display(), target.display()))?;
        info!(backup = %target.display(), "original kept");
        Some(target)
    } else {
        None
    };

    let (config, read_diagnostics, read_outcome) = load(io, file)?;

    if !read_outcome.is_success() {
        let Some(target) = backup_file else {
            warn!(file = %file.display(), "not rewriting an incompletely read file without a backup");
            writeln!(
                out,
                "{}: not rewritten, {} problem(s) while reading and no backup kept",
                file.display(),
                read_diagnostics.len()
            )?;
            print_diagnostics(out, &read_diagnostics)?;
            return Ok(Status::Incomplete);
        };
        warn!(file = %file.display(), backup = %target.display(), "rewriting without the lines that could not be read");
        writeln!(
            out,
            "warning: lines that could not be read are dropped; the original is in {}",
            target.display()
        )?;
    }

    let report = io
        .write(file, &config, WriteMode { overwrite: true, format_spec })
        .with_context(|| format!("failed to write {}", file.display()))?;

    writeln!(out, "{}: {} entries written", file.display(), report.written)?;
    print_diagnostics(out, &read_diagnostics)?;
    print_diagnostics(out, &report.diagnostics)?;

    if read_outcome.is_success() && report.outcome.is_success() {
        Ok(Status::Complete)
    } else {
        Ok(Status::Incomplete)
    }
}

fn get(
    io: &ConfigIo,
    file: &Path,
    datatype: DataType,
    scope: &str,
    field: &str,
    out: &mut dyn Write,
) -> anyhow::Result<Status> {
    let key = Key::new(scope, field)?;
    let (config, _, _) = load(io, file)?;
    let Some(value) = config.get(&key).filter(|v| v.datatype() == datatype) else {
        writeln!(out, "{datatype} {key} not found")?;
        return Ok(Status::NotFound);
    };
    let literal = (codec::codec(datatype).serialize)(value)
        .with_context(|| format!("{key} cannot be printed"))?;
    writeln!(out, "{literal}")?;
    Ok(Status::Complete)
}

#[derive(Serialize)]
struct DumpEntry<'a> {
    scope: &'a str,
    field: &'a str,
    #[serde(flatten)]
    value: &'a Value,
}

fn dump(io: &ConfigIo, file: &Path, json: bool, out: &mut dyn Write) -> anyhow::Result<Status> {
    let (config, _, outcome) = load(io, file)?;
    if json {
        let entries: Vec<DumpEntry<'_>> = config
            .iter()
            .map(|(key, value)| DumpEntry {
                scope: key.scope(),
                field: key.field(),
                value,
            })
            .collect();
        writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
    } else {
        let (text, _) = io.render(&config, false);
        out.write_all(text.as_bytes())?;
    }
    Ok(Status::from_outcome(outcome))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    struct Scratch(PathBuf);

    impl Scratch {
        fn with_file(contents: &str) -> (Self, PathBuf) {
            let dir = std::env::temp_dir().join(format!("scopecfg-cli-{}", Uuid::new_v4()));
            fs::create_dir_all(&dir).unwrap();
            let file = dir.join("app.cfg");
            fs::write(&file, contents).unwrap();
            (Self(dir), file)
        }
    }

    impl Drop for Scratch {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    fn run_to_string(command: Command, settings: &ToolSettings) -> (Status, String) {
        let mut out = Vec::new();
        let status = run(&command, settings, &mut out).unwrap();
        (status, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_check_reports_entry_count() {
        let (_dir, file) = Scratch::with_file("INT -- S :: A = 1\nBOOL -- S :: B = true\n");

        let (status, out) = run_to_string(Command::Check { file }, &ToolSettings::default());

        assert_eq!(status, Status::Complete);
        assert!(out.contains("2 entries"));
    }

    #[test]
    fn test_check_lists_problems_and_fails() {
        let (_dir, file) = Scratch::with_file("INT -- S :: A = one\n");

        let (status, out) = run_to_string(Command::Check { file }, &ToolSettings::default());

        assert_eq!(status, Status::Incomplete);
        assert_eq!(status.exit_code(), 1);
        assert!(out.contains("1 problem(s)"));
        assert!(out.contains("line 1"));
    }

    #[test]
    fn test_normalize_rewrites_canonically_and_keeps_backup() {
        // Arrange
        let original = "BOOL--B::x=true\n   INT -- A :: y = 2\n";
        let (_dir, file) = Scratch::with_file(original);

        // Act
        let (status, _) = run_to_string(
            Command::Normalize {
                file: file.clone(),
                format_spec: false,
            },
            &ToolSettings::default(),
        );

        // Assert
        assert_eq!(status, Status::Complete);
        let rewritten = fs::read_to_string(&file).unwrap();
        assert!(rewritten.starts_with("INT\t--\tA\t::\ty\t=\t2\n\nBOOL\t--\tB\t::\tx\t=\ttrue\n"));
        assert_eq!(fs::read_to_string(backup_path(&file)).unwrap(), original);
    }

    #[test]
    fn test_normalize_backup_is_taken_before_diagnostics_are_appended() {
        // Arrange
        let original = "INT -- S :: A = 1\nINT -- S :: B = oops\n";
        let (_dir, file) = Scratch::with_file(original);

        // Act
        let (status, out) = run_to_string(
            Command::Normalize {
                file: file.clone(),
                format_spec: false,
            },
            &ToolSettings::default(),
        );

        // Assert
        assert_eq!(status, Status::Incomplete);
        assert_eq!(fs::read(backup_path(&file)).unwrap(), original.as_bytes());
        assert!(out.contains("warning:"));
        assert!(fs::read_to_string(&file).unwrap().contains("INT\t--\tS\t::\tA\t=\t1"));
    }

    #[test]
    fn test_normalize_refuses_incomplete_read_without_backup() {
        // Arrange
        let long = format!("STRING -- S :: Long = L\"{}\"\n", "x".repeat(300));
        let original = format!("INT -- S :: A = 1\n{long}INT -- S :: C = 3\n");
        let (_dir, file) = Scratch::with_file(&original);
        let settings = ToolSettings {
            backup: false,
            ..ToolSettings::default()
        };

        // Act
        let (status, out) = run_to_string(
            Command::Normalize {
                file: file.clone(),
                format_spec: false,
            },
            &settings,
        );

        // Assert
        assert_eq!(status, Status::Incomplete);
        assert!(out.contains("not rewritten"), "{out}");
        let after = fs::read_to_string(&file).unwrap();
        assert!(after.starts_with(&original));
        assert!(!backup_path(&file).exists());
    }

    #[test]
    fn test_normalize_without_backup_setting_leaves_no_copy() {
        let (_dir, file) = Scratch::with_file("INT -- A :: y = 2\n");
        let settings = ToolSettings {
            backup: false,
            format_spec: true,
            ..ToolSettings::default()
        };

        run_to_string(
            Command::Normalize {
                file: file.clone(),
                format_spec: false,
            },
            &settings,
        );

        assert!(!backup_path(&file).exists());
        assert!(fs::read_to_string(&file).unwrap().contains("# Format:"));
    }

    #[test]
    fn test_get_prints_literal() {
        let (_dir, file) = Scratch::with_file("COLOR -- UI :: Tint = (255, 128, 0, 255)\n");

        let (status, out) = run_to_string(
            Command::Get {
                file,
                datatype: DataType::Color,
                scope: "UI".to_string(),
                field: "Tint".to_string(),
            },
            &ToolSettings::default(),
        );

        assert_eq!(status, Status::Complete);
        assert_eq!(out, "(255,128,0,255)\n");
    }

    #[test]
    fn test_get_with_wrong_datatype_is_not_found() {
        let (_dir, file) = Scratch::with_file("INT -- S :: F = 1\n");

        let (status, _) = run_to_string(
            Command::Get {
                file,
                datatype: DataType::Double,
                scope: "S".to_string(),
                field: "F".to_string(),
            },
            &ToolSettings::default(),
        );

        assert_eq!(status, Status::NotFound);
    }

    #[test]
    fn test_dump_json_lists_entries_in_key_order() {
        let (_dir, file) = Scratch::with_file("INT -- B :: x = 1\nBOOL -- A :: y = false\n");

        let (_, out) = run_to_string(Command::Dump { file, json: true }, &ToolSettings::default());

        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["scope"], "A");
        assert_eq!(parsed[0]["type"], "Bool");
        assert_eq!(parsed[0]["value"], false);
        assert_eq!(parsed[1]["field"], "x");
        assert_eq!(parsed[1]["value"], 1);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let file = std::env::temp_dir().join(format!("scopecfg-cli-missing-{}.cfg", Uuid::new_v4()));
        let mut out = Vec::new();
        let result = run(&Command::Check { file }, &ToolSettings::default(), &mut out);
        assert!(result.is_err());
    }
}
