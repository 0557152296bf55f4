//! Command-line definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use scopecfg_core::DataType;

/// Check, normalize and inspect scopecfg configuration files
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the tool's own TOML settings file
    #[arg(short, long, global = true)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read a file and report every problem found in it
    Check {
        /// Configuration file to read
        file: PathBuf,
    },

    /// Rewrite a file in canonical form
    Normalize {
        /// Configuration file to rewrite
        file: PathBuf,

        /// Append a description of the file format
        #[arg(long)]
        format_spec: bool,
    },

    /// Print one value in its literal form
    Get {
        /// Configuration file to read
        file: PathBuf,
        /// Datatype name, e.g. INT or FILENAME
        datatype: DataType,
        /// Scope of the entry (may be empty)
        scope: String,
        /// Field of the entry
        field: String,
    },

    /// Print every entry in key order
    Dump {
        /// Configuration file to read
        file: PathBuf,

        /// Print JSON instead of configuration lines
        #[arg(long)]
        json: bool,
    },
}
