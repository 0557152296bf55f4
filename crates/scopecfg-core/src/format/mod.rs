//! The flat-text file format.
//!
//! [`codec`] converts single lines to and from entries; [`io`] applies it to
//! whole files, collects diagnostics and writes them back.

pub mod codec;
pub mod io;

pub use codec::{format_entry, parse_entry, LineParse, ParseContext};
pub use io::{ConfigIo, Diagnostic, ReadReport, WriteMode, WriteReport, END_MARKER, MAX_LINE_LEN};
