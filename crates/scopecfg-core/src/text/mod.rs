//! Text utilities shared by the reader and the writer.
//!
//! - **`scanner`** – quote- and escape-aware walking of a line, and the
//!   cleaning step every line goes through before it is parsed.
//! - **`literal`** – one parser and one serializer per value literal form.
//! - **`path`** – validation of file and directory names, with a
//!   [`path::FileSystem`] seam so tests never touch the disk.

pub mod literal;
pub mod path;
pub mod scanner;

pub use literal::LiteralError;
pub use path::{FileSystem, PathInfo, PathKind, StdFileSystem};
