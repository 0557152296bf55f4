//! # scopecfg-core
//!
//! Typed configuration store keyed by `(scope, field)`, with a flat text file
//! format and an ownership policy deciding which store a consumer uses.
//!
//! # Architecture overview
//!
//! - **`domain`** – [`Key`], the tagged [`Value`] and the ordered [`Config`]
//!   map.  No I/O.
//!
//! - **`text`** – the character-level pieces: quote/escape-aware line
//!   cleaning, literal parsers and serializers, and file-name validation
//!   against a [`text::FileSystem`].
//!
//! - **`format`** – [`ConfigIo`], which reads files line by line into a
//!   [`Config`], collects diagnostics for every line it cannot use, and writes
//!   a [`Config`] back out in canonical form.
//!
//! - **`user`** – [`ConfigUser`] and the process-wide instance in
//!   [`user::global`].
//!
//! A file looks like this:
//!
//! ```text
//! INT     --  Window  ::  Width   =  1280
//! COLOR   --  UI      ::  Tint    =  (255,128,0,255)
//! STRING  --  UI      ::  Title   =  L"Main Menu"
//! ```

pub mod domain;
pub mod format;
pub mod text;
pub mod user;

pub use domain::key::Key;
pub use domain::store::{Config, ConfigError, Outcome};
pub use domain::value::{ConfigValue, DataType, Value, Vec4};
pub use format::io::{ConfigIo, Diagnostic, ReadReport, WriteMode, WriteReport};
pub use user::{ConfigHandle, ConfigUser, Merge, Mode};
