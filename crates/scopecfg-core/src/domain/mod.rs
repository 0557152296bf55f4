//! Configuration entities with no I/O.
//!
//! Everything here is plain data: keys, tagged values and the ordered store
//! that holds them.  Reading and writing files lives in [`crate::format`];
//! ownership and sharing live in [`crate::user`].

pub mod key;
pub mod store;
pub mod value;

pub use key::Key;
pub use store::{Config, ConfigError, Outcome};
pub use value::{ConfigValue, DataType, UnknownDataType, Value, Vec4};
