//! The typed, ordered configuration store.

use std::collections::btree_map::{self, BTreeMap};
use std::path::PathBuf;

use thiserror::Error;

use super::key::Key;
use super::value::{ConfigValue, DataType, Value};

/// Errors that callers must not ignore: usage errors and I/O failures.
///
/// Expected conditions such as "not found" or "already assigned" are not
/// errors; they travel as an [`Outcome`] inside `Ok`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required argument was empty or otherwise unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The payload type cannot carry the requested datatype.
    #[error("type mismatch for {key}: payload cannot be stored as {datatype}")]
    TypeMismatch { key: Key, datatype: DataType },

    /// An operation was invoked in the wrong ownership mode or with a
    /// forbidden handle.
    #[error("usage mismatch: {0}")]
    UsageMismatch(String),

    /// A file could not be opened, read or written.
    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Non-fatal result of an operation that otherwise succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Everything requested was done.
    Success,
    /// The key already had a value; the new value was discarded.
    AlreadyAssigned,
    /// A required entry was absent.
    DataNotFound,
    /// Some lines or entries were skipped; see the accompanying diagnostics.
    DataIncomplete,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        self == Outcome::Success
    }
}

/// Ordered map from [`Key`] to [`Value`], one value per key.
///
/// The store owns every value it holds.  Retrieval hands out borrows tied to
/// the store's lifetime; there is no way to change a value in place, only to
/// [`clear`](Config::clear) the store and insert again.
///
/// Not safe for concurrent mutation.  Share it through
/// [`crate::user::ConfigHandle`], which cannot leave its thread.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    entries: BTreeMap<Key, Value>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `(scope, field)` tagged as `datatype`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidInput`] if `field` is empty and
    /// [`ConfigError::TypeMismatch`] if `T` cannot be stored as `datatype`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use scopecfg_core::{Config, DataType, Outcome};
    ///
    /// let mut config = Config::new();
    /// let first = config.insert("Window", "Width", DataType::Int, 1280).unwrap();
    /// let second = config.insert("Window", "Width", DataType::Int, 640).unwrap();
    /// assert_eq!(first, Outcome::Success);
    /// assert_eq!(second, Outcome::AlreadyAssigned);
    /// assert_eq!(config.retrieve::<i32>("Window", "Width", DataType::Int), Some(&1280));
    /// ```
    pub fn insert<T: ConfigValue>(
        &mut self,
        scope: &str,
        field: &str,
        datatype: DataType,
        value: T,
    ) -> Result<Outcome, ConfigError> {
        let key = Key::new(scope, field)?;
        match value.into_value(datatype) {
            Ok(value) => Ok(self.insert_value(key, value)),
            Err(_) => Err(ConfigError::TypeMismatch { key, datatype }),
        }
    }

    /// Stores an already tagged value.  Never overwrites.
    pub fn insert_value(&mut self, key: Key, value: Value) -> Outcome {
        match self.entries.entry(key) {
            btree_map::Entry::Occupied(_) => Outcome::AlreadyAssigned,
            btree_map::Entry::Vacant(slot) => {
                slot.insert(value);
                Outcome::Success
            }
        }
    }

    /// Borrows the value at `(scope, field)` if it exists and is tagged
    /// `datatype`.
    ///
    /// Absence is the normal way optional configuration shows up, so a miss
    /// is silent.
    pub fn retrieve<T: ConfigValue>(&self, scope: &str, field: &str, datatype: DataType) -> Option<&T> {
        let key = Key::new(scope, field).ok()?;
        let value = self.entries.get(&key)?;
        if value.datatype() != datatype {
            return None;
        }
        T::from_value(value)
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains(&self, scope: &str, field: &str) -> bool {
        Key::new(scope, field)
            .map(|key| self.entries.contains_key(&key))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries ordered by scope, then field.
    pub fn iter(&self) -> btree_map::Iter<'_, Key, Value> {
        self.entries.iter()
    }

    /// Drops every stored value.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<'a> IntoIterator for &'a Config {
    type Item = (&'a Key, &'a Value);
    type IntoIter = btree_map::Iter<'a, Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value::Vec4;

    #[test]
    fn test_insert_then_retrieve_returns_borrowed_value() {
        // Arrange
        let mut config = Config::new();

        // Act
        let outcome = config
            .insert("MyScope", "Count", DataType::Int, 42)
            .unwrap();

        // Assert
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(config.retrieve::<i32>("MyScope", "Count", DataType::Int), Some(&42));
    }

    #[test]
    fn test_insert_empty_field_is_invalid_input() {
        let mut config = Config::new();
        let result = config.insert("Scope", "", DataType::Bool, true);
        assert!(matches!(result, Err(ConfigError::InvalidInput(_))));
        assert!(config.is_empty());
    }

    #[test]
    fn test_insert_with_incompatible_payload_is_type_mismatch() {
        let mut config = Config::new();
        let result = config.insert("Scope", "Flag", DataType::Int, true);
        assert!(matches!(result, Err(ConfigError::TypeMismatch { datatype: DataType::Int, .. })));
        assert!(config.is_empty());
    }

    #[test]
    fn test_second_insert_reports_already_assigned_and_keeps_first_value() {
        // Arrange
        let mut config = Config::new();
        config
            .insert("S", "Name", DataType::String, "first".to_string())
            .unwrap();

        // Act
        let outcome = config
            .insert("S", "Name", DataType::String, "second".to_string())
            .unwrap();

        // Assert
        assert_eq!(outcome, Outcome::AlreadyAssigned);
        assert_eq!(
            config.retrieve::<String>("S", "Name", DataType::String).map(String::as_str),
            Some("first")
        );
        assert_eq!(config.len(), 1);
    }

    #[test]
    fn test_duplicate_with_different_datatype_still_already_assigned() {
        let mut config = Config::new();
        config.insert("S", "X", DataType::Int, 1).unwrap();
        let outcome = config.insert("S", "X", DataType::Double, 1.0).unwrap();
        assert_eq!(outcome, Outcome::AlreadyAssigned);
        assert_eq!(config.retrieve::<f64>("S", "X", DataType::Double), None);
    }

    #[test]
    fn test_retrieve_missing_key_returns_none() {
        let config = Config::new();
        assert_eq!(config.retrieve::<i32>("Nope", "Nothing", DataType::Int), None);
    }

    #[test]
    fn test_retrieve_with_wrong_datatype_returns_none() {
        let mut config = Config::new();
        config
            .insert("Paths", "Log", DataType::Filename, "log.txt".to_string())
            .unwrap();

        // Same payload type, different tag.
        assert_eq!(config.retrieve::<String>("Paths", "Log", DataType::String), None);
        assert_eq!(config.retrieve::<String>("Paths", "Log", DataType::Directory), None);
        assert!(config.retrieve::<String>("Paths", "Log", DataType::Filename).is_some());
    }

    #[test]
    fn test_retrieve_with_wrong_payload_type_returns_none() {
        let mut config = Config::new();
        config.insert("S", "F", DataType::Int, 7).unwrap();
        assert_eq!(config.retrieve::<f64>("S", "F", DataType::Int), None);
    }

    #[test]
    fn test_retrieve_empty_field_returns_none() {
        let config = Config::new();
        assert_eq!(config.retrieve::<bool>("S", "", DataType::Bool), None);
    }

    #[test]
    fn test_iteration_is_sorted_by_scope_then_field_for_any_insert_order() {
        // Arrange
        let mut config = Config::new();
        for (scope, field) in [("b", "z"), ("a", "y"), ("", "q"), ("b", "a"), ("a", "b")] {
            config.insert(scope, field, DataType::Bool, true).unwrap();
        }

        // Act
        let keys: Vec<String> = config.iter().map(|(k, _)| k.to_string()).collect();

        // Assert
        assert_eq!(keys, vec!["::q", "a::b", "a::y", "b::a", "b::z"]);
    }

    #[test]
    fn test_iteration_is_restartable() {
        let mut config = Config::new();
        config.insert("s", "a", DataType::Int, 1).unwrap();
        config.insert("s", "b", DataType::Int, 2).unwrap();
        let first: Vec<_> = config.iter().collect();
        let second: Vec<_> = (&config).into_iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_clear_drops_every_entry() {
        let mut config = Config::new();
        config
            .insert("UI", "Tint", DataType::Color, Vec4::new(1.0, 0.0, 0.0, 1.0))
            .unwrap();
        config.clear();
        assert!(config.is_empty());
        assert!(!config.contains("UI", "Tint"));
    }

    #[test]
    fn test_contains_reports_presence() {
        let mut config = Config::new();
        config.insert("", "Root", DataType::Bool, false).unwrap();
        assert!(config.contains("", "Root"));
        assert!(!config.contains("", "Other"));
        assert!(!config.contains("", ""));
    }

    #[test]
    fn test_outcome_is_success() {
        assert!(Outcome::Success.is_success());
        assert!(!Outcome::DataIncomplete.is_success());
    }
}
