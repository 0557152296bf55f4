//! The `(scope, field)` key identifying a configuration entry.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::store::ConfigError;

/// Two-part key of a configuration entry.
///
/// `scope` may be empty, `field` may not.  The derived ordering compares
/// `scope` first and `field` second, which is what makes [`super::Config`]
/// iterate (and therefore serialize) grouped by scope in alphabetical order.
///
/// Keys are immutable once constructed; there are no setters.  Deserializing
/// goes through [`Key::new`], so the empty-field rule holds there too.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "KeyParts")]
pub struct Key {
    scope: String,
    field: String,
}

#[derive(Deserialize)]
struct KeyParts {
    scope: String,
    field: String,
}

impl TryFrom<KeyParts> for Key {
    type Error = ConfigError;

    fn try_from(parts: KeyParts) -> Result<Self, Self::Error> {
        Key::new(parts.scope, parts.field)
    }
}

impl Key {
    /// Creates a key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidInput`] if `field` is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use scopecfg_core::Key;
    ///
    /// let key = Key::new("Renderer", "Width").unwrap();
    /// assert_eq!(key.to_string(), "Renderer::Width");
    /// assert!(Key::new("Renderer", "").is_err());
    /// ```
    pub fn new(scope: impl Into<String>, field: impl Into<String>) -> Result<Self, ConfigError> {
        let field = field.into();
        if field.is_empty() {
            return Err(ConfigError::InvalidInput(
                "configuration field name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            scope: scope.into(),
            field,
        })
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.scope, self.field)
    }
}
