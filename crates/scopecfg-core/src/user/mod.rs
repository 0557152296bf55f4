//! Which configuration a consumer reads from and writes to.
//!
//! A [`ConfigUser`] is created in one of three modes, fixed for its lifetime:
//!
//! - **Global** – always uses the process-wide instance from [`global`].
//! - **Shared** – uses a [`ConfigHandle`] supplied by someone else.  The
//!   global instance may not be supplied this way.
//! - **Private** – owns its own [`Config`], usually loaded from a file whose
//!   name is itself an entry in another configuration.
//!
//! The typed proxies ([`ConfigUser::insert`], [`ConfigUser::retrieve`])
//! resolve the active configuration per mode and log every miss, duplicate
//! and failure, returning only a simple result to the caller.
//!
//! # What is an ownership mode? (for beginners)
//!
//! Most of a program reads settings from one place, the global instance set
//! up at startup.  Some parts want their own settings instead.  A plugin
//! might keep its options in a separate file whose name is listed in the main
//! configuration:
//!
//! ```text
//! FILENAME  --  Plugins  ::  Audio  =  "plugins/audio.cfg"
//! ```
//!
//! A private [`ConfigUser`] looks up that `FILENAME` entry, reads the file it
//! names, and keeps the result to itself.  A shared user points at a
//! configuration owned by a sibling component, so several components see the
//! same edits.  Picking the mode once at construction means the code using
//! the proxies never has to know where its settings come from.
//!
//! # Why `Rc<RefCell<..>>`?
//!
//! `Rc` lets several users hold the same [`Config`], and `RefCell` lets any of
//! them change it through a shared handle.  Both are single-threaded types, so
//! the compiler rejects any attempt to send a handle to another thread.

pub mod global;

use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use tracing::{debug, error, info, warn};

use crate::domain::store::{Config, ConfigError, Outcome};
use crate::domain::value::{ConfigValue, DataType};
use crate::format::io::ConfigIo;

/// Reference-counted handle to a shared [`Config`].
///
/// `Rc` is neither `Send` nor `Sync`, so a handle can never reach another
/// thread.
pub type ConfigHandle = Rc<RefCell<Config>>;

pub fn new_handle(config: Config) -> ConfigHandle {
    Rc::new(RefCell::new(config))
}

/// How [`ConfigUser::load_private`] combines a file with an existing config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Merge {
    /// Discard the current config and use only the file's entries.
    #[default]
    Replace,
    /// Add the file's entries to the current config; existing keys win.
    Augment,
}

/// The ownership mode of a [`ConfigUser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Global,
    Shared,
    Private,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Global => "global",
            Mode::Shared => "shared",
            Mode::Private => "private",
        };
        f.write_str(name)
    }
}

enum Ownership {
    Global,
    Shared(Option<ConfigHandle>),
    Private(Option<Config>),
}

/// A consumer of configuration values.
///
/// # Examples
///
/// ```rust
/// use scopecfg_core::user::{new_handle, ConfigUser};
/// use scopecfg_core::{Config, DataType};
///
/// let handle = new_handle(Config::new());
/// let mut writer = ConfigUser::shared(Some(handle.clone())).unwrap();
/// let reader = ConfigUser::shared(Some(handle)).unwrap();
///
/// assert!(writer.insert("Window", "Width", DataType::Int, 1280));
/// assert_eq!(reader.retrieve::<i32>("Window", "Width", DataType::Int), Some(1280));
/// assert_eq!(reader.retrieve_or("Window", "Height", DataType::Int, 720), 720);
/// ```
pub struct ConfigUser {
    ownership: Ownership,
}

impl fmt::Debug for ConfigUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigUser")
            .field("mode", &self.mode())
            .field("has_config", &self.has_config())
            .finish()
    }
}

fn usage(message: String) -> ConfigError {
    error!("{message}");
    ConfigError::UsageMismatch(message)
}

fn with_handle<R>(handle: &ConfigHandle, f: impl FnOnce(Option<&Config>) -> R) -> R {
    let borrowed = handle.try_borrow();
    match borrowed {
        Ok(config) => f(Some(&*config)),
        Err(_) => {
            error!("configuration is being modified; treating it as absent");
            f(None)
        }
    }
}

fn with_handle_mut<R>(handle: &ConfigHandle, f: impl FnOnce(Option<&mut Config>) -> R) -> R {
    let borrowed = handle.try_borrow_mut();
    match borrowed {
        Ok(mut config) => f(Some(&mut *config)),
        Err(_) => {
            error!("configuration is already borrowed; treating it as absent");
            f(None)
        }
    }
}

impl ConfigUser {
    /// A consumer of the global instance.
    pub fn global() -> Self {
        Self {
            ownership: Ownership::Global,
        }
    }

    /// A consumer of a configuration shared with other consumers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UsageMismatch`] if `handle` is the global
    /// instance.
    pub fn shared(handle: Option<ConfigHandle>) -> Result<Self, ConfigError> {
        if handle.as_ref().is_some_and(global::is_global) {
            return Err(usage(
                "the global configuration cannot be used as a shared configuration".to_string(),
            ));
        }
        Ok(Self {
            ownership: Ownership::Shared(handle),
        })
    }

    /// A consumer that will own its configuration.  It starts with none.
    pub fn private() -> Self {
        Self {
            ownership: Ownership::Private(None),
        }
    }

    /// Creates a private consumer and loads its configuration right away.
    ///
    /// See [`ConfigUser::load_private`].  The consumer is returned even when
    /// the outcome is not [`Outcome::Success`].
    pub fn private_from(
        location_source: Option<&Config>,
        scope: &str,
        field: &str,
        io: &ConfigIo,
    ) -> Result<(Self, Outcome), ConfigError> {
        let mut user = Self::private();
        let outcome = user.load_private(location_source, scope, field, Merge::Replace, io)?;
        Ok((user, outcome))
    }

    pub fn mode(&self) -> Mode {
        match self.ownership {
            Ownership::Global => Mode::Global,
            Ownership::Shared(_) => Mode::Shared,
            Ownership::Private(_) => Mode::Private,
        }
    }

    /// Returns `true` if a configuration currently backs this consumer.
    pub fn has_config(&self) -> bool {
        match &self.ownership {
            Ownership::Global => global::is_initialized(),
            Ownership::Shared(handle) => handle.is_some(),
            Ownership::Private(config) => config.is_some(),
        }
    }

    /// Replaces the shared handle.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UsageMismatch`] if this consumer is not shared
    /// or `handle` is the global instance.
    pub fn set_shared(&mut self, handle: Option<ConfigHandle>) -> Result<(), ConfigError> {
        let mode = self.mode();
        let Ownership::Shared(slot) = &mut self.ownership else {
            return Err(usage(format!("set_shared called on a {mode} consumer")));
        };
        if handle.as_ref().is_some_and(global::is_global) {
            return Err(usage(
                "the global configuration cannot be used as a shared configuration".to_string(),
            ));
        }
        *slot = handle;
        Ok(())
    }

    /// Returns a clone of the shared handle.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UsageMismatch`] if this consumer is not shared.
    pub fn shared_handle(&self) -> Result<Option<ConfigHandle>, ConfigError> {
        match &self.ownership {
            Ownership::Shared(handle) => Ok(handle.clone()),
            _ => Err(usage(format!("shared_handle called on a {} consumer", self.mode()))),
        }
    }

    /// Loads the private configuration from the file named by the
    /// `FILENAME` entry `(scope, field)` of `location_source`, or of the
    /// global instance when `location_source` is `None`.
    ///
    /// Returns [`Outcome::DataNotFound`] without touching the current
    /// configuration when the entry is missing, and
    /// [`Outcome::DataIncomplete`] when the file had problems.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UsageMismatch`] if this consumer is not private
    /// and [`ConfigError::Io`] if the file cannot be read.
    pub fn load_private(
        &mut self,
        location_source: Option<&Config>,
        scope: &str,
        field: &str,
        merge: Merge,
        io: &ConfigIo,
    ) -> Result<Outcome, ConfigError> {
        let mode = self.mode();
        let Ownership::Private(slot) = &mut self.ownership else {
            return Err(usage(format!("load_private called on a {mode} consumer")));
        };

        let lookup = |config: Option<&Config>| {
            config.and_then(|c| c.retrieve::<String>(scope, field, DataType::Filename).cloned())
        };
        let location = match location_source {
            Some(source) => lookup(Some(source)),
            None => match global::handle() {
                Some(handle) => with_handle(&handle, lookup),
                None => None,
            },
        };
        let Some(location) = location else {
            warn!(scope, field, "no FILENAME entry names the private configuration");
            return Ok(Outcome::DataNotFound);
        };

        let path = Path::new(&location);
        let report = match (merge, slot.as_mut()) {
            (Merge::Augment, Some(current)) => io.read(path, current)?,
            _ => {
                let (config, report) = io.load(path)?;
                *slot = Some(config);
                report
            }
        };
        info!(
            path = %location,
            inserted = report.inserted,
            outcome = ?report.outcome,
            "private configuration loaded"
        );
        Ok(report.outcome)
    }

    /// Installs `config` as the private configuration, returning the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UsageMismatch`] if this consumer is not private.
    pub fn set_private(&mut self, config: Config) -> Result<Option<Config>, ConfigError> {
        let mode = self.mode();
        match &mut self.ownership {
            Ownership::Private(slot) => Ok(slot.replace(config)),
            _ => Err(usage(format!("set_private called on a {mode} consumer"))),
        }
    }

    /// Removes and returns the private configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UsageMismatch`] if this consumer is not private.
    pub fn take_private(&mut self) -> Result<Option<Config>, ConfigError> {
        let mode = self.mode();
        match &mut self.ownership {
            Ownership::Private(slot) => Ok(slot.take()),
            _ => Err(usage(format!("take_private called on a {mode} consumer"))),
        }
    }

    /// Runs `f` with the active configuration, or `None` if there is none.
    pub fn with_config<R>(&self, f: impl FnOnce(Option<&Config>) -> R) -> R {
        match &self.ownership {
            Ownership::Global => match global::handle() {
                Some(handle) => with_handle(&handle, f),
                None => f(None),
            },
            Ownership::Shared(Some(handle)) => with_handle(handle, f),
            Ownership::Shared(None) => f(None),
            Ownership::Private(config) => f(config.as_ref()),
        }
    }

    /// Runs `f` with mutable access to the active configuration.
    pub fn with_config_mut<R>(&mut self, f: impl FnOnce(Option<&mut Config>) -> R) -> R {
        match &mut self.ownership {
            Ownership::Global => match global::handle() {
                Some(handle) => with_handle_mut(&handle, f),
                None => f(None),
            },
            Ownership::Shared(Some(handle)) => with_handle_mut(handle, f),
            Ownership::Shared(None) => f(None),
            Ownership::Private(config) => f(config.as_mut()),
        }
    }

    // ── Typed proxies ────────────────────────────────────────────────────────

    /// Inserts into the active configuration.
    ///
    /// Returns `true` only if the value was stored.  Every other result is
    /// logged.
    pub fn insert<T: ConfigValue>(&mut self, scope: &str, field: &str, datatype: DataType, value: T) -> bool {
        let mode = self.mode();
        self.with_config_mut(|config| {
            let Some(config) = config else {
                warn!(%mode, scope, field, %datatype, "insert without a configuration");
                return false;
            };
            match config.insert(scope, field, datatype, value) {
                Ok(Outcome::Success) => true,
                Ok(outcome) => {
                    warn!(%mode, scope, field, %datatype, ?outcome, "value not inserted");
                    false
                }
                Err(e) => {
                    error!(%mode, scope, field, %datatype, "insert failed: {e}");
                    false
                }
            }
        })
    }

    /// Returns a copy of the value at `(scope, field)` if it exists with
    /// `datatype`.  A miss is logged at debug level.
    pub fn retrieve<T: ConfigValue + Clone>(&self, scope: &str, field: &str, datatype: DataType) -> Option<T> {
        self.with_config(|config| {
            let Some(config) = config else {
                debug!(mode = %self.mode(), scope, field, %datatype, "retrieve without a configuration");
                return None;
            };
            let found = config.retrieve::<T>(scope, field, datatype).cloned();
            if found.is_none() {
                debug!(mode = %self.mode(), scope, field, %datatype, "value not found");
            }
            found
        })
    }

    /// Like [`ConfigUser::retrieve`], falling back to `default`.
    pub fn retrieve_or<T: ConfigValue + Clone>(&self, scope: &str, field: &str, datatype: DataType, default: T) -> T {
        self.retrieve(scope, field, datatype).unwrap_or(default)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_int(scope: &str, field: &str, value: i32) -> Config {
        let mut config = Config::new();
        config.insert(scope, field, DataType::Int, value).unwrap();
        config
    }

    #[test]
    fn test_global_user_reads_global_instance() {
        global::init(config_with_int("App", "Threads", 4)).unwrap();
        let user = ConfigUser::global();

        assert_eq!(user.retrieve::<i32>("App", "Threads", DataType::Int), Some(4));
        assert_eq!(user.mode(), Mode::Global);
    }

    #[test]
    fn test_global_user_without_init_finds_nothing() {
        let mut user = ConfigUser::global();
        assert!(!user.has_config());
        assert!(!user.insert("A", "B", DataType::Bool, true));
        assert_eq!(user.retrieve::<bool>("A", "B", DataType::Bool), None);
    }

    #[test]
    fn test_global_user_insert_is_visible_through_global_handle() {
        global::init(Config::new()).unwrap();
        let mut user = ConfigUser::global();

        assert!(user.insert("Audio", "Volume", DataType::Double, 0.8));

        let handle = global::handle().unwrap();
        assert_eq!(handle.borrow().retrieve::<f64>("Audio", "Volume", DataType::Double), Some(&0.8));
    }

    #[test]
    fn test_shared_rejects_global_handle() {
        // Arrange
        global::init(Config::new()).unwrap();
        let global_handle = global::handle().unwrap();

        // Act
        let result = ConfigUser::shared(Some(global_handle));

        // Assert
        assert!(matches!(result, Err(ConfigError::UsageMismatch(_))));
    }

    #[test]
    fn test_set_shared_rejects_global_handle_and_keeps_old_one() {
        global::init(Config::new()).unwrap();
        let own = new_handle(config_with_int("S", "F", 1));
        let mut user = ConfigUser::shared(Some(own.clone())).unwrap();

        let result = user.set_shared(global::handle());

        assert!(matches!(result, Err(ConfigError::UsageMismatch(_))));
        let kept = user.shared_handle().unwrap().unwrap();
        assert!(Rc::ptr_eq(&kept, &own));
    }

    #[test]
    fn test_shared_users_see_each_others_inserts() {
        let handle = new_handle(Config::new());
        let mut a = ConfigUser::shared(Some(handle.clone())).unwrap();
        let b = ConfigUser::shared(Some(handle)).unwrap();

        assert!(a.insert("Net", "Port", DataType::Int, 8080));
        assert_eq!(b.retrieve::<i32>("Net", "Port", DataType::Int), Some(8080));
    }

    #[test]
    fn test_shared_without_handle_finds_nothing() {
        let user = ConfigUser::shared(None).unwrap();
        assert!(!user.has_config());
        assert_eq!(user.retrieve_or("S", "F", DataType::Int, 9), 9);
    }

    #[test]
    fn test_mode_specific_operations_reject_other_modes() {
        let mut private = ConfigUser::private();
        let mut global_user = ConfigUser::global();
        let io = ConfigIo::new();

        assert!(matches!(private.set_shared(None), Err(ConfigError::UsageMismatch(_))));
        assert!(matches!(private.shared_handle(), Err(ConfigError::UsageMismatch(_))));
        assert!(matches!(global_user.set_private(Config::new()), Err(ConfigError::UsageMismatch(_))));
        assert!(matches!(global_user.take_private(), Err(ConfigError::UsageMismatch(_))));
        assert!(matches!(
            global_user.load_private(None, "S", "F", Merge::Replace, &io),
            Err(ConfigError::UsageMismatch(_))
        ));
    }

    #[test]
    fn test_private_set_and_take() {
        let mut user = ConfigUser::private();
        assert!(!user.has_config());

        assert_eq!(user.set_private(config_with_int("S", "F", 3)).unwrap(), None);
        assert_eq!(user.retrieve::<i32>("S", "F", DataType::Int), Some(3));

        let taken = user.take_private().unwrap().unwrap();
        assert!(taken.contains("S", "F"));
        assert_eq!(user.retrieve::<i32>("S", "F", DataType::Int), None);
    }

    #[test]
    fn test_load_private_missing_location_key_is_data_not_found() {
        // Arrange
        let mut user = ConfigUser::private();
        user.set_private(config_with_int("Keep", "Me", 1)).unwrap();
        let source = Config::new();

        // Act
        let outcome = user
            .load_private(Some(&source), "Paths", "Renderer", Merge::Replace, &ConfigIo::new())
            .unwrap();

        // Assert
        assert_eq!(outcome, Outcome::DataNotFound);
        assert_eq!(user.retrieve::<i32>("Keep", "Me", DataType::Int), Some(1));
    }

    #[test]
    fn test_load_private_ignores_location_with_wrong_datatype() {
        let mut source = Config::new();
        source
            .insert("Paths", "Renderer", DataType::String, "renderer.cfg".to_string())
            .unwrap();

        let (user, outcome) =
            ConfigUser::private_from(Some(&source), "Paths", "Renderer", &ConfigIo::new()).unwrap();

        assert_eq!(outcome, Outcome::DataNotFound);
        assert!(!user.has_config());
    }

    #[test]
    fn test_insert_duplicate_returns_false_and_keeps_value() {
        let mut user = ConfigUser::private();
        user.set_private(config_with_int("S", "F", 1)).unwrap();

        assert!(!user.insert("S", "F", DataType::Int, 2));
        assert_eq!(user.retrieve::<i32>("S", "F", DataType::Int), Some(1));
    }

    #[test]
    fn test_insert_usage_errors_return_false() {
        let mut user = ConfigUser::private();
        user.set_private(Config::new()).unwrap();

        assert!(!user.insert("S", "", DataType::Int, 1));
        assert!(!user.insert("S", "F", DataType::Int, "text".to_string()));
    }

    #[test]
    fn test_retrieve_while_mutably_borrowed_reports_absent() {
        let handle = new_handle(config_with_int("S", "F", 5));
        let user = ConfigUser::shared(Some(handle.clone())).unwrap();

        let _guard = handle.borrow_mut();

        assert_eq!(user.retrieve::<i32>("S", "F", DataType::Int), None);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::Private.to_string(), "private");
        assert_eq!(format!("{:?}", ConfigUser::global()), "ConfigUser { mode: Global, has_config: false }");
    }
}
