//! The process-wide configuration instance.
//!
//! The instance is created by [`init`] and torn down by [`shutdown`], both
//! called by the bootstrap thread.  It lives in a thread-local slot, so a
//! thread that never called [`init`] sees no global configuration.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{info, warn};

use super::{new_handle, ConfigHandle};
use crate::domain::store::{Config, ConfigError};

thread_local! {
    static GLOBAL: RefCell<Option<ConfigHandle>> = const { RefCell::new(None) };
}

/// Installs `config` as the global instance.
///
/// # Errors
///
/// Returns [`ConfigError::UsageMismatch`] if a global instance already exists.
pub fn init(config: Config) -> Result<(), ConfigError> {
    GLOBAL.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_some() {
            return Err(ConfigError::UsageMismatch(
                "global configuration is already initialized".to_string(),
            ));
        }
        info!(entries = config.len(), "global configuration initialized");
        *slot = Some(new_handle(config));
        Ok(())
    })
}

/// Returns the global instance, if initialized.
pub fn handle() -> Option<ConfigHandle> {
    GLOBAL.with(|slot| slot.borrow().clone())
}

pub fn is_initialized() -> bool {
    GLOBAL.with(|slot| slot.borrow().is_some())
}

/// Returns `true` if `handle` refers to the global instance.
pub fn is_global(handle: &ConfigHandle) -> bool {
    GLOBAL.with(|slot| {
        slot.borrow()
            .as_ref()
            .is_some_and(|global| Rc::ptr_eq(global, handle))
    })
}

/// Removes the global instance and returns its configuration.
///
/// If handles obtained from [`handle`] are still alive, they keep the old
/// instance and the caller receives a copy.
pub fn shutdown() -> Option<Config> {
    let handle = GLOBAL.with(|slot| slot.borrow_mut().take())?;
    match Rc::try_unwrap(handle) {
        Ok(cell) => {
            info!("global configuration shut down");
            Some(cell.into_inner())
        }
        Err(shared) => {
            warn!(
                holders = Rc::strong_count(&shared) - 1,
                "global configuration still referenced at shutdown; returning a copy"
            );
            let copy = shared.try_borrow().ok().map(|config| config.clone());
            copy
        }
    }
}
