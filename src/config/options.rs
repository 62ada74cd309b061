//! Store behaviour switches.

use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::StoreError;

/// Debounce window applied when none is configured.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Writes encoded configuration bytes to the file at the given path.
pub type PersistFn = Arc<dyn Fn(&Path, &[u8]) -> io::Result<()> + Send + Sync>;

/// Receives errors from reloads triggered by the file watcher.
pub type ErrorHandler = Arc<dyn Fn(&StoreError) + Send + Sync>;

#[derive(Clone)]
pub struct StoreOptions {
    pub(crate) auto_apply: bool,
    pub(crate) auto_save: bool,
    pub(crate) watch: bool,
    pub(crate) debounce: Duration,
    pub(crate) persist: Option<PersistFn>,
    pub(crate) on_error: Option<ErrorHandler>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            auto_apply: true,
            auto_save: false,
            watch: false,
            debounce: DEFAULT_DEBOUNCE,
            persist: None,
            on_error: None,
        }
    }
}

impl fmt::Debug for StoreOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreOptions")
            .field("auto_apply", &self.auto_apply)
            .field("auto_save", &self.auto_save)
            .field("watch", &self.watch)
            .field("debounce", &self.debounce)
            .field("persist", &self.persist.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply form submissions directly instead of previewing them first.
    pub fn auto_apply(mut self, enabled: bool) -> Self {
        self.auto_apply = enabled;
        self
    }

    /// Save after every form submission and list edit.
    pub fn auto_save(mut self, enabled: bool) -> Self {
        self.auto_save = enabled;
        self
    }

    /// Reload when the file changes on disk.
    pub fn watch(mut self, enabled: bool) -> Self {
        self.watch = enabled;
        self
    }

    pub fn debounce(mut self, window: Duration) -> Self {
        self.debounce = window;
        self
    }

    /// Replace the default whole-file overwrite used by `save`.
    pub fn persist<F>(mut self, persist: F) -> Self
    where
        F: Fn(&Path, &[u8]) -> io::Result<()> + Send + Sync + 'static,
    {
        self.persist = Some(Arc::new(persist));
        self
    }

    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&StoreError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(handler));
        self
    }
}
