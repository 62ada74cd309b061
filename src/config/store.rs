//! The live configuration value and everything allowed to change it.
//!
//! # Responsibilities
//! - Hold the value behind a reader-writer lock and never expose the lock
//! - Reconcile form submissions, file changes and manual reloads
//! - Persist the value and notify listeners after every mutation
//!
//! # Design Decisions
//! - Form submissions are all-or-nothing: applied to a copy, swapped in
//!   only when every field succeeded
//! - No file I/O happens while the lock is held
//! - Listeners run synchronously on the mutating thread, after the lock
//!   has been released, in registration order

use std::fs;
use std::io;
use std::path::{Path as FsPath, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Instant;

use arc_swap::ArcSwap;
use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use crate::config::event::{ChangeEvent, Source};
use crate::config::format::{Format, FormatError};
use crate::config::options::StoreOptions;
use crate::config::watcher::{FileWatcher, Hooks};
use crate::config::Config;
use crate::form::{self, FormView, ListError, Navigation, Rejection, Submission, Values};
use crate::path::Path;
use crate::schema::{Schema, SchemaError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse '{}': {source}", path.display())]
    Parse { path: PathBuf, source: FormatError },

    #[error(transparent)]
    Format(FormatError),

    #[error("invalid configuration type: {0}")]
    Schema(#[from] SchemaError),

    #[error("failed to encode configuration: {0}")]
    Encode(FormatError),

    #[error("failed to write '{}': {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to watch configuration file: {0}")]
    Watch(#[from] notify::Error),

    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error(transparent)]
    List(#[from] ListError),
}

type Listener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

struct Shared<T> {
    value: RwLock<T>,
    schema: Schema,
    path: PathBuf,
    format: Format,
    options: StoreOptions,
    listeners: ArcSwap<Vec<Listener>>,
    last_write: Mutex<Option<Instant>>,
    watcher: Mutex<Option<FileWatcher>>,
}

impl<T> Shared<T> {
    fn within_debounce(&self) -> bool {
        self.last_write
            .lock()
            .is_some_and(|at| at.elapsed() < self.options.debounce)
    }
}

/// Shared handle to the live configuration. Clones refer to the same value.
pub struct Store<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Config> Store<T> {
    /// Read and parse the file once, then start the watcher if enabled.
    /// Every failure here is fatal; no partial store is returned.
    pub fn load(path: impl AsRef<FsPath>, options: StoreOptions) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let format = Format::from_path(&path).map_err(StoreError::Format)?;
        let schema = Schema::of::<T>()?;
        let value: T = read_file(&path, format)?;

        let watch = options.watch;
        let store = Self {
            shared: Arc::new(Shared {
                value: RwLock::new(value),
                schema,
                path,
                format,
                options,
                listeners: ArcSwap::from_pointee(Vec::new()),
                last_write: Mutex::new(None),
                watcher: Mutex::new(None),
            }),
        };

        if watch {
            let watcher = FileWatcher::start(
                &store.shared.path,
                store.shared.options.debounce,
                store.hooks(),
            )?;
            *store.shared.watcher.lock() = Some(watcher);
        }

        tracing::info!(
            path = %store.shared.path.display(),
            format = ?format,
            fields = store.shared.schema.fields().len(),
            "Configuration loaded"
        );
        Ok(store)
    }

    fn hooks(&self) -> Hooks {
        let weak = Arc::downgrade(&self.shared);
        let reload_weak: Weak<Shared<T>> = weak.clone();
        Hooks {
            is_self_write: Box::new(move || weak.upgrade().is_some_and(|s| s.within_debounce())),
            reload: Box::new(move || {
                let Some(shared) = reload_weak.upgrade() else {
                    return;
                };
                let store = Store { shared };
                if let Err(e) = store.reload_from(Source::FileChange) {
                    match &store.shared.options.on_error {
                        Some(handler) => handler(&e),
                        None => tracing::warn!(error = %e, "Config reload failed, keeping current configuration"),
                    }
                }
            }),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.shared.schema
    }

    pub fn file(&self) -> &FsPath {
        &self.shared.path
    }

    pub fn format(&self) -> Format {
        self.shared.format
    }

    pub fn auto_apply(&self) -> bool {
        self.shared.options.auto_apply
    }

    pub fn auto_save(&self) -> bool {
        self.shared.options.auto_save
    }

    pub fn is_watching(&self) -> bool {
        self.shared.watcher.lock().is_some()
    }

    /// Run `f` with shared access to the live value.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.shared.value.read())
    }

    /// Run `f` with exclusive access to the live value, then notify
    /// listeners with a `Manual` event.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut *self.shared.value.write());
        self.emit(ChangeEvent::new(Source::Manual, Path::root()));
        result
    }

    pub fn snapshot(&self) -> T {
        self.shared.value.read().clone()
    }

    pub fn extract(&self) -> Values {
        let value = self.shared.value.read();
        form::extract(&self.shared.schema, &*value)
    }

    pub fn render(&self, focus: &Path) -> FormView {
        form::render(&self.shared.schema, &self.extract(), focus)
    }

    pub fn navigate(&self, focus: &Path) -> Navigation {
        form::navigate(&self.shared.schema, &self.extract(), focus)
    }

    pub fn validate(&self, submission: &Submission) -> Result<(), Rejection> {
        form::validate(&self.shared.schema, submission)
    }

    /// Validate and apply a submission. The live value changes only when
    /// every field succeeds. With auto-save on, the file is written
    /// afterwards; a failed save is reported but the new value stays.
    pub fn apply(&self, submission: &Submission) -> Result<ChangeEvent, StoreError> {
        self.validate(submission)?;
        {
            let mut value = self.shared.value.write();
            let mut draft = value.clone();
            form::apply(&self.shared.schema, &mut draft, submission)?;
            *value = draft;
        }

        let event = ChangeEvent::new(Source::FormSubmit, submitted_prefix(submission));
        tracing::info!(path = %event.path, fields = submission.len(), "Form submission applied");
        self.emit(event.clone());
        self.save_if_enabled()?;
        Ok(event)
    }

    /// What `apply` would produce, without touching the live value.
    pub fn preview(&self, submission: &Submission) -> Result<Values, Rejection> {
        self.validate(submission)?;
        let mut draft = self.snapshot();
        form::apply(&self.shared.schema, &mut draft, submission)?;
        Ok(form::extract(&self.shared.schema, &draft))
    }

    /// Append a zero-valued element to the list at `path`. Returns the new
    /// length.
    pub fn add_item(&self, path: &Path) -> Result<usize, StoreError> {
        let len = {
            let mut value = self.shared.value.write();
            form::add_item(&self.shared.schema, &mut *value, path)?
        };
        self.emit(ChangeEvent::new(Source::FormSubmit, path.clone()));
        self.save_if_enabled()?;
        Ok(len)
    }

    /// Remove the element at `index` of the list at `path`. Returns the new
    /// length.
    pub fn remove_item(&self, path: &Path, index: usize) -> Result<usize, StoreError> {
        let len = {
            let mut value = self.shared.value.write();
            form::remove_item(&self.shared.schema, &mut *value, path, index)?
        };
        self.emit(ChangeEvent::new(Source::FormSubmit, path.clone()));
        self.save_if_enabled()?;
        Ok(len)
    }

    /// Encode the live value and write it out. The in-memory value is
    /// unaffected by a failure.
    pub fn save(&self) -> Result<(), StoreError> {
        let bytes = {
            let value = self.shared.value.read();
            self.shared.format.encode(&*value).map_err(StoreError::Encode)?
        };

        let path = &self.shared.path;
        self.mark_form_submit();
        let written = match &self.shared.options.persist {
            Some(persist) => persist(path, &bytes),
            None => fs::write(path, &bytes),
        };
        self.mark_form_submit();

        written.map_err(|source| StoreError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "Configuration saved");
        Ok(())
    }

    /// Re-read the file on demand.
    pub fn reload(&self) -> Result<ChangeEvent, StoreError> {
        self.reload_from(Source::Manual)
    }

    fn reload_from(&self, source: Source) -> Result<ChangeEvent, StoreError> {
        let next: T = read_file(&self.shared.path, self.shared.format)?;
        *self.shared.value.write() = next;

        let event = ChangeEvent::new(source, Path::root());
        tracing::info!(source = %source, path = %self.shared.path.display(), "Configuration reloaded");
        self.emit(event.clone());
        Ok(event)
    }

    /// Record that we are about to write the file, so the watcher ignores
    /// the notification it causes.
    pub fn mark_form_submit(&self) {
        *self.shared.last_write.lock() = Some(Instant::now());
    }

    /// Register a listener for change events.
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        self.shared.listeners.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(listener.clone());
            next
        });
    }

    /// Halt the watcher. Later file changes never reload. Safe to call
    /// more than once.
    pub fn stop(&self) {
        let watcher = self.shared.watcher.lock().take();
        if let Some(mut watcher) = watcher {
            watcher.stop();
        }
    }

    fn save_if_enabled(&self) -> Result<(), StoreError> {
        if self.shared.options.auto_save {
            self.save()?;
        }
        Ok(())
    }

    fn emit(&self, event: ChangeEvent) {
        tracing::debug!(source = %event.source, path = %event.path, "Change event");
        for listener in self.shared.listeners.load().iter() {
            listener(&event);
        }
    }
}

fn read_file<T: Config>(path: &FsPath, format: Format) -> Result<T, StoreError> {
    let bytes = fs::read(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    format.decode(&bytes).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// The deepest path covering every submitted key.
fn submitted_prefix(submission: &Submission) -> Path {
    let paths: Vec<Path> = submission
        .keys()
        .filter_map(|key| Path::parse(key).ok())
        .collect();
    Path::common_prefix(&paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> Submission {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_submitted_prefix() {
        assert_eq!(
            submitted_prefix(&form(&[("Services.0.Name", "a"), ("Services.0.Weight", "1")])).to_string(),
            "Services.0"
        );
        assert_eq!(
            submitted_prefix(&form(&[("Services.0.Name", "a"), ("Services.1.Name", "b")])).to_string(),
            "Services"
        );
        assert!(submitted_prefix(&form(&[("Host", "x"), ("Port", "1")])).is_root());
        assert!(submitted_prefix(&Submission::new()).is_root());
    }
}
