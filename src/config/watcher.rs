//! Configuration file watcher for hot reload.
//!
//! # Data Flow
//! ```text
//! notify (parent directory)
//!     → filter: events for the configuration file only
//!     → drop: events within the debounce window of our own save
//!     → coalesce: one reload once the file stays quiet for the window
//!     → reload callback on the watcher thread
//! ```
//!
//! # Design Decisions
//! - The parent directory is watched so editors that replace the file by
//!   rename are still seen
//! - The watcher never holds the store alive; callbacks upgrade a weak
//!   handle and give up when it is gone

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

enum Signal {
    Event(notify::Result<Event>),
    Stop,
}

/// Callbacks the watcher thread drives.
pub(crate) struct Hooks {
    /// Whether a notification arriving now was caused by our own write.
    pub is_self_write: Box<dyn Fn() -> bool + Send>,
    pub reload: Box<dyn Fn() + Send>,
}

/// A running watcher. Dropping it stops the watcher.
pub(crate) struct FileWatcher {
    stopped: Arc<AtomicBool>,
    signals: Sender<Signal>,
    watcher: Option<RecommendedWatcher>,
    thread: Option<JoinHandle<()>>,
}

impl FileWatcher {
    pub fn start(path: &Path, debounce: Duration, hooks: Hooks) -> notify::Result<Self> {
        let file = path.to_path_buf();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (signals, rx) = mpsc::channel();
        let events = signals.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = events.send(Signal::Event(res));
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        let stopped = Arc::new(AtomicBool::new(false));
        let flag = stopped.clone();
        let thread = thread::Builder::new()
            .name("config-watcher".into())
            .spawn(move || run(rx, &file, debounce, &flag, hooks))
            .map_err(notify::Error::io)?;

        tracing::info!(path = %path.display(), debounce_ms = debounce.as_millis() as u64, "Config watcher started");
        Ok(Self {
            stopped,
            signals,
            watcher: Some(watcher),
            thread: Some(thread),
        })
    }

    /// Halt the watcher. No reload starts after this returns, unless it is
    /// called from the watcher thread itself.
    pub fn stop(&mut self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.watcher.take();
        let _ = self.signals.send(Signal::Stop);

        if let Some(handle) = self.thread.take() {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
        tracing::info!("Config watcher stopped");
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(
    rx: mpsc::Receiver<Signal>,
    file: &Path,
    debounce: Duration,
    stopped: &AtomicBool,
    hooks: Hooks,
) {
    let mut deadline: Option<Instant> = None;

    loop {
        let signal = match deadline {
            Some(at) => rx.recv_timeout(at.saturating_duration_since(Instant::now())),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match signal {
            Ok(Signal::Event(Ok(event))) => {
                if !concerns(&event, file) {
                    continue;
                }
                if (hooks.is_self_write)() {
                    tracing::debug!(path = %file.display(), "Ignoring change caused by own write");
                    continue;
                }
                deadline = Some(Instant::now() + debounce);
            }
            Ok(Signal::Event(Err(e))) => {
                tracing::warn!(error = %e, "Config watch error");
            }
            Err(RecvTimeoutError::Timeout) => {
                deadline = None;
                if stopped.load(Ordering::SeqCst) {
                    break;
                }
                tracing::info!(path = %file.display(), "Config file changed, reloading");
                (hooks.reload)();
            }
            Ok(Signal::Stop) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

fn concerns(event: &Event, file: &Path) -> bool {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return false;
    }
    let name = file.file_name();
    event.paths.iter().any(|p| p.file_name() == name)
}
