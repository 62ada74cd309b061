//! Configuration storage subsystem.
//!
//! # Data Flow
//! ```text
//! config file (JSON/TOML/YAML)
//!     → format.rs (decode by extension)
//!     → store.rs (live value behind a RwLock)
//!
//! Change sources:
//!     form submission  → store.apply / add_item / remove_item → FormSubmit
//!     file edit        → watcher.rs (filter, debounce) → reload → FileChange
//!     operator action  → store.reload / store.save           → Manual
//!
//! Every successful mutation:
//!     → listeners (synchronously, after the lock is released)
//!     → optional save (auto-save)
//! ```
//!
//! # Design Decisions
//! - The store owns the only copy of the live value
//! - Our own writes are remembered so the watcher does not reload them

pub mod event;
pub mod format;
pub mod options;
pub mod store;
mod watcher;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::reflect::Reflect;
use crate::schema::Describe;

pub use event::{ChangeEvent, Source};
pub use format::{Format, FormatError};
pub use options::{ErrorHandler, PersistFn, StoreOptions, DEFAULT_DEBOUNCE};
pub use store::{Store, StoreError};

/// A type the store can hold: describable, reflectable and serialisable.
pub trait Config: Describe + Reflect + Serialize + DeserializeOwned + Clone + 'static {}

impl<T> Config for T where T: Describe + Reflect + Serialize + DeserializeOwned + Clone + 'static {}
