//! Embeddable admin editor for structured configuration files.
//!
//! # Architecture Overview
//!
//! ```text
//!   record! / scalar!          schema            walk
//!   (describe a type) ───────▶ (node tree) ────▶ (visitor traversal)
//!                                                     │
//!                     ┌───────────────┬───────────────┼──────────────┐
//!                     ▼               ▼               ▼              ▼
//!                 extract          apply          validate     render/navigate
//!                     │               │               │              │
//!                     └───────────────┴──── form ─────┴──────────────┘
//!                                             │
//!                                             ▼
//!   file on disk ◀──── format ──── config::Store ◀──── admin (axum)
//!        │                              ▲
//!        └──── config watcher ──────────┘
//! ```

pub mod admin;
pub mod config;
pub mod form;
pub mod observability;
pub mod path;
pub mod reflect;
pub mod schema;
pub mod walk;

pub use config::{ChangeEvent, Source, Store, StoreError, StoreOptions};
pub use path::Path;
pub use schema::Schema;

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
