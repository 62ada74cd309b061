//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! store, watcher, admin handlers
//!     → tracing events with structured fields (path, source, error)
//!     → logging.rs subscriber (stdout, text or JSON)
//!
//! admin router
//!     → tower_http TraceLayer (one span per request)
//! ```

pub mod logging;
