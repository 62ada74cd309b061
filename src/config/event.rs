use std::fmt;

use serde::Serialize;

use crate::path::Path;

/// What caused a change to the live value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    FormSubmit,
    FileChange,
    Manual,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Source::FormSubmit => "form_submit",
            Source::FileChange => "file_change",
            Source::Manual => "manual",
        })
    }
}

/// Emitted after every successful mutation of the live value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub source: Source,
    /// Deepest path covering everything that changed; the root for reloads.
    pub path: Path,
}

impl ChangeEvent {
    pub fn new(source: Source, path: Path) -> Self {
        Self { source, path }
    }
}
