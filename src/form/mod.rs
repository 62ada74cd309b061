//! Form synchronisation between the live value and the wire form.
//!
//! # Data Flow
//! ```text
//! live value ──extract.rs──▶ Values (path → snapshot) ──view.rs──▶ FormView / Navigation
//!                                                                     │
//!                                                             external renderer
//!                                                                     │
//! live value ◀──apply.rs─── Submission (path → raw string) ◀──validate.rs
//!            ◀──list.rs──── add / remove item requests
//! ```
//!
//! # Design Decisions
//! - Absent keys never modify the value; present-but-empty keys do
//! - A bare list key with no indexed keys below it empties the list
//! - Lists are replaced wholesale, never edited in place
//! - Every field error is collected before reporting

pub mod apply;
pub mod extract;
pub mod list;
pub mod validate;
pub mod view;

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use serde::Serialize;
use thiserror::Error;

pub use apply::apply;
pub use extract::{extract, Entry, EntryKind, Values};
pub use list::{add_item, remove_item, ListError};
pub use validate::validate;
pub use view::{navigate, render, Crumb, FieldView, FormView, Navigation, Section, Widget};

/// A flat form submission: wire path → raw string.
pub type Submission = BTreeMap<String, String>;

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{path}: {reason}")]
pub struct FieldError {
    pub path: String,
    pub reason: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// A submission that could not be accepted, with every offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("submission rejected: {}", summarize(.fields))]
pub struct Rejection {
    pub fields: Vec<FieldError>,
}

impl Rejection {
    pub fn new(fields: Vec<FieldError>) -> Self {
        Self { fields }
    }
}

fn summarize(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Indices submitted directly below the list at `prefix`.
///
/// Returns `None` when no key addresses an element of the list, and an
/// empty set when only the bare list key (the empty marker) is present.
/// Keys below the list that lack a canonical index are ignored.
pub(crate) fn submitted_indices(submission: &Submission, prefix: &str) -> Option<BTreeSet<usize>> {
    let mut present = false;
    let mut indices = BTreeSet::new();

    let keys = submission
        .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
        .map(|(k, _)| k)
        .take_while(|k| k.starts_with(prefix));

    for key in keys {
        let rest = &key[prefix.len()..];
        if rest.is_empty() {
            present = true;
            continue;
        }
        let Some(rest) = rest.strip_prefix(crate::path::SEPARATOR) else {
            continue;
        };
        let token = rest.split(crate::path::SEPARATOR).next().unwrap_or_default();
        match token.parse::<usize>() {
            Ok(index) if index.to_string() == token => {
                present = true;
                indices.insert(index);
            }
            _ => {}
        }
    }

    present.then_some(indices)
}
