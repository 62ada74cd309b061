//! Typed access to the live configuration value.
//!
//! # Responsibilities
//! - Expose records, lists and scalars behind object-safe traits
//! - Resolve a `Path` against a value, immutably or mutably
//!
//! # Design Decisions
//! - Record accessors are generated by `record!` at compile time
//! - Lists are replaced wholesale on every length change
//! - Scalars parse their own wire strings

mod list;
mod scalar;

use crate::path::Path;

pub use list::List;
pub use scalar::{ParseError, Scalar, CHECKED};

/// Borrowed view of a value, by kind.
pub enum ReflectRef<'a> {
    Scalar(&'a dyn Scalar),
    Record(&'a dyn Record),
    List(&'a dyn List),
}

/// Mutable view of a value, by kind.
pub enum ReflectMut<'a> {
    Scalar(&'a mut dyn Scalar),
    Record(&'a mut dyn Record),
    List(&'a mut dyn List),
}

/// A value the form layer can read and write.
pub trait Reflect: Send + Sync {
    fn reflect_ref(&self) -> ReflectRef<'_>;
    fn reflect_mut(&mut self) -> ReflectMut<'_>;
}

/// Field access on a structured record, keyed by wire name.
pub trait Record: Send + Sync {
    fn field(&self, name: &str) -> Option<&dyn Reflect>;
    fn field_mut(&mut self, name: &str) -> Option<&mut dyn Reflect>;
}

/// Follow `path` from `root`. Returns `None` when a segment does not exist
/// or an index is out of range.
pub fn resolve<'a>(root: &'a dyn Reflect, path: &Path) -> Option<&'a dyn Reflect> {
    let mut current = root;
    for segment in path.iter() {
        current = match current.reflect_ref() {
            ReflectRef::Record(record) => record.field(&segment.name)?,
            _ => return None,
        };
        if let Some(index) = segment.index {
            current = match current.reflect_ref() {
                ReflectRef::List(list) => list.item(index)?,
                _ => return None,
            };
        }
    }
    Some(current)
}

/// Mutable counterpart of [`resolve`].
pub fn resolve_mut<'a>(root: &'a mut dyn Reflect, path: &Path) -> Option<&'a mut dyn Reflect> {
    let mut current = root;
    for segment in path.iter() {
        current = match current.reflect_mut() {
            ReflectMut::Record(record) => record.field_mut(&segment.name)?,
            _ => return None,
        };
        if let Some(index) = segment.index {
            current = match current.reflect_mut() {
                ReflectMut::List(list) => list.item_mut(index)?,
                _ => return None,
            };
        }
    }
    Some(current)
}

/// The scalar at `path`, if the path resolves to one.
pub fn scalar_mut<'a>(root: &'a mut dyn Reflect, path: &Path) -> Option<&'a mut dyn Scalar> {
    match resolve_mut(root, path)?.reflect_mut() {
        ReflectMut::Scalar(scalar) => Some(scalar),
        _ => None,
    }
}

/// The list at `path`, if the path resolves to one.
pub fn list_ref<'a>(root: &'a dyn Reflect, path: &Path) -> Option<&'a dyn List> {
    match resolve(root, path)?.reflect_ref() {
        ReflectRef::List(list) => Some(list),
        _ => None,
    }
}

pub fn list_mut<'a>(root: &'a mut dyn Reflect, path: &Path) -> Option<&'a mut dyn List> {
    match resolve_mut(root, path)?.reflect_mut() {
        ReflectMut::List(list) => Some(list),
        _ => None,
    }
}
