//! Homogeneous ordered collections.

use crate::reflect::{Reflect, ReflectMut, ReflectRef};

/// A list whose length can change through the form.
///
/// Every length-changing operation builds a new backing vector and
/// assigns it, instead of growing or shrinking the existing one in place.
pub trait List: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn item(&self, index: usize) -> Option<&dyn Reflect>;
    fn item_mut(&mut self, index: usize) -> Option<&mut dyn Reflect>;

    /// Replace the list with one of exactly `len` elements: existing
    /// elements are carried forward, missing ones are zero-valued.
    fn resize(&mut self, len: usize);

    /// Replace the list with a copy that has one zero-valued element appended.
    fn push_default(&mut self);

    /// Replace the list with a copy that omits `index`. Returns `false`
    /// without touching the list when `index` is out of range.
    fn remove_at(&mut self, index: usize) -> bool;
}

impl<T> List for Vec<T>
where
    T: Reflect + Default + Clone,
{
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn item(&self, index: usize) -> Option<&dyn Reflect> {
        self.get(index).map(|v| v as &dyn Reflect)
    }

    fn item_mut(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        self.get_mut(index).map(|v| v as &mut dyn Reflect)
    }

    fn resize(&mut self, len: usize) {
        let mut next: Vec<T> = Vec::with_capacity(len);
        next.extend(self.iter().take(len).cloned());
        next.resize_with(len, T::default);
        *self = next;
    }

    fn push_default(&mut self) {
        let mut next: Vec<T> = Vec::with_capacity(Vec::len(self) + 1);
        next.extend(self.iter().cloned());
        next.push(T::default());
        *self = next;
    }

    fn remove_at(&mut self, index: usize) -> bool {
        if index >= Vec::len(self) {
            return false;
        }
        let next: Vec<T> = self
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, v)| v.clone())
            .collect();
        *self = next;
        true
    }
}

impl<T> Reflect for Vec<T>
where
    T: Reflect + Default + Clone,
{
    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::List(self)
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::List(self)
    }
}
