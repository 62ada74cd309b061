//! Write direction: submission → in-place mutation of the live value.
//!
//! A key that is absent leaves its field untouched, so a form that shows
//! only one section never clears the rest. A key that is present always
//! wins, even when its value is empty.

use crate::form::{submitted_indices, FieldError, Rejection, Submission};
use crate::reflect::{self, Reflect};
use crate::schema::{Node, Schema};
use crate::walk::{Context, Flow, Visitor, Walker};

/// Largest list the form may grow a list to in a single submission.
pub const MAX_LIST_LEN: usize = 10_000;

/// Apply `submission` to `value` in place.
///
/// Fields are written independently: when some fields fail to parse, the
/// others have still been written. Callers needing all-or-nothing
/// semantics apply to a copy, as the store does.
pub fn apply(schema: &Schema, value: &mut dyn Reflect, submission: &Submission) -> Result<(), Rejection> {
    let mut errors = Vec::new();
    let mut visitor = Applier { value, submission };
    Walker::new().walk(schema, &mut visitor, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(Rejection::new(errors))
    }
}

struct Applier<'v, 's> {
    value: &'v mut dyn Reflect,
    submission: &'s Submission,
}

impl Visitor for Applier<'_, '_> {
    type State = Vec<FieldError>;

    fn visit_primitive(&mut self, node: &Node, cx: &mut Context<'_, Self::State>) -> Flow {
        if node.meta.readonly {
            return Flow::Skip;
        }
        let key = cx.path.to_string();
        let Some(raw) = self.submission.get(&key) else {
            return Flow::Continue;
        };

        match reflect::scalar_mut(&mut *self.value, cx.path) {
            Some(scalar) => {
                if let Err(e) = scalar.assign(raw) {
                    cx.state.push(FieldError::new(key, e.to_string()));
                }
            }
            None => cx.state.push(FieldError::new(key, "does not address a value")),
        }
        Flow::Continue
    }

    fn visit_record(&mut self, node: &Node, _cx: &mut Context<'_, Self::State>) -> Flow {
        if node.meta.readonly {
            Flow::Skip
        } else {
            Flow::Continue
        }
    }

    fn visit_list(&mut self, node: &Node, cx: &mut Context<'_, Self::State>) -> Flow {
        if node.meta.readonly {
            return Flow::Skip;
        }
        let key = cx.path.to_string();
        let Some(indices) = submitted_indices(self.submission, &key) else {
            return Flow::Skip;
        };

        let Some(list) = reflect::list_mut(&mut *self.value, cx.path) else {
            cx.state.push(FieldError::new(key, "does not address a list"));
            return Flow::Skip;
        };

        let Some(&highest) = indices.last() else {
            tracing::trace!(path = %key, "Empty list marker submitted");
            list.resize(0);
            return Flow::Skip;
        };

        if highest >= MAX_LIST_LEN {
            cx.state.push(FieldError::new(
                cx.path.index(highest).to_string(),
                format!("index exceeds the maximum list length of {}", MAX_LIST_LEN),
            ));
            return Flow::Skip;
        }

        list.resize(list.len().max(highest + 1));
        Flow::Items(indices.into_iter().collect())
    }
}
