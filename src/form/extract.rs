//! Read direction: live value → wire-keyed snapshot map.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::form::Submission;
use crate::reflect::{self, Record, Reflect, ReflectRef};
use crate::schema::{Node, Schema};
use crate::walk::{Context, Flow, Visitor, Walker};

/// What a `Values` entry addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A primitive leaf, including elements of primitive lists.
    Field,
    Record,
    List,
    /// One element of a list of records.
    Item,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub kind: EntryKind,
    pub value: Value,
    /// Wire string for leaves, as the form would submit it.
    pub wire: Option<String>,
}

/// Snapshot of every reachable path of a configuration value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values {
    entries: BTreeMap<String, Entry>,
}

impl Values {
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.entries.get(path).map(|e| &e.value)
    }

    pub fn entry(&self, path: &str) -> Option<&Entry> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of elements of the list at `path`, or zero.
    pub fn list_len(&self, path: &str) -> usize {
        match self.get(path) {
            Some(Value::Array(items)) => items.len(),
            _ => 0,
        }
    }

    /// Render the leaves back into a submission that reproduces the value
    /// when applied. Empty lists are emitted as bare keys.
    pub fn to_submission(&self) -> Submission {
        self.entries
            .iter()
            .filter_map(|(path, entry)| match entry.kind {
                EntryKind::Field => Some((path.clone(), entry.wire.clone().unwrap_or_default())),
                EntryKind::List if entry.value.as_array().is_some_and(Vec::is_empty) => {
                    Some((path.clone(), String::new()))
                }
                _ => None,
            })
            .collect()
    }

    fn insert(&mut self, path: String, kind: EntryKind, value: Value, wire: Option<String>) {
        self.entries.insert(path, Entry { kind, value, wire });
    }
}

impl Serialize for Values {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (path, entry) in &self.entries {
            map.serialize_entry(path, &entry.value)?;
        }
        map.end()
    }
}

/// Snapshot the value at every reachable path of `value`.
pub fn extract(schema: &Schema, value: &dyn Reflect) -> Values {
    let mut values = Values::default();
    let mut visitor = Extractor { value };
    Walker::new().walk(schema, &mut visitor, &mut values);
    values
}

struct Extractor<'v> {
    value: &'v dyn Reflect,
}

impl Visitor for Extractor<'_> {
    type State = Values;

    fn visit_primitive(&mut self, _node: &Node, cx: &mut Context<'_, Values>) -> Flow {
        if let Some(ReflectRef::Scalar(scalar)) =
            reflect::resolve(self.value, cx.path).map(|v| v.reflect_ref())
        {
            cx.state.insert(
                cx.path.to_string(),
                EntryKind::Field,
                scalar.to_json(),
                Some(scalar.to_wire()),
            );
        }
        Flow::Continue
    }

    fn visit_record(&mut self, node: &Node, cx: &mut Context<'_, Values>) -> Flow {
        match reflect::resolve(self.value, cx.path) {
            Some(value) => {
                cx.state
                    .insert(cx.path.to_string(), EntryKind::Record, snapshot(node, value), None);
                Flow::Continue
            }
            None => Flow::Skip,
        }
    }

    fn visit_list(&mut self, node: &Node, cx: &mut Context<'_, Values>) -> Flow {
        let Some(list) = reflect::list_ref(self.value, cx.path) else {
            return Flow::Skip;
        };

        let items: Vec<Value> = (0..list.len())
            .filter_map(|i| list.item(i))
            .map(|item| item_snapshot(node, item))
            .collect();

        if node.element().is_none() {
            for (i, item) in items.iter().enumerate() {
                cx.state
                    .insert(cx.path.index(i).to_string(), EntryKind::Item, item.clone(), None);
            }
        }

        let len = items.len();
        cx.state
            .insert(cx.path.to_string(), EntryKind::List, Value::Array(items), None);
        Flow::Items((0..len).collect())
    }
}

/// JSON snapshot of `value`, shaped by `node` and keyed by wire names.
pub(crate) fn snapshot(node: &Node, value: &dyn Reflect) -> Value {
    match value.reflect_ref() {
        ReflectRef::Scalar(scalar) => scalar.to_json(),
        ReflectRef::Record(record) => record_snapshot(&node.children, record),
        ReflectRef::List(list) => Value::Array(
            (0..list.len())
                .filter_map(|i| list.item(i))
                .map(|item| item_snapshot(node, item))
                .collect(),
        ),
    }
}

fn item_snapshot(list: &Node, item: &dyn Reflect) -> Value {
    match item.reflect_ref() {
        ReflectRef::Scalar(scalar) => scalar.to_json(),
        ReflectRef::Record(record) => record_snapshot(&list.children, record),
        ReflectRef::List(_) => Value::Null,
    }
}

fn record_snapshot(children: &[Node], record: &dyn Record) -> Value {
    let mut map = Map::new();
    for child in children {
        if let Some(value) = record.field(&child.name) {
            map.insert(child.name.clone(), snapshot(child, value));
        }
    }
    Value::Object(map)
}
