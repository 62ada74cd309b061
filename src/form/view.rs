//! Rendering and navigation models for an external page renderer.
//!
//! # Responsibilities
//! - Order fields for display and pick a widget per field
//! - Expand the subtree on the focus line, summarise everything else
//! - Produce breadcrumbs and the sections reachable from the focus
//!
//! # Design Decisions
//! - Both models are built from `Values`, never from the live value
//! - A node is on the focus line when it is an ancestor of the focus or
//!   lies inside it

use serde::Serialize;
use serde_json::Value;

use crate::form::Values;
use crate::path::Path;
use crate::schema::{FieldMeta, Node, NodeKind, Schema, ValueType};
use crate::walk::{Context, Flow, Visitor, Walker};

/// Suggested input control for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Widget {
    Text,
    Number,
    /// Browsers omit unchecked boxes, and an absent key keeps the current
    /// value. Renderers must place a hidden `off` input of the same name
    /// before each box: the later `on` wins when checked, and an unchecked
    /// box submits `off`, which clears the field like an empty value does.
    Checkbox,
    Select,
    Group,
    List,
    Item,
}

impl Widget {
    fn for_node(node: &Node) -> Self {
        match node.kind {
            NodeKind::Record => Widget::Group,
            NodeKind::List(_) => Widget::List,
            NodeKind::Primitive(_) if !node.meta.options.is_empty() => Widget::Select,
            NodeKind::Primitive(ValueType::Bool) => Widget::Checkbox,
            NodeKind::Primitive(ValueType::Int | ValueType::Float) => Widget::Number,
            NodeKind::Primitive(ValueType::String) => Widget::Text,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub path: String,
    pub label: String,
    pub widget: Widget,
    pub depth: usize,
    pub value: Value,
    pub meta: FieldMeta,
    pub expanded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormView {
    pub focus: String,
    pub fields: Vec<FieldView>,
}

impl FormView {
    pub fn field(&self, path: &str) -> Option<&FieldView> {
        self.fields.iter().find(|f| f.path == path)
    }
}

/// Lay out the form for `focus`, in document order.
pub fn render(schema: &Schema, values: &Values, focus: &Path) -> FormView {
    let mut fields = Vec::new();
    let mut visitor = Renderer { values };
    Walker::new()
        .focus(focus.clone())
        .walk(schema, &mut visitor, &mut fields);

    FormView {
        focus: focus.to_string(),
        fields,
    }
}

fn on_focus_line(path: &Path, focus: Option<&Path>) -> bool {
    match focus {
        Some(focus) => path.has_prefix(focus) || focus.has_prefix(path),
        None => true,
    }
}

fn item_label(list: &Node, index: usize) -> String {
    format!("{} [{}]", list.label(), index)
}

struct Renderer<'v> {
    values: &'v Values,
}

impl Renderer<'_> {
    fn view(&self, node: &Node, cx: &Context<'_, Vec<FieldView>>, expanded: bool) -> FieldView {
        let path = cx.path.to_string();
        let summary = match (expanded, node.kind) {
            (false, NodeKind::Record) => Some(format!("{} fields", node.children.len())),
            (false, NodeKind::List(_)) => Some(format!("{} items", self.values.list_len(&path))),
            _ => None,
        };
        FieldView {
            value: self.values.get(&path).cloned().unwrap_or(Value::Null),
            label: node.label().to_string(),
            widget: Widget::for_node(node),
            depth: cx.depth,
            meta: node.meta.clone(),
            expanded,
            summary,
            path,
        }
    }
}

impl Visitor for Renderer<'_> {
    type State = Vec<FieldView>;

    fn visit_primitive(&mut self, node: &Node, cx: &mut Context<'_, Self::State>) -> Flow {
        let view = self.view(node, cx, true);
        cx.state.push(view);
        Flow::Continue
    }

    fn visit_record(&mut self, node: &Node, cx: &mut Context<'_, Self::State>) -> Flow {
        let expanded = on_focus_line(cx.path, cx.focus);
        let view = self.view(node, cx, expanded);
        cx.state.push(view);
        if expanded {
            Flow::Continue
        } else {
            Flow::Skip
        }
    }

    fn visit_list(&mut self, node: &Node, cx: &mut Context<'_, Self::State>) -> Flow {
        let expanded = on_focus_line(cx.path, cx.focus);
        let view = self.view(node, cx, expanded);
        cx.state.push(view);
        if !expanded {
            return Flow::Skip;
        }
        let len = self.values.list_len(&cx.path.to_string());
        Flow::Items((0..len).collect())
    }

    fn enter_item(&mut self, list: &Node, cx: &mut Context<'_, Self::State>) -> Flow {
        if list.element().is_some() {
            return Flow::Continue;
        }

        let path = cx.path.to_string();
        let expanded = on_focus_line(cx.path, cx.focus);
        cx.state.push(FieldView {
            value: self.values.get(&path).cloned().unwrap_or(Value::Null),
            label: item_label(list, cx.index.unwrap_or_default()),
            widget: Widget::Item,
            depth: cx.depth,
            meta: FieldMeta::default(),
            expanded,
            summary: (!expanded).then(|| format!("{} fields", list.children.len())),
            path,
        });

        if expanded {
            Flow::Continue
        } else {
            Flow::Skip
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub path: String,
    pub label: String,
}

/// A record, list or list element reachable in one step from the focus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub path: String,
    pub label: String,
    pub widget: Widget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub focus: String,
    pub breadcrumbs: Vec<Crumb>,
    pub sections: Vec<Section>,
}

/// Breadcrumbs down to `focus` and the sections directly below it.
pub fn navigate(schema: &Schema, values: &Values, focus: &Path) -> Navigation {
    let mut navigation = Navigation {
        focus: focus.to_string(),
        ..Navigation::default()
    };
    let mut visitor = Navigator { values };
    Walker::new()
        .focus(focus.clone())
        .walk(schema, &mut visitor, &mut navigation);
    navigation
}

struct Navigator<'v> {
    values: &'v Values,
}

impl Navigator<'_> {
    fn section(&self, node: &Node, path: &Path) -> Section {
        let wire = path.to_string();
        Section {
            items: node.is_list().then(|| self.values.list_len(&wire)),
            label: node.label().to_string(),
            widget: Widget::for_node(node),
            path: wire,
        }
    }
}

impl Visitor for Navigator<'_> {
    type State = Navigation;

    fn visit_primitive(&mut self, _node: &Node, _cx: &mut Context<'_, Navigation>) -> Flow {
        Flow::Continue
    }

    fn visit_record(&mut self, node: &Node, cx: &mut Context<'_, Navigation>) -> Flow {
        let focus = cx.focus.cloned().unwrap_or_default();
        if focus.has_prefix(cx.path) {
            cx.state.breadcrumbs.push(Crumb {
                path: cx.path.to_string(),
                label: node.label().to_string(),
            });
            return Flow::Continue;
        }
        if cx.path.parent() == focus {
            let section = self.section(node, cx.path);
            cx.state.sections.push(section);
        }
        Flow::Skip
    }

    fn visit_list(&mut self, node: &Node, cx: &mut Context<'_, Navigation>) -> Flow {
        let focus = cx.focus.cloned().unwrap_or_default();
        if !focus.has_prefix(cx.path) {
            if cx.path.parent() == focus {
                let section = self.section(node, cx.path);
                cx.state.sections.push(section);
            }
            return Flow::Skip;
        }

        cx.state.breadcrumbs.push(Crumb {
            path: cx.path.to_string(),
            label: node.label().to_string(),
        });

        let len = self.values.list_len(&cx.path.to_string());
        match focus.index_after(cx.path) {
            Some(index) if index < len && node.element().is_none() => Flow::Items(vec![index]),
            Some(_) => Flow::Skip,
            None => {
                for index in 0..len {
                    cx.state.sections.push(Section {
                        path: cx.path.index(index).to_string(),
                        label: item_label(node, index),
                        widget: Widget::Item,
                        items: None,
                    });
                }
                Flow::Skip
            }
        }
    }

    fn enter_item(&mut self, list: &Node, cx: &mut Context<'_, Navigation>) -> Flow {
        cx.state.breadcrumbs.push(Crumb {
            path: cx.path.to_string(),
            label: item_label(list, cx.index.unwrap_or_default()),
        });
        Flow::Continue
    }
}
