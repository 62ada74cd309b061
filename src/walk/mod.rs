//! Depth-first traversal of the schema tree.
//!
//! # Responsibilities
//! - Visit every node in document order, pre-order
//! - Accumulate the `Path` of each node, including list indices
//! - Dispatch by node kind to a pluggable `Visitor`
//!
//! # Design Decisions
//! - The walker never reads or writes the live value; visitors correlate
//!   paths with the value themselves
//! - A record's children are walked unless its visitor returns `Flow::Skip`
//! - A list's elements are walked only for the indices the visitor returns
//!   in `Flow::Items`, since only the visitor knows which elements exist
//! - Nodes deeper than `max_depth` are silently not visited
//! - `Visitor::enter_item` runs before each list element is descended

use crate::path::Path;
use crate::schema::{ElementKind, Node, NodeKind, Schema};

/// What the walker does after a visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Descend into a record's children. For lists, equivalent to `Skip`.
    Continue,
    /// Prune the subtree below this node.
    Skip,
    /// Descend into these elements of a list, in the given order.
    Items(Vec<usize>),
}

/// Per-node traversal context.
pub struct Context<'a, S> {
    /// Full path of the visited node.
    pub path: &'a Path,
    /// Zero for top-level fields.
    pub depth: usize,
    pub parent: Option<&'a Node>,
    /// Index of the enclosing list element, if inside one.
    pub index: Option<usize>,
    /// State carried across the whole traversal.
    pub state: &'a mut S,
    /// Path the caller is focused on, if any.
    pub focus: Option<&'a Path>,
}

/// One behaviour run over the schema tree.
pub trait Visitor {
    type State;

    fn visit_primitive(&mut self, node: &Node, cx: &mut Context<'_, Self::State>) -> Flow;
    fn visit_record(&mut self, node: &Node, cx: &mut Context<'_, Self::State>) -> Flow;
    fn visit_list(&mut self, node: &Node, cx: &mut Context<'_, Self::State>) -> Flow;

    /// Called before descending into one element of `list`, with the
    /// element's indexed path. Returning `Flow::Skip` skips the element.
    fn enter_item(&mut self, _list: &Node, _cx: &mut Context<'_, Self::State>) -> Flow {
        Flow::Continue
    }
}

/// The traversal engine shared by every form behaviour.
#[derive(Debug, Clone)]
pub struct Walker {
    max_depth: usize,
    focus: Option<Path>,
}

impl Default for Walker {
    fn default() -> Self {
        Self {
            max_depth: usize::MAX,
            focus: None,
        }
    }
}

struct Frame<'a> {
    base: &'a Path,
    depth: usize,
    parent: Option<&'a Node>,
    index: Option<usize>,
}

impl Walker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn focus(mut self, focus: Path) -> Self {
        self.focus = Some(focus);
        self
    }

    /// Walk every top-level field of `schema`.
    pub fn walk<V: Visitor>(&self, schema: &Schema, visitor: &mut V, state: &mut V::State) {
        let root = Path::root();
        let frame = Frame {
            base: &root,
            depth: 0,
            parent: None,
            index: None,
        };
        self.walk_nodes(schema.fields(), &frame, visitor, state);
    }

    fn walk_nodes<V: Visitor>(
        &self,
        nodes: &[Node],
        frame: &Frame<'_>,
        visitor: &mut V,
        state: &mut V::State,
    ) {
        if frame.depth > self.max_depth {
            return;
        }
        for node in nodes {
            let path = if frame.base.is_root() {
                Path::new(node.name.clone())
            } else {
                frame.base.child(node.name.clone())
            };
            self.walk_node(node, &path, frame, visitor, state);
        }
    }

    fn walk_node<V: Visitor>(
        &self,
        node: &Node,
        path: &Path,
        frame: &Frame<'_>,
        visitor: &mut V,
        state: &mut V::State,
    ) {
        let mut cx = Context {
            path,
            depth: frame.depth,
            parent: frame.parent,
            index: frame.index,
            state: &mut *state,
            focus: self.focus.as_ref(),
        };

        match node.kind {
            NodeKind::Primitive(_) => {
                visitor.visit_primitive(node, &mut cx);
            }
            NodeKind::Record => {
                if visitor.visit_record(node, &mut cx) == Flow::Skip {
                    return;
                }
                let child = Frame {
                    base: path,
                    depth: frame.depth + 1,
                    parent: Some(node),
                    index: frame.index,
                };
                self.walk_nodes(&node.children, &child, visitor, state);
            }
            NodeKind::List(element) => {
                let Flow::Items(indices) = visitor.visit_list(node, &mut cx) else {
                    return;
                };
                if frame.depth + 1 > self.max_depth {
                    return;
                }
                for index in indices {
                    let item_path = path.index(index);
                    let item = Frame {
                        base: &item_path,
                        depth: frame.depth + 1,
                        parent: Some(node),
                        index: Some(index),
                    };
                    let mut item_cx = Context {
                        path: &item_path,
                        depth: item.depth,
                        parent: item.parent,
                        index: item.index,
                        state: &mut *state,
                        focus: self.focus.as_ref(),
                    };
                    if visitor.enter_item(node, &mut item_cx) == Flow::Skip {
                        continue;
                    }
                    match (element, node.element()) {
                        (ElementKind::Primitive(_), Some(element)) => {
                            self.walk_node(element, &item_path, &item, visitor, state);
                        }
                        _ => self.walk_nodes(&node.children, &item, visitor, state),
                    }
                }
            }
        }
    }
}
