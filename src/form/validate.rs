//! Static per-field checks on a submission, before it is applied.
//!
//! Only constraints carried as field metadata are checked. Absent fields
//! are never reported: `required` means "may not be submitted empty".

use crate::form::{submitted_indices, FieldError, Rejection, Submission};
use crate::path::Path;
use crate::schema::{ElementKind, Node, NodeKind, Schema, ValueType};
use crate::walk::{Context, Flow, Visitor, Walker};

/// Check `submission` against the schema, reporting every violation.
pub fn validate(schema: &Schema, submission: &Submission) -> Result<(), Rejection> {
    let mut errors = unknown_keys(schema, submission);
    let mut visitor = Validator { submission };
    Walker::new().walk(schema, &mut visitor, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(Rejection::new(errors))
    }
}

/// Keys that are not valid paths, or that address nothing editable.
fn unknown_keys(schema: &Schema, submission: &Submission) -> Vec<FieldError> {
    submission
        .keys()
        .filter_map(|key| check_key(schema, key).err().map(|reason| FieldError::new(key.clone(), reason)))
        .collect()
}

/// Follow `key` through the schema segment by segment. Every segment below
/// a list of records must carry an index, and only list segments may.
fn check_key(schema: &Schema, key: &str) -> Result<(), String> {
    let path = Path::parse(key).map_err(|e| e.to_string())?;
    if path.to_string() != key {
        return Err(format!("is not a canonical path, expected '{}'", path));
    }

    let depth = path.len();
    let mut nodes = schema.fields();
    let mut target = None;
    for (i, segment) in path.iter().enumerate() {
        let node = nodes
            .iter()
            .find(|n| n.name == segment.name)
            .ok_or_else(|| "unknown field".to_string())?;
        let last = i + 1 == depth;

        match (node.kind, segment.index) {
            (NodeKind::List(ElementKind::Record), None) if !last => {
                return Err(format!("'{}' is a list and needs an index", segment.name));
            }
            (NodeKind::List(_), _) => {}
            (_, Some(_)) => return Err(format!("'{}' is not a list", segment.name)),
            (_, None) => {}
        }
        nodes = &node.children;
        target = Some(node);
    }

    match target.map(|n| n.kind) {
        Some(NodeKind::Record) => Err("records cannot be submitted directly".to_string()),
        Some(_) => Ok(()),
        None => Err("unknown field".to_string()),
    }
}

struct Validator<'s> {
    submission: &'s Submission,
}

impl Visitor for Validator<'_> {
    type State = Vec<FieldError>;

    fn visit_primitive(&mut self, node: &Node, cx: &mut Context<'_, Self::State>) -> Flow {
        if node.meta.readonly {
            return Flow::Skip;
        }
        let key = cx.path.to_string();
        if let Some(raw) = self.submission.get(&key) {
            if let Err(reason) = check(node, raw) {
                cx.state.push(FieldError::new(key, reason));
            }
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
        match submitted_indices(self.submission, &cx.path.to_string()) {
            Some(indices) => Flow::Items(indices.into_iter().collect()),
            None => Flow::Skip,
        }
    }
}

fn check(node: &Node, raw: &str) -> Result<(), String> {
    let meta = &node.meta;
    let value = raw.trim();

    if value.is_empty() {
        return if meta.required {
            Err("is required".to_string())
        } else {
            Ok(())
        };
    }

    match node.value_type() {
        Some(ValueType::Int) => {
            let number = value
                .parse::<i128>()
                .map_err(|_| format!("'{}' is not a whole number", value))?;
            check_range(meta.min, meta.max, number as f64)?;
        }
        Some(ValueType::Float) => {
            let number = value
                .parse::<f64>()
                .map_err(|_| format!("'{}' is not a number", value))?;
            check_range(meta.min, meta.max, number)?;
        }
        Some(ValueType::Bool) => {
            if !matches!(value, crate::reflect::CHECKED | "true" | "false" | "off") {
                return Err(format!("'{}' is not a boolean", value));
            }
        }
        Some(ValueType::String) | None => {
            let chars = raw.chars().count();
            if let Some(min) = meta.min_len {
                if chars < min {
                    return Err(format!("must be at least {} characters", min));
                }
            }
            if let Some(max) = meta.max_len {
                if chars > max {
                    return Err(format!("must be at most {} characters", max));
                }
            }
            if let Some(pattern) = node.pattern() {
                if !pattern.is_match(raw) {
                    return Err(format!(
                        "does not match pattern '{}'",
                        meta.pattern.as_deref().unwrap_or_default()
                    ));
                }
            }
        }
    }

    if !meta.options.is_empty() && !meta.options.iter().any(|o| o == value) {
        return Err(format!("must be one of: {}", meta.options.join(", ")));
    }

    Ok(())
}

fn check_range(min: Option<f64>, max: Option<f64>, number: f64) -> Result<(), String> {
    if let Some(min) = min {
        if number < min {
            return Err(format!("must be at least {}", min));
        }
    }
    if let Some(max) = max {
        if number > max {
            return Err(format!("must be at most {}", max));
        }
    }
    Ok(())
}
