//! Static field descriptors.
//!
//! Every configuration type describes itself once through [`Describe`].
//! Records list their fields in declaration order; scalars report their
//! value type; `Vec<T>` reports a list of `T`'s shape.

use serde::Serialize;

/// Scalar kinds a primitive field can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Int,
    Bool,
    Float,
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueType::String => "string",
            ValueType::Int => "int",
            ValueType::Bool => "bool",
            ValueType::Float => "float",
        };
        f.write_str(name)
    }
}

/// Statically known structure of a type.
#[derive(Debug, Clone)]
pub enum Shape {
    Scalar(ValueType),
    Record(Vec<FieldDescriptor>),
    List(Box<Shape>),
}

/// Types that can describe their own structure.
pub trait Describe {
    fn shape() -> Shape;
}

impl<T: Describe> Describe for Vec<T> {
    fn shape() -> Shape {
        Shape::List(Box::new(T::shape()))
    }
}

/// Only optional scalars are supported; an optional record has no
/// `Reflect` implementation to match.
impl<T: Describe + crate::reflect::Scalar> Describe for Option<T> {
    fn shape() -> Shape {
        T::shape()
    }
}

/// UI constraints attached to a field, taken verbatim from its annotations.
///
/// The builder methods are named after the annotation keys accepted by
/// [`record!`](crate::record), so `{ required, min = 1 }` becomes
/// `FieldMeta::new().required().min(1)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub readonly: bool,
    #[serde(skip)]
    pub skip: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_len: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl FieldMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Exclude the field from the schema tree entirely.
    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    pub fn min(mut self, min: impl Into<f64>) -> Self {
        self.min = Some(min.into());
        self
    }

    pub fn max(mut self, max: impl Into<f64>) -> Self {
        self.max = Some(max.into());
        self
    }

    pub fn step(mut self, step: impl Into<f64>) -> Self {
        self.step = Some(step.into());
        self
    }

    pub fn min_len(mut self, len: usize) -> Self {
        self.min_len = Some(len);
        self
    }

    pub fn max_len(mut self, len: usize) -> Self {
        self.max_len = Some(len);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }
}

/// One declared field of a record type.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Wire name of the field.
    pub name: &'static str,
    pub shape: Shape,
    pub meta: FieldMeta,
}

impl FieldDescriptor {
    pub fn new(name: &'static str, shape: Shape, meta: FieldMeta) -> Self {
        Self { name, shape, meta }
    }

    /// Describe a field from an accessor on its parent, so the field's type
    /// is inferred rather than spelled out.
    pub fn of<P, T>(
        name: &'static str,
        _accessor: impl for<'a> Fn(&'a P) -> &'a T,
        meta: FieldMeta,
    ) -> Self
    where
        T: Describe,
    {
        Self::new(name, T::shape(), meta)
    }

    /// Type tag: `string`, `int`, `bool`, `float`, `record` or `list`.
    pub fn type_tag(&self) -> &'static str {
        match &self.shape {
            Shape::Scalar(ValueType::String) => "string",
            Shape::Scalar(ValueType::Int) => "int",
            Shape::Scalar(ValueType::Bool) => "bool",
            Shape::Scalar(ValueType::Float) => "float",
            Shape::Record(_) => "record",
            Shape::List(_) => "list",
        }
    }

    /// Nested fields for records and lists of records.
    pub fn fields(&self) -> &[FieldDescriptor] {
        match &self.shape {
            Shape::Record(fields) => fields,
            Shape::List(element) => match element.as_ref() {
                Shape::Record(fields) => fields,
                _ => &[],
            },
            Shape::Scalar(_) => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_builder() {
        let meta = FieldMeta::new()
            .required()
            .min(1)
            .max(65535)
            .options(["a", "b"])
            .pattern("^[a-z]+$");
        assert!(meta.required);
        assert!(!meta.readonly);
        assert_eq!(meta.min, Some(1.0));
        assert_eq!(meta.max, Some(65535.0));
        assert_eq!(meta.options, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(meta.pattern.as_deref(), Some("^[a-z]+$"));
    }

    #[test]
    fn test_type_tags() {
        let list = FieldDescriptor::new(
            "Tags",
            Vec::<String>::shape(),
            FieldMeta::new(),
        );
        assert_eq!(list.type_tag(), "list");
        assert!(list.fields().is_empty());

        let port = FieldDescriptor::new("Port", u16::shape(), FieldMeta::new());
        assert_eq!(port.type_tag(), "int");

        let maybe = FieldDescriptor::new("Ratio", Option::<f32>::shape(), FieldMeta::new());
        assert_eq!(maybe.type_tag(), "float");
    }

    #[test]
    fn test_optional_scalar_shape() {
        assert!(matches!(Option::<u16>::shape(), Shape::Scalar(ValueType::Int)));
        assert!(matches!(Option::<String>::shape(), Shape::Scalar(ValueType::String)));
    }
}
