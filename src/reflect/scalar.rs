//! Scalar leaves: strings, integers, booleans, floats and optional values.

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use crate::reflect::{Reflect, ReflectMut, ReflectRef};
use crate::schema::{Describe, Shape, ValueType};

/// Value a checkbox submits when ticked.
pub const CHECKED: &str = "on";

/// A submitted string that does not fit the target scalar type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{raw}' is not a valid {expected}: {reason}")]
pub struct ParseError {
    pub expected: ValueType,
    pub raw: String,
    pub reason: String,
}

impl ParseError {
    pub fn new(expected: ValueType, raw: &str, reason: impl ToString) -> Self {
        Self {
            expected,
            raw: raw.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// A leaf value that round-trips through the wire form.
pub trait Scalar: Send + Sync {
    /// Snapshot for rendering.
    fn to_json(&self) -> Value;

    /// Wire string that [`assign`](Scalar::assign) parses back to this value.
    fn to_wire(&self) -> String;

    /// Parse a submitted string and overwrite the value.
    fn assign(&mut self, raw: &str) -> Result<(), ParseError>;
}

macro_rules! reflect_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl Reflect for $t {
                fn reflect_ref(&self) -> ReflectRef<'_> {
                    ReflectRef::Scalar(self)
                }

                fn reflect_mut(&mut self) -> ReflectMut<'_> {
                    ReflectMut::Scalar(self)
                }
            }
        )*
    };
}

macro_rules! integer {
    ($($t:ty),* $(,)?) => {
        $(
            impl Describe for $t {
                fn shape() -> Shape {
                    Shape::Scalar(ValueType::Int)
                }
            }

            impl Scalar for $t {
                fn to_json(&self) -> Value {
                    Value::from(*self)
                }

                fn to_wire(&self) -> String {
                    self.to_string()
                }

                fn assign(&mut self, raw: &str) -> Result<(), ParseError> {
                    let trimmed = raw.trim();
                    *self = if trimmed.is_empty() {
                        0
                    } else {
                        trimmed
                            .parse::<$t>()
                            .map_err(|e| ParseError::new(ValueType::Int, raw, e))?
                    };
                    Ok(())
                }
            }

            reflect_scalar!($t);
        )*
    };
}

macro_rules! float {
    ($($t:ty),* $(,)?) => {
        $(
            impl Describe for $t {
                fn shape() -> Shape {
                    Shape::Scalar(ValueType::Float)
                }
            }

            impl Scalar for $t {
                fn to_json(&self) -> Value {
                    Value::from(*self)
                }

                fn to_wire(&self) -> String {
                    self.to_string()
                }

                fn assign(&mut self, raw: &str) -> Result<(), ParseError> {
                    let trimmed = raw.trim();
                    *self = if trimmed.is_empty() {
                        0.0
                    } else {
                        trimmed
                            .parse::<$t>()
                            .map_err(|e| ParseError::new(ValueType::Float, raw, e))?
                    };
                    Ok(())
                }
            }

            reflect_scalar!($t);
        )*
    };
}

integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
float!(f32, f64);

impl Describe for String {
    fn shape() -> Shape {
        Shape::Scalar(ValueType::String)
    }
}

impl Scalar for String {
    fn to_json(&self) -> Value {
        Value::String(self.clone())
    }

    fn to_wire(&self) -> String {
        self.clone()
    }

    fn assign(&mut self, raw: &str) -> Result<(), ParseError> {
        raw.clone_into(self);
        Ok(())
    }
}

impl Describe for bool {
    fn shape() -> Shape {
        Shape::Scalar(ValueType::Bool)
    }
}

impl Scalar for bool {
    fn to_json(&self) -> Value {
        Value::Bool(*self)
    }

    fn to_wire(&self) -> String {
        self.to_string()
    }

    /// Checkbox inputs submit [`CHECKED`]; radio pairs submit `true`/`false`.
    fn assign(&mut self, raw: &str) -> Result<(), ParseError> {
        *self = match raw.trim() {
            CHECKED | "true" => true,
            "" | "off" | "false" => false,
            other => {
                return Err(ParseError::new(
                    ValueType::Bool,
                    other,
                    "expected 'on', 'true' or 'false'",
                ))
            }
        };
        Ok(())
    }
}

impl Describe for PathBuf {
    fn shape() -> Shape {
        Shape::Scalar(ValueType::String)
    }
}

impl Scalar for PathBuf {
    fn to_json(&self) -> Value {
        Value::String(self.display().to_string())
    }

    fn to_wire(&self) -> String {
        self.display().to_string()
    }

    fn assign(&mut self, raw: &str) -> Result<(), ParseError> {
        *self = PathBuf::from(raw);
        Ok(())
    }
}

reflect_scalar!(String, bool, PathBuf);

/// Optional leaves render as the zero value of `T` when unset, and an empty
/// submission clears them.
impl<T> Scalar for Option<T>
where
    T: Scalar + Default,
{
    fn to_json(&self) -> Value {
        match self {
            Some(value) => value.to_json(),
            None => T::default().to_json(),
        }
    }

    fn to_wire(&self) -> String {
        self.as_ref().map(Scalar::to_wire).unwrap_or_default()
    }

    fn assign(&mut self, raw: &str) -> Result<(), ParseError> {
        if raw.trim().is_empty() {
            *self = None;
            return Ok(());
        }
        let mut value = T::default();
        value.assign(raw)?;
        *self = Some(value);
        Ok(())
    }
}

impl<T> Reflect for Option<T>
where
    T: Scalar + Default,
{
    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::Scalar(self)
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Scalar(self)
    }
}

/// Expose a type with `FromStr` and `Display` (typically a fieldless enum)
/// as a string-valued scalar.
#[macro_export]
macro_rules! scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl $crate::schema::Describe for $t {
                fn shape() -> $crate::schema::Shape {
                    $crate::schema::Shape::Scalar($crate::schema::ValueType::String)
                }
            }

            impl $crate::reflect::Scalar for $t {
                fn to_json(&self) -> $crate::__private::serde_json::Value {
                    $crate::__private::serde_json::Value::String(self.to_string())
                }

                fn to_wire(&self) -> String {
                    self.to_string()
                }

                fn assign(&mut self, raw: &str) -> Result<(), $crate::reflect::ParseError> {
                    *self = raw.trim().parse::<$t>().map_err(|e| {
                        $crate::reflect::ParseError::new($crate::schema::ValueType::String, raw, e)
                    })?;
                    Ok(())
                }
            }

            impl $crate::reflect::Reflect for $t {
                fn reflect_ref(&self) -> $crate::reflect::ReflectRef<'_> {
                    $crate::reflect::ReflectRef::Scalar(self)
                }

                fn reflect_mut(&mut self) -> $crate::reflect::ReflectMut<'_> {
                    $crate::reflect::ReflectMut::Scalar(self)
                }
            }
        )*
    };
}
