//! Schema subsystem.
//!
//! # Data Flow
//! ```text
//! #[derive(Serialize, Deserialize)] struct + record! { .. }
//!     → describe.rs (Describe::shape, static FieldDescriptors)
//!     → tree.rs (Schema::of, tree of Nodes, once at startup)
//!     → walk / form (read-only during request handling)
//! ```

pub mod describe;
mod macros;
pub mod tree;

pub use describe::{Describe, FieldDescriptor, FieldMeta, Shape, ValueType};
pub use tree::{ElementKind, Node, NodeKind, Schema, SchemaError};
