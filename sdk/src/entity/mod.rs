//! Node framework
//!
//! Nodes declare typed fields, possibly referring to each other. The
//! [`NodeRegistry`] resolves the graph of nodes into one validated,
//! memoized [`Schema`] that queries are executed against.

pub mod field;
pub mod registry;
pub mod schema;
pub mod traits;
pub mod types;

// Re-export commonly used types and traits
pub use field::Field;
pub use registry::{BuildState, NodeRegistry};
pub use traits::{FnResolver, Node, Record, ResolveParams, Resolver, resolver_fn};
pub use types::{FieldType, NodeError, NodeResult, ScalarType};

// Re-export schema types
pub use schema::{ArgumentDefinition, ObjectId, ObjectType, OutputType, Schema, SchemaField};
