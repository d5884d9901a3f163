//! The built schema graph, its SDL printer and its validator

pub mod printer;
pub mod types;
pub mod validation;

pub use types::{
    ArgumentDefinition, ObjectId, ObjectType, OutputType, RootField, Schema, SchemaField,
};
pub use validation::{SchemaValidator, ValidationResult};
