//! Core types for the node framework

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Primitive scalar types a field can be declared with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    String,
    Int,
    Float,
    Boolean,
}

impl ScalarType {
    /// Look up a primitive by its tag, `None` for anything else
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "String" => Some(ScalarType::String),
            "Int" => Some(ScalarType::Int),
            "Float" => Some(ScalarType::Float),
            "Boolean" => Some(ScalarType::Boolean),
            _ => None,
        }
    }

    /// The GraphQL name of the scalar
    pub fn graphql_name(&self) -> &'static str {
        match self {
            ScalarType::String => "String",
            ScalarType::Int => "Int",
            ScalarType::Float => "Float",
            ScalarType::Boolean => "Boolean",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.graphql_name())
    }
}

/// Declared type of a field: a primitive, or the type tag of another node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Scalar(ScalarType),
    Node(String),
}

impl FieldType {
    /// Parse a tag, treating every non-primitive tag as a node reference
    pub fn from_tag(tag: &str) -> Self {
        match ScalarType::from_tag(tag) {
            Some(scalar) => FieldType::Scalar(scalar),
            None => FieldType::Node(tag.to_string()),
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, FieldType::Scalar(_))
    }

    /// The referenced node's type tag, if this is a node reference
    pub fn node_type(&self) -> Option<&str> {
        match self {
            FieldType::Node(tag) => Some(tag),
            FieldType::Scalar(_) => None,
        }
    }
}

impl From<ScalarType> for FieldType {
    fn from(scalar: ScalarType) -> Self {
        FieldType::Scalar(scalar)
    }
}

impl From<&str> for FieldType {
    fn from(tag: &str) -> Self {
        FieldType::from_tag(tag)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Scalar(scalar) => write!(f, "{}", scalar),
            FieldType::Node(tag) => write!(f, "{}", tag),
        }
    }
}

/// Error type for schema construction, argument validation and query execution
#[derive(Error, Debug)]
pub enum NodeError {
    /// A field names a type that is neither a primitive nor a registered node
    #[error("unsupported field type: {field_type}")]
    UnsupportedFieldType { field_type: String },

    /// A node type tag was looked up but never registered
    #[error("unsupported node type: {node_type}")]
    UnsupportedNodeType { node_type: String },

    /// The same type tag was registered twice
    #[error("node type '{node_type}' is already registered")]
    DuplicateNode { node_type: String },

    /// Two nodes expose the same collection name
    #[error("node name '{name}' is used by more than one node")]
    DuplicateName { name: String },

    /// The built schema failed validation
    #[error("schema error: {reason}")]
    Schema { reason: String },

    /// A raw argument value does not have the shape its kind expects
    #[error("invalid {argument} argument: {reason}")]
    InvalidArgument { argument: String, reason: String },

    /// No argument kind is registered under this name
    #[error("unknown argument kind: {argument}")]
    UnknownArgument { argument: String },

    /// The argument exists but the queried field does not accept it
    #[error("field '{field}' does not accept argument '{argument}'")]
    UnsupportedArgument { field: String, argument: String },

    /// Filter operator tag outside the supported vocabulary
    #[error("unsupported operation type: {operator}")]
    UnsupportedOperation { operator: String },

    /// The clause accumulator is missing a mandatory fragment
    #[error("incomplete query: {reason}")]
    IncompleteQuery { reason: String },

    /// The query document cannot be executed against the schema
    #[error("query error: {reason}")]
    Query { reason: String },

    /// The data source failed; the source error is kept as-is
    #[error("failed to resolve '{node}': {source}")]
    Execution {
        node: String,
        #[source]
        source: anyhow::Error,
    },

    /// The caller cancelled the request before the data source answered
    #[error("request cancelled")]
    Cancelled,
}

impl NodeError {
    pub fn unsupported_field_type<T: AsRef<str>>(field_type: T) -> Self {
        Self::UnsupportedFieldType {
            field_type: field_type.as_ref().to_string(),
        }
    }

    pub fn unsupported_node_type<T: AsRef<str>>(node_type: T) -> Self {
        Self::UnsupportedNodeType {
            node_type: node_type.as_ref().to_string(),
        }
    }

    pub fn schema<R: AsRef<str>>(reason: R) -> Self {
        Self::Schema {
            reason: reason.as_ref().to_string(),
        }
    }

    /// Create an InvalidArgument error
    pub fn invalid_argument<A: AsRef<str>, R: AsRef<str>>(argument: A, reason: R) -> Self {
        Self::InvalidArgument {
            argument: argument.as_ref().to_string(),
            reason: reason.as_ref().to_string(),
        }
    }

    pub fn unknown_argument<A: AsRef<str>>(argument: A) -> Self {
        Self::UnknownArgument {
            argument: argument.as_ref().to_string(),
        }
    }

    pub fn unsupported_operation<O: AsRef<str>>(operator: O) -> Self {
        Self::UnsupportedOperation {
            operator: operator.as_ref().to_string(),
        }
    }

    pub fn incomplete_query<R: AsRef<str>>(reason: R) -> Self {
        Self::IncompleteQuery {
            reason: reason.as_ref().to_string(),
        }
    }

    pub fn query<R: AsRef<str>>(reason: R) -> Self {
        Self::Query {
            reason: reason.as_ref().to_string(),
        }
    }

    /// Wrap a data-source failure for the node being resolved
    pub fn execution<N: AsRef<str>>(node: N, source: anyhow::Error) -> Self {
        Self::Execution {
            node: node.as_ref().to_string(),
            source,
        }
    }

    /// Errors caused by a single request rather than by the schema itself
    pub fn is_request_error(&self) -> bool {
        match self {
            Self::InvalidArgument { .. }
            | Self::UnknownArgument { .. }
            | Self::UnsupportedArgument { .. }
            | Self::UnsupportedOperation { .. }
            | Self::IncompleteQuery { .. }
            | Self::Query { .. }
            | Self::Execution { .. }
            | Self::Cancelled => true,

            Self::UnsupportedFieldType { .. }
            | Self::UnsupportedNodeType { .. }
            | Self::DuplicateNode { .. }
            | Self::DuplicateName { .. }
            | Self::Schema { .. } => false,
        }
    }
}

/// Result type alias for node operations
pub type NodeResult<T> = Result<T, NodeError>;
