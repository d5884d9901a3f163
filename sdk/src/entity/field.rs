//! Node attributes and their conversion into schema fields

use crate::entity::registry::SchemaBuilder;
use crate::entity::schema::SchemaField;
use crate::entity::schema::types::OutputType;
use crate::entity::traits::Resolver;
use crate::entity::types::{FieldType, NodeError, NodeResult};
use std::fmt;
use std::sync::Arc;

/// One attribute of a node
#[derive(Clone)]
pub struct Field {
    name: String,
    field_type: FieldType,
    resolver: Option<Arc<dyn Resolver>>,
    description: Option<String>,
    as_list: Option<bool>,
}

impl Field {
    /// Create a field; `field_type` is a scalar or a node tag such as `"department"`
    pub fn new<N: Into<String>, T: Into<FieldType>>(name: N, field_type: T) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            resolver: None,
            description: None,
            as_list: None,
        }
    }

    /// Resolve this field with its own resolver instead of reading it off the parent record
    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Override list-ness; a node-typed field otherwise follows the target node's `is_list`
    /// and a scalar field is a single value
    pub fn as_list(mut self, as_list: bool) -> Self {
        self.as_list = Some(as_list);
        self
    }

    pub fn with_description<D: Into<String>>(mut self, description: D) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn resolver(&self) -> Option<&Arc<dyn Resolver>> {
        self.resolver.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn list_override(&self) -> Option<bool> {
        self.as_list
    }

    /// Produce the schema field.
    ///
    /// A node-typed field builds the referenced node first, which is the
    /// only place one node's build pulls in another's.
    pub(crate) fn convert(&self, builder: &mut SchemaBuilder<'_>) -> NodeResult<SchemaField> {
        let (output, node_type, arguments) = match &self.field_type {
            FieldType::Scalar(scalar) => {
                let output = match self.as_list {
                    Some(true) => OutputType::List(Box::new(OutputType::Scalar(*scalar))),
                    _ => OutputType::Scalar(*scalar),
                };
                (output, None, Vec::new())
            }
            FieldType::Node(tag) => {
                let Some(index) = builder.node_index(tag) else {
                    return Err(NodeError::unsupported_field_type(tag));
                };
                builder.build_node(index)?;
                let mut output = builder.resolve_field_type(tag)?;
                if let (Some(as_list), Some(id)) = (self.as_list, output.object_id()) {
                    output = OutputType::for_node(id, as_list);
                }
                let arguments = builder.arguments_of(index).to_vec();
                (output, Some(tag.clone()), arguments)
            }
        };

        Ok(SchemaField {
            name: self.name.clone(),
            output,
            node_type,
            arguments,
            resolver: self.resolver.clone(),
            description: self.description.clone(),
        })
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("has_resolver", &self.resolver.is_some())
            .field("as_list", &self.as_list)
            .finish()
    }
}
