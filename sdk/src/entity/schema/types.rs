//! Types of the built schema graph

use crate::argument::ArgumentRegistry;
use crate::entity::traits::Resolver;
use crate::entity::types::ScalarType;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Index of an object type in the schema arena.
///
/// Two fields referencing the same node hold the same id, so comparing ids
/// is comparing identity of the built object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) usize);

impl ObjectId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Output type of a field in the built schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputType {
    Scalar(ScalarType),
    Object(ObjectId),
    List(Box<OutputType>),
}

impl OutputType {
    /// Wrap `Object(id)` in a list when the node is a list node
    pub fn for_node(id: ObjectId, is_list: bool) -> Self {
        if is_list {
            OutputType::List(Box::new(OutputType::Object(id)))
        } else {
            OutputType::Object(id)
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, OutputType::List(_))
    }

    pub fn is_scalar(&self) -> bool {
        match self {
            OutputType::Scalar(_) => true,
            OutputType::Object(_) => false,
            OutputType::List(inner) => inner.is_scalar(),
        }
    }

    /// The object the type ultimately points at, looking through lists
    pub fn object_id(&self) -> Option<ObjectId> {
        match self {
            OutputType::Scalar(_) => None,
            OutputType::Object(id) => Some(*id),
            OutputType::List(inner) => inner.object_id(),
        }
    }
}

/// An argument a field accepts: its name and the scalar it is typed with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentDefinition {
    pub name: String,
    pub type_name: String,
}

impl ArgumentDefinition {
    pub fn new<N: Into<String>, T: Into<String>>(name: N, type_name: T) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// A field of a built object type
#[derive(Clone)]
pub struct SchemaField {
    pub name: String,
    pub output: OutputType,
    /// Type tag of the referenced node, for node-typed fields
    pub node_type: Option<String>,
    /// Arguments copied from the referenced node's configuration
    pub arguments: Vec<ArgumentDefinition>,
    /// Custom resolution override
    pub resolver: Option<Arc<dyn Resolver>>,
    pub description: Option<String>,
}

impl fmt::Debug for SchemaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaField")
            .field("name", &self.name)
            .field("output", &self.output)
            .field("node_type", &self.node_type)
            .field("arguments", &self.arguments)
            .field("has_resolver", &self.resolver.is_some())
            .finish()
    }
}

/// A built node: the placeholder allocated first, filled in once its fields are built
#[derive(Debug, Clone)]
pub struct ObjectType {
    /// GraphQL type name
    pub name: String,
    pub node_type: String,
    pub fields: Vec<SchemaField>,
    pub arguments: Vec<ArgumentDefinition>,
    pub complete: bool,
}

impl ObjectType {
    pub(crate) fn placeholder(
        name: String,
        node_type: String,
        arguments: Vec<ArgumentDefinition>,
    ) -> Self {
        Self {
            name,
            node_type,
            fields: Vec::new(),
            arguments,
            complete: false,
        }
    }

    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name.as_str()).collect()
    }
}

/// A top-level collection of the `Query` root
#[derive(Clone)]
pub struct RootField {
    pub name: String,
    pub node_type: String,
    pub output: OutputType,
    pub arguments: Vec<ArgumentDefinition>,
    pub resolver: Arc<dyn Resolver>,
}

impl RootField {
    pub fn object_id(&self) -> Option<ObjectId> {
        self.output.object_id()
    }
}

impl fmt::Debug for RootField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootField")
            .field("name", &self.name)
            .field("node_type", &self.node_type)
            .field("output", &self.output)
            .field("arguments", &self.arguments)
            .finish()
    }
}

/// The fully built, read-only schema graph
#[derive(Debug)]
pub struct Schema {
    objects: Vec<ObjectType>,
    by_type: HashMap<String, ObjectId>,
    query: Vec<RootField>,
    arguments: Arc<ArgumentRegistry>,
}

impl Schema {
    pub(crate) fn new(
        objects: Vec<ObjectType>,
        query: Vec<RootField>,
        arguments: Arc<ArgumentRegistry>,
    ) -> Self {
        let by_type = objects
            .iter()
            .enumerate()
            .map(|(index, object)| (object.node_type.clone(), ObjectId(index)))
            .collect();
        Self {
            objects,
            by_type,
            query,
            arguments,
        }
    }

    /// Panics on an id from another schema; ids are only minted by the builder
    pub fn object(&self, id: ObjectId) -> &ObjectType {
        &self.objects[id.0]
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&ObjectType> {
        self.objects.get(id.0)
    }

    pub fn object_id(&self, node_type: &str) -> Option<ObjectId> {
        self.by_type.get(node_type).copied()
    }

    pub fn object_by_type(&self, node_type: &str) -> Option<&ObjectType> {
        self.object_id(node_type).map(|id| self.object(id))
    }

    pub fn objects(&self) -> &[ObjectType] {
        &self.objects
    }

    pub fn root_field(&self, name: &str) -> Option<&RootField> {
        self.query.iter().find(|field| field.name == name)
    }

    pub fn root_fields(&self) -> &[RootField] {
        &self.query
    }

    pub fn argument_registry(&self) -> &ArgumentRegistry {
        &self.arguments
    }

    /// Number of built object types
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
