//! Node catalog and schema construction

use crate::argument::ArgumentRegistry;
use crate::entity::schema::types::{ArgumentDefinition, ObjectId, ObjectType, OutputType, RootField};
use crate::entity::schema::{Schema, SchemaValidator};
use crate::entity::traits::Node;
use crate::entity::types::{NodeError, NodeResult, ScalarType};
use convert_case::{Case, Casing};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Build progress of one registered node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Unbuilt,
    /// Allocated and referenceable, fields still being built
    Placeholder(ObjectId),
    Complete(ObjectId),
}

impl BuildState {
    pub fn object_id(&self) -> Option<ObjectId> {
        match self {
            BuildState::Unbuilt => None,
            BuildState::Placeholder(id) | BuildState::Complete(id) => Some(*id),
        }
    }
}

/// Catalog of registered nodes.
///
/// Register every node first, then call [`NodeRegistry::build_schema`].
/// Nodes may reference each other in any order and in cycles; references
/// are only resolved at build time.
pub struct NodeRegistry {
    nodes: Vec<Arc<dyn Node>>,
    by_type: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    arguments: Arc<ArgumentRegistry>,
    schema: OnceLock<Arc<Schema>>,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeRegistry {
    /// A registry resolving argument kinds through the process-wide [`ArgumentRegistry`]
    pub fn new() -> Self {
        Self::with_arguments(ArgumentRegistry::global())
    }

    pub fn with_arguments(arguments: Arc<ArgumentRegistry>) -> Self {
        Self {
            nodes: Vec::new(),
            by_type: HashMap::new(),
            by_name: HashMap::new(),
            arguments,
            schema: OnceLock::new(),
        }
    }

    pub fn register<N: Node>(&mut self, node: N) -> NodeResult<()> {
        self.register_arc(Arc::new(node))
    }

    /// Add a node to the catalog. Its fields are not looked at until build time.
    pub fn register_arc(&mut self, node: Arc<dyn Node>) -> NodeResult<()> {
        let node_type = node.node_type().to_string();
        let name = node.name().to_string();

        if self.by_type.contains_key(&node_type) {
            return Err(NodeError::DuplicateNode { node_type });
        }
        if self.by_name.contains_key(&name) {
            return Err(NodeError::DuplicateName { name });
        }

        debug!("Registering node {} ({})", name, node_type);
        let index = self.nodes.len();
        self.nodes.push(node);
        self.by_type.insert(node_type, index);
        self.by_name.insert(name, index);
        // a new node invalidates any schema built so far
        self.schema = OnceLock::new();
        Ok(())
    }

    pub fn get_node(&self, node_type: &str) -> NodeResult<Arc<dyn Node>> {
        self.by_type
            .get(node_type)
            .map(|index| self.nodes[*index].clone())
            .ok_or_else(|| NodeError::unsupported_node_type(node_type))
    }

    pub fn get_node_by_name(&self, name: &str) -> Option<Arc<dyn Node>> {
        self.by_name.get(name).map(|index| self.nodes[*index].clone())
    }

    /// Registered type tags in registration order
    pub fn node_types(&self) -> Vec<&str> {
        self.nodes.iter().map(|node| node.node_type()).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn arguments(&self) -> &Arc<ArgumentRegistry> {
        &self.arguments
    }

    /// Build every registered node into one schema.
    ///
    /// The result is cached until the next registration. Any unresolved
    /// field type fails the whole build.
    pub fn build_schema(&self) -> NodeResult<Arc<Schema>> {
        if let Some(schema) = self.schema.get() {
            return Ok(schema.clone());
        }

        let mut builder = SchemaBuilder::new(self);
        let mut query = Vec::with_capacity(self.nodes.len());
        for (index, node) in self.nodes.iter().enumerate() {
            let id = builder.build_node(index)?;
            query.push(RootField {
                name: node.name().to_string(),
                node_type: node.node_type().to_string(),
                output: OutputType::for_node(id, node.is_list()),
                arguments: builder.arguments_of(index).to_vec(),
                resolver: node.resolver(),
            });
        }

        let schema = Schema::new(builder.into_objects(), query, self.arguments.clone());

        let result = SchemaValidator::new().validate(&schema);
        for warning in &result.warnings {
            warn!("Schema warning: {}", warning);
        }
        if !result.is_valid() {
            return Err(NodeError::schema(result.errors.join("; ")));
        }

        info!(
            "Built schema with {} nodes and {} root fields",
            schema.len(),
            schema.root_fields().len()
        );

        let schema = Arc::new(schema);
        let _ = self.schema.set(schema.clone());
        Ok(schema)
    }
}

/// Single-use arena builder behind [`NodeRegistry::build_schema`]
pub(crate) struct SchemaBuilder<'a> {
    registry: &'a NodeRegistry,
    states: Vec<BuildState>,
    objects: Vec<ObjectType>,
}

impl<'a> SchemaBuilder<'a> {
    fn new(registry: &'a NodeRegistry) -> Self {
        Self {
            registry,
            states: vec![BuildState::Unbuilt; registry.nodes.len()],
            objects: Vec::new(),
        }
    }

    pub(crate) fn node_index(&self, node_type: &str) -> Option<usize> {
        self.registry.by_type.get(node_type).copied()
    }

    /// Build a node once.
    ///
    /// The placeholder is allocated before any field is built, so a field
    /// referring back to a node that is still in progress resolves to that
    /// placeholder instead of recursing.
    pub(crate) fn build_node(&mut self, index: usize) -> NodeResult<ObjectId> {
        if let Some(id) = self.states[index].object_id() {
            return Ok(id);
        }

        let node = self.registry.nodes[index].clone();
        let arguments = self.argument_config(node.as_ref())?;
        let id = ObjectId(self.objects.len());
        self.objects.push(ObjectType::placeholder(
            node.node_type().to_case(Case::Pascal),
            node.node_type().to_string(),
            arguments,
        ));
        self.states[index] = BuildState::Placeholder(id);
        debug!("Allocated placeholder for node {}", node.node_type());

        let mut fields = Vec::new();
        for field in node.build_fields() {
            fields.push(field.convert(self)?);
        }

        let object = &mut self.objects[id.0];
        object.fields = fields;
        object.complete = true;
        self.states[index] = BuildState::Complete(id);
        debug!(
            "Built node {} with {} fields",
            node.node_type(),
            self.objects[id.0].fields.len()
        );
        Ok(id)
    }

    /// Output type of a field declared with `tag`
    pub(crate) fn resolve_field_type(&self, tag: &str) -> NodeResult<OutputType> {
        if let Some(scalar) = ScalarType::from_tag(tag) {
            return Ok(OutputType::Scalar(scalar));
        }

        let id = self
            .node_index(tag)
            .and_then(|index| self.states[index].object_id().map(|id| (index, id)));
        match id {
            Some((index, id)) => Ok(OutputType::for_node(
                id,
                self.registry.nodes[index].is_list(),
            )),
            None => Err(NodeError::unsupported_field_type(tag)),
        }
    }

    /// Argument configuration of an allocated node; empty for an unbuilt one
    pub(crate) fn arguments_of(&self, index: usize) -> &[ArgumentDefinition] {
        match self.states[index].object_id() {
            Some(id) => &self.objects[id.0].arguments,
            None => &[],
        }
    }

    fn argument_config(&self, node: &dyn Node) -> NodeResult<Vec<ArgumentDefinition>> {
        let mut definitions: Vec<ArgumentDefinition> = Vec::new();
        for kind in node.build_args() {
            if definitions.iter().any(|def| def.name == kind) {
                continue;
            }
            let argument = self
                .registry
                .arguments
                .factory(&kind)
                .ok_or_else(|| NodeError::unknown_argument(&kind))?;
            definitions.push(ArgumentDefinition::new(kind, argument.scalar_name()));
        }
        Ok(definitions)
    }

    fn into_objects(self) -> Vec<ObjectType> {
        self.objects
    }
}
