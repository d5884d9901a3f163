//! Schema construction over nodes that reference each other

use gql_builder::argument::{ArgumentRegistry, default_argument_kinds};
use gql_builder::entity::{
    Field, Node, NodeError, NodeRegistry, OutputType, Record, ResolveParams, Resolver,
    ScalarType,
};
use gql_builder::{NodeResult, async_trait};
use std::sync::Arc;

struct NoRows;

#[async_trait]
impl Resolver for NoRows {
    async fn resolve(&self, _params: ResolveParams) -> NodeResult<Vec<Record>> {
        Ok(Vec::new())
    }
}

/// A node declared entirely by data, so each test can shape its own graph
struct Declared {
    name: &'static str,
    node_type: &'static str,
    is_list: bool,
    fields: Vec<(&'static str, &'static str)>,
}

impl Declared {
    fn new(name: &'static str, node_type: &'static str) -> Self {
        Self {
            name,
            node_type,
            is_list: true,
            fields: vec![("id", "String")],
        }
    }

    fn singular(mut self) -> Self {
        self.is_list = false;
        self
    }

    fn field(mut self, name: &'static str, tag: &'static str) -> Self {
        self.fields.push((name, tag));
        self
    }
}

impl Node for Declared {
    fn name(&self) -> &str {
        self.name
    }

    fn node_type(&self) -> &str {
        self.node_type
    }

    fn is_list(&self) -> bool {
        self.is_list
    }

    fn build_fields(&self) -> Vec<Field> {
        self.fields
            .iter()
            .map(|(name, tag)| Field::new(*name, *tag))
            .collect()
    }

    fn resolver(&self) -> Arc<dyn Resolver> {
        Arc::new(NoRows)
    }
}

fn registry() -> NodeRegistry {
    NodeRegistry::with_arguments(Arc::new(ArgumentRegistry::with_defaults()))
}

#[test]
fn test_mutual_references_terminate() {
    let mut registry = registry();
    registry
        .register(Declared::new("users", "user").field("department", "department"))
        .unwrap();
    registry
        .register(Declared::new("departments", "department").field("members", "user"))
        .unwrap();

    let schema = registry.build_schema().unwrap();
    assert_eq!(schema.len(), 2);

    let user_id = schema.object_id("user").unwrap();
    let department_id = schema.object_id("department").unwrap();
    let user = schema.object(user_id);
    let department = schema.object(department_id);
    assert!(user.complete && department.complete);

    assert_eq!(
        user.field("department").unwrap().output,
        OutputType::for_node(department_id, true)
    );
    assert_eq!(
        department.field("members").unwrap().output,
        OutputType::for_node(user_id, true)
    );
}

#[test]
fn test_self_reference() {
    let mut registry = registry();
    registry
        .register(Declared::new("employees", "employee").field("manager", "employee"))
        .unwrap();

    let schema = registry.build_schema().unwrap();
    let id = schema.object_id("employee").unwrap();
    assert_eq!(
        schema.object(id).field("manager").unwrap().output.object_id(),
        Some(id)
    );
}

#[test]
fn test_shared_dependency_is_built_once() {
    let mut registry = registry();
    registry
        .register(Declared::new("users", "user").field("department", "department"))
        .unwrap();
    registry
        .register(Declared::new("projects", "project").field("owner", "department"))
        .unwrap();
    registry
        .register(Declared::new("departments", "department").singular())
        .unwrap();

    let schema = registry.build_schema().unwrap();
    assert_eq!(schema.len(), 3);
    assert_eq!(
        schema
            .objects()
            .iter()
            .filter(|object| object.node_type == "department")
            .count(),
        1
    );

    let from_user = schema
        .object_by_type("user")
        .unwrap()
        .field("department")
        .unwrap()
        .output
        .object_id();
    let from_project = schema
        .object_by_type("project")
        .unwrap()
        .field("owner")
        .unwrap()
        .output
        .object_id();
    assert!(from_user.is_some());
    assert_eq!(from_user, from_project);
    assert_eq!(from_user, schema.root_field("departments").unwrap().object_id());

    // a singular node is referenced without a list wrapper
    assert!(!schema.object_by_type("user").unwrap().field("department").unwrap().output.is_list());
}

#[test]
fn test_relationship_fields_carry_argument_config() {
    let mut registry = registry();
    registry
        .register(Declared::new("users", "user").field("department", "department"))
        .unwrap();
    registry.register(Declared::new("departments", "department")).unwrap();

    let schema = registry.build_schema().unwrap();
    let names: Vec<String> = schema
        .object_by_type("user")
        .unwrap()
        .field("department")
        .unwrap()
        .arguments
        .iter()
        .map(|argument| argument.name.clone())
        .collect();
    assert_eq!(names, default_argument_kinds());

    let scalar = schema.object_by_type("user").unwrap().field("id").unwrap();
    assert_eq!(scalar.output, OutputType::Scalar(ScalarType::String));
    assert!(scalar.arguments.is_empty());
}

#[test]
fn test_registration_order_does_not_matter() {
    let mut forward = registry();
    forward
        .register(Declared::new("users", "user").field("department", "department"))
        .unwrap();
    forward.register(Declared::new("departments", "department")).unwrap();

    let mut backward = registry();
    backward.register(Declared::new("departments", "department")).unwrap();
    backward
        .register(Declared::new("users", "user").field("department", "department"))
        .unwrap();

    let forward = forward.build_schema().unwrap();
    let backward = backward.build_schema().unwrap();
    assert_eq!(forward.to_sdl().len(), backward.to_sdl().len());
    assert_eq!(
        forward.root_fields().iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
        vec!["users", "departments"]
    );
    assert_eq!(
        backward.root_fields().iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
        vec!["departments", "users"]
    );
}

#[test]
fn test_duplicate_type_tag_keeps_one_entry() {
    let mut registry = registry();
    registry.register(Declared::new("users", "user")).unwrap();
    let err = registry
        .register(Declared::new("members", "user").field("nickname", "String"))
        .unwrap_err();
    assert!(matches!(err, NodeError::DuplicateNode { ref node_type } if node_type == "user"));

    let schema = registry.build_schema().unwrap();
    assert_eq!(schema.len(), 1);
    assert_eq!(schema.root_fields().len(), 1);
    assert!(schema.object_by_type("user").unwrap().field("nickname").is_none());
}

#[test]
fn test_unknown_field_type_aborts_without_schema() {
    let mut registry = registry();
    registry
        .register(Declared::new("users", "user").field("wallet", "wallet"))
        .unwrap();
    registry.register(Declared::new("departments", "department")).unwrap();

    let err = registry.build_schema().unwrap_err();
    assert!(matches!(err, NodeError::UnsupportedFieldType { .. }));
    assert!(!err.is_request_error());

    // still failing on retry: no half-built schema was cached
    assert!(registry.build_schema().is_err());
}

#[test]
fn test_node_without_fields_fails_validation() {
    struct Empty;

    impl Node for Empty {
        fn name(&self) -> &str {
            "empties"
        }

        fn node_type(&self) -> &str {
            "empty"
        }

        fn is_list(&self) -> bool {
            true
        }

        fn build_fields(&self) -> Vec<Field> {
            Vec::new()
        }

        fn resolver(&self) -> Arc<dyn Resolver> {
            Arc::new(NoRows)
        }
    }

    let mut registry = registry();
    registry.register(Empty).unwrap();
    let err = registry.build_schema().unwrap_err();
    assert!(matches!(err, NodeError::Schema { .. }));
    assert!(err.to_string().contains("at least one field"));
}

#[test]
fn test_field_overrides_list_shape() {
    struct Member;

    impl Node for Member {
        fn name(&self) -> &str {
            "members"
        }

        fn node_type(&self) -> &str {
            "member"
        }

        fn is_list(&self) -> bool {
            true
        }

        fn build_fields(&self) -> Vec<Field> {
            vec![
                Field::new("id", ScalarType::Int),
                Field::new("mentor", "member").as_list(false),
                Field::new("peers", "member"),
                Field::new("tags", ScalarType::String).as_list(true),
            ]
        }

        fn resolver(&self) -> Arc<dyn Resolver> {
            Arc::new(NoRows)
        }
    }

    let mut registry = registry();
    registry.register(Member).unwrap();
    let schema = registry.build_schema().unwrap();

    let id = schema.object_id("member").unwrap();
    let member = schema.object(id);
    assert_eq!(member.field("mentor").unwrap().output, OutputType::Object(id));
    assert_eq!(member.field("peers").unwrap().output, OutputType::for_node(id, true));
    assert_eq!(
        member.field("tags").unwrap().output,
        OutputType::List(Box::new(OutputType::Scalar(ScalarType::String)))
    );
    assert!(schema.root_field("members").unwrap().output.is_list());
    assert!(schema.to_sdl().contains("tags: [String]"));
}
