//! Users and departments that refer to each other, backed by in-memory tables

use anyhow::Result;
use gql_builder::adapter::{CellValue, Column, TableAdapter};
use gql_builder::entity::{Field, Node, NodeRegistry, Resolver, ScalarType};
use gql_builder::testing::MemoryDataSource;
use std::sync::Arc;

pub const FIELD_TYPE_USER: &str = "user";
pub const FIELD_TYPE_DEPARTMENT: &str = "department";

fn user_columns() -> Vec<Column> {
    vec![
        Column::new("id").required(),
        Column::new("name"),
        Column::new("email"),
        Column::new("age"),
        Column::new("dept_id").required(),
    ]
}

fn department_columns() -> Vec<Column> {
    vec![
        Column::new("id").required(),
        Column::new("dept_name").with_alias("name"),
    ]
}

pub struct UserNode {
    source: Arc<MemoryDataSource>,
}

impl UserNode {
    pub fn new(source: Arc<MemoryDataSource>) -> Self {
        Self { source }
    }

    fn department_field(&self) -> Field {
        let adapter = TableAdapter::new("department", department_columns(), self.source.clone())
            .with_parent_link("id", "dept_id");
        Field::new("department", FIELD_TYPE_DEPARTMENT)
            .with_resolver(Arc::new(adapter))
            .as_list(false)
            .with_description("Department the user belongs to")
    }
}

impl Node for UserNode {
    fn name(&self) -> &str {
        "users"
    }

    fn node_type(&self) -> &str {
        FIELD_TYPE_USER
    }

    fn is_list(&self) -> bool {
        true
    }

    fn build_fields(&self) -> Vec<Field> {
        vec![
            Field::new("id", ScalarType::Int),
            Field::new("name", ScalarType::String),
            Field::new("email", ScalarType::String),
            Field::new("age", ScalarType::Int),
            self.department_field(),
        ]
    }

    fn resolver(&self) -> Arc<dyn Resolver> {
        Arc::new(TableAdapter::new("user", user_columns(), self.source.clone()))
    }
}

pub struct DepartmentNode {
    source: Arc<MemoryDataSource>,
}

impl DepartmentNode {
    pub fn new(source: Arc<MemoryDataSource>) -> Self {
        Self { source }
    }
}

impl Node for DepartmentNode {
    fn name(&self) -> &str {
        "departments"
    }

    fn node_type(&self) -> &str {
        FIELD_TYPE_DEPARTMENT
    }

    fn is_list(&self) -> bool {
        true
    }

    fn build_fields(&self) -> Vec<Field> {
        let members = TableAdapter::new("user", user_columns(), self.source.clone())
            .with_parent_link("dept_id", "id");
        vec![
            Field::new("id", ScalarType::Int),
            Field::new("name", ScalarType::String),
            Field::new("members", FIELD_TYPE_USER).with_resolver(Arc::new(members)),
        ]
    }

    fn resolver(&self) -> Arc<dyn Resolver> {
        Arc::new(TableAdapter::new("department", department_columns(), self.source.clone()))
    }
}

/// Create the tables and fill them with a handful of rows
pub fn seed(source: &MemoryDataSource) -> Result<()> {
    source.create_table("department", ["id", "dept_name"])?;
    for (id, name) in [(1, "engineering"), (2, "marketing")] {
        source.insert_row("department", vec![CellValue::Int(id), name.into()])?;
    }

    source.create_table("user", ["id", "name", "email", "age", "dept_id"])?;
    let users = [
        (1, "ada", "ada@example.com", 36, 1),
        (2, "grace", "grace@example.com", 45, 1),
        (3, "linus", "linus@example.com", 28, 2),
        (4, "margaret", "margaret@example.com", 33, 1),
    ];
    for (id, name, email, age, dept) in users {
        source.insert_row(
            "user",
            vec![
                CellValue::Int(id),
                name.into(),
                email.into(),
                CellValue::Int(age),
                CellValue::Int(dept),
            ],
        )?;
    }
    Ok(())
}

/// Register both nodes against `source`
pub fn build_registry(source: Arc<MemoryDataSource>) -> Result<NodeRegistry> {
    let mut registry = NodeRegistry::new();
    registry.register(UserNode::new(source.clone()))?;
    registry.register(DepartmentNode::new(source))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gql_builder::CancellationToken;
    use serde_json::{Map, json};

    fn registry() -> (NodeRegistry, Arc<MemoryDataSource>) {
        let source = Arc::new(MemoryDataSource::new().unwrap());
        seed(&source).unwrap();
        (build_registry(source.clone()).unwrap(), source)
    }

    #[test]
    fn test_schema_sdl() {
        let (registry, _) = registry();
        let schema = registry.build_schema().unwrap();
        let sdl = schema.to_sdl();
        assert!(sdl.contains("type User"));
        assert!(sdl.contains("type Department"));
        assert!(sdl.contains("scalar OrderBy"));

        // one department per user, many members per department
        let user = schema.object_by_type(FIELD_TYPE_USER).unwrap();
        assert!(!user.field("department").unwrap().output.is_list());
        let department = schema.object_by_type(FIELD_TYPE_DEPARTMENT).unwrap();
        assert!(department.field("members").unwrap().output.is_list());
    }

    #[tokio::test]
    async fn test_users_with_departments() {
        let (registry, source) = registry();
        let schema = registry.build_schema().unwrap();

        let data = schema
            .execute(
                r#"{ users(filter: {age: {greater_than: "30"}}, order_by: {age: desc}) {
                      name
                      department { name }
                   } }"#,
                &Map::new(),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(
            data,
            json!({"users": [
                {"name": "grace", "department": {"name": "engineering"}},
                {"name": "ada", "department": {"name": "engineering"}},
                {"name": "margaret", "department": {"name": "engineering"}},
            ]})
        );
        assert_eq!(
            source.executed().await[1],
            "SELECT dept_name AS name,id FROM department WHERE  id = '1' "
        );
    }

    #[tokio::test]
    async fn test_department_members() {
        let (registry, _) = registry();
        let schema = registry.build_schema().unwrap();

        let data = schema
            .execute(
                r#"{ departments(filter: {id: {equal: "2"}}) { name members { email } } }"#,
                &Map::new(),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(
            data,
            json!({"departments": [
                {"name": "marketing", "members": [{"email": "linus@example.com"}]},
            ]})
        );
    }
}
