//! Queries executed end to end: arguments compiled to SQL, run against the
//! in-memory store, nested relationships resolved per parent record.

use gql_builder::adapter::{CellValue, Column, TableAdapter};
use gql_builder::argument::ArgumentRegistry;
use gql_builder::entity::{
    Field, Node, NodeError, NodeRegistry, Record, Resolver, ScalarType, Schema, resolver_fn,
};
use gql_builder::testing::MemoryDataSource;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn user_columns() -> Vec<Column> {
    vec![
        Column::new("id").required(),
        Column::new("name"),
        Column::new("age"),
        Column::new("is_male"),
        Column::new("dept_id").required(),
    ]
}

fn department_columns() -> Vec<Column> {
    vec![Column::new("id").required(), Column::new("name")]
}

/// Computed from the parent record rather than read from a column
fn label_resolver() -> Arc<dyn Resolver> {
    resolver_fn(|params| async move {
        let parent = params.parent.unwrap_or_default();
        let mut record = Record::new();
        record.insert(
            "label".to_string(),
            json!(format!("user {} of department {}", parent["id"], parent["dept_id"])),
        );
        Ok(vec![record])
    })
}

struct UserNode {
    source: Arc<MemoryDataSource>,
}

impl Node for UserNode {
    fn name(&self) -> &str {
        "users"
    }

    fn node_type(&self) -> &str {
        "user"
    }

    fn is_list(&self) -> bool {
        true
    }

    fn build_fields(&self) -> Vec<Field> {
        let department = TableAdapter::new("department", department_columns(), self.source.clone())
            .with_parent_link("id", "dept_id");
        vec![
            Field::new("id", ScalarType::Int),
            Field::new("name", ScalarType::String),
            Field::new("age", ScalarType::Int),
            Field::new("is_male", ScalarType::Boolean),
            Field::new("label", ScalarType::String).with_resolver(label_resolver()),
            Field::new("department", "department").with_resolver(Arc::new(department)),
        ]
    }

    fn resolver(&self) -> Arc<dyn Resolver> {
        Arc::new(TableAdapter::new("user", user_columns(), self.source.clone()))
    }
}

struct DepartmentNode {
    source: Arc<MemoryDataSource>,
}

impl Node for DepartmentNode {
    fn name(&self) -> &str {
        "departments"
    }

    fn node_type(&self) -> &str {
        "department"
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
            Field::new("members", "user").with_resolver(Arc::new(members)),
        ]
    }

    fn resolver(&self) -> Arc<dyn Resolver> {
        Arc::new(TableAdapter::new("department", department_columns(), self.source.clone()))
    }
}

fn setup() -> (Arc<Schema>, Arc<MemoryDataSource>) {
    let source = Arc::new(MemoryDataSource::new().unwrap());
    source
        .create_table("user", ["id", "name", "age", "is_male", "dept_id"])
        .unwrap();
    for (id, name, age, is_male, dept) in [
        (1, "alice", 30, false, 10),
        (2, "bob", 17, true, 20),
        (3, "carol", 41, false, 10),
        (4, "dave", 25, true, 10),
    ] {
        source
            .insert_row(
                "user",
                vec![
                    CellValue::Int(id),
                    name.into(),
                    CellValue::Int(age),
                    is_male.into(),
                    CellValue::Int(dept),
                ],
            )
            .unwrap();
    }
    source.create_table("department", ["id", "name"]).unwrap();
    source
        .insert_row("department", vec![CellValue::Int(10), "sales".into()])
        .unwrap();
    source
        .insert_row("department", vec![CellValue::Int(20), CellValue::Bytes(b"research".to_vec())])
        .unwrap();

    let mut registry = NodeRegistry::with_arguments(Arc::new(ArgumentRegistry::with_defaults()));
    registry
        .register(UserNode {
            source: source.clone(),
        })
        .unwrap();
    registry
        .register(DepartmentNode {
            source: source.clone(),
        })
        .unwrap();

    (registry.build_schema().unwrap(), source)
}

async fn run(schema: &Schema, query: &str) -> Result<Value, NodeError> {
    schema.execute(query, &Map::new(), CancellationToken::new()).await
}

#[tokio::test]
async fn test_filter_order_and_limit() {
    let (schema, source) = setup();
    let data = run(
        &schema,
        r#"{ users(filter: {age: {greater_or_equal: "18"}}, order_by: {age: desc}, limit: {count: 2}) { name age } }"#,
    )
    .await
    .unwrap();

    assert_eq!(
        data,
        json!({"users": [{"name": "carol", "age": 41}, {"name": "alice", "age": 30}]})
    );
    assert_eq!(
        source.executed().await,
        vec!["SELECT name,age,id,dept_id FROM user WHERE  age >= '18'  ORDER BY age DESC LIMIT 0,2"]
    );
}

#[tokio::test]
async fn test_order_by_list_keeps_client_priority() {
    let (schema, source) = setup();
    let data = run(
        &schema,
        r#"{ users(order_by: [{dept_id: asc}, {age: desc}]) { name } }"#,
    )
    .await
    .unwrap();

    assert_eq!(
        data,
        json!({"users": [
            {"name": "carol"},
            {"name": "alice"},
            {"name": "dave"},
            {"name": "bob"},
        ]})
    );
    assert_eq!(
        source.executed().await,
        vec!["SELECT name,id,dept_id FROM user ORDER BY dept_id ASC,age DESC"]
    );
}

#[tokio::test]
async fn test_containment_and_boolean_operands() {
    let (schema, source) = setup();
    let data = run(
        &schema,
        r#"{ users(filter: {id: {in: [1, 3]}, is_male: {equal: false}}) { name } }"#,
    )
    .await
    .unwrap();
    assert_eq!(data, json!({"users": [{"name": "alice"}, {"name": "carol"}]}));
    assert_eq!(
        source.executed().await,
        vec!["SELECT name,id,dept_id FROM user WHERE  id IN ('1','3')  AND  is_male = '0' "]
    );
}

#[tokio::test]
async fn test_empty_containment_is_no_predicate() {
    let (schema, source) = setup();
    let data = run(&schema, r#"{ users(filter: {id: {in: []}}) { id } }"#)
        .await
        .unwrap();
    assert_eq!(data["users"].as_array().unwrap().len(), 4);
    assert_eq!(source.executed().await, vec!["SELECT id,dept_id FROM user"]);
}

#[tokio::test]
async fn test_nested_relationship_per_parent() {
    let (schema, source) = setup();
    let data = run(
        &schema,
        r#"{ users(filter: {name: {equal: "bob"}}) { name department { name } } }"#,
    )
    .await
    .unwrap();

    // byte cells come back as text
    assert_eq!(
        data,
        json!({"users": [{"name": "bob", "department": [{"name": "research"}]}]})
    );
    assert_eq!(
        source.executed().await,
        vec![
            "SELECT name,id,dept_id FROM user WHERE  name = 'bob' ",
            "SELECT name,id FROM department WHERE  id = '20' ",
        ]
    );
}

#[tokio::test]
async fn test_nested_relationship_takes_its_own_arguments() {
    let (schema, source) = setup();
    let data = run(
        &schema,
        r#"{ departments(filter: {id: {equal: "10"}}) {
              name
              members(order_by: {age: asc}, limit: {count: 1, offset: 1}) { name }
           } }"#,
    )
    .await
    .unwrap();

    assert_eq!(
        data,
        json!({"departments": [{"name": "sales", "members": [{"name": "alice"}]}]})
    );
    assert_eq!(
        source.executed().await[1],
        "SELECT name,id,dept_id FROM user WHERE  dept_id = '10'  ORDER BY age ASC LIMIT 1,1"
    );
}

#[tokio::test]
async fn test_scalar_field_with_own_resolver() {
    let (schema, source) = setup();
    let data = run(
        &schema,
        r#"{ users(filter: {id: {in: [2, 3]}}) { id label } }"#,
    )
    .await
    .unwrap();

    assert_eq!(
        data,
        json!({"users": [
            {"id": 2, "label": "user 2 of department 20"},
            {"id": 3, "label": "user 3 of department 10"},
        ]})
    );
    // the computed field never reaches the data source
    assert_eq!(
        source.executed().await,
        vec!["SELECT id,dept_id FROM user WHERE  id IN ('2','3') "]
    );
}

#[tokio::test]
async fn test_scalar_fields_take_no_arguments() {
    let (schema, _source) = setup();

    let err = run(&schema, r#"{ users { id label(filter: {x: {equal: "1"}}) } }"#)
        .await
        .unwrap_err();
    assert!(
        matches!(err, NodeError::UnsupportedArgument { ref field, ref argument } if field == "label" && argument == "filter")
    );

    let err = run(&schema, r#"{ users { name(limit: {count: 1}) } }"#)
        .await
        .unwrap_err();
    assert!(matches!(err, NodeError::UnsupportedArgument { .. }));
    assert!(err.is_request_error());
}

#[tokio::test]
async fn test_variables_aliases_and_typename() {
    let (schema, _source) = setup();
    let mut variables = Map::new();
    variables.insert("min".to_string(), json!("26"));

    let data = schema
        .execute(
            r#"query Adults($min: String!) {
                 grownups: users(filter: {age: {greater_than: $min}}, order_by: {id: asc}) {
                   __typename
                   id
                   name
                 }
               }"#,
            &variables,
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(
        data,
        json!({"grownups": [
            {"__typename": "User", "id": 1, "name": "alice"},
            {"__typename": "User", "id": 3, "name": "carol"},
        ]})
    );
}

#[tokio::test]
async fn test_invalid_arguments_execute_nothing() {
    let (schema, source) = setup();

    let err = run(&schema, r#"{ users(limit: {offset: 1}) { id } }"#).await.unwrap_err();
    assert!(matches!(err, NodeError::InvalidArgument { .. }));
    assert!(err.to_string().contains("count is required"));

    let err = run(&schema, r#"{ users(limit: {count: -1}) { id } }"#).await.unwrap_err();
    assert!(matches!(err, NodeError::InvalidArgument { .. }));

    let err = run(&schema, r#"{ users(order_by: {age: "sideways"}) { id } }"#)
        .await
        .unwrap_err();
    assert!(matches!(err, NodeError::InvalidArgument { .. }));

    let err = run(&schema, r#"{ users(filter: {age: {equal: "1", not_equal: "2"}}) { id } }"#)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("must have only one operation"));

    let err = run(&schema, r#"{ users(filter: {age: {between: "1"}}) { id } }"#)
        .await
        .unwrap_err();
    assert!(matches!(err, NodeError::UnsupportedOperation { .. }));

    let err = run(&schema, r#"{ users(group_by: "age") { id } }"#).await.unwrap_err();
    assert!(matches!(err, NodeError::UnsupportedArgument { .. }));
    assert!(err.is_request_error());

    assert!(source.executed().await.is_empty());
}

#[tokio::test]
async fn test_malformed_queries() {
    let (schema, _source) = setup();

    for query in [
        "{ orders { id } }",
        "{ users { id { nested } } }",
        "{ users { salary } }",
        "mutation { users { id } }",
        "{ users { ...Named } } fragment Named on User { name }",
        "{ users { id ",
    ] {
        let err = run(&schema, query).await.unwrap_err();
        assert!(matches!(err, NodeError::Query { .. }), "{}: {}", query, err);
    }
}

#[tokio::test]
async fn test_data_source_failure_is_surfaced() {
    let (schema, source) = setup();
    source.fail_with("too many connections").await;

    let err = run(&schema, "{ users { id } }").await.unwrap_err();
    assert!(matches!(err, NodeError::Execution { .. }));
    assert!(err.to_string().contains("too many connections"));
}

#[tokio::test]
async fn test_cancelled_request_does_not_query() {
    let (schema, source) = setup();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = schema
        .execute("{ users { id } }", &Map::new(), cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, NodeError::Cancelled));
    assert!(source.executed().await.is_empty());
}

#[tokio::test]
async fn test_concurrent_queries_share_the_schema() {
    let (schema, _source) = setup();

    let mut handles = Vec::new();
    for dept in ["10", "20"] {
        let schema = schema.clone();
        handles.push(tokio::spawn(async move {
            let query = format!(r#"{{ users(filter: {{dept_id: {{equal: "{}"}}}}) {{ id }} }}"#, dept);
            schema
                .execute(&query, &Map::new(), CancellationToken::new())
                .await
                .unwrap()
        }));
    }

    let mut counts = Vec::new();
    for handle in handles {
        counts.push(handle.await.unwrap()["users"].as_array().unwrap().len());
    }
    assert_eq!(counts, vec![3, 1]);
}
