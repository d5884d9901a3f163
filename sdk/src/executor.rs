//! Execution of GraphQL query documents against a built schema

use crate::argument::ValidatedArguments;
use crate::entity::schema::{ArgumentDefinition, ObjectType, OutputType, Schema, SchemaField};
use crate::entity::traits::{Record, ResolveParams, Resolver};
use crate::entity::types::{NodeError, NodeResult};
use graphql_parser::query::{
    Definition, Document, Field, OperationDefinition, Selection, SelectionSet, Value as GqlValue,
    VariableDefinition,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

const TYPENAME: &str = "__typename";

/// A GraphQL request as clients usually send it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub operation_name: Option<String>,
    #[serde(default)]
    pub variables: Map<String, Value>,
}

impl QueryRequest {
    pub fn new<Q: Into<String>>(query: Q) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_operation_name<N: Into<String>>(mut self, name: N) -> Self {
        self.operation_name = Some(name.into());
        self
    }
}

impl Schema {
    /// Execute a query document and return its `data` object
    pub async fn execute(
        &self,
        query: &str,
        variables: &Map<String, Value>,
        cancel: CancellationToken,
    ) -> NodeResult<Value> {
        let request = QueryRequest::new(query).with_variables(variables.clone());
        self.execute_request(&request, cancel).await
    }

    pub async fn execute_request(
        &self,
        request: &QueryRequest,
        cancel: CancellationToken,
    ) -> NodeResult<Value> {
        let document = graphql_parser::parse_query::<String>(&request.query)
            .map_err(|e| NodeError::query(format!("GraphQL parse error: {}", e)))?;
        let (selection_set, definitions) =
            select_operation(&document, request.operation_name.as_deref())?;

        let execution = Execution {
            schema: self,
            variables: bind_variables(definitions, &request.variables)?,
            cancel,
        };
        execution.execute_root(selection_set).await
    }
}

/// The single query operation to run, with its variable definitions
fn select_operation<'d, 'q>(
    document: &'d Document<'q, String>,
    name: Option<&str>,
) -> NodeResult<(&'d SelectionSet<'q, String>, &'d [VariableDefinition<'q, String>])> {
    let mut operations = Vec::new();
    for definition in &document.definitions {
        match definition {
            Definition::Fragment(fragment) => {
                return Err(NodeError::query(format!(
                    "fragment '{}' is not supported",
                    fragment.name
                )));
            }
            Definition::Operation(OperationDefinition::SelectionSet(selection_set)) => {
                operations.push((None, selection_set, &[][..]));
            }
            Definition::Operation(OperationDefinition::Query(query)) => {
                operations.push((
                    query.name.as_deref(),
                    &query.selection_set,
                    query.variable_definitions.as_slice(),
                ));
            }
            Definition::Operation(OperationDefinition::Mutation(_)) => {
                return Err(NodeError::query("mutations are not supported"));
            }
            Definition::Operation(OperationDefinition::Subscription(_)) => {
                return Err(NodeError::query("subscriptions are not supported"));
            }
        }
    }

    let operation = match name {
        Some(name) => operations
            .into_iter()
            .find(|(op_name, _, _)| *op_name == Some(name))
            .ok_or_else(|| NodeError::query(format!("unknown operation '{}'", name)))?,
        None if operations.len() == 1 => operations.remove(0),
        None if operations.is_empty() => {
            return Err(NodeError::query("document contains no query operation"));
        }
        None => {
            return Err(NodeError::query(
                "document contains several operations, an operation name is required",
            ));
        }
    };

    Ok((operation.1, operation.2))
}

/// Provided values first, declared defaults second
fn bind_variables(
    definitions: &[VariableDefinition<'_, String>],
    provided: &Map<String, Value>,
) -> NodeResult<Map<String, Value>> {
    let mut variables = Map::new();
    for definition in definitions {
        let value = match (provided.get(&definition.name), &definition.default_value) {
            (Some(value), _) => value.clone(),
            (None, Some(default)) => literal_to_json(default, &Map::new())?,
            (None, None) => Value::Null,
        };
        variables.insert(definition.name.clone(), value);
    }
    Ok(variables)
}

fn literal_to_json(value: &GqlValue<'_, String>, variables: &Map<String, Value>) -> NodeResult<Value> {
    Ok(match value {
        GqlValue::Variable(name) => variables
            .get(name)
            .cloned()
            .ok_or_else(|| NodeError::query(format!("variable ${} is not defined", name)))?,
        GqlValue::Int(number) => number
            .as_i64()
            .map(Value::from)
            .ok_or_else(|| NodeError::query("integer literal out of range"))?,
        GqlValue::Float(f) => Number::from_f64(*f)
            .map(Value::Number)
            .ok_or_else(|| NodeError::query(format!("invalid float literal {}", f)))?,
        GqlValue::String(s) => Value::String(s.clone()),
        GqlValue::Boolean(b) => Value::Bool(*b),
        GqlValue::Null => Value::Null,
        GqlValue::Enum(e) => Value::String(e.clone()),
        GqlValue::List(items) => Value::Array(
            items
                .iter()
                .map(|item| literal_to_json(item, variables))
                .collect::<NodeResult<_>>()?,
        ),
        GqlValue::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, item)| Ok((key.clone(), literal_to_json(item, variables)?)))
                .collect::<NodeResult<_>>()?,
        ),
    })
}

fn as_field<'s, 'q>(selection: &'s Selection<'q, String>) -> NodeResult<&'s Field<'q, String>> {
    match selection {
        Selection::Field(field) => Ok(field),
        Selection::FragmentSpread(spread) => Err(NodeError::query(format!(
            "fragment spread '{}' is not supported",
            spread.fragment_name
        ))),
        Selection::InlineFragment(_) => Err(NodeError::query("inline fragments are not supported")),
    }
}

fn response_key(field: &Field<'_, String>) -> String {
    field.alias.clone().unwrap_or_else(|| field.name.clone())
}

struct Execution<'a> {
    schema: &'a Schema,
    variables: Map<String, Value>,
    cancel: CancellationToken,
}

impl<'a> Execution<'a> {
    async fn execute_root(&self, selection_set: &SelectionSet<'_, String>) -> NodeResult<Value> {
        let mut data = Map::new();
        for selection in &selection_set.items {
            let field = as_field(selection)?;
            let key = response_key(field);
            if field.name == TYPENAME {
                data.insert(key, Value::String("Query".to_string()));
                continue;
            }

            let root = self
                .schema
                .root_field(&field.name)
                .ok_or_else(|| NodeError::query(format!("unknown field '{}' on Query", field.name)))?;
            debug!("Resolving root field {}", root.name);
            let value = self
                .resolve(&root.name, &root.resolver, &root.arguments, &root.output, field, None)
                .await?;
            data.insert(key, value);
        }
        Ok(Value::Object(data))
    }

    fn raw_arguments(&self, field: &Field<'_, String>) -> NodeResult<Map<String, Value>> {
        field
            .arguments
            .iter()
            .map(|(name, value)| Ok((name.clone(), literal_to_json(value, &self.variables)?)))
            .collect()
    }

    /// Call a resolver for one field and complete what it returns
    async fn resolve(
        &self,
        name: &str,
        resolver: &Arc<dyn Resolver>,
        accepted: &[ArgumentDefinition],
        output: &OutputType,
        field: &Field<'_, String>,
        parent: Option<&Record>,
    ) -> NodeResult<Value> {
        let object_id = output
            .object_id()
            .ok_or_else(|| NodeError::query(format!("field '{}' is not a node", name)))?;
        let object = self.schema.object(object_id);

        let raw = self.raw_arguments(field)?;
        let arguments =
            ValidatedArguments::validate(self.schema.argument_registry(), name, accepted, &raw)?;

        let mut selection: Vec<String> = Vec::new();
        for item in &field.selection_set.items {
            let sub = as_field(item)?;
            if sub.name != TYPENAME && !selection.contains(&sub.name) {
                selection.push(sub.name.clone());
            }
        }

        if self.cancel.is_cancelled() {
            return Err(NodeError::Cancelled);
        }

        let params = ResolveParams {
            field: name.to_string(),
            arguments,
            selection,
            parent: parent.cloned(),
            cancel: self.cancel.clone(),
        };
        let records = resolver.resolve(params).await?;
        self.complete(object, output.is_list(), records, &field.selection_set)
            .await
    }

    /// Shape records into the output: an array for lists, first record or null otherwise
    fn complete<'b, 'q: 'b>(
        &'b self,
        object: &'b ObjectType,
        is_list: bool,
        records: Vec<Record>,
        selection_set: &'b SelectionSet<'q, String>,
    ) -> BoxFuture<'b, NodeResult<Value>> {
        Box::pin(async move {
            if is_list {
                let mut items = Vec::with_capacity(records.len());
                for record in &records {
                    items.push(self.complete_object(object, record, selection_set).await?);
                }
                Ok(Value::Array(items))
            } else {
                match records.first() {
                    Some(record) => self.complete_object(object, record, selection_set).await,
                    None => Ok(Value::Null),
                }
            }
        })
    }

    /// Value of a scalar field computed by its own resolver from the parent record
    async fn resolve_scalar(
        &self,
        field: &SchemaField,
        resolver: &Arc<dyn Resolver>,
        arguments: ValidatedArguments,
        parent: &Record,
    ) -> NodeResult<Value> {
        if self.cancel.is_cancelled() {
            return Err(NodeError::Cancelled);
        }

        let params = ResolveParams {
            field: field.name.clone(),
            arguments,
            selection: vec![field.name.clone()],
            parent: Some(parent.clone()),
            cancel: self.cancel.clone(),
        };
        let records = resolver.resolve(params).await?;
        let mut values = records
            .iter()
            .map(|record| record.get(&field.name).cloned().unwrap_or(Value::Null));

        if field.output.is_list() {
            Ok(Value::Array(values.collect()))
        } else {
            Ok(values.next().unwrap_or(Value::Null))
        }
    }

    async fn complete_object(
        &self,
        object: &ObjectType,
        record: &Record,
        selection_set: &SelectionSet<'_, String>,
    ) -> NodeResult<Value> {
        let mut out = Map::new();
        for item in &selection_set.items {
            let field = as_field(item)?;
            let key = response_key(field);
            if field.name == TYPENAME {
                out.insert(key, Value::String(object.name.clone()));
                continue;
            }

            let schema_field = object.field(&field.name).ok_or_else(|| {
                NodeError::query(format!("unknown field '{}' on {}", field.name, object.name))
            })?;

            let value = match (schema_field.output.object_id(), &schema_field.resolver) {
                (None, resolver) => {
                    if !field.selection_set.items.is_empty() {
                        return Err(NodeError::query(format!(
                            "field '{}' on {} is a scalar and takes no selection",
                            field.name, object.name
                        )));
                    }
                    // scalars declare no arguments, so any given one is rejected here
                    let raw = self.raw_arguments(field)?;
                    let arguments = ValidatedArguments::validate(
                        self.schema.argument_registry(),
                        &schema_field.name,
                        &schema_field.arguments,
                        &raw,
                    )?;
                    match resolver {
                        Some(resolver) => {
                            self.resolve_scalar(schema_field, resolver, arguments, record)
                                .await?
                        }
                        None => record.get(&field.name).cloned().unwrap_or(Value::Null),
                    }
                }
                (Some(_), Some(resolver)) => {
                    self.resolve(
                        &schema_field.name,
                        resolver,
                        &schema_field.arguments,
                        &schema_field.output,
                        field,
                        Some(record),
                    )
                    .await?
                }
                (Some(id), None) => {
                    if !field.arguments.is_empty() {
                        return Err(NodeError::query(format!(
                            "field '{}' on {} is read from its parent and takes no arguments",
                            field.name, object.name
                        )));
                    }
                    let nested = self.schema.object(id);
                    match record.get(&field.name) {
                        None | Some(Value::Null) => Value::Null,
                        Some(Value::Object(map)) => {
                            self.complete(nested, false, vec![map.clone()], &field.selection_set)
                                .await?
                        }
                        Some(Value::Array(items)) => {
                            let records = items
                                .iter()
                                .map(|item| match item {
                                    Value::Object(map) => Ok(map.clone()),
                                    _ => Err(NodeError::query(format!(
                                        "field '{}' on {} holds a non-object item",
                                        field.name, object.name
                                    ))),
                                })
                                .collect::<NodeResult<Vec<_>>>()?;
                            self.complete(nested, true, records, &field.selection_set)
                                .await?
                        }
                        Some(_) => {
                            return Err(NodeError::query(format!(
                                "field '{}' on {} does not hold an object",
                                field.name, object.name
                            )));
                        }
                    }
                }
            };
            out.insert(key, value);
        }
        Ok(Value::Object(out))
    }
}
