//! Resolver backed by a single SQL table

use super::source::DataSource;
use crate::argument::{Operator, QueryClauses, operation_factory};
use crate::entity::traits::{Record, ResolveParams, Resolver};
use crate::entity::types::{NodeError, NodeResult};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// A table column exposed under an attribute name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub alias: String,
    /// Selected even when the client did not ask for it
    pub required: bool,
}

impl Column {
    pub fn new<N: Into<String>>(name: N) -> Self {
        let name = name.into();
        Self {
            alias: name.clone(),
            name,
            required: false,
        }
    }

    pub fn with_alias<A: Into<String>>(mut self, alias: A) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn select_expr(&self) -> String {
        if self.name == self.alias {
            self.name.clone()
        } else {
            format!("{} AS {}", self.name, self.alias)
        }
    }
}

/// Restricts rows of a nested relation to those belonging to the parent record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentLink {
    /// Column of this table holding the reference
    pub column: String,
    /// Attribute of the parent record it must equal
    pub parent_key: String,
}

/// Queries one table with the columns the client selected.
///
/// Validated arguments are compiled into the statement's clauses; when
/// used as a relationship resolver the parent link is ANDed into WHERE.
pub struct TableAdapter {
    table: String,
    columns: Vec<Column>,
    source: Arc<dyn DataSource>,
    parent_link: Option<ParentLink>,
}

impl TableAdapter {
    pub fn new<T: Into<String>>(table: T, columns: Vec<Column>, source: Arc<dyn DataSource>) -> Self {
        Self {
            table: table.into(),
            columns,
            source,
            parent_link: None,
        }
    }

    /// Only return rows whose `column` equals the parent record's `parent_key`
    pub fn with_parent_link<C: Into<String>, K: Into<String>>(mut self, column: C, parent_key: K) -> Self {
        self.parent_link = Some(ParentLink {
            column: column.into(),
            parent_key: parent_key.into(),
        });
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn column_by_alias(&self, alias: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.alias == alias)
    }

    /// Columns to select: requested ones in request order, then required ones.
    /// Nothing requested maps to a column means every column.
    fn selected_columns(&self, selection: &[String]) -> Vec<&Column> {
        let mut selected: Vec<&Column> = Vec::new();
        for alias in selection {
            if let Some(column) = self.column_by_alias(alias) {
                if !selected.contains(&column) {
                    selected.push(column);
                }
            }
        }

        if selected.is_empty() {
            return self.columns.iter().collect();
        }

        for column in self.columns.iter().filter(|column| column.required) {
            if !selected.contains(&column) {
                selected.push(column);
            }
        }
        selected
    }

    /// The statement for one resolution, `None` when the parent link cannot match anything
    pub fn build_clauses(&self, params: &ResolveParams) -> NodeResult<Option<QueryClauses>> {
        let columns = self
            .selected_columns(&params.selection)
            .iter()
            .map(|column| column.select_expr())
            .collect::<Vec<_>>()
            .join(",");

        let mut clauses = QueryClauses::new(columns, self.table.as_str());
        params.arguments.combine_into(&mut clauses);

        if let Some(link) = &self.parent_link {
            let key = params
                .parent
                .as_ref()
                .and_then(|parent| parent.get(&link.parent_key))
                .and_then(link_operand);
            let Some(key) = key else {
                warn!(
                    "Parent record has no '{}' to link {}.{}",
                    link.parent_key, self.table, link.column
                );
                return Ok(None);
            };
            let predicate = operation_factory(Operator::Equal.tag(), &link.column, &key)?;
            clauses.and_where(predicate.to_sql());
        }

        Ok(Some(clauses))
    }
}

/// Parent attribute as a comparison operand; null and composite values cannot link
fn link_operand(value: &Value) -> Option<Value> {
    match value {
        Value::String(_) | Value::Bool(_) => Some(value.clone()),
        Value::Number(n) => Some(Value::String(n.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[async_trait]
impl Resolver for TableAdapter {
    async fn resolve(&self, params: ResolveParams) -> NodeResult<Vec<Record>> {
        let Some(clauses) = self.build_clauses(&params)? else {
            return Ok(Vec::new());
        };
        let sql = clauses.to_sql()?;
        debug!("Executing SQL for {}: {}", params.field, sql);

        let rows = tokio::select! {
            biased;
            _ = params.cancel.cancelled() => return Err(NodeError::Cancelled),
            rows = self.source.query(&sql, &params.cancel) => rows,
        };
        let rows = rows.map_err(|e| NodeError::execution(&params.field, e))?;

        debug!("{} returned {} rows", self.table, rows.len());
        Ok(rows.into_records())
    }
}
