//! Query clause accumulator

use crate::entity::types::{NodeError, NodeResult};

/// Collects the fragments of one SELECT statement.
///
/// Each category holds at most one value; setting it again replaces the
/// previous value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryClauses {
    select_columns: String,
    from: String,
    where_clause: String,
    group_by: String,
    order_by: String,
    limit: String,
}

impl QueryClauses {
    pub fn new<C: Into<String>, F: Into<String>>(columns: C, from: F) -> Self {
        Self {
            select_columns: columns.into(),
            from: from.into(),
            ..Default::default()
        }
    }

    pub fn set_select<S: Into<String>>(&mut self, columns: S) {
        self.select_columns = columns.into();
    }

    pub fn set_from<S: Into<String>>(&mut self, from: S) {
        self.from = from.into();
    }

    pub fn set_where<S: Into<String>>(&mut self, filter: S) {
        self.where_clause = filter.into();
    }

    /// Conjoin a predicate with whatever WHERE fragment is already set
    pub fn and_where<S: AsRef<str>>(&mut self, predicate: S) {
        let predicate = predicate.as_ref();
        if predicate.trim().is_empty() {
            return;
        }
        if self.where_clause.trim().is_empty() {
            self.where_clause = predicate.to_string();
        } else {
            self.where_clause = format!("{} AND {}", self.where_clause, predicate);
        }
    }

    pub fn set_group_by<S: Into<String>>(&mut self, group_by: S) {
        self.group_by = group_by.into();
    }

    pub fn set_order_by<S: Into<String>>(&mut self, order_by: S) {
        self.order_by = order_by.into();
    }

    pub fn set_limit<S: Into<String>>(&mut self, limit: S) {
        self.limit = limit.into();
    }

    pub fn where_clause(&self) -> &str {
        &self.where_clause
    }

    /// Render the statement in SELECT, FROM, WHERE, GROUP BY, ORDER BY, LIMIT order
    pub fn to_sql(&self) -> NodeResult<String> {
        if self.select_columns.is_empty() || self.from.is_empty() {
            return Err(NodeError::incomplete_query(
                "not enough fields combined to form SQL statements",
            ));
        }

        let mut sql = format!("SELECT {} FROM {}", self.select_columns, self.from);

        if !self.where_clause.is_empty() {
            sql.push_str(&format!(" WHERE {}", self.where_clause));
        }
        if !self.group_by.is_empty() {
            sql.push_str(&format!(" GROUP BY {}", self.group_by));
        }
        if !self.order_by.is_empty() {
            sql.push_str(&format!(" ORDER BY {}", self.order_by));
        }
        if !self.limit.is_empty() {
            sql.push_str(&format!(" LIMIT {}", self.limit));
        }

        Ok(sql)
    }
}
