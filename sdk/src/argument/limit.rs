use super::operation::json_kind;
use super::{Argument, LIMIT_ARGUMENT, QueryClauses};
use crate::entity::types::{NodeError, NodeResult};
use serde_json::Value;
use std::any::Any;

/// `{count: n, offset: m}` pagination, rendered as `"<offset>,<count>"`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LimitArgument {
    count: u64,
    offset: u64,
}

impl LimitArgument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }
}

fn non_negative(key: &str, value: &Value) -> NodeResult<u64> {
    value.as_u64().ok_or_else(|| {
        NodeError::invalid_argument(
            LIMIT_ARGUMENT,
            format!(
                "{} must be a non-negative integer, got {}",
                key,
                match value {
                    Value::Number(n) => n.to_string(),
                    other => json_kind(other).to_string(),
                }
            ),
        )
    })
}

impl Argument for LimitArgument {
    fn type_name(&self) -> &str {
        LIMIT_ARGUMENT
    }

    fn validate(&mut self, input: &Value) -> NodeResult<()> {
        let map = input.as_object().ok_or_else(|| {
            NodeError::invalid_argument(
                LIMIT_ARGUMENT,
                format!(
                    "limit argument must be an object with count and offset, got {}",
                    json_kind(input)
                ),
            )
        })?;

        let count = map
            .get("count")
            .ok_or_else(|| NodeError::invalid_argument(LIMIT_ARGUMENT, "count is required"))?;
        let count = non_negative("count", count)?;

        let offset = match map.get("offset") {
            Some(offset) => non_negative("offset", offset)?,
            None => 0,
        };

        self.count = count;
        self.offset = offset;
        Ok(())
    }

    fn to_sql(&self) -> String {
        format!("{},{}", self.offset, self.count)
    }

    fn combine(&self, clauses: &mut QueryClauses) {
        clauses.set_limit(self.to_sql());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
