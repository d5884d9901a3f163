use super::operation::{Operation, json_kind, operation_factory};
use super::{Argument, FILTER_ARGUMENT, QueryClauses};
use crate::entity::types::{NodeError, NodeResult};
use serde_json::Value;
use std::any::Any;

/// `{field: {operator: operand}}`, compiled to a conjunction in WHERE
#[derive(Debug, Clone, Default)]
pub struct FilterArgument {
    operations: Vec<Operation>,
}

impl FilterArgument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }
}

impl Argument for FilterArgument {
    fn type_name(&self) -> &str {
        FILTER_ARGUMENT
    }

    fn validate(&mut self, input: &Value) -> NodeResult<()> {
        let fields = input.as_object().ok_or_else(|| {
            NodeError::invalid_argument(
                FILTER_ARGUMENT,
                format!("filter argument must be an object, got {}", json_kind(input)),
            )
        })?;

        for (field_name, raw) in fields {
            let operations = raw.as_object().ok_or_else(|| {
                NodeError::invalid_argument(
                    FILTER_ARGUMENT,
                    format!("argument for field {} must be an object", field_name),
                )
            })?;

            if operations.len() > 1 {
                return Err(NodeError::invalid_argument(
                    FILTER_ARGUMENT,
                    format!("argument for field {} must have only one operation", field_name),
                ));
            }

            let Some((operator, operand)) = operations.iter().next() else {
                return Err(NodeError::invalid_argument(
                    FILTER_ARGUMENT,
                    format!("argument for field {} has no operation", field_name),
                ));
            };

            let operation = operation_factory(operator, field_name, operand)?;
            self.operations.retain(|op| op.field() != field_name);
            self.operations.push(operation);
        }

        Ok(())
    }

    fn to_sql(&self) -> String {
        self.operations
            .iter()
            .map(Operation::to_sql)
            .filter(|predicate| !predicate.is_empty())
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    fn combine(&self, clauses: &mut QueryClauses) {
        clauses.set_where(self.to_sql());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
