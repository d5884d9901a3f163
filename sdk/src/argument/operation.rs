//! Single-field predicates used by the filter argument

use crate::entity::types::{NodeError, NodeResult};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Operator vocabulary accepted inside a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    In,
    NotIn,
}

impl Operator {
    /// Tag a client uses for this operator
    pub fn tag(&self) -> &'static str {
        match self {
            Operator::Equal => "equal",
            Operator::NotEqual => "not_equal",
            Operator::GreaterThan => "greater_than",
            Operator::GreaterOrEqual => "greater_or_equal",
            Operator::LessThan => "less_than",
            Operator::LessOrEqual => "less_or_equal",
            Operator::In => "in",
            Operator::NotIn => "not_in",
        }
    }

    /// SQL symbol the operator renders to
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "!=",
            Operator::GreaterThan => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::LessThan => "<",
            Operator::LessOrEqual => "<=",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
        }
    }

    /// Whether the operator takes a sequence operand
    pub fn is_containment(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

impl FromStr for Operator {
    type Err = NodeError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "equal" => Ok(Operator::Equal),
            "not_equal" => Ok(Operator::NotEqual),
            "greater_than" => Ok(Operator::GreaterThan),
            "greater_or_equal" => Ok(Operator::GreaterOrEqual),
            "less_than" => Ok(Operator::LessThan),
            "less_or_equal" => Ok(Operator::LessOrEqual),
            "in" => Ok(Operator::In),
            "not_in" => Ok(Operator::NotIn),
            other => Err(NodeError::unsupported_operation(other)),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A validated predicate over one field.
///
/// Operands are kept as already-normalised literal text, so rendering can
/// never fail once an operation exists.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// `field <op> 'value'`
    Compare {
        field: String,
        operator: Operator,
        value: String,
    },
    /// `field [NOT] IN ('v1','v2',...)`
    Contains {
        field: String,
        operator: Operator,
        values: Vec<String>,
    },
}

impl Operation {
    /// Build an operation from an operator tag, checking the operand shape
    pub fn new(operator: &str, field: &str, operand: &Value) -> NodeResult<Self> {
        let operator: Operator = operator.parse()?;
        if operator.is_containment() {
            Self::contains(operator, field, operand)
        } else {
            Self::compare(operator, field, operand)
        }
    }

    fn compare(operator: Operator, field: &str, operand: &Value) -> NodeResult<Self> {
        let value = match operand {
            Value::String(s) => s.clone(),
            Value::Bool(b) => bool_literal(*b).to_string(),
            other => {
                return Err(NodeError::invalid_argument(
                    "filter",
                    format!(
                        "operation {} on field {} expects a string or boolean, got {}",
                        operator,
                        field,
                        json_kind(other)
                    ),
                ));
            }
        };

        Ok(Operation::Compare {
            field: field.to_string(),
            operator,
            value,
        })
    }

    fn contains(operator: Operator, field: &str, operand: &Value) -> NodeResult<Self> {
        let items = operand.as_array().ok_or_else(|| {
            NodeError::invalid_argument(
                "filter",
                format!(
                    "operation {} on field {} expects a list, got {}",
                    operator,
                    field,
                    json_kind(operand)
                ),
            )
        })?;

        let values = items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                Value::Number(n) => Ok(n.to_string()),
                Value::Bool(b) => Ok(bool_literal(*b).to_string()),
                other => Err(NodeError::invalid_argument(
                    "filter",
                    format!(
                        "operation {} on field {} only accepts scalar list items, got {}",
                        operator,
                        field,
                        json_kind(other)
                    ),
                )),
            })
            .collect::<NodeResult<Vec<_>>>()?;

        Ok(Operation::Contains {
            field: field.to_string(),
            operator,
            values,
        })
    }

    pub fn field(&self) -> &str {
        match self {
            Operation::Compare { field, .. } | Operation::Contains { field, .. } => field,
        }
    }

    pub fn operator(&self) -> Operator {
        match self {
            Operation::Compare { operator, .. } | Operation::Contains { operator, .. } => *operator,
        }
    }

    /// Render the predicate; an empty containment list renders as `""`
    pub fn to_sql(&self) -> String {
        match self {
            Operation::Compare {
                field,
                operator,
                value,
            } => format!(" {} {} '{}' ", field, operator.symbol(), escape_literal(value)),
            Operation::Contains {
                field,
                operator,
                values,
            } => {
                if values.is_empty() {
                    return String::new();
                }
                let list = values
                    .iter()
                    .map(|v| format!("'{}'", escape_literal(v)))
                    .collect::<Vec<_>>()
                    .join(",");
                format!(" {} {} ({}) ", field, operator.symbol(), list)
            }
        }
    }
}

/// Operation factory keyed by operator tag
pub fn operation_factory(operator: &str, field: &str, operand: &Value) -> NodeResult<Operation> {
    Operation::new(operator, field, operand)
}

fn bool_literal(b: bool) -> &'static str {
    if b { "1" } else { "0" }
}

// Values stay interpolated as literals; a quote inside one is doubled.
fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
