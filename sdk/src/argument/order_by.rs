use super::operation::json_kind;
use super::{Argument, ORDER_BY_ARGUMENT, QueryClauses};
use crate::entity::types::{NodeError, NodeResult};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Desc)
        } else {
            Err(())
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "ASC"),
            SortDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// `{field: "asc" | "desc"}` or a list of such objects, rendered as a
/// comma-joined ORDER BY list.
///
/// Inline GraphQL object literals reach validation with their keys sorted,
/// so a client that needs a sort priority across several fields sends the
/// list form, e.g. `[{dept: asc}, {age: desc}]`, or passes the object as a
/// JSON variable.
#[derive(Debug, Clone, Default)]
pub struct OrderByArgument {
    sorts: Vec<(String, SortDirection)>,
}

impl OrderByArgument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sorts(&self) -> &[(String, SortDirection)] {
        &self.sorts
    }
}

impl Argument for OrderByArgument {
    fn type_name(&self) -> &str {
        ORDER_BY_ARGUMENT
    }

    fn validate(&mut self, input: &Value) -> NodeResult<()> {
        let mut entries: Vec<(&String, &Value)> = Vec::new();
        match input {
            Value::Object(fields) => entries.extend(fields),
            Value::Array(items) => {
                for item in items {
                    let fields = item.as_object().ok_or_else(|| {
                        NodeError::invalid_argument(
                            ORDER_BY_ARGUMENT,
                            format!("order_by list items must be objects, got {}", json_kind(item)),
                        )
                    })?;
                    entries.extend(fields);
                }
            }
            other => {
                return Err(NodeError::invalid_argument(
                    ORDER_BY_ARGUMENT,
                    format!(
                        "order_by argument must be an object or a list of objects, got {}",
                        json_kind(other)
                    ),
                ));
            }
        }

        let mut sorts = Vec::with_capacity(entries.len());
        for (field_name, raw) in entries {
            let direction = raw.as_str().ok_or_else(|| {
                NodeError::invalid_argument(
                    ORDER_BY_ARGUMENT,
                    format!("argument for field {} must be a string", field_name),
                )
            })?;

            let direction: SortDirection = direction.parse().map_err(|_| {
                NodeError::invalid_argument(
                    ORDER_BY_ARGUMENT,
                    format!(r#"argument for field {} must be "asc" or "desc""#, field_name),
                )
            })?;
            sorts.push((field_name.clone(), direction));
        }

        for (field_name, direction) in sorts {
            self.sorts.retain(|(existing, _)| existing != &field_name);
            self.sorts.push((field_name, direction));
        }
        Ok(())
    }

    fn to_sql(&self) -> String {
        self.sorts
            .iter()
            .map(|(field, direction)| format!("{} {}", field, direction))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn combine(&self, clauses: &mut QueryClauses) {
        clauses.set_order_by(self.to_sql());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
