//! Query arguments: validation of untyped client input and its compilation
//! into SQL clauses.
//!
//! An argument kind (filter, limit, order_by, or any custom kind installed
//! in the [`ArgumentRegistry`]) is instantiated fresh for every query,
//! validates the raw value a client sent, and then writes its fragment into
//! the [`QueryClauses`] of that query.

pub mod clauses;
pub mod filter;
pub mod limit;
pub mod operation;
pub mod order_by;
pub mod registry;

pub use clauses::QueryClauses;
pub use filter::FilterArgument;
pub use limit::LimitArgument;
pub use operation::{Operation, Operator, operation_factory};
pub use order_by::{OrderByArgument, SortDirection};
pub use registry::{ArgumentFactory, ArgumentRegistry};

use crate::entity::schema::ArgumentDefinition;
use crate::entity::types::{NodeError, NodeResult};
use convert_case::{Case, Casing};
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt::Debug;

pub const FILTER_ARGUMENT: &str = "filter";
pub const LIMIT_ARGUMENT: &str = "limit";
pub const ORDER_BY_ARGUMENT: &str = "order_by";

/// The argument kinds every node accepts unless it says otherwise
pub fn default_argument_kinds() -> Vec<String> {
    vec![
        FILTER_ARGUMENT.to_string(),
        LIMIT_ARGUMENT.to_string(),
        ORDER_BY_ARGUMENT.to_string(),
    ]
}

/// A pluggable query modifier.
///
/// An instance is stateful: `validate` records what it parsed, and the
/// recorded state is what `to_sql`/`combine` render. Never reuse an
/// instance for a second query.
pub trait Argument: Send + Sync + Debug + Any {
    /// Stable name, used for registry lookup and as the schema argument name
    fn type_name(&self) -> &str;

    /// Name of the custom scalar the argument is typed with in the schema
    fn scalar_name(&self) -> String {
        self.type_name().to_case(Case::Pascal)
    }

    /// Check the raw client value and record the parsed result
    fn validate(&mut self, input: &Value) -> NodeResult<()>;

    /// Render the recorded state as a clause fragment
    fn to_sql(&self) -> String;

    /// Write the fragment into the clause category this kind owns
    fn combine(&self, clauses: &mut QueryClauses);

    fn as_any(&self) -> &dyn Any;
}

/// Argument instances validated for one field of one query
#[derive(Debug, Default)]
pub struct ValidatedArguments {
    items: Vec<Box<dyn Argument>>,
}

impl ValidatedArguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a raw argument map against the arguments `field` accepts.
    ///
    /// Null values are treated as absent.
    pub fn validate(
        registry: &ArgumentRegistry,
        field: &str,
        accepted: &[ArgumentDefinition],
        raw: &Map<String, Value>,
    ) -> NodeResult<Self> {
        let mut validated = Self::new();

        for (name, value) in raw {
            if !accepted.iter().any(|def| &def.name == name) {
                return Err(NodeError::UnsupportedArgument {
                    field: field.to_string(),
                    argument: name.clone(),
                });
            }
            if value.is_null() {
                continue;
            }

            let mut argument = registry
                .factory(name)
                .ok_or_else(|| NodeError::unknown_argument(name))?;
            argument.validate(value)?;
            validated.push(argument);
        }

        Ok(validated)
    }

    pub fn push(&mut self, argument: Box<dyn Argument>) {
        self.items.push(argument);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Argument> {
        self.items
            .iter()
            .find(|arg| arg.type_name() == name)
            .map(|arg| arg.as_ref())
    }

    /// Get a validated argument as its concrete kind
    pub fn get_as<T: Argument>(&self, name: &str) -> Option<&T> {
        self.get(name).and_then(|arg| arg.as_any().downcast_ref::<T>())
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|arg| arg.type_name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Argument> {
        self.items.iter().map(|arg| arg.as_ref())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drive every validated argument into the accumulator
    pub fn combine_into(&self, clauses: &mut QueryClauses) {
        for argument in &self.items {
            argument.combine(clauses);
        }
    }
}
