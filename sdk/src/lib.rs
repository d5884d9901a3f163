pub mod adapter;
pub mod argument;
pub mod entity;
pub mod executor;
pub mod runner;
pub mod testing;

// Re-export commonly used types for convenience
pub use adapter::{CellValue, Column, DataSource, RowSet, TableAdapter};
pub use argument::{
    Argument, ArgumentRegistry, FilterArgument, LimitArgument, Operation, Operator,
    OrderByArgument, QueryClauses, ValidatedArguments, operation_factory,
};
pub use entity::{
    Field, FieldType, Node, NodeError, NodeRegistry, NodeResult, Record, ResolveParams, Resolver,
    ScalarType, Schema, resolver_fn,
};
pub use executor::QueryRequest;
pub use runner::{Runner, RunnerArgs};

// Re-export async_trait macro for convenience
pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;
