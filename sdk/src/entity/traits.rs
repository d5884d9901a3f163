//! Core traits for the node framework

use crate::argument::{ValidatedArguments, default_argument_kinds};
use crate::entity::field::Field;
use crate::entity::types::NodeResult;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// One resolved row, keyed by attribute name
pub type Record = Map<String, Value>;

/// Everything a resolver gets for one field of one query
#[derive(Debug)]
pub struct ResolveParams {
    /// Name of the field being resolved
    pub field: String,
    /// Arguments the client passed to this field, already validated
    pub arguments: ValidatedArguments,
    /// Attribute names the client asked for
    pub selection: Vec<String>,
    /// The enclosing record when resolving a nested field
    pub parent: Option<Record>,
    /// Cancelled when the caller gives up on the request
    pub cancel: CancellationToken,
}

impl ResolveParams {
    pub fn new<F: Into<String>>(field: F) -> Self {
        Self {
            field: field.into(),
            arguments: ValidatedArguments::new(),
            selection: Vec::new(),
            parent: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_arguments(mut self, arguments: ValidatedArguments) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn with_selection<I, S>(mut self, selection: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection = selection.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_parent(mut self, parent: Record) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Data-resolution function of a node or of a single field
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, params: ResolveParams) -> NodeResult<Vec<Record>>;
}

/// Adapts an async closure into a [`Resolver`]
pub struct FnResolver<F> {
    func: F,
}

#[async_trait]
impl<F, Fut> Resolver for FnResolver<F>
where
    F: Fn(ResolveParams) -> Fut + Send + Sync,
    Fut: Future<Output = NodeResult<Vec<Record>>> + Send,
{
    async fn resolve(&self, params: ResolveParams) -> NodeResult<Vec<Record>> {
        (self.func)(params).await
    }
}

/// Wrap an async closure as a shareable resolver
pub fn resolver_fn<F, Fut>(func: F) -> Arc<dyn Resolver>
where
    F: Fn(ResolveParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = NodeResult<Vec<Record>>> + Send + 'static,
{
    Arc::new(FnResolver { func })
}

/// A business object exposed as a top-level queryable collection.
///
/// The registry only ever talks to a node through this trait: it asks for
/// the field list while building the schema and for the resolver when a
/// query arrives.
pub trait Node: Send + Sync + 'static {
    /// Query name of the collection, e.g. `users`
    fn name(&self) -> &str;

    /// Unique type tag other nodes use to reference this one
    fn node_type(&self) -> &str;

    /// Whether the node resolves to a list of records
    fn is_list(&self) -> bool;

    fn build_fields(&self) -> Vec<Field>;

    /// Names of the argument kinds the node accepts
    fn build_args(&self) -> Vec<String> {
        default_argument_kinds()
    }

    fn resolver(&self) -> Arc<dyn Resolver>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_resolver_fn() {
        let resolver = resolver_fn(|params: ResolveParams| async move {
            let mut record = Record::new();
            record.insert("field".to_string(), json!(params.field));
            record.insert("selected".to_string(), json!(params.selection.len()));
            Ok(vec![record])
        });

        let rows = resolver
            .resolve(ResolveParams::new("users").with_selection(["id", "name"]))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["field"], json!("users"));
        assert_eq!(rows[0]["selected"], json!(2));
    }
}
