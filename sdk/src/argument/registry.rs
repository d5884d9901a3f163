//! Registry of argument kinds

use super::{
    Argument, FILTER_ARGUMENT, FilterArgument, LIMIT_ARGUMENT, LimitArgument, ORDER_BY_ARGUMENT,
    OrderByArgument,
};
use crate::entity::types::{NodeError, NodeResult};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Zero-argument constructor producing a fresh, empty argument instance
pub type ArgumentFactory = fn() -> Box<dyn Argument>;

static GLOBAL_REGISTRY: OnceLock<Arc<ArgumentRegistry>> = OnceLock::new();

fn new_filter_argument() -> Box<dyn Argument> {
    Box::new(FilterArgument::new())
}

fn new_limit_argument() -> Box<dyn Argument> {
    Box::new(LimitArgument::new())
}

fn new_order_by_argument() -> Box<dyn Argument> {
    Box::new(OrderByArgument::new())
}

/// Maps argument kind names to their constructors.
///
/// Populate it during start-up; after that it is only read, so a shared
/// reference can be used from any number of concurrent queries.
#[derive(Debug, Clone, Default)]
pub struct ArgumentRegistry {
    factories: HashMap<String, ArgumentFactory>,
}

impl ArgumentRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in filter, limit and order_by kinds
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register(FILTER_ARGUMENT, new_filter_argument)
            .register(LIMIT_ARGUMENT, new_limit_argument)
            .register(ORDER_BY_ARGUMENT, new_order_by_argument);
        registry
    }

    /// Register a kind; a later registration under the same name replaces the earlier one
    pub fn register<N: Into<String>>(&mut self, name: N, factory: ArgumentFactory) -> &mut Self {
        let name = name.into();
        debug!("Registering argument kind: {}", name);
        self.factories.insert(name, factory);
        self
    }

    /// A fresh instance of the named kind, `None` if no such kind exists
    pub fn factory(&self, name: &str) -> Option<Box<dyn Argument>> {
        self.factories.get(name).map(|factory| factory())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered kind names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// The process-wide registry, initialised with the built-in kinds on first use
    pub fn global() -> Arc<ArgumentRegistry> {
        GLOBAL_REGISTRY
            .get_or_init(|| Arc::new(Self::with_defaults()))
            .clone()
    }

    /// Replace the process-wide registry. Only possible before anything has used it.
    pub fn install(registry: ArgumentRegistry) -> NodeResult<()> {
        GLOBAL_REGISTRY.set(Arc::new(registry)).map_err(|_| {
            NodeError::schema("the global argument registry is already initialised")
        })
    }
}
