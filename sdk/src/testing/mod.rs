//! Testing doubles for nodes backed by SQL tables
//!
//! [`MemoryDataSource`] stands in for a database: it executes the statements
//! a [`crate::adapter::TableAdapter`] renders against in-memory tables and
//! records every statement it receives.

pub mod memory_source;

pub use memory_source::MemoryDataSource;
