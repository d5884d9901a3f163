use anyhow::Result;
use gql_builder::Runner;
use gql_builder::testing::MemoryDataSource;
use std::sync::Arc;

fn main() -> Result<()> {
    let source = Arc::new(MemoryDataSource::new()?);
    user_department::seed(&source)?;
    let registry = user_department::build_registry(source)?;

    Runner::new(registry).start();
    Ok(())
}
