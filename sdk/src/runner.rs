use crate::entity::NodeRegistry;
use crate::executor::QueryRequest;
use anyhow::{Context, Result, bail};
use clap::Parser;
use serde_json::{Map, Value, json};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Command line arguments for a node schema runner
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "gql-builder")]
#[command(about = "Build a node schema and run GraphQL queries against it")]
pub struct RunnerArgs {
    /// Query document to execute
    #[arg(short, long, conflicts_with = "query_file")]
    pub query: Option<String>,

    /// Read the query document from a file
    #[arg(long)]
    pub query_file: Option<PathBuf>,

    /// Query variables as a JSON object
    #[arg(long)]
    pub variables: Option<String>,

    /// Operation to run when the document holds several
    #[arg(long)]
    pub operation_name: Option<String>,

    /// Print the schema as GraphQL SDL
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub print_schema: bool,

    /// Enable debug/verbose logging
    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    pub debug: bool,
}

impl RunnerArgs {
    /// The request described by the arguments, `None` when no query was given
    pub fn request(&self) -> Result<Option<QueryRequest>> {
        let query = match (&self.query, &self.query_file) {
            (Some(query), _) => query.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read query file: {}", path.display()))?,
            (None, None) => return Ok(None),
        };

        let variables = match &self.variables {
            Some(raw) => parse_variables(raw)?,
            None => Map::new(),
        };

        let mut request = QueryRequest::new(query).with_variables(variables);
        if let Some(name) = &self.operation_name {
            request = request.with_operation_name(name.clone());
        }
        Ok(Some(request))
    }
}

fn parse_variables(raw: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(raw).context("Failed to parse --variables as JSON")?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => bail!("--variables must be a JSON object, got {}", other),
    }
}

/// Builds the schema of a registry and executes one query against it
pub struct Runner {
    registry: NodeRegistry,
    args: Option<RunnerArgs>,
}

impl Runner {
    pub fn new(registry: NodeRegistry) -> Self {
        Self {
            registry,
            args: None,
        }
    }

    /// Use these arguments instead of parsing the command line
    pub fn with_args(mut self, args: RunnerArgs) -> Self {
        self.args = Some(args);
        self
    }

    /// Initialize logging based on debug flag
    /// Gracefully handles cases where a global subscriber is already initialized
    pub fn init_logging(debug: bool) {
        let level = if debug { "debug" } else { "info" };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| level.into()),
            )
            .with_target(false)
            .with_line_number(debug)
            .with_file(debug)
            .try_init();
    }

    /// Run on a fresh Tokio runtime; logs the error and exits the process on failure
    pub fn start(self) {
        let result = tokio::runtime::Runtime::new()
            .context("Failed to create runtime")
            .and_then(|rt| rt.block_on(self.run()));
        if let Err(e) = result {
            error!("Runner failed: {:#}", e);
            std::process::exit(1);
        }
    }

    /// Build the schema, print it if asked, then execute the query if one was given.
    ///
    /// Returns the `data` of the executed query. Ctrl-C cancels a running query.
    pub async fn run(self) -> Result<Option<Value>> {
        let args = self.args.clone().unwrap_or_else(RunnerArgs::parse);
        Self::init_logging(args.debug);
        debug!("Runner configuration: {:?}", args);

        let schema = self
            .registry
            .build_schema()
            .context("Failed to build schema")?;
        info!("Schema ready with {} root fields", schema.root_fields().len());

        if args.print_schema {
            println!("{}", schema.to_sdl());
        }

        let Some(request) = args.request()? else {
            info!("No query given");
            return Ok(None);
        };

        let cancel = CancellationToken::new();
        let guard = cancel.clone();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                guard.cancel();
            }
        });

        let result = schema.execute_request(&request, cancel).await;
        ctrl_c.abort();

        let data = result.context("Query failed")?;
        println!("{}", serde_json::to_string_pretty(&json!({ "data": data }))?);
        Ok(Some(data))
    }
}
