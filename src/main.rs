//! GraphQL gateway binary.
//!
//! Loads configuration, wires a demo schema and an in-memory user store into
//! the gateway, and serves it. Real deployments embed [`GatewayServer`] as a
//! library with their own schema, database handle, and user store.

use std::path::PathBuf;
use std::sync::Arc;

use async_graphql::{Context, EmptyMutation, EmptySubscription, Json, Object, Schema};
use clap::Parser;
use tokio::net::TcpListener;

use graphql_gateway::auth::InMemoryUserStore;
use graphql_gateway::config::{self, GatewayConfig};
use graphql_gateway::context::DbHandle;
use graphql_gateway::observability;
use graphql_gateway::schema::{self, DirectiveMap, SchemaError, SchemaSource};
use graphql_gateway::{ContextBuilder, ExecutionContext, GatewayServer};

#[derive(Parser)]
#[command(name = "graphql-gateway")]
#[command(about = "GraphQL HTTP/WebSocket gateway", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Placeholder database collaborator for the demo binary.
struct DemoDb;

struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Context fields assembled for the current operation.
    async fn viewer(&self, ctx: &Context<'_>) -> async_graphql::Result<Json<serde_json::Value>> {
        let exec = ctx.data::<ExecutionContext>()?;
        Ok(Json(serde_json::Value::Object(exec.values().clone())))
    }
}

struct DemoSchema;

impl SchemaSource for DemoSchema {
    type Directive = ();
    type Executor = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

    fn build(self, _directives: DirectiveMap<()>) -> Result<Self::Executor, SchemaError> {
        Ok(Schema::build(QueryRoot, EmptyMutation, EmptySubscription).finish())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Bad configuration is fatal: the process must not come up half-wired.
    let config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => GatewayConfig::default(),
    };

    observability::logging::init(&config.observability);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        graphql_path = %config.graphql.path,
        gui = config.graphql.gui,
        "configuration loaded"
    );

    let executor = schema::build_schema(DemoSchema, DirectiveMap::new(), DirectiveMap::new())?;

    let context_builder = ContextBuilder::new(DbHandle::new(DemoDb), config.auth.clone())
        .with_user_store(Arc::new(InMemoryUserStore::new()));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = GatewayServer::new(config, executor, context_builder);
    server.run(listener).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
