//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router around the GraphQL endpoint
//! - Assemble the per-operation context before execution
//! - Complete WebSocket handshakes for GraphQL subscriptions
//! - Mount caller-supplied middlewares after the main handler
//! - Wire ambient middleware (tracing, timeout, request ID)
//! - Reject upgrade attempts on unrecognized targets

use std::sync::Arc;
use std::time::Duration;

use async_graphql::http::{playground_source, GraphQLPlaygroundConfig, ALL_WEBSOCKET_PROTOCOLS};
use async_graphql::{Data, Executor};
use async_graphql_axum::{GraphQLProtocol, GraphQLRequest, GraphQLResponse, GraphQLWebSocket};
use axum::{
    body::Body,
    extract::{ws::WebSocketUpgrade, FromRequestParts, State},
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::post,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::context::{ConnectionScope, ContextBuilder, RequestDetails};
use crate::http::guard;
use crate::schema::sanitize_response;
use crate::upgrade::{UpgradeRoute, UpgradeRouter};

/// Application state injected into handlers.
#[derive(Clone)]
struct AppState<E> {
    executor: E,
    context_builder: ContextBuilder,
    config: Arc<GatewayConfig>,
}

/// A caller-supplied request-handler stage, applied to the router after the
/// main GraphQL handler is mounted. Stages run in list order.
pub type MiddlewareFn = Box<dyn FnOnce(Router) -> Router + Send>;

/// Optional wiring injected at construction time.
#[derive(Default)]
pub struct GatewayOptions {
    /// Router owning the host framework's realtime transport subtree.
    /// Nested under the configured native prefix, untouched by the gateway.
    pub native_router: Option<Router>,

    /// Ordered middleware list mounted after the main handler.
    pub middlewares: Vec<MiddlewareFn>,
}

/// HTTP/WebSocket server for the GraphQL gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Create a server with default wiring (no native subtree, no extra
    /// middlewares).
    pub fn new<E: Executor>(
        config: GatewayConfig,
        executor: E,
        context_builder: ContextBuilder,
    ) -> Self {
        Self::with_options(config, executor, context_builder, GatewayOptions::default())
    }

    /// Create a server with caller-supplied wiring.
    pub fn with_options<E: Executor>(
        config: GatewayConfig,
        executor: E,
        context_builder: ContextBuilder,
        options: GatewayOptions,
    ) -> Self {
        let state = AppState {
            executor,
            context_builder,
            config: Arc::new(config.clone()),
        };
        let router = Self::build_router(&config, state, options);
        Self { router, config }
    }

    /// Build the Axum router with all handlers and middleware layers.
    fn build_router<E: Executor>(
        config: &GatewayConfig,
        state: AppState<E>,
        options: GatewayOptions,
    ) -> Router {
        let mut app = Router::new()
            .route(
                &config.graphql.path,
                post(graphql_post::<E>).get(graphql_get::<E>),
            )
            .fallback(unmatched::<E>)
            .with_state(state);

        // Caller middlewares mount after the main handler, in list order.
        for middleware in options.middlewares {
            app = middleware(app);
        }

        if let Some(native) = options.native_router {
            // Reserved for the host framework's own realtime transport.
            app = app.nest(&config.realtime.native_prefix, native);
        }

        app.layer(TimeoutLayer::new(Duration::from_secs(
            config.timeouts.request_secs,
        )))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
    }

    /// The assembled router. Useful for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            graphql_path = %self.config.graphql.path,
            "gateway starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("gateway stopped");
        Ok(())
    }
}

/// GraphQL operations over HTTP.
async fn graphql_post<E: Executor>(
    State(state): State<AppState<E>>,
    headers: HeaderMap,
    request: GraphQLRequest,
) -> Response {
    let details = RequestDetails::from_headers(&headers);

    // A failing caller-supplied resolver fails the whole operation.
    let ctx = match state.context_builder.build(&details, None).await {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!(error = %e, "context assembly failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "context resolution failed",
            )
                .into_response();
        }
    };

    let request = request.into_inner().data(ctx);
    let response = state.executor.execute(request).await;
    GraphQLResponse::from(sanitize_response(response)).into_response()
}

/// GET on the GraphQL path: subscription handshake, explorer, or guard.
async fn graphql_get<E: Executor>(
    State(state): State<AppState<E>>,
    request: Request<Body>,
) -> Response {
    if request.headers().contains_key(header::UPGRADE) {
        let (mut parts, _) = request.into_parts();
        let protocol = match GraphQLProtocol::from_request_parts(&mut parts, &()).await {
            Ok(protocol) => protocol,
            Err(rejection) => return rejection.into_response(),
        };
        let ws = match WebSocketUpgrade::from_request_parts(&mut parts, &()).await {
            Ok(ws) => ws,
            Err(rejection) => return rejection.into_response(),
        };
        return subscription_handshake(state, ws, protocol);
    }

    if state.config.graphql.gui {
        let path = &state.config.graphql.path;
        return Html(playground_source(
            GraphQLPlaygroundConfig::new(path).subscription_endpoint(path),
        ))
        .into_response();
    }

    guard::absorb_get()
}

/// Hand the upgrade to the GraphQL subscription transport.
fn subscription_handshake<E: Executor>(
    state: AppState<E>,
    ws: WebSocketUpgrade,
    protocol: GraphQLProtocol,
) -> Response {
    let AppState {
        executor,
        context_builder,
        config,
    } = state;

    ws.protocols(ALL_WEBSOCKET_PROTOCOLS)
        .on_upgrade(move |socket| {
            GraphQLWebSocket::new(socket, executor, protocol)
                .on_connection_init(move |params| connection_init(context_builder, config, params))
                .serve()
        })
        .into_response()
}

/// Establish the connection-scoped context at handshake time.
///
/// The connection context carries the database handle and, when
/// `auth.subscription_auth` is enabled, the identity resolved from the
/// `connection_init` payload. Every operation on this connection reuses it.
async fn connection_init(
    builder: ContextBuilder,
    config: Arc<GatewayConfig>,
    params: serde_json::Value,
) -> async_graphql::Result<Data> {
    let mut scope = ConnectionScope::default();
    if config.auth.subscription_auth {
        scope.context.extend(builder.connection_identity(&params).await);
    }

    let ctx = builder
        .build(&RequestDetails::default(), Some(&scope))
        .await
        .map_err(|e| async_graphql::Error::new(e.to_string()))?;

    let mut data = Data::default();
    data.insert(ctx);
    Ok(data)
}

/// Fallback for targets outside the GraphQL path and the native carve-out.
///
/// Upgrade attempts here are rejected outright. Axum owns the accepted
/// socket, so the rejection goes out as a refused handshake with
/// `Connection: close` rather than a raw teardown.
async fn unmatched<E: Executor>(
    State(state): State<AppState<E>>,
    request: Request<Body>,
) -> Response {
    if request.headers().contains_key(header::UPGRADE) {
        let path = request.uri().path();
        let route = UpgradeRouter::from_config(&state.config).classify(path);

        if route == UpgradeRoute::FrameworkNative {
            // Host framework's transport target with no native subtree
            // mounted; not ours to consume.
            return StatusCode::NOT_FOUND.into_response();
        }

        tracing::debug!(target = %path, "rejecting unrecognized upgrade target");
        let mut response = StatusCode::NOT_FOUND.into_response();
        response
            .headers_mut()
            .insert(header::CONNECTION, HeaderValue::from_static("close"));
        return response;
    }

    StatusCode::NOT_FOUND.into_response()
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
