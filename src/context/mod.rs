//! Per-operation execution context.
//!
//! # Data Flow
//! ```text
//! HTTP request ──▶ RequestDetails ──▶ ContextBuilder ──▶ ExecutionContext
//! WS handshake ──▶ ConnectionScope ─┘                        │
//!                                                            ▼
//!                                               GraphQL request data
//! ```
//!
//! # Design Decisions
//! - The database handle is a non-optional field: every context carries one
//!   by construction, regardless of the route that produced it
//! - Context values are a string-keyed JSON map so caller-supplied resolvers,
//!   connection payloads, and identity projections merge uniformly
//! - Contexts are built fresh per operation and never persisted

pub mod builder;

pub use builder::{ContextBuilder, ContextError, ContextResolver};

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use axum::http::HeaderMap;
use serde_json::{Map, Value};

/// String-keyed JSON map used for context fragments.
pub type ContextMap = Map<String, Value>;

/// Cloneable, opaque handle to the process-wide database collaborator.
///
/// The gateway never interprets the handle; resolvers downcast it back to
/// the concrete pool/client type they were constructed against.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<dyn Any + Send + Sync>,
}

impl DbHandle {
    pub fn new<T: Send + Sync + 'static>(db: T) -> Self {
        Self {
            inner: Arc::new(db),
        }
    }

    /// Borrow the underlying database as its concrete type.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl std::fmt::Debug for DbHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DbHandle")
    }
}

/// The context made available to every resolver handling one operation.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    db: DbHandle,
    values: ContextMap,
}

impl ExecutionContext {
    pub fn new(db: DbHandle) -> Self {
        Self {
            db,
            values: ContextMap::new(),
        }
    }

    /// The database handle. Always present.
    pub fn db(&self) -> &DbHandle {
        &self.db
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Merge a context fragment in; incoming keys win on conflict.
    pub fn merge(&mut self, fragment: ContextMap) {
        self.values.extend(fragment);
    }

    pub fn values(&self) -> &ContextMap {
        &self.values
    }
}

/// Connection-scoped context carried by a subscription connection.
///
/// Established once at the WebSocket handshake and merged into every
/// operation context built for that connection.
#[derive(Debug, Clone, Default)]
pub struct ConnectionScope {
    pub context: ContextMap,
}

/// Owned projection of an incoming HTTP request: the pieces context
/// building needs (headers and cookies), detached from the request body.
#[derive(Debug, Clone, Default)]
pub struct RequestDetails {
    headers: HashMap<String, String>,
    cookies: HashMap<String, String>,
}

impl RequestDetails {
    /// Capture header values and parse the `Cookie` header, if any.
    /// Header names are normalized to lowercase.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut captured = HashMap::new();
        let mut cookies = HashMap::new();

        for (name, value) in headers {
            if let Ok(value) = value.to_str() {
                captured.insert(name.as_str().to_ascii_lowercase(), value.to_string());
            }
        }

        if let Some(raw) = captured.get("cookie") {
            cookies = parse_cookies(raw);
        }

        Self {
            headers: captured,
            cookies,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Extract the login token: designated header first, then the cookie.
    /// An empty value counts as absent, so an empty header still falls
    /// through to the cookie.
    pub fn auth_token(&self, header_name: &str, cookie_name: &str) -> Option<&str> {
        self.header(header_name)
            .filter(|t| !t.is_empty())
            .or_else(|| self.cookie(cookie_name).filter(|t| !t.is_empty()))
    }
}

/// Parse a `Cookie` request header into name/value pairs.
/// Malformed pairs are skipped rather than rejected.
fn parse_cookies(raw: &str) -> HashMap<String, String> {
    raw.split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}
