//! Context assembly.
//!
//! # Responsibilities
//! - Assemble the per-operation `ExecutionContext`
//! - Apply the fixed merge order: base → db → connection-or-identity
//! - Invoke the caller-supplied default-context resolver, when configured
//!
//! # Design Decisions
//! - Connection-scoped operations never touch the token resolver; the
//!   connection supplied its own context at handshake time
//! - A failing default-context resolver fails the whole operation. The
//!   resolver is caller-supplied and may stuff security-relevant fields
//!   into the context, so its failure must not be swallowed
//! - Token resolution failure degrades to an anonymous context instead

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::{self, UserStore};
use crate::config::AuthConfig;
use crate::context::{ConnectionScope, ContextMap, DbHandle, ExecutionContext, RequestDetails};

/// Error produced while assembling a context.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The caller-supplied default-context resolver failed.
    #[error("default context resolver failed: {0}")]
    Resolver(String),
}

/// Caller-supplied strategy producing the base context for every operation.
#[async_trait]
pub trait ContextResolver: Send + Sync {
    async fn resolve(
        &self,
        request: &RequestDetails,
        connection: Option<&ConnectionScope>,
    ) -> Result<ContextMap, ContextError>;
}

/// Assembles the per-operation execution context.
///
/// Construction injects every collaborator explicitly: the database handle,
/// the optional user store, and the optional default-context resolver.
#[derive(Clone)]
pub struct ContextBuilder {
    db: DbHandle,
    auth: AuthConfig,
    store: Option<Arc<dyn UserStore>>,
    resolver: Option<Arc<dyn ContextResolver>>,
}

impl ContextBuilder {
    pub fn new(db: DbHandle, auth: AuthConfig) -> Self {
        Self {
            db,
            auth,
            store: None,
            resolver: None,
        }
    }

    /// Attach the user store used for token resolution. Without a store the
    /// gateway has no authentication capability and every context is anonymous.
    pub fn with_user_store(mut self, store: Arc<dyn UserStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Attach the caller-supplied default-context resolver.
    pub fn with_resolver(mut self, resolver: Arc<dyn ContextResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Build the context for one operation.
    ///
    /// Merge order is fixed: resolver base, then the database handle, then
    /// either the connection-scoped context (subscription operations) or the
    /// resolved user identity (plain HTTP operations). The later fragment
    /// wins on key conflicts.
    pub async fn build(
        &self,
        request: &RequestDetails,
        connection: Option<&ConnectionScope>,
    ) -> Result<ExecutionContext, ContextError> {
        let base = match &self.resolver {
            Some(resolver) => resolver.resolve(request, connection).await?,
            None => ContextMap::new(),
        };

        let mut ctx = ExecutionContext::new(self.db.clone());
        ctx.merge(base);

        if let Some(connection) = connection {
            ctx.merge(connection.context.clone());
            return Ok(ctx);
        }

        if let Some(store) = &self.store {
            let token = request.auth_token(&self.auth.token_header, &self.auth.token_cookie);
            let identity = auth::resolve_user(store.as_ref(), token, &self.auth.user_fields).await;
            ctx.merge(identity);
        }

        Ok(ctx)
    }

    /// Resolve the identity carried by a subscription `connection_init`
    /// payload. Anonymous (empty) when no token is present, when no store is
    /// attached, or when resolution fails.
    pub async fn connection_identity(&self, params: &serde_json::Value) -> ContextMap {
        match &self.store {
            Some(store) => {
                auth::connection_init_context(
                    store.as_ref(),
                    params,
                    &self.auth.connection_param,
                    &self.auth.user_fields,
                )
                .await
            }
            None => ContextMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{StoreError, UserRecord};
    use axum::http::{HeaderMap, HeaderValue};
    use serde_json::json;

    struct FixedResolver(ContextMap);

    #[async_trait]
    impl ContextResolver for FixedResolver {
        async fn resolve(
            &self,
            _request: &RequestDetails,
            _connection: Option<&ConnectionScope>,
        ) -> Result<ContextMap, ContextError> {
            Ok(self.0.clone())
        }
    }

    struct FailingResolver;

    #[async_trait]
    impl ContextResolver for FailingResolver {
        async fn resolve(
            &self,
            _request: &RequestDetails,
            _connection: Option<&ConnectionScope>,
        ) -> Result<ContextMap, ContextError> {
            Err(ContextError::Resolver("boom".into()))
        }
    }

    /// A store that fails the test if token resolution is ever attempted.
    struct ForbiddenStore;

    #[async_trait]
    impl UserStore for ForbiddenStore {
        async fn lookup_by_token(&self, _token: &str) -> Result<Option<UserRecord>, StoreError> {
            panic!("token resolution must not run for connection-scoped operations");
        }
    }

    struct SingleUserStore;

    #[async_trait]
    impl UserStore for SingleUserStore {
        async fn lookup_by_token(&self, token: &str) -> Result<Option<UserRecord>, StoreError> {
            if token == "abc123" {
                let record = json!({
                    "_id": "u1",
                    "roles": ["admin"],
                    "username": "al",
                    "emails": [],
                });
                match record {
                    serde_json::Value::Object(map) => Ok(Some(map)),
                    _ => unreachable!(),
                }
            } else {
                Ok(None)
            }
        }
    }

    fn token_request(token: &'static str) -> RequestDetails {
        let mut headers = HeaderMap::new();
        headers.insert("x-login-token", HeaderValue::from_static(token));
        RequestDetails::from_headers(&headers)
    }

    fn base_map() -> ContextMap {
        let mut map = ContextMap::new();
        map.insert("username".into(), "base-user".into());
        map.insert("tenant".into(), "alpha".into());
        map
    }

    #[tokio::test]
    async fn connection_context_wins_and_skips_token_resolution() {
        let builder = ContextBuilder::new(DbHandle::new(()), AuthConfig::default())
            .with_user_store(Arc::new(ForbiddenStore))
            .with_resolver(Arc::new(FixedResolver(base_map())));

        let mut scope = ConnectionScope::default();
        scope.context.insert("username".into(), "conn-user".into());

        // Token present in the request, but the connection path must ignore it.
        let ctx = builder
            .build(&token_request("abc123"), Some(&scope))
            .await
            .unwrap();

        assert_eq!(ctx.get("username").unwrap(), "conn-user");
        assert_eq!(ctx.get("tenant").unwrap(), "alpha");
    }

    #[tokio::test]
    async fn http_identity_overrides_base_fields() {
        let builder = ContextBuilder::new(DbHandle::new(()), AuthConfig::default())
            .with_user_store(Arc::new(SingleUserStore))
            .with_resolver(Arc::new(FixedResolver(base_map())));

        let ctx = builder.build(&token_request("abc123"), None).await.unwrap();

        assert_eq!(ctx.get("username").unwrap(), "al");
        assert_eq!(ctx.get("_id").unwrap(), "u1");
        assert_eq!(ctx.get("tenant").unwrap(), "alpha");
    }

    #[tokio::test]
    async fn unknown_token_degrades_to_anonymous() {
        let builder = ContextBuilder::new(DbHandle::new(()), AuthConfig::default())
            .with_user_store(Arc::new(SingleUserStore));

        let ctx = builder.build(&token_request("nope"), None).await.unwrap();
        assert!(ctx.values().is_empty());
    }

    #[tokio::test]
    async fn missing_store_means_anonymous_context() {
        let builder = ContextBuilder::new(DbHandle::new(()), AuthConfig::default());
        let ctx = builder.build(&token_request("abc123"), None).await.unwrap();
        assert!(ctx.values().is_empty());
    }

    #[tokio::test]
    async fn resolver_failure_propagates() {
        let builder = ContextBuilder::new(DbHandle::new(()), AuthConfig::default())
            .with_resolver(Arc::new(FailingResolver));

        let err = builder
            .build(&RequestDetails::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ContextError::Resolver(_)));
    }

    #[tokio::test]
    async fn connection_identity_reads_configured_param() {
        let builder = ContextBuilder::new(DbHandle::new(()), AuthConfig::default())
            .with_user_store(Arc::new(SingleUserStore));

        let identity = builder
            .connection_identity(&json!({ "authToken": "abc123" }))
            .await;
        assert_eq!(identity.get("username").unwrap(), "al");

        let anonymous = builder.connection_identity(&json!({})).await;
        assert!(anonymous.is_empty());
    }
}
