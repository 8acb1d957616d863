//! Token resolution.

use serde_json::Value;

use crate::auth::store::UserStore;
use crate::context::ContextMap;

/// Resolve a login token to an identity projection.
///
/// Returns an empty map for an absent or empty token (anonymous access is
/// not an error), for an unknown token, and for a failing store. A found
/// record is projected down to the configured fields; fields missing from
/// the record are omitted.
pub async fn resolve_user(
    store: &dyn UserStore,
    token: Option<&str>,
    fields: &[String],
) -> ContextMap {
    let token = match token {
        Some(t) if !t.is_empty() => t,
        _ => return ContextMap::new(),
    };

    match store.lookup_by_token(token).await {
        Ok(Some(record)) => {
            let mut identity = ContextMap::new();
            for field in fields {
                if let Some(value) = record.get(field) {
                    identity.insert(field.clone(), value.clone());
                }
            }
            identity
        }
        Ok(None) => {
            tracing::debug!("login token did not resolve to a user");
            ContextMap::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, "user store lookup failed, continuing anonymously");
            ContextMap::new()
        }
    }
}

/// Resolve the identity for a subscription handshake.
///
/// Reads the login token from the `connection_init` payload under the
/// configured key and resolves it like the HTTP path does. An absent token
/// resolves to an empty identity.
pub async fn connection_init_context(
    store: &dyn UserStore,
    connection_params: &Value,
    param_key: &str,
    fields: &[String],
) -> ContextMap {
    let token = connection_params.get(param_key).and_then(Value::as_str);
    resolve_user(store, token, fields).await
}
