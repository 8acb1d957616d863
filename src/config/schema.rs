//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the GraphQL gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// GraphQL endpoint settings.
    pub graphql: GraphqlConfig,

    /// Authentication settings (token extraction, identity projection).
    pub auth: AuthConfig,

    /// Host-framework realtime transport carve-out.
    pub realtime: RealtimeConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// GraphQL endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GraphqlConfig {
    /// Path serving GraphQL over HTTP and WebSocket.
    pub path: String,

    /// Serve the interactive explorer on GET requests.
    /// When disabled, GET requests are absorbed with an empty 200.
    pub gui: bool,
}

impl Default for GraphqlConfig {
    fn default() -> Self {
        Self {
            path: "/graphql".to_string(),
            gui: false,
        }
    }
}

/// Authentication configuration.
///
/// Controls where the login token is read from and which user fields are
/// projected into the execution context.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Request header carrying the login token.
    pub token_header: String,

    /// Cookie consulted when the header is absent.
    pub token_cookie: String,

    /// Key in the subscription `connection_init` payload carrying the token.
    pub connection_param: String,

    /// User record fields projected into the identity context.
    pub user_fields: Vec<String>,

    /// Resolve the login token during the subscription handshake.
    /// Off by default: subscription connections get a connection-scoped
    /// context only and skip token resolution entirely.
    pub subscription_auth: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_header: "x-login-token".to_string(),
            token_cookie: "login-token".to_string(),
            connection_param: "authToken".to_string(),
            user_fields: vec![
                "_id".to_string(),
                "roles".to_string(),
                "username".to_string(),
                "emails".to_string(),
            ],
            subscription_auth: false,
        }
    }
}

/// Host-framework realtime transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Path prefix reserved for the host framework's own realtime transport.
    /// Upgrade requests under this prefix must never be intercepted.
    pub native_prefix: String,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            native_prefix: "/sockjs".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
