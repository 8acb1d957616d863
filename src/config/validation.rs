//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the GraphQL path does not fall inside the native transport carve-out
//! - Validate value ranges (timeouts > 0, paths absolute)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::GatewayConfig;

/// A single semantic configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A path option does not start with '/'.
    RelativePath { option: &'static str, value: String },
    /// The GraphQL path lies under the native transport prefix, so subscription
    /// upgrades would shadow the host framework's own transport.
    PathConflict { graphql: String, native: String },
    /// The identity projection is empty.
    EmptyUserFields,
    /// A timeout is zero.
    ZeroTimeout { option: &'static str },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::RelativePath { option, value } => {
                write!(f, "{} must start with '/': {:?}", option, value)
            }
            ValidationError::PathConflict { graphql, native } => write!(
                f,
                "graphql.path {:?} falls under realtime.native_prefix {:?}",
                graphql, native
            ),
            ValidationError::EmptyUserFields => {
                write!(f, "auth.user_fields must name at least one field")
            }
            ValidationError::ZeroTimeout { option } => {
                write!(f, "{} must be greater than zero", option)
            }
        }
    }
}

/// Validate a deserialized configuration. Returns every error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !config.graphql.path.starts_with('/') {
        errors.push(ValidationError::RelativePath {
            option: "graphql.path",
            value: config.graphql.path.clone(),
        });
    }

    if !config.realtime.native_prefix.starts_with('/') {
        errors.push(ValidationError::RelativePath {
            option: "realtime.native_prefix",
            value: config.realtime.native_prefix.clone(),
        });
    }

    if config.graphql.path.starts_with(&config.realtime.native_prefix) {
        errors.push(ValidationError::PathConflict {
            graphql: config.graphql.path.clone(),
            native: config.realtime.native_prefix.clone(),
        });
    }

    if config.auth.user_fields.is_empty() {
        errors.push(ValidationError::EmptyUserFields);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout {
            option: "timeouts.request_secs",
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn graphql_path_under_native_prefix_rejected() {
        let mut config = GatewayConfig::default();
        config.graphql.path = "/sockjs/graphql".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::PathConflict { .. })));
    }

    #[test]
    fn all_errors_reported() {
        let mut config = GatewayConfig::default();
        config.graphql.path = "graphql".to_string();
        config.auth.user_fields.clear();
        config.timeouts.request_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
