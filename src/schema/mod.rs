//! Executable-schema glue.
//!
//! # Responsibilities
//! - Define the collaborator contract for the schema-loading subsystem
//! - Merge default and caller-supplied schema directives (caller wins)
//! - Sanitize execution responses before they reach clients
//!
//! # Design Decisions
//! - GraphQL execution itself is delegated: the gateway is generic over
//!   `async_graphql::Executor` and never inspects operations
//! - A schema that fails to build is fatal at startup; the process must not
//!   come up serving a broken schema
//! - Client-visible errors carry message, locations, and path only; error
//!   extensions and internal sources are stripped server-side

use std::collections::BTreeMap;

use async_graphql::{Executor, Response};
use thiserror::Error;

/// Named schema directives, merged before the schema is built.
pub type DirectiveMap<D> = BTreeMap<String, D>;

/// Fatal schema construction error.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to build executable schema: {0}")]
    Build(String),
}

/// Contract required from the schema-loading subsystem: given the merged
/// directive set, produce an executable schema.
pub trait SchemaSource {
    /// Directive artifact understood by this schema implementation.
    type Directive;
    /// The executable schema handed to the gateway.
    type Executor: Executor;

    fn build(self, directives: DirectiveMap<Self::Directive>) -> Result<Self::Executor, SchemaError>;
}

/// Merge directive sets by name. Caller-supplied definitions win on conflict.
pub fn merge_directives<D>(
    defaults: DirectiveMap<D>,
    supplied: DirectiveMap<D>,
) -> DirectiveMap<D> {
    let mut merged = defaults;
    merged.extend(supplied);
    merged
}

/// Build the executable schema with defaults and caller directives merged.
pub fn build_schema<S: SchemaSource>(
    source: S,
    defaults: DirectiveMap<S::Directive>,
    supplied: DirectiveMap<S::Directive>,
) -> Result<S::Executor, SchemaError> {
    source.build(merge_directives(defaults, supplied))
}

/// Strip server internals from an execution response.
///
/// Errors keep `{message, locations, path}`; extension data and attached
/// source errors never leave the process.
pub fn sanitize_response(mut response: Response) -> Response {
    for error in &mut response.errors {
        error.extensions = None;
        error.source = None;
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::{ErrorExtensionValues, Pos, ServerError};

    #[test]
    fn supplied_directives_win_on_name_conflict() {
        let mut defaults = DirectiveMap::new();
        defaults.insert("auth".to_string(), "default-auth");
        defaults.insert("deprecated".to_string(), "default-deprecated");

        let mut supplied = DirectiveMap::new();
        supplied.insert("auth".to_string(), "caller-auth");

        let merged = merge_directives(defaults, supplied);
        assert_eq!(merged["auth"], "caller-auth");
        assert_eq!(merged["deprecated"], "default-deprecated");
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn sanitize_strips_extensions_and_sources() {
        let mut error = ServerError::new("boom", Some(Pos { line: 2, column: 5 }));
        let mut extensions = ErrorExtensionValues::default();
        extensions.set("code", "INTERNAL");
        error.extensions = Some(extensions);

        let response = sanitize_response(Response::from_errors(vec![error]));

        let error = &response.errors[0];
        assert_eq!(error.message, "boom");
        assert_eq!(error.locations, vec![Pos { line: 2, column: 5 }]);
        assert!(error.extensions.is_none());
        assert!(error.source.is_none());
    }
}
