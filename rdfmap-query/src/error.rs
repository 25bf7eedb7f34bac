//! Error types for constraint compilation and execution

use crate::client::ClientError;
use rdfmap_json_ld::JsonLdError;
use thiserror::Error;

/// Compilation and execution errors
#[derive(Error, Debug)]
pub enum QueryError {
    /// A bare-IRI schema reference the provider does not know
    #[error("Schema not found: {iri}")]
    SchemaUnresolved { iri: String },

    /// A condition that cannot be compiled (explicit null, unknown relation, ...)
    #[error("Malformed condition '{key}' in entity {entity}: {reason}")]
    MalformedConstraint {
        entity: usize,
        key: String,
        reason: String,
    },

    /// CONSTRUCT matched nothing although the root subject was pinned by `@id`
    #[error("CONSTRUCT returned no triples for collection '{collection}'")]
    EmptyConstructResult { collection: String },

    /// Key absent from every schema of the collection (strict mode only)
    #[error("Unknown property '{key}' in entity {entity}")]
    UnknownPropertyReference { entity: usize, key: String },

    /// Insert without a `data['@id']` subject
    #[error("Entity {entity} has no '@id' in data")]
    MissingSubject { entity: usize },

    /// Transport failure from the injected client
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// Invalid schema or synthesized JSON-LD context
    #[error("JSON-LD error: {0}")]
    JsonLd(#[from] JsonLdError),

    /// Constraint JSON that does not match the wire shape
    #[error("Invalid constraint JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl QueryError {
    pub(crate) fn malformed(entity: usize, key: &str, reason: impl Into<String>) -> Self {
        QueryError::MalformedConstraint {
            entity,
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for compile and execute operations
pub type Result<T> = std::result::Result<T, QueryError>;
