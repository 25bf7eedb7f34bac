//! Compiler configuration

use rdfmap_sparql::RenderOptions;
use serde::{Deserialize, Serialize};

/// Default prefix for synthesized (non-stored) properties in CONSTRUCT templates.
pub const DEFAULT_LOCAL_URN_PREFIX: &str = "urn:local:";

/// Settings shared by every compile call of an [`ObjectMapper`](crate::ObjectMapper).
///
/// Deserializes from camelCase JSON; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerConfig {
    /// Fail with `UnknownPropertyReference` instead of dropping unknown keys
    pub strict_properties: bool,
    /// Array-property follow-up queries in flight at once (1 = sequential)
    pub array_fetch_concurrency: usize,
    /// IRI prefix of bound (computed) properties in CONSTRUCT output
    pub local_urn_prefix: String,
    /// `resolveType` for entities that do not set it
    pub default_resolve_type: bool,
    /// Render compact IRIs with `PREFIX` declarations
    pub emit_prefixes: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            strict_properties: false,
            array_fetch_concurrency: 1,
            local_urn_prefix: DEFAULT_LOCAL_URN_PREFIX.to_string(),
            default_resolve_type: false,
            emit_prefixes: true,
        }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strict_properties(mut self, strict: bool) -> Self {
        self.strict_properties = strict;
        self
    }

    /// Set follow-up concurrency; values below 1 are raised to 1.
    pub fn with_array_fetch_concurrency(mut self, n: usize) -> Self {
        self.array_fetch_concurrency = n.max(1);
        self
    }

    pub fn with_local_urn_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.local_urn_prefix = prefix.into();
        self
    }

    pub fn with_default_resolve_type(mut self, resolve: bool) -> Self {
        self.default_resolve_type = resolve;
        self
    }

    pub fn with_emit_prefixes(mut self, emit: bool) -> Self {
        self.emit_prefixes = emit;
        self
    }

    /// Serializer options derived from this config.
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions::default().with_emit_prefixes(self.emit_prefixes)
    }

    /// IRI used for a bound property in CONSTRUCT templates.
    pub fn local_iri(&self, key: &str) -> String {
        format!("{}{}", self.local_urn_prefix, key)
    }
}
