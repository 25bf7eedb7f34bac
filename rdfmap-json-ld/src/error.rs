use serde_json::Value as JsonValue;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum JsonLdError {
    #[error("Invalid context: {message}")]
    InvalidContext { message: String },

    #[error("Invalid IRI mapping for term '{term}'")]
    InvalidIriMapping { term: String, context: JsonValue },

    #[error("Invalid quad: {message}")]
    InvalidQuad { message: String },
}

pub type Result<T> = std::result::Result<T, JsonLdError>;
