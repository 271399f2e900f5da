//! Error types for rbdict

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while importing records. Lookups never fail; absence is an `Option`.
#[derive(Error, Debug)]
pub enum Error {
    /// A record lacks a field the import policy requires
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// A record names a gimmick the resolver does not know
    #[error("unknown gimmick `{0}`")]
    UnknownGimmick(String),

    /// JSON parsing error (serde_json)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
