use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The (placeholder-encoded) query text was rejected by the PromQL parser.
    #[error("failed to parse PromQL query `{query}`: {message}")]
    Parse { query: String, message: String },

    #[error("unknown named query: {0}")]
    UnknownQuery(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
