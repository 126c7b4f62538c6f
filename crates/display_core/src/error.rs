use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("invalid endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        endpoint: String,
        source: url::ParseError,
    },
    #[error("endpoint must use ws://, wss://, http:// or https://, got '{0}'")]
    UnsupportedScheme(String),
    #[error("not connected to controller")]
    NotConnected,
    #[error("failed to encode outbound frame: {0}")]
    Encode(#[from] serde_json::Error),
}
