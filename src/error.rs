use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("street suffix list is empty")]
    NoStreetSuffixes,

    #[error("failed to build address pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("collector unreachable at {url}")]
    CollectorUnreachable { url: String },

    #[error("collector rejected request: {status}")]
    CollectorStatus { status: reqwest::StatusCode },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
