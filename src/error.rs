use std::num::ParseIntError;

/// A single line of a section that could not be turned into a record.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid timestamp {value:?}: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("invalid JSON record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid {field} counter {value:?}: {source}")]
    Counter {
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("expected at least {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },
}

impl ParseError {
    /// True when the upstream record shape itself changed (a required key is
    /// gone), as opposed to a single garbled value.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, ParseError::Json(e) if e.is_data())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid API URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported URL scheme {scheme:?} (expected http or https)")]
    UnsupportedScheme { scheme: String },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("cannot encode record {item}: {source}")]
    Encode {
        item: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("API token is not a valid header value")]
    InvalidToken,

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid check parameters in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown levels kind {0:?} (expected \"fixed\" or \"no_levels\")")]
    UnknownLevels(String),

    #[error("levels kind \"fixed\" requires a (warn, crit) pair")]
    MissingLevels,
}
