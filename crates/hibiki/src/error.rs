use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HibikiError {
    #[error("Book manifest is not available")]
    ManifestUnavailable,

    #[error("Access parameters have not been captured")]
    AccessParametersMissing,

    #[error("Not enough access parameters: {actual} tokens for {expected} segments")]
    AccessParametersExhausted { expected: usize, actual: usize },

    #[error("Hourly work quota exceeded, next start possible in {retry_after:?}")]
    HourlyQuotaExceeded { retry_after: Duration },

    #[error("Segment {index} did not reach a terminal state in time")]
    SegmentStalled { index: u32 },

    #[error("Metadata sidecar write did not reach a terminal state in time")]
    SidecarStalled,

    #[error("Download host rejected the transfer: {0}")]
    HostRejected(String),

    #[error("Unknown download handle")]
    UnknownHandle,

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error(transparent)]
    RequestError(#[from] reqwest::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
}

pub type HibikiResult<T> = Result<T, HibikiError>;
