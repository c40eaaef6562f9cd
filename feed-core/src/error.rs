use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("payload parsing error: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("invalid source {0:?}")]
    InvalidSource(String),
    #[error("script callback error: {0}")]
    Callback(#[from] CallbackError),
    #[error("no category matches {0:?}")]
    CategoryNotFound(String),
}

impl FetchError {
    /// Maps reqwest timeouts onto `Timeout` so callers can tell them apart.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(err)
        }
    }
}

#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("script body is not a callback invocation")]
    Malformed,
    #[error("no pending callback named {0}")]
    Unknown(String),
    #[error("callback payload is not valid JSON: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("callback {0} timed out")]
    TimedOut(String),
    #[error("callback {0} was dropped before firing")]
    Dropped(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SlotError {
    #[error("slot {0} has no recognised loader class")]
    UnknownLoader(String),
    #[error("slot {0} declares no sources")]
    NoSources(String),
}
