use thiserror::Error;

use crate::storage::error::StorageError;

#[derive(Debug, Error)]
pub enum FetchError {
    /// network failure, 5xx or 429 answer, worth retrying
    #[error("request failed: {0}")]
    Transient(String),

    /// the site refused the request, asking again will not help
    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: usize, last: String },

    #[error("no ajax nonce found on {0}")]
    Nonce(String),

    #[error("page cache error: {0}")]
    Cache(#[from] StorageError),
}

impl From<ureq::Error> for FetchError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => {
                let reason = format!("{} answered {code}", response.get_url());
                if code == 429 || code >= 500 {
                    FetchError::Transient(reason)
                } else {
                    FetchError::Rejected(reason)
                }
            }
            ureq::Error::Transport(transport) => FetchError::Transient(transport.to_string()),
        }
    }
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        FetchError::Transient(err.to_string())
    }
}
