use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("no results for {0}")]
    NotFound(String),

    #[error("search request failed: {0}")]
    Http(Box<ureq::Error>),

    #[error("failed to read search response: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ureq::Error> for SearchError {
    fn from(err: ureq::Error) -> Self {
        SearchError::Http(Box::new(err))
    }
}

impl SearchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SearchError::NotFound(_))
    }
}
