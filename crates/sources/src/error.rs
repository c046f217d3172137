/// Errors raised by the metadata clients.
///
/// None of these reach an assessment: [`ChainDataService`](crate::ChainDataService)
/// logs them and treats the field as unknown.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Transport failure or non-success status.
    #[error("request to {url} failed: {message}")]
    Http { url: String, message: String },

    /// The body was not the JSON shape we expect.
    #[error("could not parse response from {url}: {message}")]
    Parse { url: String, message: String },

    /// The blocking worker running the request panicked or was cancelled.
    #[error("task join error: {0}")]
    Join(String),
}

impl SourceError {
    pub(crate) fn http(url: &str, err: impl std::fmt::Display) -> Self {
        SourceError::Http {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn parse(url: &str, err: impl std::fmt::Display) -> Self {
        SourceError::Parse {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}
