use thiserror::Error;

/// Failure of a geocoding or weather lookup.
///
/// None of these reach the end user; the orchestrator logs them and stops the run.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned {status} {status_text}: {body}")]
    Status {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("malformed {what} response: {source}")]
    Malformed {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ProviderError {
    /// HTTP status code, when the upstream answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
