use reqwest::StatusCode;

pub type Result<T> = std::result::Result<T, SstError>;

#[derive(Debug, thiserror::Error)]
pub enum SstError {
    #[error("login rejected with http {status}")]
    AuthFailure { status: StatusCode },
    #[error("login response did not set a csrftoken cookie")]
    MissingCredential,
    #[error("account owns {count} houses, exactly one is supported")]
    UnsupportedTopology { count: usize },
    #[error("list request failed with http {status}")]
    FetchFailure { status: StatusCode },
    #[error("no device matches selector {selector:?}")]
    UnknownDevice { selector: String },
    #[error("{count} devices available, a device selector is required")]
    SelectorAmbiguous { count: usize },
    #[error("http transport error")]
    Transport(#[from] reqwest::Error),
    #[error("unable to deserialize response, body was: {body:?}")]
    InvalidPayload {
        #[source]
        source: serde_json::Error,
        body: String,
    },
}

/// Result of a single control POST. Transport failures surface as
/// `Err(SstError::Transport)` instead; a `Rejected` outcome means the vendor
/// answered with a non-success status and the write must not be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Accepted,
    Rejected { status: StatusCode },
}

impl CommandOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, CommandOutcome::Accepted)
    }
}
