use reqwest::StatusCode;

/// Failures of a one-shot position request.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location unavailable: {0}")]
    Unavailable(String),
}

/// Failures of a current-weather request.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("No network connection available")]
    NetworkUnavailable,
    #[error("Weather request failed with status {0}")]
    Http(StatusCode),
    #[error("Failed to parse weather response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Failed to reach weather service: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Coarse bucket a failed fetch falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailure {
    /// HTTP 400.
    BadRequest,
    /// HTTP 404, no data for the location.
    NotFound,
    Generic,
}

impl FetchError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Http(status) => Some(*status),
            _ => None,
        }
    }

    pub fn classify(&self) -> FetchFailure {
        match self.status() {
            Some(StatusCode::BAD_REQUEST) => FetchFailure::BadRequest,
            Some(StatusCode::NOT_FOUND) => FetchFailure::NotFound,
            _ => FetchFailure::Generic,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("A weather lookup is already in progress")]
    AlreadyRunning,
}
