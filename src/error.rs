use thiserror::Error;

/// Failures surfaced to the popup. None of them are fatal: the session turns every variant into
/// local state (an error line, a failed report list, an empty view) and stays usable.
#[derive(Debug, Error)]
pub enum PopupError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Login failed: {0}")]
    AuthFailure(String),
    #[error("Network failure: {0}")]
    NetworkFailure(String),
    #[error("Storage failure: {0:#}")]
    Storage(anyhow::Error),
    #[error("Tracker failure: {0:#}")]
    Tracker(anyhow::Error),
    #[error("Not logged in")]
    NotLoggedIn,
}

impl From<reqwest::Error> for PopupError {
    fn from(value: reqwest::Error) -> Self {
        PopupError::NetworkFailure(value.to_string())
    }
}
