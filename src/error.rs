use thiserror::Error;

/// Failures surfaced by the monitor.
///
/// `LocalPrecondition` is raised before any request leaves the client.
/// `Transport` covers anything that kept us from getting a usable answer
/// from the capture server, `Rejected` is the server saying no.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    #[error("connection error with the capture server: {0}")]
    Transport(String),
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    LocalPrecondition(String),
    /// Local filesystem failure, e.g. writing an exported capture.
    #[error("{0}")]
    Io(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Rejected,
    LocalPrecondition,
    Io,
}

impl MonitorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MonitorError::Transport(_) => ErrorKind::Transport,
            MonitorError::Rejected(_) => ErrorKind::Rejected,
            MonitorError::LocalPrecondition(_) => ErrorKind::LocalPrecondition,
            MonitorError::Io(_) => ErrorKind::Io,
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        MonitorError::LocalPrecondition(message.into())
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MonitorError::Transport(format!("request timed out: {err}"))
        } else if err.is_decode() {
            MonitorError::Transport(format!("parse error: {err}"))
        } else {
            MonitorError::Transport(format!("request failed: {err}"))
        }
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
