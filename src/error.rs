use std::{error::Error, fmt};

#[derive(Debug)]
pub enum BackendError {
    Transport(Box<dyn Error + Send + Sync + 'static>),
    Http { status: u16, body: String },
    Decode(String),
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use BackendError::*;
        match self {
            Transport(e) => Some(e.as_ref() as &dyn Error),
            _ => None,
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use BackendError::*;
        match self {
            Transport(_) => write!(f, "TransportError"),
            Http { status, body } => write!(f, "HTTP {}: {}", status, body),
            Decode(s) => write!(f, "DecodeError: {}", s),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(error: reqwest::Error) -> Self {
        BackendError::Transport(Box::new(error))
    }
}

#[derive(Debug)]
pub enum SyncError {
    Configuration(String),
    Backend(BackendError),
    InvalidPayload(String),
    InvalidTimestamp(String),
    Consistency(String),
    Storage(anyhow::Error),
    InProgress,
    Cancelled,
    Timeout(u64),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use SyncError::*;
        match self {
            Configuration(s) => write!(f, "ConfigurationError: {}", s),
            Backend(_) => write!(f, "BackendError"),
            InvalidPayload(s) => write!(f, "InvalidPayload: {}", s),
            InvalidTimestamp(s) => write!(f, "InvalidTimestamp: {}", s),
            Consistency(s) => write!(f, "ConsistencyError: {}", s),
            Storage(_) => write!(f, "StorageError"),
            InProgress => write!(f, "SyncInProgress"),
            Cancelled => write!(f, "SyncCancelled"),
            Timeout(secs) => write!(f, "Timeout: sync did not finish within {}s", secs),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use SyncError::*;
        match self {
            Backend(e) => Some(e),
            Storage(e) => {
                let inner: &(dyn Error + 'static) = &**e;
                Some(inner)
            }
            _ => None,
        }
    }
}

impl From<BackendError> for SyncError {
    fn from(error: BackendError) -> Self {
        SyncError::Backend(error)
    }
}

impl From<anyhow::Error> for SyncError {
    fn from(error: anyhow::Error) -> Self {
        SyncError::Storage(error)
    }
}
