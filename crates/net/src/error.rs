use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    /// Connection, DNS, TLS or protocol failure before a status was received.
    #[error("could not fetch {url}: {message}")]
    Transport { url: String, message: String },
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid fetch target {0:?}")]
    InvalidTarget(String),
}

impl FetchError {
    pub fn is_status(&self) -> bool {
        matches!(self, FetchError::Status { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;
