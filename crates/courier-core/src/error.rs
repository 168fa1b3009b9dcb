use bytes::Bytes;
use http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Connection-level failure with no HTTP status attached.
    #[error("transport error: {0}")]
    Transport(String),

    /// The call did not complete within the configured request timeout.
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    /// A well-formed HTTP exchange whose status was interpreted as a failure.
    #[error("{operation} failed with status {status}")]
    Application {
        status: StatusCode,
        operation: String,
        body: Option<Bytes>,
    },

    #[error("failure encoding object into query map: {0}")]
    Encoding(String),

    /// The server list had no candidate endpoint for the logical target.
    #[error("no available target for {0}")]
    NoAvailableTarget(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Status code carried by a coded failure, `None` for everything else.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Application { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
