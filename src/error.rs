use thiserror::Error;

/// Errors raised by the codecs and the archive container.
#[derive(Debug, Error)]
pub enum Error {
    /// Input bytes are truncated, malformed or internally inconsistent.
    #[error("Corrupt data: {0}")]
    CorruptData(String),

    /// A value does not fit the fixed-width field it must be written to.
    #[error("Capacity exceeded: {what} is {value}, limit is {limit}")]
    CapacityExceeded {
        what: &'static str,
        value: usize,
        limit: usize,
    },

    /// Algorithm identifier with no matching codec. Names that do not
    /// resolve are reported with id 0.
    #[error("Unknown algorithm id {0}")]
    UnknownAlgorithm(u8),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        Error::CorruptData(msg.into())
    }

    /// Maps a short read onto `CorruptData`; other I/O errors pass through.
    pub(crate) fn from_read(err: std::io::Error, context: &str) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::CorruptData(format!("unexpected end of data reading {}", context))
        } else {
            Error::Io(err)
        }
    }
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
