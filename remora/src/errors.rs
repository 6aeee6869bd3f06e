/// Errors produced by `remora`.
#[derive(Debug)]
pub enum Error {
    /// An I/O error has occurred.
    Io(std::io::Error),
    /// Two matrices or vectors disagree on a dimension.
    DimensionMismatch { expected: usize, got: usize },
    /// A peer or the helper sent something other than what the protocol
    /// schedule calls for.
    Desync(String),
    /// A role byte other than 0 or 1.
    InvalidRole(u8),
    /// A malformed matrix or query file.
    Parse(String),
    /// A query referenced a row that does not exist.
    IndexOutOfRange { index: usize, bound: usize },
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::DimensionMismatch { expected, got } => {
                write!(f, "dimension mismatch: expected {}, got {}", expected, got)
            }
            Error::Desync(s) => write!(f, "protocol desync: {}", s),
            Error::InvalidRole(r) => write!(f, "invalid role byte {} (expected 0 or 1)", r),
            Error::Parse(s) => write!(f, "parse error: {}", s),
            Error::IndexOutOfRange { index, bound } => {
                write!(f, "index {} out of range (bound {})", index, bound)
            }
        }
    }
}
