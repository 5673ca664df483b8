use crate::DType;

/// Errors raised while reading or writing array archives.
#[derive(thiserror::Error, Debug)]
pub enum NpyError {
    #[error("not an npy file: bad magic string")]
    BadMagic,
    #[error("unsupported npy format version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },
    #[error("malformed npy header: {0}")]
    MalformedHeader(String),
    #[error("unsupported dtype descriptor `{0}`")]
    UnsupportedDType(String),
    #[error("dtype mismatch, got {got}, expected {expected}")]
    DTypeMismatch { expected: &'static str, got: DType },
    #[error("array data is truncated, expected {expected} bytes but got {got}")]
    Truncated { expected: usize, got: usize },
    #[error("expected a single element, array has shape {0:?}")]
    NotAScalar(Vec<usize>),
    #[error("{0} elements do not fit shape {1:?}")]
    ShapeMismatch(usize, Vec<usize>),
    #[error("no array named `{0}` in archive")]
    MissingArray(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, NpyError>;
