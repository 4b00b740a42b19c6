use thiserror::Error;

// Failures raised while reading source records or resolving their spans
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Invalid token range '{0}'")]
    InvalidTokenRange(String),
    #[error("Token index {index} out of range for document with {len} tokens")]
    TokenOutOfRange { index: i64, len: usize },
    #[error("Byte range {start}..{end} out of bounds for document of {len} bytes")]
    ByteRangeOutOfBounds { start: i64, end: i64, len: usize },
    #[error("Rendered HTML is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
}
