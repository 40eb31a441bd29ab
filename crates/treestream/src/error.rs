//! Error types for treestream operations.
//!
//! Only conditions arising from *external* input (a byte buffer loaded from
//! disk, a JSON authoring document) are reported through [`Error`]. Invariant
//! breaches inside an already-built stream (offset arithmetic past the buffer
//! end, out-of-range name or object indices, format capacity overruns) are
//! programming errors and abort via `assert!` instead.

use std::fmt;

/// Error type for treestream operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Buffer ended before the expected structure did.
    TruncatedStream { needed: usize, len: usize },
    /// Name table bytes are not valid UTF-8.
    InvalidNameBytes,
    /// Name table count field is negative.
    InvalidNameCount(i32),

    // JSON authoring errors
    /// Failed to parse JSON input.
    JsonParse(String),
    /// Failed to serialize to JSON.
    JsonSerialize(String),
    /// A node's `"body"` string is not valid base64.
    InvalidBodyEncoding(String),
    /// A node's `"type"` value is outside the 0-254 type-index domain
    /// (0xFF is reserved).
    TypeIndexRange(u64),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TruncatedStream { needed, len } => {
                write!(f, "truncated stream: needed {needed} bytes, have {len}")
            }
            Error::InvalidNameBytes => write!(f, "invalid UTF-8 in name table"),
            Error::InvalidNameCount(count) => write!(f, "negative name table count {count}"),
            Error::JsonParse(msg) => write!(f, "JSON parse error: {msg}"),
            Error::JsonSerialize(msg) => write!(f, "JSON serialize error: {msg}"),
            Error::InvalidBodyEncoding(msg) => write!(f, "invalid body encoding: {msg}"),
            Error::TypeIndexRange(v) => write!(f, "type index {v} does not fit in a byte"),
        }
    }
}

impl std::error::Error for Error {}

/// Result type alias for treestream operations.
pub type Result<T> = std::result::Result<T, Error>;
