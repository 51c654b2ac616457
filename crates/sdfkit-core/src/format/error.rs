use thiserror::Error;

/// Errors returned while decoding an SDF stream.
///
/// Every variant carries the absolute byte offset at which the problem was
/// detected, counted from the start of the stream.
///
/// # Examples
/// ```
/// use sdfkit_core::DecodeError;
///
/// let err = DecodeError::InvalidPageVersion { offset: 8, value: 42 };
/// assert!(err.to_string().contains("invalid page version 42"));
/// assert_eq!(err.offset(), 8);
/// ```
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(
        "unexpected end of stream at offset {offset} while reading {context}: need {needed} bytes, got {actual}"
    )]
    UnexpectedEndOfStream {
        offset: u64,
        context: String,
        needed: usize,
        actual: usize,
    },
    #[error("invalid page version {value} at offset {offset}")]
    InvalidPageVersion { offset: u64, value: u32 },
    #[error("truncated extension record at offset {offset}: {reason}")]
    TruncatedRecord { offset: u64, reason: String },
    #[error("impossible sample count {count} for channel {channel} at offset {offset}")]
    ImpossibleSampleCount {
        offset: u64,
        channel: String,
        count: u64,
    },
    #[error("malformed field {field} at offset {offset}: {reason}")]
    MalformedField {
        offset: u64,
        field: String,
        reason: String,
    },
    #[error("expected ping marker at offset {offset}, found {found:#010x}")]
    MissingMarker { offset: u64, found: u32 },
    #[error("I/O error at offset {offset}: {source}")]
    Io {
        offset: u64,
        #[source]
        source: std::io::Error,
    },
}

impl DecodeError {
    /// Byte offset at which the error was detected.
    pub fn offset(&self) -> u64 {
        match self {
            DecodeError::UnexpectedEndOfStream { offset, .. }
            | DecodeError::InvalidPageVersion { offset, .. }
            | DecodeError::TruncatedRecord { offset, .. }
            | DecodeError::ImpossibleSampleCount { offset, .. }
            | DecodeError::MalformedField { offset, .. }
            | DecodeError::MissingMarker { offset, .. }
            | DecodeError::Io { offset, .. } => *offset,
        }
    }
}
