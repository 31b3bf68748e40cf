//! Error types for Teleinfo frame reading and decoding.

use std::io;

use thiserror::Error;

/// Errors produced while synchronizing on and decoding Teleinfo frames.
///
/// Every decode error aborts the frame as a whole: a [`Frame`](crate::Frame)
/// with a failing field is never constructed.
#[derive(Error, Debug)]
pub enum FrameError {
    /// The stream ended before a start-of-frame marker was found.
    #[error("stream ended while looking for start-of-frame marker")]
    Sync(#[source] io::Error),

    /// No end-of-frame marker within the bounded lookahead, or the stream
    /// ended in the middle of a frame.
    #[error("no end-of-frame marker within {scanned} bytes")]
    Truncated { scanned: usize },

    /// Start marker immediately followed by the end marker.
    #[error("read empty frame")]
    Empty,

    /// A field line did not split into the expected number of tokens.
    #[error("invalid number of elements for field line (data: '{line}')")]
    FieldFormat { line: String },

    /// The checksum token is not exactly one byte.
    #[error("invalid checksum length (actual: {actual}, expected: 1)")]
    ChecksumLength { actual: usize },

    /// The computed checksum does not match the byte read from the wire.
    #[error("invalid checksum (field: '{field}', value: '{value}', read: '{read}', expected: '{expected}')")]
    ChecksumMismatch {
        field: String,
        value: String,
        read: char,
        expected: char,
    },

    /// I/O failure other than end-of-stream while reading the source.
    #[error("I/O error reading stream")]
    Io(#[from] io::Error),
}

impl FrameError {
    /// Stable tag identifying the error kind, used to label error counters.
    pub fn kind(&self) -> &'static str {
        match self {
            FrameError::Sync(_) => "no_frame_start_marker",
            FrameError::Truncated { .. } => "no_frame_end_marker",
            FrameError::Empty => "empty_frame",
            FrameError::FieldFormat { .. } => "invalid_field",
            FrameError::ChecksumLength { .. } => "invalid_checksum_length",
            FrameError::ChecksumMismatch { .. } => "checksum_error",
            FrameError::Io(_) => "io_error",
        }
    }

    /// Whether this error reflects the underlying stream reaching its end.
    pub fn is_eof(&self) -> bool {
        match self {
            FrameError::Sync(source) => source.kind() == io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}
