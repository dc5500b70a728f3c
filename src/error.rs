//! Error types for geocam-demux.

use thiserror::Error;

/// Malformed container header detected while demultiplexing.
///
/// Any of these leaves the channel in a failed state: resynchronising on a
/// corrupt stream could emit side data as payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormatError {
    /// `total_length` is smaller than the fixed 24-byte header.
    #[error("total length {total_length} is below the {minimum}-byte minimum header")]
    TotalLengthTooSmall { total_length: u32, minimum: u32 },

    /// `total_length` exceeds the configured frame size limit.
    #[error("total length {total_length} exceeds maximum frame size {maximum}")]
    FrameTooLarge { total_length: u32, maximum: u32 },

    /// Skip-size field is smaller than its own 4-byte width.
    #[error("skip size {skip_size} is smaller than the 4-byte skip-size field")]
    SkipSizeTooSmall { skip_size: u32 },

    /// Optional fields claim more bytes than `total_length` leaves for them.
    #[error("header fields need {needed} bytes but only {available} remain in the frame")]
    PayloadUnderflow { needed: usize, available: usize },
}

/// Main error type for all demux operations.
#[derive(Debug, Error)]
pub enum DemuxError {
    /// I/O error from the underlying byte source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error (configuration and stats snapshots).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed container header.
    ///
    /// `produced` payload bytes from earlier, well-formed frames of the same
    /// call are valid at the front of the buffer.
    #[error("Format error: {source}")]
    Format { source: FormatError, produced: usize },

    /// A previous call hit a format error; the channel must be reset.
    #[error("Demux state failed on an earlier format error: {0}")]
    Failed(FormatError),

    /// Caller claimed more valid bytes than the buffer holds.
    #[error("Valid length {valid_len} exceeds buffer capacity {capacity}")]
    InvalidLength { valid_len: usize, capacity: usize },

    /// The negotiated pixel format is not the MUX container.
    #[error("Unsupported pixel format: {0}")]
    UnsupportedFormat(crate::format::FourCc),

    /// Byte source ended in the middle of a frame.
    #[error("Stream ended inside a frame")]
    TruncatedStream,
}

/// Result type alias using DemuxError.
pub type Result<T> = std::result::Result<T, DemuxError>;
