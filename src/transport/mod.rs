//! Transport module - async adapters over raw container byte sources.
//!
//! Provides:
//! - [`DemuxReader`] wrapping any `tokio::io::AsyncRead`

mod reader;

pub use reader::{DemuxReader, DEFAULT_READ_SIZE};
