//! # geocam-demux
//!
//! Incremental demultiplexer for the MUX container emitted by GeoVision
//! camera sensors.
//!
//! The camera wraps every H.264 access unit in a fixed 24-byte header,
//! optionally followed by extra header fields and side data. This crate
//! strips all of that from the capture stream, in place, no matter how the
//! driver chunks the bytes.
//!
//! ## Architecture
//!
//! - **Protocol** ([`protocol`]): wire format, field accumulator and the
//!   in-place [`DemuxState`] state machine
//! - **Channel** ([`DemuxChannel`]): per-capture-channel owner with format
//!   check, statistics and logging
//! - **Transport** ([`transport`]): async reader adapter for byte sources
//!
//! ## Example
//!
//! ```
//! use geocam_demux::protocol::{DemuxState, FrameBuilder};
//!
//! let stream = FrameBuilder::new().field6(0).build(b"\x00\x00\x00\x01\x65");
//! let mut state = DemuxState::new();
//! let mut payload = Vec::new();
//!
//! // The driver may deliver the stream in arbitrary pieces.
//! for chunk in stream.chunks(3) {
//!     let mut buf = chunk.to_vec();
//!     let produced = state.process(&mut buf, chunk.len()).unwrap();
//!     payload.extend_from_slice(&buf[..produced]);
//! }
//!
//! assert_eq!(payload, b"\x00\x00\x00\x01\x65");
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod protocol;
pub mod transport;

mod channel;

pub use channel::{DemuxChannel, DemuxStats};
pub use config::DemuxConfig;
pub use error::{DemuxError, FormatError, Result};
pub use protocol::DemuxState;
