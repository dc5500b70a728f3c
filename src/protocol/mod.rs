//! Protocol module - MUX container wire format and the demultiplexer.
//!
//! This module implements the camera's container framing:
//! - 24-byte mandatory header with two conditional trailing fields
//! - Field accumulator for headers split across reads
//! - In-place demultiplexer that compacts payload bytes
//! - Frame encoder for producing container streams

mod demux;
mod field;
mod frame;
mod wire_format;

pub use demux::DemuxState;
pub use field::{Accumulated, FieldAccumulator};
pub use frame::FrameBuilder;
pub use wire_format::{
    sample_flags_have_skip_size, version_has_field6, Phase, DEFAULT_MAX_FRAME_SIZE, FIELD_SIZE,
    MIN_HEADER_SIZE, SAMPLE_FLAG_SKIP_SIZE, VERSION_WITH_FIELD6,
};
