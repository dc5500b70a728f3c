//! Incremental, in-place demultiplexer.
//!
//! Each call takes one delivered chunk of the container stream, strips
//! headers and side data, and slides payload bytes to the front of the same
//! buffer. Chunk boundaries may fall anywhere, even inside a header field.
//! State machine per frame:
//! - header phases: assemble 4-byte fields, some conditional
//! - `Skipping`: discard side data announced by the skip-size field
//! - `Payload`: compact payload toward the output cursor
//!
//! # Example
//!
//! ```
//! use geocam_demux::protocol::{DemuxState, FrameBuilder};
//!
//! let mut state = DemuxState::new();
//! let mut buf = FrameBuilder::new().skip(b"meta").build(b"h264");
//! let len = buf.len();
//!
//! let produced = state.process(&mut buf, len).unwrap();
//! assert_eq!(&buf[..produced], b"h264");
//! ```

use tracing::trace;

use super::field::{Accumulated, FieldAccumulator};
use super::wire_format::{
    sample_flags_have_skip_size, version_has_field6, Phase, FIELD_SIZE, MIN_HEADER_SIZE,
};
use crate::config::DemuxConfig;
use crate::error::{DemuxError, FormatError, Result};

/// Parsing state for one channel.
///
/// Persists across calls and must see every byte of the stream exactly once,
/// in order.
#[derive(Debug, Clone)]
pub struct DemuxState {
    phase: Phase,
    /// Side data left to discard in the current frame.
    skip_left: usize,
    /// Payload left to emit in the current frame.
    payload_left: usize,
    field: FieldAccumulator,
    has_field6: bool,
    has_skip_size_field: bool,
    max_frame_size: u32,
    frames_completed: u64,
    /// Latched on the first format error; cleared only by `reset`.
    failure: Option<FormatError>,
}

impl DemuxState {
    /// Fresh state with the default configuration.
    pub fn new() -> Self {
        Self::with_config(DemuxConfig::default())
    }

    /// Fresh state with a custom configuration.
    pub fn with_config(config: DemuxConfig) -> Self {
        Self {
            phase: Phase::TotalLength,
            skip_left: 0,
            payload_left: 0,
            field: FieldAccumulator::new(),
            has_field6: false,
            has_skip_size_field: false,
            max_frame_size: config.max_frame_size,
            frames_completed: 0,
            failure: None,
        }
    }

    /// Demultiplex one chunk in place.
    ///
    /// The first `valid_len` bytes of `buf` are the next bytes of the stream.
    /// Returns how many bytes at the front of `buf` are now payload;
    /// everything after that is stale.
    ///
    /// # Errors
    ///
    /// - `InvalidLength` if `valid_len` exceeds `buf.len()` (state untouched)
    /// - `Format` on a malformed header; the state is then failed. Payload
    ///   from frames completed earlier in the same call stays in
    ///   `buf[..produced]` and is reported in the error
    /// - `Failed` on any call after a format error, until [`reset`](Self::reset)
    pub fn process(&mut self, buf: &mut [u8], valid_len: usize) -> Result<usize> {
        if let Some(err) = self.failure {
            return Err(DemuxError::Failed(err));
        }
        if valid_len > buf.len() {
            return Err(DemuxError::InvalidLength {
                valid_len,
                capacity: buf.len(),
            });
        }

        // output <= input at all times: header and side data are never emitted.
        let mut input = 0;
        let mut output = 0;

        while input < valid_len {
            match self.phase {
                Phase::Skipping => {
                    let n = self.skip_left.min(valid_len - input);
                    input += n;
                    self.skip_left -= n;
                    if self.skip_left == 0 {
                        self.phase = Phase::Payload;
                    }
                }
                Phase::Payload => {
                    let n = self.payload_left.min(valid_len - input);
                    if input != output {
                        buf.copy_within(input..input + n, output);
                    }
                    input += n;
                    output += n;
                    self.payload_left -= n;
                    if self.payload_left == 0 {
                        self.phase = Phase::TotalLength;
                        self.frames_completed += 1;
                        trace!(frames = self.frames_completed, "Frame complete");
                    }
                }
                phase => match self.field.push(&buf[input..valid_len]) {
                    Accumulated::Complete { value, consumed } => {
                        input += consumed;
                        if let Err(err) = self.resolve(phase, value) {
                            self.failure = Some(err);
                            return Err(DemuxError::Format {
                                source: err,
                                produced: output,
                            });
                        }
                    }
                    Accumulated::Pending => input = valid_len,
                },
            }
        }

        Ok(output)
    }

    /// Apply a completed header field and advance the phase.
    ///
    /// Counters are only written once every check has passed.
    fn resolve(&mut self, phase: Phase, value: u32) -> std::result::Result<(), FormatError> {
        match phase {
            Phase::TotalLength => {
                let minimum = MIN_HEADER_SIZE as u32;
                if value < minimum {
                    return Err(FormatError::TotalLengthTooSmall {
                        total_length: value,
                        minimum,
                    });
                }
                if value > self.max_frame_size {
                    return Err(FormatError::FrameTooLarge {
                        total_length: value,
                        maximum: self.max_frame_size,
                    });
                }
                self.payload_left = (value - minimum) as usize;
                self.skip_left = 0;
                self.has_field6 = false;
                self.has_skip_size_field = false;
            }
            Phase::VersionFlags => self.has_field6 = version_has_field6(value),
            Phase::SampleFlags => self.has_skip_size_field = sample_flags_have_skip_size(value),
            Phase::OptionalField6 => {
                self.payload_left = shrink(self.payload_left, FIELD_SIZE)?;
            }
            Phase::OptionalSkipSize => {
                let payload_left = shrink(self.payload_left, FIELD_SIZE)?;
                let skip_left = (value as usize)
                    .checked_sub(FIELD_SIZE)
                    .ok_or(FormatError::SkipSizeTooSmall { skip_size: value })?;
                self.payload_left = shrink(payload_left, skip_left)?;
                self.skip_left = skip_left;
            }
            Phase::Reserved1 | Phase::Reserved3 | Phase::Reserved5 => {}
            Phase::Skipping | Phase::Payload => {}
        }

        self.phase = phase.next(self.has_field6, self.has_skip_size_field);
        Ok(())
    }

    /// Return to the start-of-frame state, clearing any failure.
    ///
    /// Only meaningful when the caller also restarts the byte stream at a
    /// frame boundary.
    pub fn reset(&mut self) {
        *self = Self::with_config(DemuxConfig {
            max_frame_size: self.max_frame_size,
        });
    }

    /// Current phase.
    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Side data still to discard in the current frame.
    #[inline]
    pub fn skip_left(&self) -> usize {
        self.skip_left
    }

    /// Payload still to emit in the current frame.
    #[inline]
    pub fn payload_left(&self) -> usize {
        self.payload_left
    }

    /// Number of frames fully demultiplexed since creation or reset.
    #[inline]
    pub fn frames_completed(&self) -> u64 {
        self.frames_completed
    }

    /// Format error that failed this state, if any.
    #[inline]
    pub fn failure(&self) -> Option<FormatError> {
        self.failure
    }

    /// Check if a format error has failed this state.
    #[inline]
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Check if the stream consumed so far ends exactly on a frame.
    pub fn is_at_frame_boundary(&self) -> bool {
        match self.phase {
            Phase::TotalLength => self.field.is_empty(),
            Phase::Skipping => self.skip_left == 0 && self.payload_left == 0,
            Phase::Payload => self.payload_left == 0,
            _ => false,
        }
    }
}

impl Default for DemuxState {
    fn default() -> Self {
        Self::new()
    }
}

fn shrink(available: usize, needed: usize) -> std::result::Result<usize, FormatError> {
    available
        .checked_sub(needed)
        .ok_or(FormatError::PayloadUnderflow { needed, available })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::FrameBuilder;

    /// Raw 24-byte mandatory header.
    fn header(total_length: u32, version_flags: u32, sample_flags: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        for field in [total_length, 0, version_flags, 0, sample_flags, 0] {
            bytes.extend_from_slice(&field.to_be_bytes());
        }
        bytes
    }

    /// Feed `stream` in chunks of the given sizes, collecting output.
    fn feed_chunks(state: &mut DemuxState, stream: &[u8], sizes: &[usize]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut offset = 0;
        for &size in sizes {
            let mut chunk = stream[offset..offset + size].to_vec();
            let produced = state.process(&mut chunk, size).unwrap();
            out.extend_from_slice(&chunk[..produced]);
            offset += size;
        }
        assert_eq!(offset, stream.len());
        out
    }

    #[test]
    fn test_no_optional_fields_chunked() {
        let payload: Vec<u8> = (0..16).collect();
        let mut stream = header(0x28, 0, 0);
        stream.extend_from_slice(&payload);

        let mut state = DemuxState::new();
        let out = feed_chunks(&mut state, &stream, &[7, 7, 7, 3, 16]);

        assert_eq!(out, payload);
        assert_eq!(state.phase(), Phase::TotalLength);
        assert_eq!(state.frames_completed(), 1);
    }

    #[test]
    fn test_skip_size_present() {
        let payload: Vec<u8> = (100..112).collect();
        let mut stream = header(0x30, 0, 0x0000_0200);
        stream.extend_from_slice(&0x0000_000Cu32.to_be_bytes());
        stream.extend_from_slice(&[0xEE; 8]);
        stream.extend_from_slice(&payload);
        assert_eq!(stream.len(), 48);

        let mut state = DemuxState::new();
        let len = stream.len();
        let produced = state.process(&mut stream, len).unwrap();

        assert_eq!(produced, 12);
        assert_eq!(&stream[..produced], &payload[..]);
    }

    #[test]
    fn test_field6_is_not_payload() {
        let mut stream = header(24 + 4 + 3, 0x0100_0000, 0);
        stream.extend_from_slice(&[0xF6; 4]);
        stream.extend_from_slice(b"abc");

        let mut state = DemuxState::new();
        let out = feed_chunks(&mut state, &stream, &[25, 3, 3]);

        assert_eq!(out, b"abc");
    }

    #[test]
    fn test_both_optional_fields() {
        let frame = FrameBuilder::new()
            .field6(7)
            .skip(&[0xEE; 5])
            .build(b"payload");

        let mut state = DemuxState::new();
        let sizes = vec![1; frame.len()];
        let out = feed_chunks(&mut state, &frame, &sizes);

        assert_eq!(out, b"payload");
    }

    #[test]
    fn test_two_frames_in_one_call() {
        let mut stream = FrameBuilder::new().build(b"first");
        FrameBuilder::new().skip(b"side").build_into(b"second", &mut stream);

        let mut state = DemuxState::new();
        let len = stream.len();
        let produced = state.process(&mut stream, len).unwrap();

        assert_eq!(&stream[..produced], b"firstsecond");
        assert_eq!(state.frames_completed(), 2);
        assert!(state.is_at_frame_boundary());
    }

    #[test]
    fn test_state_persists_mid_skip() {
        let frame = FrameBuilder::new().skip(&[0; 10]).build(b"xy");
        let mut state = DemuxState::new();

        let mut first = frame[..32].to_vec();
        assert_eq!(state.process(&mut first, 32).unwrap(), 0);
        assert_eq!(state.phase(), Phase::Skipping);
        assert_eq!(state.skip_left(), 6);
        assert_eq!(state.payload_left(), 2);

        let mut rest = frame[32..].to_vec();
        let produced = state.process(&mut rest, 8).unwrap();
        assert_eq!(&rest[..produced], b"xy");
    }

    #[test]
    fn test_state_persists_mid_payload() {
        let frame = FrameBuilder::new().build(b"abcdef");
        let mut state = DemuxState::new();

        let mut first = frame[..26].to_vec();
        let produced = state.process(&mut first, 26).unwrap();
        assert_eq!(&first[..produced], b"ab");
        assert_eq!(state.phase(), Phase::Payload);
        assert_eq!(state.payload_left(), 4);
        assert!(!state.is_at_frame_boundary());
    }

    #[test]
    fn test_empty_payload_frame() {
        let mut stream = FrameBuilder::new().build(b"");
        FrameBuilder::new().build_into(b"next", &mut stream);

        let mut state = DemuxState::new();
        let len = stream.len();
        let produced = state.process(&mut stream, len).unwrap();

        assert_eq!(&stream[..produced], b"next");
        assert_eq!(state.frames_completed(), 2);
    }

    #[test]
    fn test_zero_length_call_is_noop() {
        let mut state = DemuxState::new();
        let mut buf = [0u8; 8];

        assert_eq!(state.process(&mut buf, 0).unwrap(), 0);
        assert_eq!(state.phase(), Phase::TotalLength);
    }

    #[test]
    fn test_valid_len_beyond_buffer() {
        let mut state = DemuxState::new();
        let mut buf = [0u8; 4];

        let result = state.process(&mut buf, 5);
        assert!(matches!(
            result,
            Err(DemuxError::InvalidLength {
                valid_len: 5,
                capacity: 4
            })
        ));
        assert!(!state.is_failed());
    }

    #[test]
    fn test_total_length_too_small() {
        let mut stream = header(10, 0, 0);
        let mut state = DemuxState::new();
        let len = stream.len();

        let result = state.process(&mut stream, len);
        assert!(matches!(
            result,
            Err(DemuxError::Format {
                source: FormatError::TotalLengthTooSmall {
                    total_length: 10,
                    ..
                },
                produced: 0,
            })
        ));
        assert!(state.is_failed());
    }

    #[test]
    fn test_failed_state_rejects_until_reset() {
        let mut state = DemuxState::new();
        let mut bad = 10u32.to_be_bytes().to_vec();
        assert!(state.process(&mut bad, 4).is_err());

        let mut good = FrameBuilder::new().build(b"ok");
        let len = good.len();
        assert!(matches!(
            state.process(&mut good, len),
            Err(DemuxError::Failed(FormatError::TotalLengthTooSmall { .. }))
        ));

        state.reset();
        assert!(!state.is_failed());
        let produced = state.process(&mut good, len).unwrap();
        assert_eq!(&good[..produced], b"ok");
    }

    #[test]
    fn test_frame_too_large() {
        let mut state = DemuxState::with_config(DemuxConfig::new().with_max_frame_size(100));
        let mut stream = header(101, 0, 0);
        let len = stream.len();

        let result = state.process(&mut stream, len);
        assert!(matches!(
            result,
            Err(DemuxError::Format {
                source: FormatError::FrameTooLarge {
                    total_length: 101,
                    maximum: 100
                },
                ..
            })
        ));
    }

    #[test]
    fn test_skip_size_too_small() {
        let mut stream = header(40, 0, 0x0000_0200);
        stream.extend_from_slice(&3u32.to_be_bytes());
        let mut state = DemuxState::new();
        let len = stream.len();

        let result = state.process(&mut stream, len);
        assert!(matches!(
            result,
            Err(DemuxError::Format {
                source: FormatError::SkipSizeTooSmall { skip_size: 3 },
                ..
            })
        ));
    }

    #[test]
    fn test_skip_region_larger_than_frame() {
        let mut stream = header(32, 0, 0x0000_0200);
        stream.extend_from_slice(&20u32.to_be_bytes());
        let mut state = DemuxState::new();
        let len = stream.len();

        let result = state.process(&mut stream, len);
        assert!(matches!(
            result,
            Err(DemuxError::Format {
                source: FormatError::PayloadUnderflow {
                    needed: 16,
                    available: 4
                },
                ..
            })
        ));
        assert_eq!(state.skip_left(), 0);
        assert_eq!(state.payload_left(), 8);
    }

    #[test]
    fn test_field6_without_room() {
        let mut stream = header(24, 0x0100_0000, 0);
        stream.extend_from_slice(&[0; 4]);
        let mut state = DemuxState::new();
        let len = stream.len();

        let result = state.process(&mut stream, len);
        assert!(matches!(
            result,
            Err(DemuxError::Format {
                source: FormatError::PayloadUnderflow { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_camera_version_bytes_announce_field6() {
        let mut stream = Vec::new();
        stream.extend_from_slice(&[0, 0, 0, 31]);
        stream.extend_from_slice(&[0; 4]);
        stream.extend_from_slice(&[1, 0, 0, 0]);
        stream.extend_from_slice(&[0; 12]);
        stream.extend_from_slice(&[0xF6; 4]);
        stream.extend_from_slice(b"abc");
        assert_eq!(stream.len(), 31);

        let mut state = DemuxState::new();
        let produced = state.process(&mut stream, 31).unwrap();

        assert_eq!(&stream[..produced], b"abc");
        assert_eq!(state.frames_completed(), 1);
    }

    #[test]
    fn test_low_version_byte_does_not_announce_field6() {
        let mut stream = header(24 + 4, 0x0000_0001, 0);
        stream.extend_from_slice(b"data");

        let mut state = DemuxState::new();
        let produced = state.process(&mut stream, 28).unwrap();

        assert_eq!(&stream[..produced], b"data");
    }

    #[test]
    fn test_format_error_reports_earlier_payload() {
        let mut stream = FrameBuilder::new().build(b"good");
        FrameBuilder::new().build_into(b"also", &mut stream);
        stream.extend_from_slice(&header(10, 0, 0));

        let mut state = DemuxState::new();
        let len = stream.len();
        let err = state.process(&mut stream, len).unwrap_err();

        match err {
            DemuxError::Format { source, produced } => {
                assert!(matches!(source, FormatError::TotalLengthTooSmall { .. }));
                assert_eq!(produced, 8);
                assert_eq!(&stream[..produced], b"goodalso");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(state.is_failed());
    }

    #[test]
    fn test_residual_survives_across_calls() {
        let frame = FrameBuilder::new().build(b"q");
        let mut state = DemuxState::new();

        let mut a = frame[..2].to_vec();
        assert_eq!(state.process(&mut a, 2).unwrap(), 0);
        assert!(!state.is_at_frame_boundary());

        let mut b = frame[2..].to_vec();
        let len = b.len();
        let produced = state.process(&mut b, len).unwrap();
        assert_eq!(&b[..produced], b"q");
    }

    #[test]
    fn test_reset_keeps_config() {
        let mut state = DemuxState::with_config(DemuxConfig::new().with_max_frame_size(30));
        state.reset();

        let mut stream = header(31, 0, 0);
        let len = stream.len();
        assert!(state.process(&mut stream, len).is_err());
    }
}
