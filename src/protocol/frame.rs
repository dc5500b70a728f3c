//! Frame encoder for the MUX container.
//!
//! Produces complete frames (header, optional side data, payload) as a
//! camera would emit them. Handy for tests, fixtures and loopback tools.
//!
//! # Example
//!
//! ```
//! use geocam_demux::protocol::{FrameBuilder, MIN_HEADER_SIZE};
//!
//! let bytes = FrameBuilder::new().skip(&[0xEE; 8]).build(b"payload");
//! assert_eq!(bytes.len(), MIN_HEADER_SIZE + 4 + 8 + 7);
//! assert_eq!(&bytes[..4], &(bytes.len() as u32).to_be_bytes());
//! ```

use super::wire_format::{FIELD_SIZE, MIN_HEADER_SIZE, SAMPLE_FLAG_SKIP_SIZE, VERSION_WITH_FIELD6};

/// Builder for one container frame.
#[derive(Debug, Clone, Default)]
pub struct FrameBuilder {
    field6: Option<u32>,
    skip: Option<Vec<u8>>,
}

impl FrameBuilder {
    /// Frame with no optional fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Include field 6 (sets the version to 1).
    pub fn field6(mut self, value: u32) -> Self {
        self.field6 = Some(value);
        self
    }

    /// Include the skip-size field followed by `side_data`.
    ///
    /// An empty slice still emits the field, with a value of 4.
    pub fn skip(mut self, side_data: &[u8]) -> Self {
        self.skip = Some(side_data.to_vec());
        self
    }

    /// Size of the header including optional fields.
    pub fn header_len(&self) -> usize {
        let mut len = MIN_HEADER_SIZE;
        if self.field6.is_some() {
            len += FIELD_SIZE;
        }
        if self.skip.is_some() {
            len += FIELD_SIZE;
        }
        len
    }

    /// Value written to `total_length` for a payload of `payload_len` bytes.
    pub fn total_length(&self, payload_len: usize) -> usize {
        self.header_len() + self.skip.as_ref().map_or(0, Vec::len) + payload_len
    }

    /// Encode the frame into a new buffer.
    ///
    /// # Panics
    ///
    /// Panics if the frame would not fit a 32-bit `total_length`.
    pub fn build(&self, payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.total_length(payload.len()));
        self.build_into(payload, &mut buf);
        buf
    }

    /// Append the encoded frame to `out`.
    ///
    /// # Panics
    ///
    /// Panics if the frame would not fit a 32-bit `total_length`.
    pub fn build_into(&self, payload: &[u8], out: &mut Vec<u8>) {
        let total_length = u32::try_from(self.total_length(payload.len()))
            .expect("frame length exceeds u32::MAX");

        let version_flags = if self.field6.is_some() {
            u32::from(VERSION_WITH_FIELD6) << 24
        } else {
            0
        };
        let sample_flags = if self.skip.is_some() {
            u32::from(SAMPLE_FLAG_SKIP_SIZE) << 8
        } else {
            0
        };

        out.extend_from_slice(&total_length.to_be_bytes());
        out.extend_from_slice(&[0u8; FIELD_SIZE]);
        out.extend_from_slice(&version_flags.to_be_bytes());
        out.extend_from_slice(&[0u8; FIELD_SIZE]);
        out.extend_from_slice(&sample_flags.to_be_bytes());
        out.extend_from_slice(&[0u8; FIELD_SIZE]);

        if let Some(value) = self.field6 {
            out.extend_from_slice(&value.to_be_bytes());
        }
        if let Some(side_data) = &self.skip {
            let skip_size = (side_data.len() + FIELD_SIZE) as u32;
            out.extend_from_slice(&skip_size.to_be_bytes());
            out.extend_from_slice(side_data);
        }

        out.extend_from_slice(payload);
    }
}
