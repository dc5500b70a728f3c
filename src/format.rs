//! Pixel format codes negotiated with the capture device.
//!
//! The demultiplexer only applies to streams announced as the MUX
//! container. Kernels without the MUX patch report a zero code for the same
//! stream.

use std::fmt;

/// Four-character pixel format code, V4L2 layout (first char in low byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub u32);

/// Big-endian flag bit that V4L2 sets on `v4l2_fourcc_be` codes.
const BIG_ENDIAN_FLAG: u32 = 1 << 31;

/// MUX container as reported by a patched kernel.
pub const MUX_FOURCC: FourCc = FourCc(FourCc::from_chars(*b"MUX ").0 | BIG_ENDIAN_FLAG);

/// MUX container as reported by an unpatched kernel.
pub const MUX_FOURCC_UNKNOWN: FourCc = FourCc(0);

/// Payload carried inside the container.
pub const PAYLOAD_FOURCC: FourCc = FourCc::from_chars(*b"H264");

impl FourCc {
    /// Build a code from its four characters.
    pub const fn from_chars(chars: [u8; 4]) -> Self {
        Self(u32::from_le_bytes(chars))
    }

    /// The four characters, without the big-endian flag.
    pub fn chars(self) -> [u8; 4] {
        (self.0 & !BIG_ENDIAN_FLAG).to_le_bytes()
    }

    /// Check if this code announces the MUX container.
    #[inline]
    pub fn is_mux(self) -> bool {
        self == MUX_FOURCC || self == MUX_FOURCC_UNKNOWN
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.chars() {
            let c = if c.is_ascii_graphic() || c == b' ' {
                c as char
            } else {
                '.'
            };
            write!(f, "{}", c)?;
        }
        if self.0 & BIG_ENDIAN_FLAG != 0 {
            write!(f, "-BE")?;
        }
        Ok(())
    }
}
