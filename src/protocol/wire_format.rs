//! Wire format of the MUX container header.
//!
//! Every frame starts with six mandatory fields, followed by up to two
//! optional ones:
//! ```text
//! ┌──────────┬──────┬──────────┬──────┬──────────┬──────┬──────────┬───────────┐
//! │ Total Len│ Rsvd │ Ver/Flags│ Rsvd │ Smp Flags│ Rsvd │ Field 6? │ Skip Size?│
//! │ uint32 BE│ 4 B  │ uint32 BE│ 4 B  │ uint32 BE│ 4 B  │ 4 B      │ uint32 BE │
//! └──────────┴──────┴──────────┴──────┴──────────┴──────┴──────────┴───────────┘
//! ```
//!
//! `Total Len` covers the whole frame including the header. Field 6 is
//! present when the version is 1; the skip-size field is present when bit 1
//! of the third sample-flags byte is set. The skip-size value counts itself
//! plus the side data that follows it.
//!
//! All multi-byte integers are Big Endian.

/// Width of every header field in bytes.
pub const FIELD_SIZE: usize = 4;

/// Size of the six mandatory header fields.
pub const MIN_HEADER_SIZE: usize = 24;

/// Version value (first byte on the wire) announcing the optional field 6.
pub const VERSION_WITH_FIELD6: u8 = 1;

/// Mask applied to the third byte (wire order) of the sample flags.
pub const SAMPLE_FLAG_SKIP_SIZE: u8 = 0x02;

/// Default upper bound on `total_length` (64 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 64 * 1024 * 1024;

/// Position of the parser inside the current frame.
///
/// Header phases each assemble one 4-byte field; `Skipping` and `Payload`
/// consume the frame body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    TotalLength,
    Reserved1,
    VersionFlags,
    Reserved3,
    SampleFlags,
    Reserved5,
    OptionalField6,
    OptionalSkipSize,
    Skipping,
    Payload,
}

impl Phase {
    /// Phase that follows `self` once it resolves.
    ///
    /// Absent optional fields are stepped over: field 6 first, then the
    /// skip size, so a frame with neither lands directly on `Skipping`.
    pub fn next(self, has_field6: bool, has_skip_size_field: bool) -> Phase {
        let next = match self {
            Phase::TotalLength => Phase::Reserved1,
            Phase::Reserved1 => Phase::VersionFlags,
            Phase::VersionFlags => Phase::Reserved3,
            Phase::Reserved3 => Phase::SampleFlags,
            Phase::SampleFlags => Phase::Reserved5,
            Phase::Reserved5 => Phase::OptionalField6,
            Phase::OptionalField6 => Phase::OptionalSkipSize,
            Phase::OptionalSkipSize => Phase::Skipping,
            Phase::Skipping => Phase::Payload,
            Phase::Payload => Phase::TotalLength,
        };

        let next = if next == Phase::OptionalField6 && !has_field6 {
            Phase::OptionalSkipSize
        } else {
            next
        };

        if next == Phase::OptionalSkipSize && !has_skip_size_field {
            Phase::Skipping
        } else {
            next
        }
    }

    /// True for the phases that assemble a 4-byte header field.
    #[inline]
    pub fn is_header_field(self) -> bool {
        !matches!(self, Phase::Skipping | Phase::Payload)
    }
}

/// Check whether a version/flags field announces field 6.
///
/// The version is the first byte on the wire; the other three are flags.
#[inline]
pub fn version_has_field6(value: u32) -> bool {
    value.to_be_bytes()[0] == VERSION_WITH_FIELD6
}

/// Check whether a sample-flags field announces the skip-size field.
#[inline]
pub fn sample_flags_have_skip_size(value: u32) -> bool {
    value.to_be_bytes()[2] & SAMPLE_FLAG_SKIP_SIZE != 0
}
