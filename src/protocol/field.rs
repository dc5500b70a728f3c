//! Accumulator for 4-byte header fields split across reads.
//!
//! A field may arrive in any number of pieces. Partial bytes are kept in a
//! fixed residual so no per-call buffer is needed.

use super::wire_format::FIELD_SIZE;

/// Outcome of feeding bytes into a [`FieldAccumulator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulated {
    /// Field complete. `consumed` input bytes were used to finish it.
    Complete { value: u32, consumed: usize },
    /// Input was too short; all of it is now held in the residual.
    Pending,
}

/// Reassembles one big-endian `u32` header field.
#[derive(Debug, Clone, Default)]
pub struct FieldAccumulator {
    residual: [u8; FIELD_SIZE],
    len: usize,
}

impl FieldAccumulator {
    /// Create an empty accumulator.
    pub const fn new() -> Self {
        Self {
            residual: [0u8; FIELD_SIZE],
            len: 0,
        }
    }

    /// Feed newly available bytes.
    ///
    /// Takes at most the bytes still missing from the current field. On
    /// completion the residual is emptied for the next field.
    pub fn push(&mut self, input: &[u8]) -> Accumulated {
        let missing = FIELD_SIZE - self.len;

        if input.len() < missing {
            self.residual[self.len..self.len + input.len()].copy_from_slice(input);
            self.len += input.len();
            return Accumulated::Pending;
        }

        self.residual[self.len..].copy_from_slice(&input[..missing]);
        self.len = 0;

        Accumulated::Complete {
            value: u32::from_be_bytes(self.residual),
            consumed: missing,
        }
    }

    /// Number of bytes held for the pending field.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if no partial field is held.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop any partial field.
    pub fn clear(&mut self) {
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_field_in_one_push() {
        let mut acc = FieldAccumulator::new();
        let result = acc.push(&[0x00, 0x00, 0x00, 0x28, 0xAA]);

        assert_eq!(
            result,
            Accumulated::Complete {
                value: 0x28,
                consumed: 4
            }
        );
        assert!(acc.is_empty());
    }

    #[test]
    fn test_split_field() {
        let mut acc = FieldAccumulator::new();

        assert_eq!(acc.push(&[0x12]), Accumulated::Pending);
        assert_eq!(acc.len(), 1);
        assert_eq!(acc.push(&[0x34, 0x56]), Accumulated::Pending);
        assert_eq!(acc.len(), 3);

        let result = acc.push(&[0x78, 0x9A, 0xBC]);
        assert_eq!(
            result,
            Accumulated::Complete {
                value: 0x1234_5678,
                consumed: 1
            }
        );
        assert!(acc.is_empty());
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut acc = FieldAccumulator::new();
        let bytes = 0xDEAD_BEEFu32.to_be_bytes();

        for b in &bytes[..3] {
            assert_eq!(acc.push(&[*b]), Accumulated::Pending);
        }
        assert_eq!(
            acc.push(&bytes[3..]),
            Accumulated::Complete {
                value: 0xDEAD_BEEF,
                consumed: 1
            }
        );
    }

    #[test]
    fn test_empty_input_is_pending() {
        let mut acc = FieldAccumulator::new();
        acc.push(&[1, 2]);

        assert_eq!(acc.push(&[]), Accumulated::Pending);
        assert_eq!(acc.len(), 2);
    }

    #[test]
    fn test_consecutive_fields_do_not_leak() {
        let mut acc = FieldAccumulator::new();
        acc.push(&[0xFF, 0xFF, 0xFF]);
        acc.push(&[0xFF]);

        assert_eq!(
            acc.push(&[0, 0, 0, 7]),
            Accumulated::Complete {
                value: 7,
                consumed: 4
            }
        );
    }

    #[test]
    fn test_clear_drops_partial_field() {
        let mut acc = FieldAccumulator::new();
        acc.push(&[9, 9]);
        acc.clear();

        assert!(acc.is_empty());
        assert_eq!(
            acc.push(&[0, 0, 1, 0]),
            Accumulated::Complete {
                value: 256,
                consumed: 4
            }
        );
    }
}
