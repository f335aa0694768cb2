//! Bit-level extraction for packed binary fields.
//!
//! ADS-C packs fields at odd widths (21-bit coordinates, 9-bit wind
//! direction, a 130-bit predicted-route record that is not byte-aligned).
//! All decoders extract through [`BitReader`] rather than ad hoc shifts so
//! the offset/width arithmetic lives in one tested place.

/// Reads big-endian bit fields at absolute bit offsets from a byte slice.
pub struct BitReader<'a> {
    data: &'a [u8],
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        BitReader { data }
    }

    /// Total number of addressable bits.
    pub fn bit_len(&self) -> usize {
        self.data.len() * 8
    }

    /// Read `width` bits (MSB-first) starting at absolute bit offset `start`.
    ///
    /// Callers must have validated the buffer length; reading past the end
    /// or more than 32 bits is a programming error and panics.
    pub fn read(&self, start: usize, width: usize) -> u32 {
        assert!(width <= 32, "bit field wider than 32 bits");
        assert!(
            start + width <= self.bit_len(),
            "bit range {start}..{} exceeds buffer of {} bits",
            start + width,
            self.bit_len()
        );

        let mut out = 0u32;
        for i in 0..width {
            let bit = start + i;
            if self.data[bit / 8] & (1 << (7 - bit % 8)) != 0 {
                out |= 1 << (width - 1 - i);
            }
        }
        out
    }

    /// Read `width` bits and sign-extend the top bit.
    pub fn read_signed(&self, start: usize, width: usize) -> i32 {
        sign_extend(self.read(start, width), width)
    }
}

/// Sign-extend a `width`-bit two's-complement value to i32.
pub fn sign_extend(raw: u32, width: usize) -> i32 {
    if width == 0 || width >= 32 {
        return raw as i32;
    }
    if raw & (1 << (width - 1)) != 0 {
        (raw | (u32::MAX << width)) as i32
    } else {
        raw as i32
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
