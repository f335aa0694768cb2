//! CRC-16 validation for ARINC 622/623 binary messages.
//!
//! Polynomial 0x1021, MSB-first, initial value 0xFFFF — the same algorithm
//! libacars uses for FANS-1/A CPDLC and ADS-C verification.
//!
//! The checksum covers the 10-character ASCII envelope prefix (IMI +
//! registration field, exactly as transmitted) followed by the binary
//! payload. Feeding the whole buffer including its trailing 2-byte CRC
//! through the register leaves the residual [`GOOD_RESIDUAL`].

const GENERATOR: u16 = 0x1021;

/// Register residual of a valid message processed together with its CRC.
pub const GOOD_RESIDUAL: u16 = 0x1D0F;

const INIT: u16 = 0xFFFF;

// ---------------------------------------------------------------------------
// CRC lookup table (compile-time)
// ---------------------------------------------------------------------------

const fn build_crc_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ GENERATOR;
            } else {
                crc <<= 1;
            }
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static CRC_TABLE: [u16; 256] = build_crc_table();

// ---------------------------------------------------------------------------
// Core CRC functions
// ---------------------------------------------------------------------------

/// CRC-16/ARINC polynomial division over `data`, continuing from `init`.
pub fn crc16(data: &[u8], init: u16) -> u16 {
    let mut crc = init;
    for &byte in data {
        crc = (crc << 8) ^ CRC_TABLE[(((crc >> 8) ^ byte as u16) & 0xFF) as usize];
    }
    crc
}

/// Compute the 2-byte trailing checksum for a message (big-endian).
pub fn checksum(message: &[u8]) -> [u8; 2] {
    let crc = crc16(message, INIT) ^ 0xFFFF;
    [(crc >> 8) as u8, (crc & 0xFF) as u8]
}

/// Verify an ARINC binary message.
///
/// `prefix` is the raw 10-byte ASCII envelope prefix (IMI + registration
/// field, dots included). `payload` is the decoded binary payload with its
/// trailing 2-byte CRC still attached. No partial decode may be trusted
/// unless this returns true.
pub fn verify(prefix: &[u8], payload: &[u8]) -> bool {
    if prefix.len() != 10 || payload.len() < 2 {
        return false;
    }
    let crc = crc16(prefix, INIT);
    crc16(payload, crc) == GOOD_RESIDUAL
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::hex_decode;

    // Known-good ADS-C downlink: "/XYTGL7X.ADS.F-GXLI<hex>" with label B6.
    const SAMPLE_PREFIX: &[u8] = b"ADS.F-GXLI";
    const SAMPLE_HEX: &str =
        "0725BFC82D8D46BC46CC1D0D25B0182C2CC745807725965029EF880A40B791";

    #[test]
    fn test_crc_table_entries() {
        assert_eq!(CRC_TABLE[0], 0x0000);
        assert_eq!(CRC_TABLE[1], 0x1021);
        assert_eq!(CRC_TABLE[255], 0x1EF0);
    }

    #[test]
    fn test_verify_known_good_message() {
        let payload = hex_decode(SAMPLE_HEX).unwrap();
        assert!(verify(SAMPLE_PREFIX, &payload));
    }

    #[test]
    fn test_verify_rejects_any_flipped_crc_bit() {
        let payload = hex_decode(SAMPLE_HEX).unwrap();
        let crc_start = payload.len() - 2;
        for bit in 0..16 {
            let mut corrupted = payload.clone();
            corrupted[crc_start + bit / 8] ^= 1 << (bit % 8);
            assert!(
                !verify(SAMPLE_PREFIX, &corrupted),
                "flipping CRC bit {bit} should fail verification"
            );
        }
    }

    #[test]
    fn test_verify_rejects_payload_corruption() {
        let mut payload = hex_decode(SAMPLE_HEX).unwrap();
        payload[0] ^= 0x01;
        assert!(!verify(SAMPLE_PREFIX, &payload));
    }

    #[test]
    fn test_verify_rejects_wrong_prefix() {
        let payload = hex_decode(SAMPLE_HEX).unwrap();
        assert!(!verify(b"ADS.F-GXLO", &payload));
        assert!(!verify(b"short", &payload)); // prefix must be exactly 10 bytes
    }

    #[test]
    fn test_verify_too_short() {
        assert!(!verify(SAMPLE_PREFIX, &[]));
        assert!(!verify(SAMPLE_PREFIX, &[0xAB]));
    }

    #[test]
    fn test_checksum_roundtrip() {
        let mut buf = SAMPLE_PREFIX.to_vec();
        buf.extend_from_slice(&[0x07, 0x25, 0xBF, 0xC8]);
        let cs = checksum(&buf);

        let mut payload = vec![0x07, 0x25, 0xBF, 0xC8];
        payload.extend_from_slice(&cs);
        assert!(verify(SAMPLE_PREFIX, &payload));
    }

    #[test]
    fn test_checksum_matches_known_good() {
        let payload = hex_decode(SAMPLE_HEX).unwrap();
        let mut buf = SAMPLE_PREFIX.to_vec();
        buf.extend_from_slice(&payload[..payload.len() - 2]);
        assert_eq!(checksum(&buf), [payload[payload.len() - 2], payload[payload.len() - 1]]);
    }
}
