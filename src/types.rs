//! Shared types, error enum, and the decoded-result sum type for acars-core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adsc::AdscReport;
use crate::eta::EtaReport;
use crate::pattern::PatternError;

/// All errors produced by acars-core construction paths.
///
/// Per-message parse failures are never errors — decoders return `None`
/// (see `registry::Parser::parse`).
#[derive(Debug, Error)]
pub enum AcarsError {
    #[error("duplicate parser registered: {0}")]
    DuplicateParser(String),
    #[error("pattern error: {0}")]
    Pattern(#[from] PatternError),
}

pub type Result<T> = std::result::Result<T, AcarsError>;

// ---------------------------------------------------------------------------
// Link direction
// ---------------------------------------------------------------------------

/// Direction of an ACARS transmission relative to the aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Uplink,
    Downlink,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Uplink => write!(f, "uplink"),
            Direction::Downlink => write!(f, "downlink"),
        }
    }
}

// ---------------------------------------------------------------------------
// Hex utilities
// ---------------------------------------------------------------------------

/// Decode a hex string into bytes. Case-insensitive, must be even length.
pub fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.trim();
    if hex.len() % 2 != 0 {
        return None;
    }
    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for chunk in hex.as_bytes().chunks(2) {
        let high = hex_digit(chunk[0])?;
        let low = hex_digit(chunk[1])?;
        bytes.push((high << 4) | low);
    }
    Some(bytes)
}

/// Encode bytes as uppercase hex string.
pub fn hex_encode(data: &[u8]) -> String {
    let mut s = String::with_capacity(data.len() * 2);
    for &b in data {
        s.push(HEX_CHARS[(b >> 4) as usize] as char);
        s.push(HEX_CHARS[(b & 0x0F) as usize] as char);
    }
    s
}

const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Decoded results
// ---------------------------------------------------------------------------

/// Union type for all decoded messages, one variant per decoder family.
///
/// Field names and optionality of the payload structs are part of the wire
/// contract for downstream JSON consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Decoded {
    #[serde(rename = "adsc")]
    Adsc(AdscReport),
    #[serde(rename = "eta")]
    Eta(EtaReport),
}

impl Decoded {
    /// String discriminant identifying the decoder family.
    pub fn kind(&self) -> &'static str {
        match self {
            Decoded::Adsc(_) => "adsc",
            Decoded::Eta(_) => "eta",
        }
    }

    /// ID of the original message this result was decoded from.
    pub fn message_id(&self) -> i64 {
        match self {
            Decoded::Adsc(r) => r.message_id,
            Decoded::Eta(r) => r.message_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
