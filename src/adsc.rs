//! ADS-C (Automatic Dependent Surveillance - Contract) decoder.
//!
//! Handles ACARS labels B6 (downlink reports) and A6 (uplink contract
//! requests). The envelope is ARINC 622: a text prefix carrying the ground
//! station and registration, then a hex-encoded binary payload whose last
//! two bytes are a CRC-16 over the 10-character prefix plus payload. A CRC
//! failure rejects the whole message; no partial decode is emitted.
//!
//! Downlink payloads are a tag walk (ARINC 745): each tag byte announces a
//! fixed-size group that is decoded and skipped. An unknown tag aborts the
//! walk but keeps whatever decoded before it. Field encodings are
//! fixed-point two's complement, matching libacars.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::bits::{sign_extend, BitReader};
use crate::crc;
use crate::message::Message;
use crate::registry::{Parser, ParserTrace, QuickCheckTrace};
use crate::types::{hex_decode, Decoded, Direction};

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Meteorological group (tag 0x10).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MeteoData {
    pub wind_speed_kts: f64,
    /// True wind direction in degrees.
    pub wind_direction_deg: f64,
    pub wind_dir_invalid: bool,
    pub temperature_c: f64,
}

/// Earth-referenced velocity group (tag 0x0E).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EarthRef {
    pub track_deg: f64,
    pub track_invalid: bool,
    pub ground_speed_kts: f64,
    pub vert_speed_fpm: i32,
}

/// Air-referenced velocity group (tag 0x0F).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AirRef {
    pub heading_deg: f64,
    pub heading_invalid: bool,
    pub mach: f64,
    pub vert_speed_fpm: i32,
}

/// A predicted waypoint from the route group.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_ft: i32,
    /// Estimated time to the waypoint in seconds. Zero for next+1, which
    /// carries no ETA field.
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub eta_seconds: i32,
}

/// Predicted route group (tag 0x0D): the next two waypoints.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PredictedRoute {
    pub next_waypoint: Waypoint,
    pub next_next_waypoint: Waypoint,
}

/// Uplink contract request (label A6).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ContractRequest {
    pub contract_num: u8,
    /// Requested reporting interval. The wire carries a modulus of 64 s.
    pub interval_secs: u32,
}

/// A decoded ADS-C message. Field names and optionality are part of the
/// JSON wire contract.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AdscReport {
    pub message_id: i64,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    /// Flight ID hint from the text envelope, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flight_id: Option<String>,
    pub registration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ground_station: Option<String>,
    /// First tag of the payload, e.g. "basic", "emergency",
    /// "uplink_contract_request", or "unknown_xx".
    pub message_type: String,
    /// Decoded payload length, CRC excluded.
    pub payload_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_request: Option<ContractRequest>,
    /// Report time as seconds past the hour.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_time_sec: Option<f64>,
    /// Position accuracy figure of merit (0-7).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<u8>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub nav_redundancy: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub tcas_available: bool,
    /// ICAO 24-bit address as hex (tag 0x11).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airframe_id: Option<String>,
    /// Flight ID carried inside the binary payload (tag 0x0C).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adsc_flight_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meteo: Option<MeteoData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earth_ref: Option<EarthRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub air_ref: Option<AirRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_route: Option<PredictedRoute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_hex: Option<String>,
}

fn is_zero_i32(v: &i32) -> bool {
    *v == 0
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Flight ID hint at the end of the envelope prefix, e.g. "AKL0628" in
/// "L46AKL0628/FUKJJYA".
static FLIGHT_HINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]{2,3}\d{3,4}[A-Z]?)$").unwrap());

/// Decoder for ADS-C messages on labels B6 and A6.
pub struct AdscParser;

impl Parser for AdscParser {
    fn name(&self) -> &'static str {
        "adsc"
    }

    fn labels(&self) -> &'static [&'static str] {
        &["B6", "A6"]
    }

    fn priority(&self) -> i32 {
        10
    }

    fn quick_check(&self, text: &str) -> bool {
        text.contains(".ADS.")
    }

    fn parse(&self, msg: &Message) -> Option<Decoded> {
        self.decode(msg).map(Decoded::Adsc)
    }

    fn parse_with_trace(&self, msg: &Message) -> ParserTrace {
        let passed = self.quick_check(&msg.text);
        ParserTrace {
            parser: self.name().to_string(),
            quick_check: QuickCheckTrace {
                passed,
                reason: (!passed).then(|| "text does not contain .ADS.".to_string()),
            },
            formats: Vec::new(),
            matched: if passed { self.parse(msg) } else { None },
        }
    }
}

impl AdscParser {
    fn decode(&self, msg: &Message) -> Option<AdscReport> {
        let text = msg.text.trim();
        if text.is_empty() {
            return None;
        }

        let ads_idx = text.find(".ADS.")?;

        let mut report = AdscReport {
            message_id: msg.id,
            timestamp: msg.timestamp.clone(),
            direction: match msg.label.as_str() {
                "A6" => Some(Direction::Uplink),
                "B6" => Some(Direction::Downlink),
                _ => None,
            },
            ..Default::default()
        };

        // Envelope prefix: [link chars][flight]/[ground station].
        let mut prefix = &text[..ads_idx];
        if let Some(slash) = prefix.rfind('/') {
            let station = &prefix[slash + 1..];
            if !station.is_empty() {
                report.ground_station = Some(station.to_string());
            }
            prefix = &prefix[..slash];
        }
        if let Some(caps) = FLIGHT_HINT.captures(prefix) {
            report.flight_id = Some(caps[1].to_string());
        }

        // The CRC covers the 10 raw characters starting after the dot
        // before "ADS": the IMI plus the registration field as sent.
        let prefix_start = ads_idx + 1;
        let text_prefix = text.get(prefix_start..prefix_start + 10)?;
        let hex_payload = text.get(prefix_start + 10..)?;

        if hex_payload.len() < 4 || hex_payload.len() % 2 != 0 {
            return None;
        }
        let data = hex_decode(hex_payload)?;
        if data.len() < 3 {
            return None;
        }

        if !crc::verify(text_prefix.as_bytes(), &data) {
            return None;
        }

        // Registration is the prefix after "ADS", minus padding dots.
        report.registration = text_prefix.get(3..)?.trim_start_matches('.').to_string();
        report.raw_hex = Some(hex_payload.to_string());

        let payload = &data[..data.len() - 2];
        if msg.label == "A6" {
            decode_contract_request(&mut report, payload);
        } else {
            decode_tags(&mut report, payload);
        }

        Some(report)
    }
}

// ---------------------------------------------------------------------------
// Uplink payload
// ---------------------------------------------------------------------------

/// Uplink contract request: header byte, contract number, then the
/// reporting interval as a modulus of 64 seconds.
fn decode_contract_request(report: &mut AdscReport, data: &[u8]) {
    if data.len() < 3 {
        return;
    }
    report.payload_bytes = data.len();
    report.message_type = "uplink_contract_request".to_string();
    report.contract_request = Some(ContractRequest {
        contract_num: data[1],
        interval_secs: data[2] as u32 * 64,
    });
}

// ---------------------------------------------------------------------------
// Downlink tag walk
// ---------------------------------------------------------------------------

/// Walk the payload tag by tag. The first tag names the message type; later
/// tags add groups. A truncated or unknown tag stops the walk, keeping the
/// groups decoded so far.
fn decode_tags(report: &mut AdscReport, data: &[u8]) {
    if data.is_empty() {
        return;
    }
    report.payload_bytes = data.len();

    let mut offset = 0;
    let mut first = true;
    while offset < data.len() {
        let tag = data[offset];
        offset += 1;
        match decode_tag(report, tag, &data[offset..], first) {
            Some(consumed) => offset += consumed,
            None => break,
        }
        first = false;
    }
}

/// Decode one tag group. Returns the number of payload bytes consumed, or
/// `None` when the group is truncated or the tag is unknown.
fn decode_tag(report: &mut AdscReport, tag: u8, data: &[u8], is_first: bool) -> Option<usize> {
    match tag {
        // Acknowledgement: contract number only.
        0x03 => {
            if is_first {
                report.message_type = "acknowledgment".to_string();
            }
            (!data.is_empty()).then_some(1)
        }
        // Negative acknowledgement: contract number + reason.
        0x04 => {
            if is_first {
                report.message_type = "nack".to_string();
            }
            (data.len() >= 2).then_some(2)
        }
        // Noncompliance notification: header + group count, then two bytes
        // per noncompliant group.
        0x05 => {
            if is_first {
                report.message_type = "noncompliance".to_string();
            }
            if data.len() < 2 {
                return None;
            }
            Some(2 + data[1] as usize * 2)
        }
        // Cancel emergency mode: no body.
        0x06 => {
            if is_first {
                report.message_type = "cancel_emergency".to_string();
            }
            Some(0)
        }
        // Basic report and the event reports that share its layout.
        0x07 | 0x09 | 0x0A | 0x12 | 0x13 | 0x14 => {
            if is_first {
                report.message_type = match tag {
                    0x07 => "basic",
                    0x09 => "emergency",
                    0x0A => "lateral_deviation",
                    0x12 => "vert_rate_change",
                    0x13 => "altitude_range",
                    _ => "waypoint_change",
                }
                .to_string();
            }
            if data.len() < 10 {
                return None;
            }
            decode_basic_report(report, &data[..10]);
            Some(10)
        }
        // Flight ID, 8 six-bit characters.
        0x0C => {
            if data.len() < 6 {
                return None;
            }
            report.adsc_flight_id = Some(decode_flight_id(&data[..6]));
            Some(6)
        }
        // Predicted route: next two waypoints.
        0x0D => {
            if data.len() < 17 {
                return None;
            }
            report.predicted_route = Some(decode_predicted_route(&data[..17]));
            Some(17)
        }
        // Earth reference: ground track and speed.
        0x0E => {
            if data.len() < 5 {
                return None;
            }
            report.earth_ref = Some(decode_earth_ref(&data[..5]));
            Some(5)
        }
        // Air reference: heading and mach.
        0x0F => {
            if data.len() < 5 {
                return None;
            }
            report.air_ref = Some(decode_air_ref(&data[..5]));
            Some(5)
        }
        // Meteo: wind and temperature.
        0x10 => {
            if data.len() < 4 {
                return None;
            }
            report.meteo = Some(decode_meteo(&data[..4]));
            Some(4)
        }
        // Airframe ID: ICAO 24-bit address.
        0x11 => {
            if data.len() < 3 {
                return None;
            }
            report.airframe_id =
                Some(format!("{:02X}{:02X}{:02X}", data[0], data[1], data[2]));
            Some(3)
        }
        // Intermediate projection: skipped, length known.
        0x16 => (data.len() >= 8).then_some(8),
        // Fixed projection: skipped, length known.
        0x17 => (data.len() >= 9).then_some(9),
        // Unknown tag: length unknowable, abort the walk.
        _ => {
            if is_first {
                report.message_type = format!("unknown_{tag:02x}");
            }
            None
        }
    }
}

/// 10-byte basic report: lat(21) lon(21) alt(16) time(15) flags(7).
fn decode_basic_report(report: &mut AdscReport, data: &[u8]) {
    let r = BitReader::new(data);

    let mut lat = decode_coordinate(r.read(0, 21));
    let mut lon = decode_coordinate(r.read(21, 21));
    // Out-of-range coordinates are padding or corruption; zero them.
    if !(-90.0..=90.0).contains(&lat) {
        lat = 0.0;
    }
    if !(-180.0..=180.0).contains(&lon) {
        lon = 0.0;
    }
    report.latitude = Some(lat);
    report.longitude = Some(lon);
    report.altitude = Some(decode_altitude(r.read(42, 16)));
    report.report_time_sec = Some(r.read(58, 15) as f64 * 0.125);

    let flags = r.read(73, 7);
    report.nav_redundancy = flags & 0x01 != 0;
    report.accuracy = Some(((flags >> 1) & 0x07) as u8);
    report.tcas_available = flags & 0x10 != 0;
}

/// 4-byte meteo group: wind_speed(9) dir_invalid(1) wind_dir(9) temp(12).
fn decode_meteo(data: &[u8]) -> MeteoData {
    let r = BitReader::new(data);
    MeteoData {
        wind_speed_kts: r.read(0, 9) as f64 / 2.0,
        wind_dir_invalid: r.read(9, 1) != 0,
        wind_direction_deg: decode_wind_dir(r.read(10, 9)),
        temperature_c: decode_temperature(r.read(19, 12)),
    }
}

/// 5-byte earth reference group: invalid(1) track(12) speed(13) vs(12).
fn decode_earth_ref(data: &[u8]) -> EarthRef {
    let r = BitReader::new(data);
    EarthRef {
        track_invalid: r.read(0, 1) != 0,
        track_deg: decode_heading(r.read(1, 12)),
        ground_speed_kts: r.read(13, 13) as f64 / 2.0,
        vert_speed_fpm: decode_vert_speed(r.read(26, 12)),
    }
}

/// 5-byte air reference group: invalid(1) heading(12) mach(13) vs(12).
/// Mach is carried as mach x 1000.
fn decode_air_ref(data: &[u8]) -> AirRef {
    let r = BitReader::new(data);
    AirRef {
        heading_invalid: r.read(0, 1) != 0,
        heading_deg: decode_heading(r.read(1, 12)),
        mach: r.read(13, 13) as f64 / 1000.0,
        vert_speed_fpm: decode_vert_speed(r.read(26, 12)),
    }
}

/// 17-byte predicted route group: two waypoints, the second without an ETA.
fn decode_predicted_route(data: &[u8]) -> PredictedRoute {
    let r = BitReader::new(data);
    PredictedRoute {
        next_waypoint: Waypoint {
            latitude: decode_coordinate(r.read(0, 21)),
            longitude: decode_coordinate(r.read(21, 21)),
            altitude_ft: decode_altitude(r.read(42, 16)),
            eta_seconds: r.read(58, 14) as i32,
        },
        next_next_waypoint: Waypoint {
            latitude: decode_coordinate(r.read(72, 21)),
            longitude: decode_coordinate(r.read(93, 21)),
            altitude_ft: decode_altitude(r.read(114, 16)),
            eta_seconds: 0,
        },
    }
}

/// 6 bytes carrying 8 six-bit ISO5 characters, space padded on the right.
fn decode_flight_id(data: &[u8]) -> String {
    let r = BitReader::new(data);
    let mut id = String::with_capacity(8);
    for i in 0..8 {
        let mut c = r.read(i * 6, 6) as u8;
        // Six-bit ISO5: digits and space carry bit 5 set; letters do not
        // and map into the ASCII uppercase range.
        if c & 0x20 == 0 {
            c += 0x40;
        }
        id.push(c as char);
    }
    id.trim_end_matches(' ').to_string()
}

// ---------------------------------------------------------------------------
// Fixed-point field decoding
// ---------------------------------------------------------------------------

/// 21-bit signed coordinate. MSB weight 90 degrees, LSB weight 90/2^19.
fn decode_coordinate(raw: u32) -> f64 {
    let signed = sign_extend(raw, 21);
    let max = 180.0 - 90.0 / (1u32 << 19) as f64;
    max * signed as f64 / 0xFFFFF as f64
}

/// 16-bit signed altitude, 2 ft resolution. Validated against captured
/// traffic: raw 0x1BDA is exactly 14260 ft, raw 0x2134 exactly 17000 ft.
fn decode_altitude(raw: u32) -> i32 {
    sign_extend(raw, 16) * 2
}

/// 12-bit signed heading/track, normalized to 0..360.
fn decode_heading(raw: u32) -> f64 {
    let signed = sign_extend(raw, 12);
    let max = 180.0 - 90.0 / (1u32 << 10) as f64;
    let deg = max * signed as f64 / 0x7FF as f64;
    if deg < 0.0 {
        deg + 360.0
    } else {
        deg
    }
}

/// 9-bit signed wind direction, normalized to 0..360.
fn decode_wind_dir(raw: u32) -> f64 {
    let signed = sign_extend(raw, 9);
    let max = 180.0 - 90.0 / (1u32 << 7) as f64;
    let deg = max * signed as f64 / 0xFF as f64;
    if deg < 0.0 {
        deg + 360.0
    } else {
        deg
    }
}

/// 12-bit signed temperature in Celsius.
fn decode_temperature(raw: u32) -> f64 {
    let signed = sign_extend(raw, 12);
    let max = 512.0 - 256.0 / (1u32 << 10) as f64;
    max * signed as f64 / 0x7FF as f64
}

/// 12-bit signed vertical speed, 16 ft/min resolution.
fn decode_vert_speed(raw: u32) -> i32 {
    sign_extend(raw, 12) * 16
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
