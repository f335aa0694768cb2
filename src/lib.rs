//! acars-core: Pure classification + decode library for ACARS traffic.
//!
//! No async, no I/O, just algorithms. A transport layer feeds raw
//! [`Message`] values in; the [`Registry`] routes each one by label to its
//! decoders and returns a typed [`Decoded`] result. Text decoders declare
//! their layouts through the grok-style [`Compiler`]; binary decoders (ADS-C
//! on labels B6/A6) verify the ARINC 622 CRC and walk the tag stream.

pub mod adsc;
pub mod bits;
pub mod crc;
pub mod eta;
pub mod extract;
pub mod message;
pub mod pattern;
pub mod registry;
pub mod types;

// Re-export commonly used types at crate root
pub use adsc::AdscParser;
pub use eta::EtaParser;
pub use message::Message;
pub use pattern::{Compiler, Format, Match};
pub use registry::{Parser, Registry, RegistryBuilder};
pub use types::*;

/// Build a registry with every decoder this crate ships.
pub fn default_registry() -> Result<Registry> {
    RegistryBuilder::new()
        .register(AdscParser)
        .register(eta::EtaParser::new().map_err(AcarsError::Pattern)?)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_builds() {
        let registry = default_registry().unwrap();
        assert_eq!(registry.parser_names(), vec!["adsc", "eta"]);
    }

    #[test]
    fn test_default_registry_end_to_end() {
        let registry = default_registry().unwrap();

        let msg = Message {
            id: 77,
            label: "B6".to_string(),
            text: "/QUKAXBA.ADS.G-ZBKO072495A7EE7786F6A4D21F7A5D".to_string(),
            ..Default::default()
        };
        let decoded = registry.dispatch(&msg).unwrap();
        assert_eq!(decoded.kind(), "adsc");
        assert_eq!(decoded.message_id(), 77);

        let msg = Message {
            id: 78,
            label: "5Z".to_string(),
            text: "/OS YSSY/YMML 123456".to_string(),
            ..Default::default()
        };
        assert_eq!(registry.dispatch(&msg).unwrap().kind(), "eta");
    }

    #[test]
    fn test_decoded_json_wire_contract() {
        let registry = default_registry().unwrap();
        let msg = Message {
            id: 42,
            label: "B6".to_string(),
            text: "/XYTGL7X.ADS.F-GXLO0725A2E02967884D24581D0D25665826E6484D0110254F0025F2884D00815F"
                .to_string(),
            ..Default::default()
        };

        let decoded = registry.dispatch(&msg).unwrap();
        let json = serde_json::to_value(&decoded).unwrap();

        assert_eq!(json["type"], "adsc");
        assert_eq!(json["message_id"], 42);
        assert_eq!(json["registration"], "F-GXLO");
        assert_eq!(json["message_type"], "basic");
        assert_eq!(json["direction"], "downlink");
        assert_eq!(json["altitude"], 17000);
        assert!(json["latitude"].is_number());
        // Absent groups must not appear at all.
        assert!(json.get("meteo").is_none());
        assert!(json.get("contract_request").is_none());
        assert!(json.get("flight_id").is_none());
    }
}
