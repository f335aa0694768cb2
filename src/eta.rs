//! ETA and timing message decoder (ACARS label 5Z).
//!
//! Label 5Z carries airline-defined timing traffic: expected-arrival
//! reports, landing data requests, route declarations. Each known layout is
//! a grok format; the first matching format in declaration order decides
//! the message type.

use serde::Serialize;

use crate::extract::normalise_flight_number;
use crate::message::Message;
use crate::pattern::{Compiler, Format, PatternError};
use crate::registry::{Parser, ParserTrace, QuickCheckTrace};
use crate::types::Decoded;

/// The known 5Z timing layouts. Order matters: earlier formats win.
const FORMATS: &[Format] = &[
    // /ET EXP TIME / YSSY YMML 29 123456/EON 1530 AUTO
    Format {
        name: "et_exp_time",
        pattern: r"/ET\s+EXP\s+TIME\s+/\s*(?P<origin>{ICAO})\s+(?P<dest>{ICAO})\s+(?P<day>\d{2})\s+(?P<time>{TIME6})/EON\s+(?P<eta>{TIME4})(?:\s+(?P<mode>\w+))?",
        fields: &["origin", "dest", "day", "time", "eta", "mode"],
    },
    // /IR QFA123/.../ETA 1530
    Format {
        name: "ir_format",
        pattern: r"/IR\s+(?P<flight>[A-Z]{3}\d+)/.*?/ETA\s+(?P<eta>{TIME4})",
        fields: &["flight", "eta"],
    },
    // /B6 LDG DATA REQ/YMML 1530 00/RWY 16R/GATE A12
    Format {
        name: "b6_ldg_data",
        pattern: r"/B6\s+LDG\s+DATA\s+REQ/(?P<dest>{ICAO})\s+(?P<eta>{TIME4})(?:\s+\d{2})?/RWY\s*(?P<runway>{RUNWAY})(?:/GATE\s*(?P<gate>[A-Z0-9]+))?",
        fields: &["dest", "eta", "runway", "gate"],
    },
    // /OS YSSY/YMML 123456
    Format {
        name: "os_format",
        pattern: r"/OS\s+(?P<origin>{ICAO})\s*/(?P<dest>{ICAO})\s*(?P<time>{TIME6})?",
        fields: &["origin", "dest", "time"],
    },
    // /C3 YSSY.YMML
    Format {
        name: "c3_route",
        pattern: r"/C3\s+(?P<origin>{ICAO})\s*\.(?P<dest>{ICAO})",
        fields: &["origin", "dest"],
    },
];

/// A decoded ETA/timing message.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EtaReport {
    pub message_id: i64,
    pub timestamp: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tail: String,
    /// Matched layout family: "ET", "IR", "B6", "OS", or "C3".
    pub message_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,
    /// Report time as HHMMSS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_time: Option<String>,
    /// Estimated arrival as HHMM.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
    /// Report mode, e.g. "AUTO".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runway: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate: Option<String>,
    /// Normalized flight number (leading zeros stripped).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flight: Option<String>,
}

/// Decoder for 5Z timing messages.
pub struct EtaParser {
    compiler: Compiler,
}

impl EtaParser {
    /// Compile every format eagerly so a broken pattern is a startup error
    /// rather than a silently dead format.
    pub fn new() -> Result<Self, PatternError> {
        let compiler = Compiler::new(FORMATS, &[]);
        compiler.compile()?;
        Ok(EtaParser { compiler })
    }

    fn decode(&self, msg: &Message) -> Option<EtaReport> {
        let text = msg.text.trim();
        if text.is_empty() {
            return None;
        }

        let m = self.compiler.parse(text)?;
        let mut report = EtaReport {
            message_id: msg.id,
            timestamp: msg.timestamp.clone(),
            tail: msg.tail.clone(),
            ..Default::default()
        };

        let opt = |name: &str| {
            let v = m.capture(name);
            (!v.is_empty()).then(|| v.to_string())
        };

        match m.format_name.as_str() {
            "et_exp_time" => {
                report.message_type = "ET".to_string();
                report.origin = opt("origin");
                report.destination = opt("dest");
                report.report_time = opt("time");
                report.eta = opt("eta");
                report.mode = opt("mode");
                report.day_of_month = m.capture("day").parse().ok();
            }
            "ir_format" => {
                report.message_type = "IR".to_string();
                report.flight = opt("flight").map(|f| normalise_flight_number(&f));
                report.eta = opt("eta");
            }
            "b6_ldg_data" => {
                report.message_type = "B6".to_string();
                report.destination = opt("dest");
                report.eta = opt("eta");
                report.runway = opt("runway");
                report.gate = opt("gate");
            }
            "os_format" => {
                report.message_type = "OS".to_string();
                report.origin = opt("origin");
                report.destination = opt("dest");
                report.report_time = opt("time");
            }
            "c3_route" => {
                report.message_type = "C3".to_string();
                report.origin = opt("origin");
                report.destination = opt("dest");
            }
            _ => return None,
        }

        Some(report)
    }
}

impl Parser for EtaParser {
    fn name(&self) -> &'static str {
        "eta"
    }

    fn labels(&self) -> &'static [&'static str] {
        &["5Z"]
    }

    fn quick_check(&self, text: &str) -> bool {
        text.contains("/ET ")
            || text.contains("/IR ")
            || text.contains("/B6 ")
            || text.contains("/OS ")
            || text.contains("/C3 ")
    }

    fn parse(&self, msg: &Message) -> Option<Decoded> {
        self.decode(msg).map(Decoded::Eta)
    }

    fn parse_with_trace(&self, msg: &Message) -> ParserTrace {
        let passed = self.quick_check(&msg.text);
        let mut trace = ParserTrace {
            parser: self.name().to_string(),
            quick_check: QuickCheckTrace {
                passed,
                reason: (!passed)
                    .then(|| "no /ET, /IR, /B6, /OS, or /C3 prefix found".to_string()),
            },
            formats: Vec::new(),
            matched: None,
        };
        if !passed {
            return trace;
        }

        let ptrace = self.compiler.parse_with_trace(msg.text.trim());
        trace.formats = ptrace.formats;
        trace.matched = self.parse(msg);
        trace
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
