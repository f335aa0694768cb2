//! Grok-style pattern compiler shared by the text decoders.
//!
//! Decoders declare message formats using `{PLACEHOLDER}` references into a
//! shared fragment library instead of ad hoc raw regex, then match and
//! capture against them uniformly. Expansion is a single non-recursive
//! substitution pass; fragments must not reference other fragments.
//!
//! Compilation runs at most once per [`Compiler`] instance and is cached —
//! including failures, which are returned to every caller rather than
//! retried. A format that fails to compile (unknown fragment or invalid
//! regex) fails closed: it can never match, but its siblings still compile.

use std::collections::HashMap;
use std::sync::{LazyLock, OnceLock};

use regex::Regex;
use thiserror::Error;

/// Errors from format compilation. Per-message matching never errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("format {format}: unknown fragment {fragment}")]
    UnknownFragment { format: String, fragment: String },
    #[error("format {format}: invalid regex: {reason}")]
    InvalidRegex { format: String, reason: String },
}

// ---------------------------------------------------------------------------
// Base fragment library
// ---------------------------------------------------------------------------

/// Reusable regex fragments referenced from format patterns as `{NAME}`.
/// All fragments assume upper-cased input (see [`Compiler::parse`]).
pub const BASE_FRAGMENTS: &[(&str, &str)] = &[
    // Airport codes.
    ("ICAO", r"[KYEPCZLRVOSWUABDFGHMNT][A-Z]{3}"),
    ("IATA", r"[A-Z]{3}"),
    // Flight identifiers: 2-3 letter ICAO code + 1-4 digits + 0-2 letter
    // suffix. e.g. JST501, DAL1260, FIN5LA, QTR58U.
    ("FLIGHT", r"[A-Z]{2,3}\d{1,4}[A-Z]{0,2}"),
    // Time formats.
    ("TIME4", r"\d{4}"),                     // HHMM
    ("TIME6", r"\d{6}"),                     // HHMMSS
    ("TIMEZ", r"\d{4}Z"),                    // HHMM with Z suffix
    ("DATE6", r"\d{6}"),                     // DDMMYY or YYMMDD
    ("DAYHH", r"\d{2}[A-Z]{3}\s+\d{4}Z"),    // 29DEC 1827Z
    // Coordinates - latitude formats.
    ("LAT_DIR", r"[NS]"),
    ("LAT_2D", r"\d{2}"),                    // DD (degrees only)
    ("LAT_4D", r"\d{4}"),                    // DDMM
    ("LAT_5D", r"\d{5}"),                    // DDMMD (tenths of minutes)
    ("LAT_6D", r"\d{6}"),                    // DDMMSS
    ("LAT_DM", r"\d{4}\.\d"),                // DDMM.D
    ("LAT_DMS", r"\d{6}"),                   // DDMMSS
    ("LAT_DEC", r"[-\d.]+"),                 // Decimal latitude
    // Coordinates - longitude formats.
    ("LON_DIR", r"[EW]"),
    ("LON_3D", r"\d{3}"),                    // DDD (degrees only)
    ("LON_5D", r"\d{5}"),                    // DDDMM
    ("LON_6D", r"\d{6}"),                    // DDDMMD (tenths of minutes)
    ("LON_7D", r"\d{7}"),                    // DDDMMSS
    ("LON_DM", r"\d{5}\.\d"),                // DDDMM.D
    ("LON_DMS", r"\d{6,7}"),                 // DDMMSS or DDDMMSS
    ("LON_DEC", r"[-\d.]+"),                 // Decimal longitude
    // Altitude and flight level.
    ("FL", r"\d{2,3}"),
    ("ALT", r"\d{3,6}"),
    ("ALTITUDE", r"\d{3,5}"),
    // Navigation.
    ("HEADING", r"\d{3}"),
    ("SPEED", r"\d{2,4}"),
    ("MACH", r"\d{2,3}"),
    ("WAYPOINT", r"[A-Z][A-Z0-9]{1,5}"),
    // Weather.
    ("TEMP_SIGN", r"[MP]"),
    ("TEMP", r"\d{1,3}"),
    ("WIND_DIR", r"\d{3}"),
    ("WIND_SPD", r"\d{2,3}"),
    // Clearance data.
    ("SQUAWK", r"[0-7]{4}"),
    ("RUNWAY", r"\d{1,2}[LRC]?"),
    ("FREQ", r"\d{3}\.\d{1,3}"),
    // Aircraft types: letter + 2-3 digits + optional letter (A320, B738, A21N).
    ("AIRCRAFT", r"[A-Z]\d{2,3}[A-Z]?"),
    // SID/STAR names: letters followed by a digit and optional alphanumerics.
    ("SID", r"[A-Z]{2,}[0-9][A-Z0-9]*"),
    // Misc.
    ("ATIS", r"[A-Z]"),
    ("PDCNUM", r"\d{1,6}"),
    ("CALLSIGN", r"[A-Z0-9]{3,8}"),
    ("TAIL", r"[A-Z0-9-]{4,8}"),
];

/// Matches any `{NAME}` placeholder left over after expansion.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[A-Z][A-Z0-9_]*\}").unwrap());

// ---------------------------------------------------------------------------
// Formats and matches
// ---------------------------------------------------------------------------

/// A message format with named capture groups. Static, author-supplied data.
#[derive(Debug, Clone, Copy)]
pub struct Format {
    /// Format name for identification.
    pub name: &'static str,
    /// Pattern with `{PLACEHOLDER}` syntax.
    pub pattern: &'static str,
    /// Field names in capture order (for documentation).
    pub fields: &'static [&'static str],
}

/// A successful pattern match with extracted fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Name of the matched format.
    pub format_name: String,
    /// Named capture group values. Groups that did not participate in the
    /// match are present with an empty value.
    pub captures: HashMap<String, String>,
}

impl Match {
    /// Capture value by group name; empty string if absent.
    pub fn capture(&self, name: &str) -> &str {
        self.captures.get(name).map(String::as_str).unwrap_or("")
    }

    /// Capture value with a default for missing or empty groups.
    pub fn capture_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        match self.captures.get(name) {
            Some(v) if !v.is_empty() => v,
            _ => default,
        }
    }
}

/// Debug record of one format's match attempt.
#[derive(Debug, Clone)]
pub struct FormatTrace {
    pub name: String,
    pub matched: bool,
    /// The expanded regex pattern (as compiled, or as it failed to compile).
    pub pattern: String,
    pub captures: HashMap<String, String>,
}

/// Complete trace of a parse attempt across every format.
#[derive(Debug, Clone, Default)]
pub struct ParseTrace {
    pub formats: Vec<FormatTrace>,
    /// The first successful match, if any.
    pub matched: Option<Match>,
}

// ---------------------------------------------------------------------------
// Compiler
// ---------------------------------------------------------------------------

struct CompiledFormat {
    name: &'static str,
    expanded: String,
    /// None if this format failed to compile — it then never matches.
    regex: Option<Regex>,
    error: Option<PatternError>,
}

/// Compiles a list of formats against the fragment library and matches text
/// against them. Compilation happens once, on first use, and the outcome
/// (success or failure) is cached for the lifetime of the instance.
pub struct Compiler {
    fragments: HashMap<&'static str, &'static str>,
    formats: Vec<Format>,
    compiled: OnceLock<Vec<CompiledFormat>>,
}

impl Compiler {
    /// Build a compiler from formats plus optional local fragment overrides
    /// that shadow [`BASE_FRAGMENTS`] for this instance only.
    pub fn new(formats: &[Format], local_fragments: &[(&'static str, &'static str)]) -> Self {
        let mut fragments: HashMap<&'static str, &'static str> =
            BASE_FRAGMENTS.iter().copied().collect();
        for &(name, pattern) in local_fragments {
            fragments.insert(name, pattern);
        }
        Compiler {
            fragments,
            formats: formats.to_vec(),
            compiled: OnceLock::new(),
        }
    }

    /// Expand `{PLACEHOLDER}` references and compile every format's regex.
    ///
    /// Returns the first compilation failure, if any. Formats that compiled
    /// remain usable regardless; failed formats never match.
    pub fn compile(&self) -> Result<(), PatternError> {
        for cf in self.compiled() {
            if let Some(err) = &cf.error {
                return Err(err.clone());
            }
        }
        Ok(())
    }

    /// Compilation errors for every format that failed, in declaration order.
    pub fn compile_errors(&self) -> Vec<PatternError> {
        self.compiled()
            .iter()
            .filter_map(|cf| cf.error.clone())
            .collect()
    }

    fn compiled(&self) -> &[CompiledFormat] {
        self.compiled.get_or_init(|| {
            self.formats
                .iter()
                .map(|format| {
                    let expanded = self.expand(format.pattern);
                    match self.check_placeholders(format.name, &expanded) {
                        Err(err) => CompiledFormat {
                            name: format.name,
                            expanded,
                            regex: None,
                            error: Some(err),
                        },
                        Ok(()) => match Regex::new(&expanded) {
                            Ok(re) => CompiledFormat {
                                name: format.name,
                                expanded,
                                regex: Some(re),
                                error: None,
                            },
                            Err(e) => CompiledFormat {
                                name: format.name,
                                expanded,
                                regex: None,
                                error: Some(PatternError::InvalidRegex {
                                    format: format.name.to_string(),
                                    reason: e.to_string(),
                                }),
                            },
                        },
                    }
                })
                .collect()
        })
    }

    /// Replace every `{NAME}` with its fragment. Single pass, non-recursive.
    fn expand(&self, pattern: &str) -> String {
        let mut result = pattern.to_string();
        for (&name, &fragment) in &self.fragments {
            let placeholder = format!("{{{name}}}");
            if result.contains(&placeholder) {
                result = result.replace(&placeholder, fragment);
            }
        }
        result
    }

    /// A `{NAME}` surviving expansion means an unknown fragment: the format
    /// must fail closed rather than compile into a literal-brace regex.
    fn check_placeholders(&self, format: &str, expanded: &str) -> Result<(), PatternError> {
        if let Some(m) = PLACEHOLDER.find(expanded) {
            return Err(PatternError::UnknownFragment {
                format: format.to_string(),
                fragment: m.as_str().to_string(),
            });
        }
        Ok(())
    }

    /// Parse text against all formats in declaration order, returning the
    /// first match. Input is upper-cased first: every fragment assumes
    /// upper-case matching.
    pub fn parse(&self, text: &str) -> Option<Match> {
        let upper = text.to_uppercase();
        for cf in self.compiled() {
            let Some(re) = &cf.regex else { continue };
            if let Some(caps) = re.captures(&upper) {
                return Some(Match {
                    format_name: cf.name.to_string(),
                    captures: capture_map(re, &caps),
                });
            }
        }
        None
    }

    /// Parse text against all formats, returning every format that matches.
    /// Used when complementary fields are extracted by independent sibling
    /// formats over the same text.
    pub fn parse_all(&self, text: &str) -> Vec<Match> {
        let upper = text.to_uppercase();
        let mut results = Vec::new();
        for cf in self.compiled() {
            let Some(re) = &cf.regex else { continue };
            if let Some(caps) = re.captures(&upper) {
                results.push(Match {
                    format_name: cf.name.to_string(),
                    captures: capture_map(re, &caps),
                });
            }
        }
        results
    }

    /// Find every non-overlapping occurrence of one named format in text.
    /// Used for repeatable sub-elements (wind layers, oceanic fixes).
    pub fn find_all_matches(&self, text: &str, format_name: &str) -> Vec<HashMap<String, String>> {
        let upper = text.to_uppercase();
        let mut results = Vec::new();
        for cf in self.compiled() {
            if cf.name != format_name {
                continue;
            }
            if let Some(re) = &cf.regex {
                for caps in re.captures_iter(&upper) {
                    results.push(capture_map(re, &caps));
                }
            }
            break;
        }
        results
    }

    /// Evaluate every format (no short-circuit) and record the outcome of
    /// each. Debugging only — never consulted by `parse`.
    pub fn parse_with_trace(&self, text: &str) -> ParseTrace {
        let upper = text.to_uppercase();
        let mut trace = ParseTrace::default();

        for cf in self.compiled() {
            let mut ft = FormatTrace {
                name: cf.name.to_string(),
                matched: false,
                pattern: cf.expanded.clone(),
                captures: HashMap::new(),
            };

            if let Some(re) = &cf.regex {
                if let Some(caps) = re.captures(&upper) {
                    ft.matched = true;
                    ft.captures = capture_map(re, &caps);
                    if trace.matched.is_none() {
                        trace.matched = Some(Match {
                            format_name: cf.name.to_string(),
                            captures: ft.captures.clone(),
                        });
                    }
                }
            }

            trace.formats.push(ft);
        }

        trace
    }
}

/// Extract every named group into a fresh map. Non-participating groups
/// appear with an empty value.
fn capture_map(re: &Regex, caps: &regex::Captures) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for name in re.capture_names().flatten() {
        let value = caps.name(name).map(|m| m.as_str()).unwrap_or("");
        map.insert(name.to_string(), value.to_string());
    }
    map
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTE_FORMATS: &[Format] = &[
        Format {
            name: "route",
            pattern: r"(?P<origin>{ICAO})\s*-\s*(?P<dest>{ICAO})",
            fields: &["origin", "dest"],
        },
        Format {
            name: "altitude",
            pattern: r"FL(?P<fl>{FL})",
            fields: &["fl"],
        },
    ];

    #[test]
    fn test_all_base_fragments_compile() {
        for &(name, fragment) in BASE_FRAGMENTS {
            assert!(
                Regex::new(fragment).is_ok(),
                "base fragment {name} should be a valid regex"
            );
        }
    }

    #[test]
    fn test_compile_and_parse() {
        let compiler = Compiler::new(ROUTE_FORMATS, &[]);
        compiler.compile().unwrap();

        let m = compiler.parse("CLRD YSSY-YMML FL350").unwrap();
        assert_eq!(m.format_name, "route");
        assert_eq!(m.capture("origin"), "YSSY");
        assert_eq!(m.capture("dest"), "YMML");
    }

    #[test]
    fn test_parse_uppercases_input() {
        let compiler = Compiler::new(ROUTE_FORMATS, &[]);
        let m = compiler.parse("clrd yssy-ymml").unwrap();
        assert_eq!(m.capture("origin"), "YSSY");
    }

    #[test]
    fn test_parse_first_format_wins() {
        // Both formats match; declaration order decides.
        let compiler = Compiler::new(ROUTE_FORMATS, &[]);
        let m = compiler.parse("YSSY-YMML FL350").unwrap();
        assert_eq!(m.format_name, "route");
    }

    #[test]
    fn test_parse_all_returns_every_match() {
        let compiler = Compiler::new(ROUTE_FORMATS, &[]);
        let matches = compiler.parse_all("YSSY-YMML FL350");
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].format_name, "route");
        assert_eq!(matches[1].format_name, "altitude");
        assert_eq!(matches[1].capture("fl"), "350");
    }

    #[test]
    fn test_find_all_matches() {
        const FIX_FORMATS: &[Format] = &[Format {
            name: "fix",
            pattern: r"(?P<lat>{LAT_2D})(?P<lat_dir>{LAT_DIR})(?P<lon>{LON_3D})(?P<lon_dir>{LON_DIR})",
            fields: &["lat", "lat_dir", "lon", "lon_dir"],
        }];
        let compiler = Compiler::new(FIX_FORMATS, &[]);
        let fixes = compiler.find_all_matches("51N040W 52N030W 52N020W", "fix");
        assert_eq!(fixes.len(), 3);
        assert_eq!(fixes[0]["lat"], "51");
        assert_eq!(fixes[2]["lon"], "020");

        assert!(compiler.find_all_matches("51N040W", "no_such_format").is_empty());
    }

    #[test]
    fn test_unknown_fragment_fails_closed() {
        const FORMATS: &[Format] = &[
            Format {
                name: "bad",
                pattern: r"(?P<x>{NO_SUCH_FRAGMENT})",
                fields: &["x"],
            },
            Format {
                name: "good",
                pattern: r"(?P<fl>{FL})",
                fields: &["fl"],
            },
        ];
        let compiler = Compiler::new(FORMATS, &[]);

        let err = compiler.compile().unwrap_err();
        assert!(matches!(err, PatternError::UnknownFragment { .. }));

        // The bad format never matches — not even as a literal.
        assert!(compiler.parse("{NO_SUCH_FRAGMENT}").is_none());

        // Sibling format still works.
        let m = compiler.parse("350").unwrap();
        assert_eq!(m.format_name, "good");
    }

    #[test]
    fn test_invalid_regex_fails_closed() {
        const FORMATS: &[Format] = &[Format {
            name: "broken",
            pattern: r"(?P<x>{FL}", // unbalanced paren
            fields: &["x"],
        }];
        let compiler = Compiler::new(FORMATS, &[]);
        let err = compiler.compile().unwrap_err();
        assert!(matches!(err, PatternError::InvalidRegex { .. }));
        assert!(compiler.parse("350").is_none());
        assert_eq!(compiler.compile_errors().len(), 1);
    }

    #[test]
    fn test_compile_failure_is_cached() {
        const FORMATS: &[Format] = &[Format {
            name: "bad",
            pattern: r"{NOPE}",
            fields: &[],
        }];
        let compiler = Compiler::new(FORMATS, &[]);
        assert!(compiler.compile().is_err());
        // Second call returns the same cached failure.
        assert!(compiler.compile().is_err());
    }

    #[test]
    fn test_local_fragment_overrides_global() {
        const FORMATS: &[Format] = &[Format {
            name: "strict_fl",
            pattern: r"FL(?P<fl>{FL})",
            fields: &["fl"],
        }];
        // Locally require exactly 3 digits.
        let compiler = Compiler::new(FORMATS, &[("FL", r"\d{3}")]);
        assert!(compiler.parse("FL35").is_none());
        assert!(compiler.parse("FL350").is_some());
    }

    #[test]
    fn test_optional_group_captured_empty() {
        const FORMATS: &[Format] = &[Format {
            name: "opt",
            pattern: r"RWY\s*(?P<rwy>{RUNWAY})(?:/GATE\s*(?P<gate>[A-Z0-9]+))?",
            fields: &["rwy", "gate"],
        }];
        let compiler = Compiler::new(FORMATS, &[]);
        let m = compiler.parse("RWY 16R").unwrap();
        assert_eq!(m.capture("rwy"), "16R");
        // Non-participating group is present but empty.
        assert_eq!(m.capture("gate"), "");
        assert_eq!(m.capture_or("gate", "-"), "-");
    }

    #[test]
    fn test_parse_with_trace_evaluates_every_format() {
        let compiler = Compiler::new(ROUTE_FORMATS, &[]);
        let trace = compiler.parse_with_trace("YSSY-YMML FL350");
        assert_eq!(trace.formats.len(), 2);
        assert!(trace.formats[0].matched);
        assert!(trace.formats[1].matched);
        assert_eq!(trace.matched.as_ref().unwrap().format_name, "route");
        // Expanded pattern is recorded, placeholders substituted.
        assert!(!trace.formats[0].pattern.contains("{ICAO}"));
    }

    #[test]
    fn test_parse_no_match() {
        let compiler = Compiler::new(ROUTE_FORMATS, &[]);
        assert!(compiler.parse("no coordinates here").is_none());
        assert!(compiler.parse("").is_none());
        assert!(compiler.parse_all("").is_empty());
    }
}
