//! Parser registration and label-based dispatch.
//!
//! Decoders implement [`Parser`] and are registered once at startup through
//! [`RegistryBuilder`]. The frozen [`Registry`] then routes each message to
//! the candidate parsers for its ACARS label, cheapest check first: label
//! lookup, then [`Parser::quick_check`], then the full parse. The first
//! parser to return a result wins.

use std::collections::HashMap;

use crate::message::Message;
use crate::pattern::FormatTrace;
use crate::types::{AcarsError, Decoded, Result};

// ---------------------------------------------------------------------------
// Parser trait
// ---------------------------------------------------------------------------

/// A message decoder. Implementations hold no per-message state and are
/// shared across threads.
pub trait Parser: Send + Sync {
    /// Unique parser name, also used as the decoder discriminant in traces.
    fn name(&self) -> &'static str;

    /// ACARS labels this parser handles. Empty means every label (the
    /// parser is consulted for all messages).
    fn labels(&self) -> &'static [&'static str];

    /// Dispatch order among candidates for the same label. Lower runs
    /// first. Ties run in registration order.
    fn priority(&self) -> i32 {
        100
    }

    /// Cheap pre-filter, typically a substring test. Must be fast and must
    /// never reject a message `parse` would accept.
    fn quick_check(&self, text: &str) -> bool;

    /// Full decode. `None` means "not mine" or "malformed"; per-message
    /// failures are never errors.
    fn parse(&self, msg: &Message) -> Option<Decoded>;

    /// Instrumented decode for the trace path. The default wraps `parse`
    /// with no format detail; pattern-based parsers override this.
    fn parse_with_trace(&self, msg: &Message) -> ParserTrace {
        let passed = self.quick_check(&msg.text);
        let mut trace = ParserTrace {
            parser: self.name().to_string(),
            quick_check: QuickCheckTrace {
                passed,
                reason: None,
            },
            formats: Vec::new(),
            matched: None,
        };
        if passed {
            trace.matched = self.parse(msg);
        }
        trace
    }
}

// ---------------------------------------------------------------------------
// Trace types
// ---------------------------------------------------------------------------

/// Outcome of a parser's quick check during a traced dispatch.
#[derive(Debug, Clone)]
pub struct QuickCheckTrace {
    pub passed: bool,
    /// Human-readable rejection reason, if the parser provides one.
    pub reason: Option<String>,
}

/// One parser's full attempt at a message during a traced dispatch.
#[derive(Debug, Clone)]
pub struct ParserTrace {
    pub parser: String,
    pub quick_check: QuickCheckTrace,
    /// Per-format match attempts for pattern-based parsers.
    pub formats: Vec<FormatTrace>,
    pub matched: Option<Decoded>,
}

/// A complete traced dispatch: every candidate parser is run to completion
/// with no short-circuit, so a mis-routing is visible in one record.
#[derive(Debug, Clone, Default)]
pub struct DispatchTrace {
    pub candidates: Vec<ParserTrace>,
    /// Name of the parser whose result `dispatch` would have returned.
    pub matched_parser: Option<String>,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Accumulates parsers before the registry is frozen.
#[derive(Default)]
pub struct RegistryBuilder {
    parsers: Vec<Box<dyn Parser>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P: Parser + 'static>(mut self, parser: P) -> Self {
        self.parsers.push(Box::new(parser));
        self
    }

    /// Freeze into a [`Registry`]. Fails on duplicate parser names.
    pub fn build(self) -> Result<Registry> {
        let mut seen: HashMap<&'static str, ()> = HashMap::new();
        for p in &self.parsers {
            if seen.insert(p.name(), ()).is_some() {
                return Err(AcarsError::DuplicateParser(p.name().to_string()));
            }
        }

        // Indices of wildcard parsers (empty label list) join every
        // label's candidate list and form the fallback for unknown labels.
        let mut wildcard: Vec<usize> = Vec::new();
        let mut by_label: HashMap<&'static str, Vec<usize>> = HashMap::new();
        for (i, p) in self.parsers.iter().enumerate() {
            if p.labels().is_empty() {
                wildcard.push(i);
            } else {
                for &label in p.labels() {
                    by_label.entry(label).or_default().push(i);
                }
            }
        }
        for indices in by_label.values_mut() {
            indices.extend_from_slice(&wildcard);
        }

        let parsers = self.parsers;
        let sort_key = |&i: &usize| (parsers[i].priority(), i);
        for indices in by_label.values_mut() {
            indices.sort_by_key(sort_key);
        }
        wildcard.sort_by_key(sort_key);

        Ok(Registry {
            parsers,
            by_label,
            wildcard,
        })
    }
}

/// Immutable parser registry. Build once, share everywhere.
pub struct Registry {
    parsers: Vec<Box<dyn Parser>>,
    by_label: HashMap<&'static str, Vec<usize>>,
    wildcard: Vec<usize>,
}

impl Registry {
    /// Candidate parsers for a label, in dispatch order.
    fn candidates(&self, label: &str) -> &[usize] {
        self.by_label
            .get(label)
            .map(Vec::as_slice)
            .unwrap_or(&self.wildcard)
    }

    /// Number of registered parsers.
    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Registered parser names, in registration order.
    pub fn parser_names(&self) -> Vec<&'static str> {
        self.parsers.iter().map(|p| p.name()).collect()
    }

    /// Route a message to its decoders. Returns the first result, or `None`
    /// if no candidate accepts the message.
    pub fn dispatch(&self, msg: &Message) -> Option<Decoded> {
        for &i in self.candidates(&msg.label) {
            let parser = &self.parsers[i];
            if !parser.quick_check(&msg.text) {
                continue;
            }
            if let Some(decoded) = parser.parse(msg) {
                return Some(decoded);
            }
        }
        None
    }

    /// Diagnostic dispatch: run every candidate to completion and record
    /// what each did. Never used on the hot path.
    pub fn dispatch_with_trace(&self, msg: &Message) -> DispatchTrace {
        let mut trace = DispatchTrace::default();
        for &i in self.candidates(&msg.label) {
            let parser = &self.parsers[i];
            let pt = parser.parse_with_trace(msg);
            if trace.matched_parser.is_none() && pt.matched.is_some() {
                trace.matched_parser = Some(pt.parser.clone());
            }
            trace.candidates.push(pt);
        }
        trace
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
