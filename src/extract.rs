//! Field normalizers shared by the text decoders.

/// Normalize a flight number by stripping leading zeros from its numeric
/// part: "QF008" becomes "QF8", "UAL0042" becomes "UAL42". An all-zero
/// numeric part keeps a single "0". Input with no digits passes through
/// unchanged.
pub fn normalise_flight_number(flight: &str) -> String {
    let flight = flight.trim();
    let Some(digit_idx) = flight.find(|c: char| c.is_ascii_digit()) else {
        return flight.to_string();
    };

    let (prefix, numeric) = flight.split_at(digit_idx);
    let stripped = numeric.trim_start_matches('0');
    if stripped.is_empty() {
        format!("{prefix}0")
    } else {
        format!("{prefix}{stripped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_flight_number() {
        let cases = [
            ("QF001", "QF1"),
            ("QF008", "QF8"),
            ("QFA001", "QFA1"),
            ("UAL0042", "UAL42"),
            ("QF1", "QF1"),
            ("QF0", "QF0"),
            ("QF000", "QF0"),
            ("AAL", "AAL"),
            ("", ""),
            ("  QF001  ", "QF1"),
            ("ABCD1234", "ABCD1234"),
        ];
        for (input, want) in cases {
            assert_eq!(normalise_flight_number(input), want, "input {input:?}");
        }
    }
}
