//! Duration strings like `500ms`, `2s` or `1m30s`
//!
//! Accepts one or more `<number><unit>` terms where the number may carry a
//! fraction. Units: `ns`, `us`/`µs`/`μs`, `ms`, `s`, `m`, `h`. A bare `0` is
//! accepted. Input is trimmed and matched case-insensitively.

use std::time::Duration;

const NANOS_PER_UNIT: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("us", 1e3),
    ("µs", 1e3),
    ("μs", 1e3),
    ("ms", 1e6),
    ("s", 1e9),
    ("m", 60e9),
    ("h", 3600e9),
];

/// Parse a duration string, returning `None` if it is malformed
pub fn parse(input: &str) -> Option<Duration> {
    // Case-insensitive on purpose: `1M` is one minute and `2S` two seconds,
    // where Go's time.ParseDuration would reject both. There is no month unit
    // to clash with.
    let raw = input.trim().to_lowercase();
    if raw.is_empty() {
        return None;
    }
    if raw == "0" {
        return Some(Duration::ZERO);
    }

    let mut rest = raw.as_str();
    let mut total_nanos = 0f64;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, after) = rest.split_at(number_len);
        if number.is_empty() || number == "." || number.matches('.').count() > 1 {
            return None;
        }
        let value: f64 = number.parse().ok()?;

        let unit_len = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let (unit, remaining) = after.split_at(unit_len);
        let scale = NANOS_PER_UNIT.iter().find(|(name, _)| *name == unit).map(|(_, scale)| *scale)?;

        total_nanos += value * scale;
        rest = remaining;
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return None;
    }
    Some(Duration::from_nanos(total_nanos.round() as u64))
}

/// Render a duration in the largest unit that represents it exactly
pub fn format(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    let units: [(&str, u128); 5] = [
        ("h", 3_600_000_000_000),
        ("m", 60_000_000_000),
        ("s", 1_000_000_000),
        ("ms", 1_000_000),
        ("us", 1_000),
    ];
    for (unit, scale) in units {
        if nanos % scale == 0 {
            return format!("{}{}", nanos / scale, unit);
        }
    }
    format!("{}ns", nanos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_units() {
        assert_eq!(parse("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse("2s"), Some(Duration::from_secs(2)));
        assert_eq!(parse("3m"), Some(Duration::from_secs(180)));
        assert_eq!(parse("1h"), Some(Duration::from_secs(3600)));
        assert_eq!(parse("250us"), Some(Duration::from_micros(250)));
        assert_eq!(parse("250µs"), Some(Duration::from_micros(250)));
        assert_eq!(parse("10ns"), Some(Duration::from_nanos(10)));
    }

    #[test]
    fn test_parse_compound_and_fractional() {
        assert_eq!(parse("1m30s"), Some(Duration::from_secs(90)));
        assert_eq!(parse("1h2m3s"), Some(Duration::from_secs(3723)));
        assert_eq!(parse("1.5s"), Some(Duration::from_millis(1500)));
        assert_eq!(parse(".5s"), Some(Duration::from_millis(500)));
        assert_eq!(parse("2.25ms"), Some(Duration::from_micros(2250)));
    }

    #[test]
    fn test_parse_trims_and_ignores_case() {
        assert_eq!(parse("  10MS "), Some(Duration::from_millis(10)));
        assert_eq!(parse("2S"), Some(Duration::from_secs(2)));
        // Uppercase M is minutes, not months
        assert_eq!(parse("1M"), Some(Duration::from_secs(60)));
        assert_eq!(parse("1H30M"), Some(Duration::from_secs(5400)));
    }

    #[test]
    fn test_parse_zero() {
        assert_eq!(parse("0"), Some(Duration::ZERO));
        assert_eq!(parse("0s"), Some(Duration::ZERO));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["", "   ", "notaduration", "10", "ms", "5 s", "1..5s", ".s", "-1s", "+1s", "1d", "10sms"] {
            assert_eq!(parse(input), None, "{:?} should not parse", input);
        }
    }

    #[test]
    fn test_format() {
        assert_eq!(format(Duration::ZERO), "0s");
        assert_eq!(format(Duration::from_secs(1)), "1s");
        assert_eq!(format(Duration::from_secs(120)), "2m");
        assert_eq!(format(Duration::from_secs(7200)), "2h");
        assert_eq!(format(Duration::from_millis(1500)), "1500ms");
        assert_eq!(format(Duration::from_micros(10)), "10us");
        assert_eq!(format(Duration::from_nanos(7)), "7ns");
    }

    #[test]
    fn test_format_parses_back() {
        for d in [Duration::from_millis(10), Duration::from_secs(90), Duration::from_nanos(123)] {
            assert_eq!(parse(&format(d)), Some(d));
        }
    }
}
