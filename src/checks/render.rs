/// Units for [`timespan`], largest first.
const TIME_UNITS: &[(&str, f64)] = &[
    ("years", 31_536_000.0),
    ("days", 86_400.0),
    ("hours", 3_600.0),
    ("minutes", 60.0),
    ("seconds", 1.0),
    ("milliseconds", 1e-3),
    ("microseconds", 1e-6),
];

/// Render a non-negative duration the way the monitoring host does: two
/// chunks starting at the largest unit strictly below the value, each
/// truncated (`63690.0` → `17 hours 41 minutes`).
pub fn timespan(seconds: f64) -> String {
    let mut rest = seconds.abs();
    let start = TIME_UNITS
        .iter()
        .position(|(_, scale)| *scale < rest)
        .unwrap_or(TIME_UNITS.len() - 1);

    let mut chunks = Vec::with_capacity(2);
    for (unit, scale) in TIME_UNITS.iter().skip(start).take(2) {
        let value = (rest / scale).trunc();
        let name = if value == 1.0 {
            &unit[..unit.len() - 1]
        } else {
            unit
        };
        chunks.push(format!("{:.0} {}", value, name));
        rest %= scale;
    }

    let rendered = chunks.join(" ");
    if rendered == format!("0 {}", TIME_UNITS[TIME_UNITS.len() - 1].0) {
        return "0 seconds".to_string();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hours_and_minutes() {
        assert_eq!(timespan(17.0 * 3600.0 + 41.0 * 60.0 + 30.03), "17 hours 41 minutes");
    }

    #[test]
    fn test_singular_day() {
        assert_eq!(timespan(86_400.0 + 54.0 * 60.0 + 57.16), "1 day 0 hours");
    }

    #[test]
    fn test_exact_multiple_starts_at_that_unit() {
        assert_eq!(timespan(7200.0), "2 hours 0 minutes");
        assert_eq!(timespan(2.0 * 86_400.0), "2 days 0 hours");
    }

    #[test]
    fn test_exact_single_unit_drops_to_next_unit() {
        // Only units strictly smaller than the value qualify as the first chunk.
        assert_eq!(timespan(3600.0), "60 minutes 0 seconds");
    }

    #[test]
    fn test_seconds() {
        assert_eq!(timespan(42.5), "42 seconds 500 milliseconds");
    }

    #[test]
    fn test_zero() {
        assert_eq!(timespan(0.0), "0 seconds");
    }

    #[test]
    fn test_sign_is_ignored() {
        assert_eq!(timespan(-7200.0), "2 hours 0 minutes");
    }
}
