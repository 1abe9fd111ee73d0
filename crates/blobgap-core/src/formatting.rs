/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use blobgap_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let negative = value < 0.0;
    let abs_value = value.abs();

    // Half-ULP nudge so exact decimal midpoints round up.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();

    let grouped = group_thousands(&integer_part.to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        // `frac_str` is "0.xx"; keep ".xx".
        format!("{}{}", grouped, &frac_str[1..])
    };

    if negative && result.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format a gap in seconds as a compact duration.
///
/// * `< 60` seconds → `"45s"`
/// * `< 1` hour → `"12m 5s"` (seconds omitted when zero)
/// * `< 1` day → `"3h 45m"`
/// * otherwise → `"2d 4h"`
///
/// # Examples
///
/// ```
/// use blobgap_core::formatting::format_gap;
///
/// assert_eq!(format_gap(45.0), "45s");
/// assert_eq!(format_gap(725.0), "12m 5s");
/// assert_eq!(format_gap(13_500.0), "3h 45m");
/// assert_eq!(format_gap(187_200.0), "2d 4h");
/// ```
pub fn format_gap(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    if total < 60 {
        return format!("{}s", total);
    }
    if total < 3_600 {
        let (m, s) = (total / 60, total % 60);
        return if s == 0 {
            format!("{}m", m)
        } else {
            format!("{}m {}s", m, s)
        };
    }
    if total < 86_400 {
        let (h, m) = (total / 3_600, (total % 3_600) / 60);
        return if m == 0 {
            format!("{}h", h)
        } else {
            format!("{}h {}m", h, m)
        };
    }
    let (d, h) = (total / 86_400, (total % 86_400) / 3_600);
    if h == 0 {
        format!("{}d", d)
    } else {
        format!("{}d {}h", d, h)
    }
}

/// `"<seconds> s (<hours> h)"` as used throughout the report.
pub fn seconds_with_hours(seconds: f64) -> String {
    format!(
        "{} s ({:.2} h)",
        format_number(seconds, 0),
        seconds / 3600.0
    )
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── format_number ────────────────────────────────────────────────────────

    #[test]
    fn test_format_number_zero() {
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_number(0.0, 2), "0.00");
    }

    #[test]
    fn test_format_number_with_thousands() {
        assert_eq!(format_number(1_234.5, 1), "1,234.5");
        assert_eq!(format_number(1_000.0, 0), "1,000");
    }

    #[test]
    fn test_format_number_negative() {
        assert_eq!(format_number(-9_876.5, 1), "-9,876.5");
    }

    #[test]
    fn test_format_number_negative_rounding_to_zero() {
        assert_eq!(format_number(-0.001, 0), "0");
    }

    #[test]
    fn test_format_number_rounds_up() {
        assert_eq!(format_number(1.005, 2), "1.01");
    }

    #[test]
    fn test_format_number_infinite() {
        assert_eq!(format_number(f64::INFINITY, 2), "inf");
    }

    // ── format_gap ───────────────────────────────────────────────────────────

    #[test]
    fn test_format_gap_seconds() {
        assert_eq!(format_gap(0.0), "0s");
        assert_eq!(format_gap(59.4), "59s");
    }

    #[test]
    fn test_format_gap_minutes() {
        assert_eq!(format_gap(60.0), "1m");
        assert_eq!(format_gap(540.0), "9m");
        assert_eq!(format_gap(61.0), "1m 1s");
    }

    #[test]
    fn test_format_gap_hours() {
        assert_eq!(format_gap(3_600.0), "1h");
        assert_eq!(format_gap(5_400.0), "1h 30m");
    }

    #[test]
    fn test_format_gap_days() {
        assert_eq!(format_gap(86_400.0), "1d");
        assert_eq!(format_gap(90_000.0), "1d 1h");
    }

    #[test]
    fn test_format_gap_negative_clamps() {
        assert_eq!(format_gap(-5.0), "0s");
    }

    // ── seconds_with_hours ───────────────────────────────────────────────────

    #[test]
    fn test_seconds_with_hours() {
        assert_eq!(seconds_with_hours(5_400.0), "5,400 s (1.50 h)");
    }
}
