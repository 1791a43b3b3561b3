//! Field cleanup and number parsing shared by the readers

/// Trim and collapse internal whitespace runs to single spaces
pub fn collapse_spaces(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split an optional leading sign off `text`
fn split_sign(text: &str) -> (i64, &str) {
    match text.as_bytes().first() {
        Some(b'-') => (-1, &text[1..]),
        Some(b'+') => (1, &text[1..]),
        _ => (1, text),
    }
}

/// `h:mm` as (hours, minutes); empty halves count as zero
fn split_clock(text: &str) -> Option<(i64, i64)> {
    let (hours, minutes) = text.split_once(':')?;
    let number = |part: &str| -> Option<i64> {
        if part.is_empty() {
            Some(0)
        } else if part.bytes().all(|b| b.is_ascii_digit()) {
            part.parse().ok()
        } else {
            None
        }
    };
    Some((number(hours)?, number(minutes)?))
}

/// Parse an hours field: `h:mm`, `-h:mm`, `:mm` or a decimal number
///
/// An empty field is zero hours; anything else unparsable is `None`.
///
/// ```
/// use payroll_sheets_csv::parse_hours;
///
/// assert_eq!(parse_hours("7:30"), Some(7.5));
/// assert_eq!(parse_hours("-0:15"), Some(-0.25));
/// assert_eq!(parse_hours("8.25"), Some(8.25));
/// assert_eq!(parse_hours(""), Some(0.0));
/// assert_eq!(parse_hours("n/a"), None);
/// ```
pub fn parse_hours(value: &str) -> Option<f64> {
    let text: String = value.split_whitespace().collect();
    if text.is_empty() {
        return Some(0.0);
    }
    let (sign, rest) = split_sign(&text);
    if rest.contains(':') {
        let (hours, minutes) = split_clock(rest)?;
        return Some(sign as f64 * (hours as f64 + minutes as f64 / 60.0));
    }
    rest.parse::<f64>().ok().map(|hours| sign as f64 * hours)
}

/// Parse a signed `h:mm` duration into minutes
pub fn parse_minutes(value: &str) -> Option<i64> {
    let text: String = value.split_whitespace().collect();
    if text.is_empty() {
        return None;
    }
    let (sign, rest) = split_sign(&text);
    let (hours, minutes) = split_clock(rest)?;
    Some(sign * (hours * 60 + minutes))
}

/// Format minutes as `h:mm` (`-h:mm` when negative)
pub fn format_minutes(minutes: i64) -> String {
    let sign = if minutes < 0 { "-" } else { "" };
    let total = minutes.abs();
    format!("{}{}:{:02}", sign, total / 60, total % 60)
}

/// Parse a money field, ignoring `$` and thousands separators
///
/// An empty field is zero.
pub fn parse_money(value: &str) -> Option<f64> {
    let text = collapse_spaces(value).replace(['$', ','], "");
    if text.is_empty() {
        return Some(0.0);
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_spaces() {
        assert_eq!(collapse_spaces("  Maria   Lopez "), "Maria Lopez");
        assert_eq!(collapse_spaces("\t"), "");
    }

    #[test]
    fn test_parse_hours() {
        assert_eq!(parse_hours("10:00"), Some(10.0));
        assert_eq!(parse_hours(":45"), Some(0.75));
        assert_eq!(parse_hours("3:"), Some(3.0));
        assert_eq!(parse_hours(" 1 : 30 "), Some(1.5));
        assert_eq!(parse_hours("+2"), Some(2.0));
        assert_eq!(parse_hours("-1.5"), Some(-1.5));
        assert_eq!(parse_hours("1:3x"), None);
    }

    #[test]
    fn test_minutes() {
        assert_eq!(parse_minutes("8:05"), Some(485));
        assert_eq!(parse_minutes("-0:30"), Some(-30));
        assert_eq!(parse_minutes("8.5"), None);
        assert_eq!(parse_minutes(""), None);
        assert_eq!(format_minutes(485), "8:05");
        assert_eq!(format_minutes(-30), "-0:30");
        assert_eq!(format_minutes(0), "0:00");
    }

    #[test]
    fn test_parse_money() {
        assert_eq!(parse_money("$1,234.50"), Some(1234.5));
        assert_eq!(parse_money(""), Some(0.0));
        assert_eq!(parse_money("cash"), None);
    }
}
