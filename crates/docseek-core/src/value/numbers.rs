//! Number normalization with locale-aware separators.

use std::str::FromStr;

use rust_decimal::Decimal;

use super::patterns::NUMBER_BODY;
use super::ExtractedValue;

/// Normalize a matched number to a plain decimal using `decimal_separator`.
///
/// Grouping characters are dropped. When both `.` and `,` occur, the last
/// one is the decimal separator. A separator that repeats is a thousands
/// separator. A single separator is decimal when it equals the locale's,
/// otherwise it groups thousands only if exactly three digits follow it.
pub fn normalize_number(raw: &str, decimal_separator: char) -> ExtractedValue {
    match parse_number(raw, decimal_separator) {
        Some(value) => {
            let mut text = value.to_string();
            if decimal_separator != '.' {
                text = text.replace('.', &decimal_separator.to_string());
            }
            ExtractedValue::Valid(text)
        }
        None => ExtractedValue::Invalid(format!("Not a number: {}", raw.trim())),
    }
}

/// Parse a matched number into a decimal.
pub fn parse_number(raw: &str, decimal_separator: char) -> Option<Decimal> {
    let caps = NUMBER_BODY.captures(raw)?;
    let negative = caps.get(1).is_some();
    let body: String = caps[2]
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let body = body.trim_end_matches(['.', ',']);

    let decimal = decimal_position(body, decimal_separator);
    let mut normalized = String::with_capacity(body.len() + 1);
    if negative {
        normalized.push('-');
    }
    for (i, c) in body.char_indices() {
        match c {
            '.' | ',' if Some(i) == decimal => normalized.push('.'),
            '.' | ',' => {}
            digit => normalized.push(digit),
        }
    }

    Decimal::from_str(&normalized).ok()
}

fn decimal_position(body: &str, decimal_separator: char) -> Option<usize> {
    let last_dot = body.rfind('.');
    let last_comma = body.rfind(',');

    let (position, separator) = match (last_dot, last_comma) {
        (None, None) => return None,
        (Some(d), Some(c)) => return Some(d.max(c)),
        (Some(d), None) => (d, '.'),
        (None, Some(c)) => (c, ','),
    };

    if body.matches(separator).count() > 1 {
        return None;
    }
    if separator == decimal_separator {
        return Some(position);
    }
    let trailing = body.len() - position - 1;
    (trailing != 3).then_some(position)
}
