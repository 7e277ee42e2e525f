//! Regex patterns shared by the value normalizers.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Three 2-4 digit groups: 15.01.2024, 2024-01-15, 01/15/24
    pub static ref NUMERIC_DATE: Regex = Regex::new(
        r"\b(\d{2,4})[./\-\s](\d{2,4})[./\-\s](\d{2,4})\b"
    ).unwrap();

    // Day, month name, year: "15 January 2024", "3. Mai 24", "15-sty-2024"
    pub static ref NAMED_MONTH_DATE: Regex = Regex::new(
        r"\b(\d{1,2})\.?[\s\-/]*(\p{L}+)\.?[\s\-/,]*(\d{4}|\d{2})\b"
    ).unwrap();

    // Optional sign followed by digits and separators
    pub static ref NUMBER_BODY: Regex = Regex::new(
        r"(-)?\s*(\d[\d.,\s\u{00a0}']*)"
    ).unwrap();
}
