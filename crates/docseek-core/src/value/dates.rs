//! Date normalization: numeric dates and dates with month names.

use std::fmt::Write;

use chrono::NaiveDate;
use deunicode::deunicode;
use tracing::warn;

use super::patterns::{NAMED_MONTH_DATE, NUMERIC_DATE};
use super::{ExtractedValue, Language};
use crate::models::{DateOrder, LocaleConfig};

/// Normalize a matched date to the locale's output format.
///
/// Numeric dates are tried first, then day + month name + year.
pub fn normalize_date(raw: &str, locale: &LocaleConfig) -> ExtractedValue {
    let date = parse_numeric_date(raw, locale.date_order)
        .or_else(|| parse_named_month_date(raw, &locale.languages));

    match date {
        Some(date) => ExtractedValue::Valid(format_date(date, &locale.date_format)),
        None => ExtractedValue::Invalid(format!("Invalid date: {}", raw.trim())),
    }
}

/// Parse the first calendar-valid numeric date.
pub fn parse_numeric_date(text: &str, order: DateOrder) -> Option<NaiveDate> {
    NUMERIC_DATE.captures_iter(text).find_map(|caps| {
        let parts = [&caps[1], &caps[2], &caps[3]];
        let (year, month, day) = if parts[0].len() == 4 {
            (parts[0], parts[1], parts[2])
        } else {
            match order {
                DateOrder::DayMonthYear => (parts[2], parts[1], parts[0]),
                DateOrder::MonthDayYear => (parts[2], parts[0], parts[1]),
                DateOrder::YearMonthDay => (parts[0], parts[1], parts[2]),
            }
        };
        NaiveDate::from_ymd_opt(parse_year(year)?, month.parse().ok()?, day.parse().ok()?)
    })
}

/// Parse the first calendar-valid date written with a month name.
pub fn parse_named_month_date(text: &str, languages: &[Language]) -> Option<NaiveDate> {
    NAMED_MONTH_DATE.captures_iter(text).find_map(|caps| {
        let month = month_number(&caps[2], languages)?;
        NaiveDate::from_ymd_opt(parse_year(&caps[3])?, month, caps[1].parse().ok()?)
    })
}

/// Look up a month name or abbreviation in the given languages.
pub fn month_number(name: &str, languages: &[Language]) -> Option<u32> {
    let key = fold(name);
    languages.iter().find_map(|language| {
        month_names(*language)
            .iter()
            .find(|(candidate, _)| fold(candidate) == key)
            .map(|(_, month)| *month)
    })
}

fn fold(name: &str) -> String {
    deunicode(name.trim().trim_end_matches('.')).to_lowercase()
}

// Two-digit years: 00-50 are 2000s, 51-99 are 1900s.
fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    Some(match (s.len(), year) {
        (1..=2, 0..=50) => 2000 + year,
        (1..=2, _) => 1900 + year,
        _ => year,
    })
}

fn format_date(date: NaiveDate, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(format)).is_err() {
        warn!("Invalid date format {:?}, using ISO 8601", format);
        return date.format("%Y-%m-%d").to_string();
    }
    out
}

const ENGLISH_MONTHS: &[(&str, u32)] = &[
    ("january", 1),
    ("jan", 1),
    ("february", 2),
    ("feb", 2),
    ("march", 3),
    ("mar", 3),
    ("april", 4),
    ("apr", 4),
    ("may", 5),
    ("june", 6),
    ("jun", 6),
    ("july", 7),
    ("jul", 7),
    ("august", 8),
    ("aug", 8),
    ("september", 9),
    ("sep", 9),
    ("sept", 9),
    ("october", 10),
    ("oct", 10),
    ("november", 11),
    ("nov", 11),
    ("december", 12),
    ("dec", 12),
];

const GERMAN_MONTHS: &[(&str, u32)] = &[
    ("januar", 1),
    ("jänner", 1),
    ("jan", 1),
    ("februar", 2),
    ("feb", 2),
    ("märz", 3),
    ("mär", 3),
    ("april", 4),
    ("apr", 4),
    ("mai", 5),
    ("juni", 6),
    ("jun", 6),
    ("juli", 7),
    ("jul", 7),
    ("august", 8),
    ("aug", 8),
    ("september", 9),
    ("sep", 9),
    ("sept", 9),
    ("oktober", 10),
    ("okt", 10),
    ("november", 11),
    ("nov", 11),
    ("dezember", 12),
    ("dez", 12),
];

const FRENCH_MONTHS: &[(&str, u32)] = &[
    ("janvier", 1),
    ("janv", 1),
    ("février", 2),
    ("févr", 2),
    ("fév", 2),
    ("mars", 3),
    ("avril", 4),
    ("avr", 4),
    ("mai", 5),
    ("juin", 6),
    ("juillet", 7),
    ("juil", 7),
    ("août", 8),
    ("septembre", 9),
    ("sept", 9),
    ("octobre", 10),
    ("oct", 10),
    ("novembre", 11),
    ("nov", 11),
    ("décembre", 12),
    ("déc", 12),
];

const SPANISH_MONTHS: &[(&str, u32)] = &[
    ("enero", 1),
    ("ene", 1),
    ("febrero", 2),
    ("feb", 2),
    ("marzo", 3),
    ("mar", 3),
    ("abril", 4),
    ("abr", 4),
    ("mayo", 5),
    ("may", 5),
    ("junio", 6),
    ("jun", 6),
    ("julio", 7),
    ("jul", 7),
    ("agosto", 8),
    ("ago", 8),
    ("septiembre", 9),
    ("setiembre", 9),
    ("sep", 9),
    ("octubre", 10),
    ("oct", 10),
    ("noviembre", 11),
    ("nov", 11),
    ("diciembre", 12),
    ("dic", 12),
];

const ITALIAN_MONTHS: &[(&str, u32)] = &[
    ("gennaio", 1),
    ("gen", 1),
    ("febbraio", 2),
    ("feb", 2),
    ("marzo", 3),
    ("mar", 3),
    ("aprile", 4),
    ("apr", 4),
    ("maggio", 5),
    ("mag", 5),
    ("giugno", 6),
    ("giu", 6),
    ("luglio", 7),
    ("lug", 7),
    ("agosto", 8),
    ("ago", 8),
    ("settembre", 9),
    ("set", 9),
    ("ottobre", 10),
    ("ott", 10),
    ("novembre", 11),
    ("nov", 11),
    ("dicembre", 12),
    ("dic", 12),
];

const DUTCH_MONTHS: &[(&str, u32)] = &[
    ("januari", 1),
    ("jan", 1),
    ("februari", 2),
    ("feb", 2),
    ("maart", 3),
    ("mrt", 3),
    ("april", 4),
    ("apr", 4),
    ("mei", 5),
    ("juni", 6),
    ("jun", 6),
    ("juli", 7),
    ("jul", 7),
    ("augustus", 8),
    ("aug", 8),
    ("september", 9),
    ("sep", 9),
    ("oktober", 10),
    ("okt", 10),
    ("november", 11),
    ("nov", 11),
    ("december", 12),
    ("dec", 12),
];

const POLISH_MONTHS: &[(&str, u32)] = &[
    ("styczeń", 1),
    ("stycznia", 1),
    ("sty", 1),
    ("luty", 2),
    ("lutego", 2),
    ("lut", 2),
    ("marzec", 3),
    ("marca", 3),
    ("mar", 3),
    ("kwiecień", 4),
    ("kwietnia", 4),
    ("kwi", 4),
    ("maj", 5),
    ("maja", 5),
    ("czerwiec", 6),
    ("czerwca", 6),
    ("cze", 6),
    ("lipiec", 7),
    ("lipca", 7),
    ("lip", 7),
    ("sierpień", 8),
    ("sierpnia", 8),
    ("sie", 8),
    ("wrzesień", 9),
    ("września", 9),
    ("wrz", 9),
    ("październik", 10),
    ("października", 10),
    ("paź", 10),
    ("listopad", 11),
    ("listopada", 11),
    ("lis", 11),
    ("grudzień", 12),
    ("grudnia", 12),
    ("gru", 12),
];

/// Full and abbreviated month names of a language.
pub fn month_names(language: Language) -> &'static [(&'static str, u32)] {
    match language {
        Language::English => ENGLISH_MONTHS,
        Language::German => GERMAN_MONTHS,
        Language::French => FRENCH_MONTHS,
        Language::Spanish => SPANISH_MONTHS,
        Language::Italian => ITALIAN_MONTHS,
        Language::Dutch => DUTCH_MONTHS,
        Language::Polish => POLISH_MONTHS,
    }
}
