//! Field normalization.
//!
//! Pure functions that turn raw BibTeX field values into the shapes CFF
//! expects: page ranges, CFF entry types, release dates and venues.

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use tracing::debug;

use crate::error::CffError;

// ---------------------------------------------------------------------------
// Entry types
// ---------------------------------------------------------------------------

/// Single source of truth for entry types: (BibTeX type, CFF type).
const ENTRY_TYPES: &[(&str, &str)] = &[
    ("article", "article"),
    ("book", "book"),
    ("booklet", "pamphlet"),
    ("inproceedings", "conference-paper"),
    ("proceedings", "proceedings"),
    ("misc", "generic"),
    ("manual", "manual"),
    ("software", "software"),
    ("techreport", "report"),
    ("unpublished", "unpublished"),
];

/// CFF type written when the record carries none.
pub const FALLBACK_CFF_TYPE: &str = "generic";

/// Maps a BibTeX entry type to its CFF type.
///
/// # Errors
///
/// Returns [`CffError::UnsupportedType`] for types outside the table; an
/// unmapped `type` would make the CFF file invalid.
pub fn map_entry_type(bib_type: &str) -> Result<&'static str, CffError> {
    let wanted = bib_type.trim().to_lowercase();
    ENTRY_TYPES
        .iter()
        .find(|(bib, _)| *bib == wanted)
        .map(|(_, cff)| *cff)
        .ok_or_else(|| CffError::UnsupportedType(bib_type.to_string()))
}

/// Returns the full BibTeX to CFF type table.
pub fn entry_type_table() -> &'static [(&'static str, &'static str)] {
    ENTRY_TYPES
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// Splits a `start--end` page range.
///
/// A value without `--` is a single start page. An en dash is accepted in
/// place of `--`.
pub fn split_pages(pages: &str) -> Result<(String, Option<String>), CffError> {
    let pages = pages.replace('\u{2013}', "--");
    let parts: Vec<&str> = pages.split("--").map(str::trim).collect();
    match parts.as_slice() {
        [start] => Ok((start.to_string(), None)),
        [start, end] => Ok((start.to_string(), Some(end.to_string()))),
        _ => Err(CffError::MalformedInput(format!(
            "pages '{}' does not have the expected 'start--end' format",
            pages
        ))),
    }
}

// ---------------------------------------------------------------------------
// Release date
// ---------------------------------------------------------------------------

/// The date-related inputs of a record, in precedence order.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateParts<'a> {
    /// Explicit release date supplied with the repository information
    pub date_released: Option<&'a str>,
    /// Generic `date` field of the entry
    pub date: Option<&'a str>,
    pub year: Option<&'a str>,
    pub month: Option<&'a str>,
    pub day: Option<&'a str>,
}

type DateStrategy = fn(&DateParts<'_>) -> Option<Result<String, CffError>>;

/// Resolution strategies, tried in order; the first that applies wins. An
/// entry matching none of them has no year and is dated `today`.
const DATE_STRATEGIES: &[(&str, DateStrategy)] = &[
    ("date-released", explicit_release_date),
    ("date", generic_date),
    ("parts", date_from_parts),
];

/// Resolves the `date-released` value as `YYYY-MM-DD`.
///
/// `today` stands in for the current date when the entry has no year.
pub fn resolve_release_date(parts: &DateParts<'_>, today: NaiveDate) -> Result<String, CffError> {
    DATE_STRATEGIES
        .iter()
        .find_map(|(name, strategy)| {
            strategy(parts).inspect(|_| debug!(strategy = *name, "resolved release date"))
        })
        .unwrap_or_else(|| Ok(format_date(today)))
}

fn explicit_release_date(parts: &DateParts<'_>) -> Option<Result<String, CffError>> {
    parts
        .date_released
        .map(|value| normalize_full_date("date-released", value))
}

fn generic_date(parts: &DateParts<'_>) -> Option<Result<String, CffError>> {
    parts.date.map(|value| normalize_full_date("date", value))
}

fn date_from_parts(parts: &DateParts<'_>) -> Option<Result<String, CffError>> {
    parts
        .year
        .map(|year| construct_date(year, parts.month, parts.day))
}

/// Missing month and day default to `01`.
fn construct_date(year: &str, month: Option<&str>, day: Option<&str>) -> Result<String, CffError> {
    let year = parse_number("year", year)?;
    let month = month.map(parse_month).transpose()?.unwrap_or(1);
    let day = day.map(|d| parse_number("day", d)).transpose()?.unwrap_or(1);
    build_date(year, month, day)
}

fn full_date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})(?:-(\d{1,2}))?(?:-(\d{1,2}))?$").unwrap())
}

/// Accepts `YYYY-MM-DD`, padding `YYYY` and `YYYY-MM` with `-01`. A
/// `start/end` range is dated by its start.
fn normalize_full_date(field: &str, value: &str) -> Result<String, CffError> {
    let value = value.trim();
    let start = value.split('/').next().unwrap_or(value).trim();
    let malformed = || {
        CffError::MalformedInput(format!(
            "{} '{}' is not a date of the form YYYY-MM-DD",
            field, value
        ))
    };
    let caps = full_date_regex().captures(start).ok_or_else(malformed)?;
    let number = |i: usize| -> Result<u32, CffError> {
        caps.get(i)
            .map_or(Ok(1), |m| m.as_str().parse().map_err(|_| malformed()))
    };
    let year = number(1)?;
    build_date(year, number(2)?, number(3)?).map_err(|_| malformed())
}

fn build_date(year: u32, month: u32, day: u32) -> Result<String, CffError> {
    let year_i32 = i32::try_from(year)
        .map_err(|_| CffError::MalformedInput(format!("year '{}' is out of range", year)))?;
    NaiveDate::from_ymd_opt(year_i32, month, day)
        .map(format_date)
        .ok_or_else(|| {
            CffError::MalformedInput(format!(
                "{}-{:02}-{:02} is not a valid calendar date",
                year, month, day
            ))
        })
}

fn format_date(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

fn parse_number(field: &str, value: &str) -> Result<u32, CffError> {
    value.trim().parse().map_err(|_| {
        CffError::MalformedInput(format!("{} '{}' is not a number", field, value))
    })
}

const MONTH_NAMES: &[&str] = &[
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Parses a month given as a number, an English name or a three-letter
/// abbreviation.
pub fn parse_month(value: &str) -> Result<u32, CffError> {
    let trimmed = value.trim().trim_end_matches('.').to_lowercase();
    if let Ok(n) = trimmed.parse::<u32>() {
        if (1..=12).contains(&n) {
            return Ok(n);
        }
    } else if trimmed.len() >= 3 {
        if let Some(pos) = MONTH_NAMES.iter().position(|name| name.starts_with(&trimmed)) {
            return Ok(pos as u32 + 1);
        }
    }
    Err(CffError::MalformedInput(format!(
        "month '{}' is not a month number or name",
        value
    )))
}

// ---------------------------------------------------------------------------
// Venue
// ---------------------------------------------------------------------------

/// Uses `series` as the journal when no journal is given.
pub fn resolve_journal(journal: Option<String>, series: Option<&str>) -> Option<String> {
    journal.or_else(|| series.map(str::to_string))
}

/// Derives the conference name of a conference paper from its booktitle.
///
/// An explicit conference always wins; other CFF types get no derived
/// conference.
pub fn resolve_conference(
    cff_type: Option<&str>,
    booktitle: Option<&str>,
    conference: Option<String>,
) -> Option<String> {
    if conference.is_some() {
        return conference;
    }
    match (cff_type, booktitle) {
        (Some("conference-paper"), Some(booktitle)) => Some(booktitle.to_string()),
        _ => None,
    }
}
