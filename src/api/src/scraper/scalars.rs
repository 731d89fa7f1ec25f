//! Scalar parsers for numbers, dates and timestamps as Tibia.com prints them.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use crate::error::{Result, ScrapeError};
use crate::scraper::text::{collapse_whitespace, strip_nbsp};

const SECS_PER_HOUR: i32 = 3600;

/// Keep only ASCII digits and parse them. Returns 0 when none are left.
///
/// `"1,234 gold"` -> 1234.
pub fn parse_integer(s: &str) -> i64 {
    let digits: String = s.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

/// `"Jan 02 2007"` -> 2007-01-02. Spacing is free-form and full month
/// names are accepted.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let normalized = normalize(s);
    NaiveDate::parse_from_str(&normalized, "%B %d %Y")
        .map_err(|_| ScrapeError::DateTime(s.to_string()))
}

/// World creation dates: `"07/2001"` or `"Jul 2001"` -> `"2001-07"`.
pub fn parse_month(s: &str) -> Result<String> {
    let normalized = normalize(s);
    let date = NaiveDate::parse_from_str(&format!("01/{}", normalized), "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(&format!("01 {}", normalized), "%d %B %Y"))
        .map_err(|_| ScrapeError::DateTime(s.to_string()))?;
    Ok(date.format("%Y-%m").to_string())
}

/// `"Dec 24 2021, 09:52:16 CET"` -> 2021-12-24T08:52:16Z.
///
/// An empty string yields the current time; the site leaves timestamps
/// blank where the API reports "generated at".
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    let normalized = normalize(s);
    if normalized.is_empty() {
        return Ok(Utc::now());
    }

    let invalid = || ScrapeError::DateTime(s.to_string());
    let (local, zone) = normalized.rsplit_once(' ').ok_or_else(invalid)?;
    let offset = zone_offset(zone).ok_or_else(invalid)?;
    let naive = NaiveDateTime::parse_from_str(local, "%B %d %Y, %H:%M:%S").map_err(|_| invalid())?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(invalid)
}

/// RFC 3339 with second precision and a `Z` suffix.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Fixed offsets for the zone abbreviations the site prints. No DST
/// calculation: the abbreviation already says which side of the switch
/// the timestamp is on.
fn zone_offset(abbreviation: &str) -> Option<FixedOffset> {
    let hours = match abbreviation {
        "CET" => 1,
        "CEST" => 2,
        "UTC" | "GMT" => 0,
        "PST" => -8,
        "PDT" => -7,
        _ => return None,
    };
    FixedOffset::east_opt(hours * SECS_PER_HOUR)
}

/// Multiply by 1000 once per `k`: (`"5"`, 2) -> 5,000,000.
pub fn convert_abbreviated_gold(numeric: &str, k_count: usize) -> i64 {
    let base = parse_integer(numeric);
    (0..k_count).fold(base, |value, _| value.saturating_mul(1000))
}

/// `"50k gold"` -> 50,000; `"1,500 gold"` -> 1500.
pub fn parse_gold(s: &str) -> i64 {
    let amount = s.split_whitespace().next().unwrap_or("");
    let k_count = amount.chars().filter(|c| c.eq_ignore_ascii_case(&'k')).count();
    convert_abbreviated_gold(amount, k_count)
}

fn normalize(s: &str) -> String {
    collapse_whitespace(&strip_nbsp(s))
}
