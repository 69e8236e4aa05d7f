//! Small helpers shared by the extractors and the facade.
//!
//! - Date normalisation for the formats the site renders (`Sep 22nd`,
//!   `Results for September 22nd 2024`, unix milliseconds)
//! - URL slugs and id extraction from `href` paths
//! - String truncation for logging

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a char boundary) with an
/// ellipsis and the number of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Path segment used by the site for titles and nicknames: spaces become `-`.
///
/// Unlike a general slugifier this keeps case and punctuation, because the
/// site matches on the raw title.
///
/// ```ignore
/// assert_eq!(url_slug("BLAST Premier Fall Final"), "BLAST-Premier-Fall-Final");
/// ```
pub fn url_slug(title: &str) -> String {
    title.trim().replace(' ', "-")
}

/// Segment `index` of an href split on `/`.
///
/// A leading slash yields an empty first segment, so for `/matches/2370931/x`
/// the id is segment `2`.
pub fn href_segment(href: &str, index: usize) -> Option<&str> {
    href.split('/').nth(index).filter(|s| !s.is_empty())
}

/// Numeric id at segment `index` of an href.
pub fn href_id(href: &str, index: usize) -> Option<u64> {
    href_segment(href, index)?.parse().ok()
}

fn month_from_abbrev(abbrev: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    MONTHS
        .iter()
        .position(|m| *m == abbrev)
        .map(|i| i as u32 + 1)
}

fn leading_digits(s: &str) -> &str {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    &s[..end]
}

/// Normalise a short `MMM do` date into `D-M`.
///
/// `"Sep 22nd"` becomes `"22-9"`. Returns `None` for anything that is not a
/// known month abbreviation followed by an ordinal day.
pub fn normalize_short_date(text: &str) -> Option<String> {
    let mut parts = text.split_whitespace();
    let month = month_from_abbrev(parts.next()?)?;
    let day = leading_digits(parts.next()?);
    if day.is_empty() {
        return None;
    }
    Some(format!("{day}-{month}"))
}

/// Normalise a results headline into `DD-MM-YYYY`.
///
/// Only the last three words matter: `"Results for September 22nd 2024"`
/// becomes `"22-09-2024"`.
pub fn normalize_long_date(text: &str) -> Option<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < 3 {
        return None;
    }
    let [month, day, year] = [words[words.len() - 3], words[words.len() - 2], words[words.len() - 1]];
    let day: String = day.chars().filter(char::is_ascii_digit).collect();
    let date = NaiveDate::parse_from_str(&format!("{month} {day} {year}"), "%B %d %Y").ok()?;
    Some(date.format("%d-%m-%Y").to_string())
}

/// Unix milliseconds as a naive UTC date-time.
pub fn from_unix_ms(ms: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(ms).map(|dt| dt.naive_utc())
}

/// The Monday on or before `day`.
pub fn last_monday(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

/// Path fragment of the weekly team ranking: `2024/september/16`.
pub fn ranking_path(monday: NaiveDate) -> String {
    monday.format("%Y/%B/%d").to_string().to_lowercase()
}

/// Parse the `1d : 2h : 3m : 4s` countdown into seconds.
///
/// Components may be missing; unknown components are ignored. Values that
/// overflow `i64` yield `None`.
pub fn countdown_seconds(text: &str) -> Option<i64> {
    let mut total = 0i64;
    let mut seen = false;
    for part in text.split(':').map(str::trim).filter(|p| !p.is_empty()) {
        let (num, unit) = part.split_at(part.find(|c: char| !c.is_ascii_digit())?);
        let n: i64 = num.parse().ok()?;
        let scale = match unit.trim() {
            "d" => 86_400,
            "h" => 3_600,
            "m" => 60,
            "s" => 1,
            _ => continue,
        };
        total = total.checked_add(n.checked_mul(scale)?)?;
        seen = true;
    }
    seen.then_some(total)
}
