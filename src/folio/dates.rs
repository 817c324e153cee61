use anyhow::{Result, anyhow};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use std::cmp::{Ordering, Reverse};
use std::fmt::Write;

const DISPLAY_FORMATS: &[&str] = &["%B %d, %Y", "%Y-%m-%d", "%d %B %Y", "%B %d %Y"];

/// Parse a display date such as `January 01, 2025`, `Jan 1, 2025` or
/// `2025-01-01`. Returns `None` for anything else.
pub fn parse_display_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    DISPLAY_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

pub fn iso(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

pub fn parse_iso(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|err| anyhow!("invalid timezone `{name}`: {err}"))
}

/// Format `date` with a user supplied pattern. chrono reports bad
/// specifiers as a `fmt::Error` from `Display`, so this writes instead of
/// calling `to_string`.
fn try_format(date: impl std::fmt::Display) -> Option<String> {
    let mut out = String::new();
    write!(out, "{date}").ok()?;
    Some(out)
}

/// A display format must render and read back as the same date, or the
/// default dates it produces would sort as undated.
pub fn check_display_format(display_format: &str) -> Result<()> {
    let probe = NaiveDate::from_ymd_opt(2025, 1, 31)
        .ok_or_else(|| anyhow!("invalid reference date"))?;
    let rendered = try_format(probe.format(display_format))
        .ok_or_else(|| anyhow!("invalid date display format `{display_format}`"))?;
    if parse_display_date(&rendered) != Some(probe) {
        return Err(anyhow!(
            "invalid date display format `{display_format}`: `{rendered}` does not read back as a date"
        ));
    }
    Ok(())
}

/// Today's date in `tz`, formatted for display. Falls back to ISO form when
/// `display_format` cannot render.
pub fn today(tz: Tz, display_format: &str) -> String {
    let now = Utc::now().with_timezone(&tz);
    try_format(now.format(display_format))
        .unwrap_or_else(|| now.format("%Y-%m-%d").to_string())
}

/// Newest-first ordering key: date descending with undated entries last,
/// then slug ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecencyKey<'a> {
    pub date: Option<NaiveDate>,
    pub slug: &'a str,
}

impl Ord for RecencyKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        let rank = |d: Option<NaiveDate>| (d.is_none(), d.map(Reverse));
        rank(self.date)
            .cmp(&rank(other.date))
            .then_with(|| self.slug.cmp(other.slug))
    }
}

impl PartialOrd for RecencyKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn display_dates_in_common_shapes_parse() {
        assert_eq!(parse_display_date("Jan 1, 2025"), ymd(2025, 1, 1));
        assert_eq!(parse_display_date("January 01, 2025"), ymd(2025, 1, 1));
        assert_eq!(parse_display_date(" 2024-12-31 "), ymd(2024, 12, 31));
        assert_eq!(parse_display_date("5 March 2024"), ymd(2024, 3, 5));
        assert_eq!(parse_display_date("sometime last week"), None);
    }

    #[test]
    fn iso_roundtrips_and_blank_for_none() {
        assert_eq!(iso(ymd(2025, 2, 3)), "2025-02-03");
        assert_eq!(iso(None), "");
        assert_eq!(parse_iso("2025-02-03"), ymd(2025, 2, 3));
    }

    #[test]
    fn recency_orders_newest_first_then_slug() {
        let mut keys = vec![
            RecencyKey { date: None, slug: "undated" },
            RecencyKey { date: ymd(2024, 1, 1), slug: "old" },
            RecencyKey { date: ymd(2025, 1, 1), slug: "b-new" },
            RecencyKey { date: ymd(2025, 1, 1), slug: "a-new" },
        ];
        keys.sort();
        let slugs: Vec<_> = keys.iter().map(|k| k.slug).collect();
        assert_eq!(slugs, vec!["a-new", "b-new", "old", "undated"]);
    }

    #[test]
    fn display_formats_must_read_back() {
        assert!(check_display_format("%B %d, %Y").is_ok());
        assert!(check_display_format("%Y-%m-%d").is_ok());
        assert!(check_display_format("%Q").is_err());
        assert!(check_display_format("%d/%m/%Y").is_err());
    }

    #[test]
    fn bad_format_falls_back_to_iso() {
        let today = today(chrono_tz::UTC, "%Q");
        assert!(parse_iso(&today).is_some(), "{today}");
    }

    #[test]
    fn timezone_names_are_validated() {
        assert!(parse_timezone("Europe/Berlin").is_ok());
        assert!(parse_timezone("Mars/Olympus").is_err());
    }
}
