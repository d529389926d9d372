use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static DAY_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2,4})").expect("day-first pattern is valid")
});

const LOOSE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%b-%Y", "%d %b %Y", "%b %d, %Y", "%B %d, %Y"];

/// Reads the dates found in export cells: `D/M/YY` or `D/M/YYYY` first
/// (two-digit years land in the 2000s), then ISO and a few spelled-month
/// forms. A trailing time component is ignored.
pub fn parse_export_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Some(caps) = DAY_FIRST.captures(input) {
        let day = caps.get(1)?.as_str().parse::<u32>().ok()?;
        let month = caps.get(2)?.as_str().parse::<u32>().ok()?;
        let mut year = caps.get(3)?.as_str().parse::<i32>().ok()?;
        if year < 100 {
            year += 2000;
        }
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    parse_loose(input)
}

fn parse_loose(input: &str) -> Option<NaiveDate> {
    let date_part = match input.find(['T', ' ']) {
        Some(idx) if input[..idx].len() == 10 => &input[..idx],
        _ => input,
    };
    LOOSE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
}

/// Whole days from `from` to `to` (negative when `to` is earlier).
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

pub fn parse_iso(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn day_first_with_short_year() {
        assert_eq!(parse_export_date("05/03/25"), Some(d(2025, 3, 5)));
        assert_eq!(parse_export_date("5/3/2025 10:00 AM"), Some(d(2025, 3, 5)));
    }

    #[test]
    fn iso_and_spelled_forms() {
        assert_eq!(parse_export_date("2025-03-05"), Some(d(2025, 3, 5)));
        assert_eq!(parse_export_date("2025-03-05T09:30:00"), Some(d(2025, 3, 5)));
        assert_eq!(parse_export_date("05-Mar-2025"), Some(d(2025, 3, 5)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_export_date("soon"), None);
        assert_eq!(parse_export_date("31/02/25"), None);
    }
}
