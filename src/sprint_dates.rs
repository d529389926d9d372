use std::collections::HashMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::row::{Row, columns, field};

static SPRINT_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2})-(\d{2})-(\d{2})\s+to\s+(\d{2})-(\d{2})-(\d{2})")
        .expect("sprint range pattern is valid")
});

/// Start and end of a sprint as `MM/DD/YYYY` strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintDateRange {
    pub start: String,
    pub end: String,
}

pub type SprintDates = HashMap<String, SprintDateRange>;

impl SprintDateRange {
    pub fn start_date(&self) -> Option<NaiveDate> {
        parse_month_day_year(&self.start)
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        parse_month_day_year(&self.end)
    }
}

/// Reads a `DD-MM-YY to DD-MM-YY` range out of a sprint label.
///
/// When the first two-digit group exceeds 31 the groups are read as
/// `YY-MM-DD` instead. Two-digit years are placed in the 2000s. This is a
/// guess about the export's locale: labels such as `12-05-24` are always
/// read day-first even if the exporter meant year-first.
pub fn parse_sprint_label(label: &str) -> Option<SprintDateRange> {
    let caps = SPRINT_RANGE.captures(label)?;
    let group = |idx: usize| caps.get(idx).map(|m| m.as_str()).unwrap_or_default();
    let year_first = group(1).parse::<u32>().unwrap_or(0) > 31;
    let (start, end) = if year_first {
        (
            format!("{}/{}/20{}", group(2), group(3), group(1)),
            format!("{}/{}/20{}", group(5), group(6), group(4)),
        )
    } else {
        (
            format!("{}/{}/20{}", group(2), group(1), group(3)),
            format!("{}/{}/20{}", group(5), group(4), group(6)),
        )
    };
    Some(SprintDateRange { start, end })
}

/// Builds the sprint date table for a dataset; the first row carrying a
/// given sprint label decides its range.
pub fn extract_sprint_dates(rows: &[Row]) -> SprintDates {
    let mut dates = SprintDates::new();
    for row in rows {
        let sprint = field(row, columns::SPRINT);
        if sprint.is_empty() || dates.contains_key(sprint) {
            continue;
        }
        if let Some(range) = parse_sprint_label(sprint) {
            dates.insert(sprint.to_string(), range);
        }
    }
    dates
}

pub fn parse_month_day_year(input: &str) -> Option<NaiveDate> {
    let mut parts = input.trim().split('/');
    let month = parts.next()?.trim().parse::<u32>().ok()?;
    let day = parts.next()?.trim().parse::<u32>().ok()?;
    let year = parts.next()?.trim().parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_first_label() {
        let range = parse_sprint_label("Sprint 14 (03-02-25 to 16-02-25)").unwrap();
        assert_eq!(range.start, "02/03/2025");
        assert_eq!(range.end, "02/16/2025");
        assert_eq!(range.start_date(), NaiveDate::from_ymd_opt(2025, 2, 3));
    }

    #[test]
    fn year_first_label() {
        let range = parse_sprint_label("PI 35-03-10 to 35-03-21").unwrap();
        assert_eq!(range.start, "03/10/2035");
        assert_eq!(range.end, "03/21/2035");
    }

    #[test]
    fn label_without_range() {
        assert!(parse_sprint_label("Sprint 7").is_none());
    }
}
