use std::collections::HashMap;

/// One parsed export record, keyed by the trimmed header names.
pub type Row = HashMap<String, String>;

/// Column names tried in order when reading a logical field from a row.
/// The single-letter names cover exports saved without a header line where
/// the spreadsheet column letters were used instead.
pub mod columns {
    pub const ISSUE_KEY: &[&str] = &["Issue key", "Key", "Issue Key"];
    pub const ASSIGNEE: &[&str] = &["Assignee", "D"];
    pub const SPRINT: &[&str] = &["Sprint", "G"];
    pub const PROJECT: &[&str] = &["Project", "B"];
    pub const ALLOCATION_PROJECT: &[&str] = &["Project", "E"];
    pub const PROJECT_KEY: &[&str] = &["Project key", "Project Key", "ProjectKey"];
    pub const ISSUE_TYPE: &[&str] = &["Issue Type", "Type"];
    pub const STATUS: &[&str] = &["Status"];
    pub const RESOLUTION: &[&str] = &["Resolution"];
    pub const SUMMARY: &[&str] = &["Summary", "Issue summary"];
    pub const STORY_POINTS: &[&str] = &["Story Points", "SP"];
    pub const DUE_DATE: &[&str] = &["Due Date", "Due date"];
    pub const TARGET_END: &[&str] = &["Target End", "Target end"];
    pub const PARENT: &[&str] = &[
        "Parent",
        "Parent Key",
        "Parent Id",
        "Parent ID",
        "ParentIssue",
        "Parent Issue",
    ];
}

pub const UNASSIGNED: &str = "Unassigned";
pub const UNKNOWN: &str = "Unknown";
pub const NO_PROJECT: &str = "No Project";
pub const NO_SPRINT: &str = "No Sprint";
pub const ALL: &str = "all";

/// First non-empty value among `names`, or `""`.
pub fn field<'a>(row: &'a Row, names: &[&str]) -> &'a str {
    names
        .iter()
        .filter_map(|name| row.get(*name))
        .map(String::as_str)
        .find(|value| !value.is_empty())
        .unwrap_or("")
}

/// Like [`field`] but substitutes `fallback` when every column is blank.
pub fn field_or<'a>(row: &'a Row, names: &[&str], fallback: &'a str) -> &'a str {
    let value = field(row, names);
    if value.is_empty() { fallback } else { value }
}

pub fn story_points(row: &Row) -> f64 {
    parse_number(field(row, columns::STORY_POINTS))
}

/// Parses the leading decimal number of `input` ("3.5 pts" -> 3.5).
/// Anything without a numeric prefix, or a non-finite result, is zero.
pub fn parse_number(input: &str) -> f64 {
    let trimmed = input.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut seen_exp = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot && !seen_exp => seen_dot = true,
            b'e' | b'E' if seen_digit && !seen_exp => {
                let mut look = end + 1;
                if look < bytes.len() && (bytes[look] == b'+' || bytes[look] == b'-') {
                    look += 1;
                }
                if look < bytes.len() && bytes[look].is_ascii_digit() {
                    seen_exp = true;
                    end = look;
                    continue;
                }
                break;
            }
            _ => break,
        }
        end += 1;
    }
    if !seen_digit {
        return 0.0;
    }
    match trimmed[..end].parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_number_reads_numeric_prefix() {
        assert_eq!(parse_number("3"), 3.0);
        assert_eq!(parse_number(" 2.5 pts"), 2.5);
        assert_eq!(parse_number("-1"), -1.0);
        assert_eq!(parse_number("1e2x"), 100.0);
        assert_eq!(parse_number(".5"), 0.5);
    }

    #[test]
    fn parse_number_defaults_to_zero() {
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("n/a"), 0.0);
        assert_eq!(parse_number("-"), 0.0);
        assert_eq!(parse_number("."), 0.0);
    }

    #[test]
    fn field_skips_blank_columns() {
        let mut row = Row::new();
        row.insert("Assignee".into(), String::new());
        row.insert("D".into(), "Dana".into());
        assert_eq!(field(&row, columns::ASSIGNEE), "Dana");
        assert_eq!(field_or(&row, columns::SPRINT, NO_SPRINT), NO_SPRINT);
    }
}
