use chrono::NaiveDate;
use sprint_insight::aggregation::{RiskLevel, compute_assignee_stats, compute_risk_register};
use sprint_insight::sprint_dates::extract_sprint_dates;
use sprint_insight::{DashboardConfig, Filters, Preferences, Row};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn row(pairs: &[(&str, &str)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

const SPRINT: &str = "Sprint 4 03-03-25 to 14-03-25";

fn register(rows: &[Row], prefs: Preferences, today: NaiveDate) -> Vec<sprint_insight::RiskEntry> {
    let config = DashboardConfig::new(prefs, Filters::default(), today);
    let stats = compute_assignee_stats(rows, &config);
    compute_risk_register(rows, &stats, &extract_sprint_dates(rows), today)
}

#[test]
fn overdue_work_uses_day_first_due_date() {
    let rows = vec![row(&[
        ("Issue key", "R-1"),
        ("Assignee", "Ana"),
        ("Status", "In Progress"),
        ("Story Points", "3"),
        ("Due Date", "10/03/2025"),
    ])];
    let risks = register(&rows, Preferences::default(), d(2025, 3, 13));
    assert_eq!(risks.len(), 1);
    assert_eq!(risks[0].risk_level, RiskLevel::High);
    assert_eq!(risks[0].reason, "Overdue by 3 days");
    assert_eq!(risks[0].days_late, Some(3));
}

#[test]
fn sprint_end_is_the_fallback_target() {
    let rows = vec![row(&[
        ("Issue key", "R-2"),
        ("Assignee", "Ana"),
        ("Sprint", SPRINT),
        ("Status", "To Do"),
        ("Story Points", "2"),
    ])];
    let risks = register(&rows, Preferences::default(), d(2025, 3, 15));
    assert_eq!(risks[0].reason, "Overdue by 1 day");
    assert_eq!(risks[0].sprint, SPRINT);
}

#[test]
fn done_work_is_never_flagged() {
    let rows = vec![row(&[
        ("Issue key", "R-3"),
        ("Assignee", "Ana"),
        ("Status", "Done"),
        ("Story Points", "0"),
        ("Due Date", "01/01/2024"),
    ])];
    assert!(register(&rows, Preferences::default(), d(2025, 3, 15)).is_empty());
}

#[test]
fn heavily_loaded_assignee_flags_open_work() {
    let mut prefs = Preferences::default();
    prefs.assignee_caps.insert("Ben".to_string(), 4.0);
    let rows = vec![
        row(&[("Issue key", "R-4"), ("Assignee", "Ben"), ("Status", "To Do"), ("Story Points", "5")]),
        row(&[("Issue key", "R-5"), ("Assignee", "Ben"), ("Status", "Done"), ("Story Points", "5")]),
    ];
    let risks = register(&rows, prefs, d(2025, 3, 15));
    assert_eq!(risks.len(), 1);
    assert_eq!(risks[0].issue_key, "R-4");
    assert_eq!(risks[0].reason, "Assignee at 250% utilization");
    assert_eq!(risks[0].days_late, None);
}

#[test]
fn unestimated_work_due_soon_is_medium() {
    let rows = vec![
        row(&[("Issue key", "R-6"), ("Assignee", "Cy"), ("Status", "To Do"), ("Due Date", "2025-03-17")]),
        row(&[("Issue key", "R-7"), ("Assignee", "Cy"), ("Status", "To Do"), ("Due Date", "2025-03-30")]),
    ];
    let risks = register(&rows, Preferences::default(), d(2025, 3, 15));
    assert_eq!(risks.len(), 1);
    assert_eq!(risks[0].risk_level, RiskLevel::Medium);
    assert_eq!(risks[0].reason, "No Story Points - due in 2 days");
}

#[test]
fn high_risks_sort_first_then_most_late() {
    let rows = vec![
        row(&[("Issue key", "M-1"), ("Assignee", "Cy"), ("Status", "To Do"), ("Due Date", "2025-03-16")]),
        row(&[("Issue key", "H-1"), ("Assignee", "Cy"), ("Status", "To Do"), ("Story Points", "1"), ("Due Date", "2025-03-14")]),
        row(&[("Issue key", "H-2"), ("Assignee", "Cy"), ("Status", "To Do"), ("Story Points", "1"), ("Due Date", "2025-03-01")]),
    ];
    let risks = register(&rows, Preferences::default(), d(2025, 3, 15));
    let keys: Vec<&str> = risks.iter().map(|r| r.issue_key.as_str()).collect();
    assert_eq!(keys, vec!["H-2", "H-1", "M-1"]);
}
