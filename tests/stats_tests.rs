use chrono::NaiveDate;
use sprint_insight::aggregation::{
    AllocationStatus, assignee_names, compute_assignee_stats, compute_risk_register,
    filter_rows, sprint_names, summarize,
};
use sprint_insight::{DashboardConfig, Filters, Preferences, Row};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn issue(key: &str, assignee: &str, sprint: &str, kind: &str, status: &str, sp: &str) -> Row {
    [
        ("Issue key", key),
        ("Assignee", assignee),
        ("Sprint", sprint),
        ("Issue Type", kind),
        ("Status", status),
        ("Story Points", sp),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn rows() -> Vec<Row> {
    vec![
        issue("P-1", "Ana", "Sprint 2", "Story", "In Progress", "5"),
        issue("P-2", "Ana", "Sprint 2", "Bug", "To Do", "3"),
        issue("P-3", "Ana", "Sprint 1", "Task", "Done", "2"),
        issue("P-4", "Ana", "Sprint 2", "Sub-task", "Awaiting Testing", "1"),
        issue("P-5", "Ben", "Sprint 2", "Story", "In Progress", "5"),
        issue("P-6", "Ben", "Sprint 10", "Story", "To Do", "3"),
        issue("P-7", "", "Sprint 2", "Story", "Blocked", "2 pts"),
    ]
}

fn config(preferences: Preferences, filters: Filters) -> DashboardConfig {
    DashboardConfig::new(preferences, filters, d(2025, 3, 14))
}

#[test]
fn stats_bucket_points_and_capacity_per_assignee() {
    let mut prefs = Preferences::default();
    prefs.assignee_caps.insert("Ben".to_string(), 6.0);
    let stats = compute_assignee_stats(&rows(), &config(prefs, Filters::default()));

    let ana = &stats["Ana"];
    assert_eq!(ana.stories, 1);
    assert_eq!(ana.bugs, 1);
    assert_eq!(ana.tasks, 1);
    assert_eq!(ana.subtasks, 1);
    assert_eq!(ana.done_count, 1);
    assert_eq!(ana.total_story_points, 11.0);
    assert_eq!(ana.completed_story_points, 2.0);
    assert_eq!(ana.remaining_story_points, 9.0);
    assert_eq!(ana.awaiting_testing_story_points, 1.0);
    assert_eq!(ana.available_story_points, 8.0);
    assert_eq!(ana.sprint_capacity, 16.0);
    assert_eq!(ana.capacity_used, 8.0);
    assert_eq!(ana.capacity_remaining, 8.0);
    assert_eq!(ana.utilization, 0.5);
    assert_eq!(ana.allocation_status, AllocationStatus::UnderAllocated);

    let ben = &stats["Ben"];
    assert_eq!(ben.sprint_capacity, 6.0);
    assert_eq!(ben.capacity_used, 8.0);
    assert_eq!(ben.capacity_remaining, -2.0);
    assert_eq!(ben.allocation_status, AllocationStatus::OverAllocated);

    let unassigned = &stats["Unassigned"];
    assert_eq!(unassigned.total_story_points, 2.0);
    assert_eq!(unassigned.available_story_points, 2.0);
    assert_eq!(unassigned.capacity_used, 0.0);
}

#[test]
fn on_track_between_seventy_percent_and_full() {
    let rows = vec![issue("Q-1", "Cy", "Sprint 1", "Story", "To Do", "12")];
    let stats = compute_assignee_stats(&rows, &config(Preferences::default(), Filters::default()));
    assert_eq!(stats["Cy"].allocation_status, AllocationStatus::OnTrack);
}

#[test]
fn filters_restrict_the_rows_that_feed_stats() {
    let filters = Filters {
        sprint: "Sprint 2".to_string(),
        assignee: "all".to_string(),
    };
    let filtered = filter_rows(&rows(), &filters);
    assert_eq!(filtered.len(), 5);

    let stats = compute_assignee_stats(&rows(), &config(Preferences::default(), filters));
    assert_eq!(stats["Ana"].total_story_points, 9.0);
    assert_eq!(stats["Ben"].total_story_points, 5.0);
}

#[test]
fn sprint_names_sort_numbered_labels_descending() {
    assert_eq!(
        sprint_names(&rows()),
        vec!["all", "Sprint 10", "Sprint 2", "Sprint 1"]
    );
    assert_eq!(assignee_names(&rows()), vec!["all", "Ana", "Ben"]);
}

#[test]
fn summary_totals_and_counts() {
    let mut prefs = Preferences::default();
    prefs.assignee_caps.insert("Ben".to_string(), 6.0);
    let cfg = config(prefs, Filters::default());
    let stats = compute_assignee_stats(&rows(), &cfg);
    let risks = compute_risk_register(&rows(), &stats, &Default::default(), cfg.today);
    let summary = summarize(&stats, &risks);

    assert_eq!(summary.total_sp, 21.0);
    assert_eq!(summary.completed_sp, 2.0);
    assert_eq!(summary.awaiting_testing_sp, 1.0);
    assert_eq!(summary.completion_rate, 10);
    assert_eq!(summary.overloaded_count, 1);
}
