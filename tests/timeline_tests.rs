use chrono::NaiveDate;
use sprint_insight::aggregation::{
    DeliveryStatus, MilestoneStatus, compute_milestones, compute_project_timelines,
    compute_sprint_timeline,
};
use sprint_insight::sprint_dates::extract_sprint_dates;
use sprint_insight::{Preferences, Row};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

const SPRINT_7: &str = "Sprint 7 10-03-25 to 21-03-25";
const SPRINT_8: &str = "Sprint 8 24-03-25 to 04-04-25";

fn issue(project: &str, sprint: &str, status: &str, sp: &str) -> Row {
    [
        ("Project", project),
        ("Sprint", sprint),
        ("Status", status),
        ("Story Points", sp),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn rows() -> Vec<Row> {
    vec![
        issue("Payments", SPRINT_7, "Done", "3"),
        issue("Payments", SPRINT_7, "To Do", "1"),
        issue("Payments", SPRINT_8, "To Do", "4"),
        issue("Web", SPRINT_7, "Done", ""),
        issue("Web", SPRINT_7, "To Do", ""),
        issue("Web", SPRINT_7, "In Progress", ""),
        issue("Backlog", "No Sprint", "To Do", "2"),
    ]
}

#[test]
fn sprint_timeline_counts_elapsed_days() {
    let dates = extract_sprint_dates(&rows());
    let timeline =
        compute_sprint_timeline(SPRINT_7, &dates, &Preferences::default(), d(2025, 3, 14)).unwrap();
    assert_eq!(timeline.start_date, "03/10/2025");
    assert_eq!(timeline.total_days, 12);
    assert_eq!(timeline.elapsed_days, 5);
    assert_eq!(timeline.days_remaining, 8);
    assert_eq!(timeline.percent_time_elapsed, 42);
    assert!(!timeline.is_configured);
}

#[test]
fn configured_sprint_length_overrides_calendar() {
    let dates = extract_sprint_dates(&rows());
    let mut prefs = Preferences::default();
    prefs.sprint_days_config.insert(SPRINT_7.to_string(), 10);
    let timeline = compute_sprint_timeline(SPRINT_7, &dates, &prefs, d(2025, 3, 14)).unwrap();
    assert_eq!(timeline.total_days, 10);
    assert_eq!(timeline.days_remaining, 6);
    assert_eq!(timeline.percent_time_elapsed, 50);
    assert!(timeline.is_configured);
}

#[test]
fn timeline_clamps_before_start_and_after_end() {
    let dates = extract_sprint_dates(&rows());
    let prefs = Preferences::default();
    let before = compute_sprint_timeline(SPRINT_7, &dates, &prefs, d(2025, 3, 1)).unwrap();
    assert_eq!(before.elapsed_days, 1);
    let after = compute_sprint_timeline(SPRINT_7, &dates, &prefs, d(2025, 5, 1)).unwrap();
    assert_eq!(after.elapsed_days, 12);
    assert_eq!(after.days_remaining, 1);
    assert_eq!(after.percent_time_elapsed, 100);
}

#[test]
fn no_timeline_for_all_or_undated_sprints() {
    let dates = extract_sprint_dates(&rows());
    let prefs = Preferences::default();
    assert!(compute_sprint_timeline("all", &dates, &prefs, d(2025, 3, 14)).is_none());
    assert!(compute_sprint_timeline("No Sprint", &dates, &prefs, d(2025, 3, 14)).is_none());
}

#[test]
fn milestones_per_project_and_sprint() {
    let rows = rows();
    let dates = extract_sprint_dates(&rows);
    let milestones = compute_milestones(&rows, &dates, d(2025, 3, 14));
    assert_eq!(milestones.len(), 3);

    let payments = &milestones[0];
    assert_eq!(payments.project, "Payments");
    assert_eq!(payments.sprint, SPRINT_7);
    assert_eq!(payments.percent_complete, 75);
    assert_eq!(payments.days_remaining, Some(7));
    assert_eq!(payments.status, MilestoneStatus::OnTrack);

    let web = &milestones[2];
    assert_eq!(web.project, "Web");
    assert_eq!(web.percent_complete, 33);
    assert_eq!(web.status, MilestoneStatus::Behind);
}

#[test]
fn milestones_past_sprint_end_are_delayed() {
    let rows = rows();
    let dates = extract_sprint_dates(&rows);
    let milestones = compute_milestones(&rows, &dates, d(2025, 3, 25));
    assert_eq!(milestones[0].status, MilestoneStatus::Delayed);
    assert_eq!(milestones[0].days_remaining, Some(-4));
}

#[test]
fn project_timelines_span_dated_sprints() {
    let rows = rows();
    let dates = extract_sprint_dates(&rows);
    let timelines = compute_project_timelines(&rows, &dates, &Preferences::default(), d(2025, 3, 14));

    assert_eq!(timelines.len(), 2);
    let payments = timelines.iter().find(|t| t.project == "Payments").unwrap();
    assert_eq!(payments.start_date, d(2025, 3, 10));
    assert_eq!(payments.end_date, d(2025, 4, 4));
    assert_eq!(payments.percent_complete, 38);
    assert_eq!(payments.days_to_target, 21);
    assert_eq!(payments.status, DeliveryStatus::Early);
    assert_eq!(payments.past_program_end, None);

    let web = timelines.iter().find(|t| t.project == "Web").unwrap();
    assert_eq!(web.status, DeliveryStatus::OnTrack);
    assert_eq!(timelines[0].project, "Payments");
}

#[test]
fn custom_targets_and_program_end_are_applied() {
    let rows = rows();
    let dates = extract_sprint_dates(&rows);
    let mut prefs = Preferences::default();
    prefs.program_end_date = Some(d(2025, 3, 31));
    prefs.project_targets.insert("Web".to_string(), d(2025, 3, 12));

    let timelines = compute_project_timelines(&rows, &dates, &prefs, d(2025, 3, 14));
    assert_eq!(timelines[0].project, "Web");
    assert_eq!(timelines[0].status, DeliveryStatus::Delayed);
    assert_eq!(timelines[0].past_program_end, Some(false));

    let payments = timelines.iter().find(|t| t.project == "Payments").unwrap();
    assert_eq!(payments.past_program_end, Some(true));
}
