use sprint_insight::aggregation::{compute_project_progress, compute_sprint_project_progress, filter_rows};
use sprint_insight::{Filters, Row};

fn row(pairs: &[(&str, &str)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn export() -> Vec<Row> {
    vec![
        row(&[("Issue key", "PAY-1"), ("Project", "Payments"), ("Project key", "PAY"), ("Issue Type", "Story"), ("Sprint", "Sprint 5"), ("Status", "Done"), ("Story Points", "5")]),
        row(&[("Issue key", "PAY-1"), ("Project", ""), ("Issue Type", "Story"), ("Sprint", "Sprint 5"), ("Status", "In Progress"), ("Story Points", "5")]),
        row(&[("Issue key", "PAY-2"), ("Project", "Payments"), ("Issue Type", "Bug"), ("Sprint", "Sprint 5"), ("Status", "To Do"), ("Story Points", "")]),
        row(&[("Issue key", "PAY-3"), ("Project", "Payments"), ("Issue Type", "Sub-task"), ("Sprint", "Sprint 5"), ("Status", "To Do"), ("Story Points", "8")]),
        row(&[("Issue key", "WEB-1"), ("Project", "Web"), ("Issue Type", "Task"), ("Sprint", "Sprint 5"), ("Status", "To Do"), ("Resolution", "Done"), ("Story Points", "13")]),
        row(&[("Issue key", "WEB-2"), ("Project", "Web"), ("Issue Type", "Story"), ("Sprint", "Sprint 6"), ("Status", "To Do"), ("Story Points", "2")]),
        row(&[("Issue key", "OPS-1"), ("Issue Type", "Task"), ("Sprint", "Sprint 5"), ("Status", "To Do"), ("Story Points", "1")]),
    ]
}

#[test]
fn sprint_rollup_merges_duplicates_and_skips_subtasks() {
    let groups = compute_sprint_project_progress(&export(), "Sprint 5");
    let names: Vec<&str> = groups.iter().map(|g| g.project.as_str()).collect();
    assert_eq!(names, vec!["Web", "Payments", "No Project"]);

    let payments = &groups[1];
    assert_eq!(payments.project_key, "PAY");
    assert_eq!(payments.total_items, 2);
    assert_eq!(payments.done_items, 1);
    assert_eq!(payments.total_sp, 5.0);
    assert_eq!(payments.completed_sp, 5.0);
    assert_eq!(payments.percent_sp, Some(100.0));

    let web = &groups[0];
    assert_eq!(web.done_items, 1);
    assert_eq!(web.remaining_sp, 0.0);
}

#[test]
fn all_sprints_rollup_includes_every_sprint() {
    let groups = compute_sprint_project_progress(&export(), "all");
    let web = groups.iter().find(|g| g.project == "Web").unwrap();
    assert_eq!(web.total_items, 2);
    assert_eq!(web.total_sp, 15.0);
}

#[test]
fn percent_falls_back_to_item_count_without_points() {
    let rows = vec![
        row(&[("Issue key", "X-1"), ("Project", "Docs"), ("Issue Type", "Task"), ("Status", "Done")]),
        row(&[("Issue key", "X-2"), ("Project", "Docs"), ("Issue Type", "Task"), ("Status", "To Do")]),
    ];
    let groups = compute_sprint_project_progress(&rows, "all");
    assert_eq!(groups[0].percent_sp, None);
    assert_eq!(groups[0].percent(), 50.0);
}

#[test]
fn project_view_uses_all_rows_until_a_sprint_is_selected() {
    let rows = export();
    let all = Filters::default();
    let everything = compute_project_progress(&rows, &filter_rows(&rows, &all), &all);
    let names: Vec<&str> = everything.iter().map(|p| p.project.as_str()).collect();
    assert_eq!(names, vec!["Payments", "Unknown", "Web"]);

    let sprint_six = Filters {
        sprint: "Sprint 6".to_string(),
        assignee: "all".to_string(),
    };
    let filtered = filter_rows(&rows, &sprint_six);
    let scoped = compute_project_progress(&rows, &filtered, &sprint_six);
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0].project, "Web");
    assert_eq!(scoped[0].total_sp, 2.0);
}
