use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::Filters;
use crate::merge::merge_progress_issues_indexed;
use crate::row::{ALL, NO_PROJECT, Row, UNKNOWN, columns, field, field_or, story_points};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectProgress {
    pub project: String,
    pub project_key: String,
    pub total_items: u32,
    pub done_items: u32,
    #[serde(rename = "totalSP")]
    pub total_sp: f64,
    #[serde(rename = "completedSP")]
    pub completed_sp: f64,
    #[serde(rename = "remainingSP")]
    pub remaining_sp: f64,
    /// `None` when the project has no story points; callers then show
    /// [`ProjectProgress::percent_count`] instead.
    #[serde(rename = "percentSP")]
    pub percent_sp: Option<f64>,
    pub percent_count: f64,
}

impl ProjectProgress {
    fn new(project: String, project_key: String) -> Self {
        Self {
            project,
            project_key,
            total_items: 0,
            done_items: 0,
            total_sp: 0.0,
            completed_sp: 0.0,
            remaining_sp: 0.0,
            percent_sp: None,
            percent_count: 0.0,
        }
    }

    fn add(&mut self, sp: f64, done: bool) {
        self.total_items += 1;
        self.total_sp += sp;
        if done {
            self.done_items += 1;
            self.completed_sp += sp;
        }
    }

    fn finalize(mut self) -> Self {
        self.remaining_sp = (self.total_sp - self.completed_sp).max(0.0);
        self.percent_sp = (self.total_sp > 0.0).then(|| self.completed_sp / self.total_sp * 100.0);
        self.percent_count = if self.total_items > 0 {
            f64::from(self.done_items) / f64::from(self.total_items) * 100.0
        } else {
            0.0
        };
        self
    }

    /// Story-point percentage, or the item-count percentage without points.
    pub fn percent(&self) -> f64 {
        self.percent_sp.unwrap_or(self.percent_count)
    }
}

/// Parent-level issues only: stories, tasks, bugs and epics, never
/// anything whose type mentions "sub".
pub fn is_parent_issue(row: &Row) -> bool {
    let issue_type = field(row, columns::ISSUE_TYPE).to_lowercase();
    if issue_type.is_empty() || issue_type.contains("sub") {
        return false;
    }
    ["story", "task", "bug", "epic"]
        .iter()
        .any(|kind| issue_type.contains(kind))
}

/// Per-project completion for one sprint (`"all"` for every sprint),
/// counting each parent issue once. Largest projects by story points first.
pub fn compute_sprint_project_progress(rows: &[Row], sprint_name: &str) -> Vec<ProjectProgress> {
    let in_sprint = |row: &Row| {
        sprint_name.is_empty() || sprint_name == ALL || field(row, columns::SPRINT) == sprint_name
    };
    let issues = merge_progress_issues_indexed(
        rows.iter()
            .enumerate()
            .filter(|(_, row)| in_sprint(row) && is_parent_issue(row)),
    );

    let mut groups: Vec<ProjectProgress> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for issue in issues {
        let project = match issue.project.trim() {
            "" => NO_PROJECT.to_string(),
            trimmed => trimmed.to_string(),
        };
        let slot = *index.entry(project.clone()).or_insert_with(|| {
            groups.push(ProjectProgress::new(project, issue.project_key.clone()));
            groups.len() - 1
        });
        groups[slot].add(issue.sp, issue.done);
    }

    let mut groups: Vec<ProjectProgress> =
        groups.into_iter().map(ProjectProgress::finalize).collect();
    groups.sort_by(|a, b| b.total_sp.total_cmp(&a.total_sp));
    groups
}

/// Per-project totals for the projects view: every row when no sprint is
/// selected, otherwise the filtered rows. Projects keep first-seen order.
pub fn compute_project_progress(
    rows: &[Row],
    filtered_rows: &[Row],
    filters: &Filters,
) -> Vec<ProjectProgress> {
    let source = if filters.sprint_is_all() { rows } else { filtered_rows };
    let mut groups: Vec<ProjectProgress> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for row in source {
        let project = field_or(row, columns::PROJECT, UNKNOWN);
        let slot = *index.entry(project.to_string()).or_insert_with(|| {
            groups.push(ProjectProgress::new(project.to_string(), String::new()));
            groups.len() - 1
        });
        let sp = story_points(row).max(0.0);
        groups[slot].add(sp, field(row, columns::STATUS) == "Done");
    }
    groups.into_iter().map(ProjectProgress::finalize).collect()
}
