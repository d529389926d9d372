//! Reconciliation of export rows that describe the same issue.
//!
//! Exports repeat an issue once per sprint it was carried through (and
//! sometimes once per label or component). Two policies collapse those
//! duplicates, keyed by issue key with the row index as a stand-in when the
//! key is blank:
//!
//! * [`merge_move_candidates`] sums story points, keeps the first non-empty
//!   project, joins distinct summaries with `" | "`, and keeps every other
//!   field from the first row seen.
//! * [`merge_progress_issues`] keeps the first non-zero story point value
//!   rather than summing, keeps the first non-empty project and project key,
//!   and marks the issue done once any duplicate is done.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::row::{NO_PROJECT, Row, UNASSIGNED, columns, field, field_or, story_points};

const SUMMARY_SEPARATOR: &str = " | ";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveCandidate {
    pub id: String,
    pub assignee: String,
    pub sp: f64,
    pub summary: String,
    pub project: String,
    pub parent: Option<String>,
    pub is_subtask: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressIssue {
    pub id: String,
    pub project: String,
    pub project_key: String,
    pub sp: f64,
    pub done: bool,
}

pub fn issue_key(row: &Row, index: usize) -> String {
    let key = field(row, columns::ISSUE_KEY).trim();
    if key.is_empty() {
        index.to_string()
    } else {
        key.to_string()
    }
}

/// Keyed first-seen-order accumulator shared by both merge policies.
struct Merged<T> {
    order: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Merged<T> {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn upsert(&mut self, key: String, insert: impl FnOnce() -> T, merge: impl FnOnce(&mut T)) {
        match self.index.get(&key) {
            Some(&idx) => merge(&mut self.order[idx]),
            None => {
                self.index.insert(key, self.order.len());
                self.order.push(insert());
            }
        }
    }
}

pub fn merge_move_candidates(rows: &[Row]) -> Vec<MoveCandidate> {
    let mut merged = Merged::new();
    for (idx, row) in rows.iter().enumerate() {
        let id = issue_key(row, idx);
        let sp = story_points(row);
        let project = field(row, columns::ALLOCATION_PROJECT);
        let summary = field(row, columns::SUMMARY);
        merged.upsert(
            id.clone(),
            || {
                let parent = field(row, columns::PARENT);
                MoveCandidate {
                    id,
                    assignee: field_or(row, columns::ASSIGNEE, UNASSIGNED).to_string(),
                    sp,
                    summary: summary.to_string(),
                    project: project.to_string(),
                    parent: (!parent.is_empty()).then(|| parent.to_string()),
                    is_subtask: field(row, columns::ISSUE_TYPE)
                        .to_lowercase()
                        .contains("sub"),
                }
            },
            |existing| {
                existing.sp += sp;
                if existing.project.is_empty() && !project.is_empty() {
                    existing.project = project.to_string();
                }
                if !summary.is_empty() && summary != existing.summary {
                    if !existing.summary.is_empty() {
                        existing.summary.push_str(SUMMARY_SEPARATOR);
                    }
                    existing.summary.push_str(summary);
                }
            },
        );
    }
    merged.order
}

pub fn merge_progress_issues(rows: &[Row]) -> Vec<ProgressIssue> {
    merge_progress_issues_indexed(rows.iter().enumerate())
}

/// Variant of [`merge_progress_issues`] for pre-filtered rows that keep the
/// index they had in the full dataset.
pub fn merge_progress_issues_indexed<'a>(
    rows: impl IntoIterator<Item = (usize, &'a Row)>,
) -> Vec<ProgressIssue> {
    let mut merged = Merged::new();
    for (idx, row) in rows {
        let id = issue_key(row, idx);
        let sp = story_points(row);
        let done = is_done(row);
        let project = field(row, columns::ALLOCATION_PROJECT);
        let project_key = field(row, columns::PROJECT_KEY);
        merged.upsert(
            id.clone(),
            || ProgressIssue {
                id,
                project: field_or(row, columns::ALLOCATION_PROJECT, NO_PROJECT).to_string(),
                project_key: project_key.to_string(),
                sp,
                done,
            },
            |existing| {
                if (existing.project.is_empty() || existing.project == NO_PROJECT)
                    && !project.is_empty()
                {
                    existing.project = project.to_string();
                }
                if existing.project_key.is_empty() && !project_key.is_empty() {
                    existing.project_key = project_key.to_string();
                }
                if existing.sp == 0.0 && sp > 0.0 {
                    existing.sp = sp;
                }
                existing.done |= done;
            },
        );
    }
    merged.order
}

/// Done when either the status or the resolution reads "done".
fn is_done(row: &Row) -> bool {
    field(row, columns::STATUS).eq_ignore_ascii_case("done")
        || field(row, columns::RESOLUTION).eq_ignore_ascii_case("done")
}
