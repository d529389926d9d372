use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::{DashboardConfig, Filters, Preferences};
use crate::row::{ALL, Row, UNASSIGNED, columns, field, field_or, story_points};

static FIRST_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)").expect("number pattern is valid"));

const UNDER_ALLOCATED_RATIO: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusBucket {
    Done,
    InProgress,
    ToDo,
    AwaitingTesting,
    AwaitingVersioning,
    Other,
}

impl StatusBucket {
    pub fn from_status(status: &str) -> Self {
        match status {
            "Done" => StatusBucket::Done,
            "In Progress" => StatusBucket::InProgress,
            "To Do" => StatusBucket::ToDo,
            "Awaiting Testing" => StatusBucket::AwaitingTesting,
            "Awaiting Versioning" => StatusBucket::AwaitingVersioning,
            _ => StatusBucket::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationStatus {
    #[serde(rename = "Over Allocated")]
    OverAllocated,
    #[serde(rename = "Under Allocated")]
    UnderAllocated,
    #[serde(rename = "On Track")]
    OnTrack,
}

impl AllocationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationStatus::OverAllocated => "Over Allocated",
            AllocationStatus::UnderAllocated => "Under Allocated",
            AllocationStatus::OnTrack => "On Track",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssigneeStats {
    pub initiatives: u32,
    pub epics: u32,
    pub stories: u32,
    pub bugs: u32,
    pub tasks: u32,
    pub subtasks: u32,

    pub done_count: u32,
    pub in_progress_count: u32,
    pub todo_count: u32,
    pub awaiting_testing_count: u32,
    pub awaiting_versioning_count: u32,

    pub total_story_points: f64,
    pub completed_story_points: f64,
    pub remaining_story_points: f64,
    pub awaiting_testing_story_points: f64,
    pub awaiting_versioning_story_points: f64,
    pub available_story_points: f64,
    pub in_progress_story_points: f64,
    pub to_do_story_points: f64,

    pub sprint_capacity: f64,
    pub capacity_used: f64,
    pub capacity_remaining: f64,
    /// `capacity_used / sprint_capacity`, zero when the capacity is zero.
    pub utilization: f64,
    pub allocation_status: AllocationStatus,
}

impl AssigneeStats {
    pub fn with_capacity(sprint_capacity: f64) -> Self {
        Self {
            initiatives: 0,
            epics: 0,
            stories: 0,
            bugs: 0,
            tasks: 0,
            subtasks: 0,
            done_count: 0,
            in_progress_count: 0,
            todo_count: 0,
            awaiting_testing_count: 0,
            awaiting_versioning_count: 0,
            total_story_points: 0.0,
            completed_story_points: 0.0,
            remaining_story_points: 0.0,
            awaiting_testing_story_points: 0.0,
            awaiting_versioning_story_points: 0.0,
            available_story_points: 0.0,
            in_progress_story_points: 0.0,
            to_do_story_points: 0.0,
            sprint_capacity,
            capacity_used: 0.0,
            capacity_remaining: sprint_capacity,
            utilization: 0.0,
            allocation_status: AllocationStatus::UnderAllocated,
        }
    }

    pub fn utilization_percent(&self) -> f64 {
        self.utilization * 100.0
    }

    fn record(&mut self, row: &Row) {
        match field(row, columns::ISSUE_TYPE) {
            "Initiative" => self.initiatives += 1,
            "Epic" => self.epics += 1,
            "Story" => self.stories += 1,
            "Bug" => self.bugs += 1,
            "Task" => self.tasks += 1,
            "Sub-task" => self.subtasks += 1,
            _ => {}
        }

        let bucket = StatusBucket::from_status(field(row, columns::STATUS));
        match bucket {
            StatusBucket::Done => self.done_count += 1,
            StatusBucket::InProgress => self.in_progress_count += 1,
            StatusBucket::ToDo => self.todo_count += 1,
            StatusBucket::AwaitingTesting => self.awaiting_testing_count += 1,
            StatusBucket::AwaitingVersioning => self.awaiting_versioning_count += 1,
            StatusBucket::Other => {}
        }

        let sp = story_points(row);
        if sp <= 0.0 {
            return;
        }
        self.total_story_points += sp;
        match bucket {
            StatusBucket::Done => self.completed_story_points += sp,
            StatusBucket::AwaitingTesting => {
                self.awaiting_testing_story_points += sp;
                self.remaining_story_points += sp;
            }
            StatusBucket::AwaitingVersioning => {
                self.awaiting_versioning_story_points += sp;
                self.remaining_story_points += sp;
            }
            StatusBucket::InProgress => {
                self.in_progress_story_points += sp;
                self.remaining_story_points += sp;
                self.available_story_points += sp;
            }
            StatusBucket::ToDo => {
                self.to_do_story_points += sp;
                self.remaining_story_points += sp;
                self.available_story_points += sp;
            }
            StatusBucket::Other => {
                self.remaining_story_points += sp;
                self.available_story_points += sp;
            }
        }
    }

    fn finalize(&mut self) {
        self.capacity_used = self.in_progress_story_points + self.to_do_story_points;
        self.capacity_remaining = self.sprint_capacity - self.capacity_used;
        self.utilization = if self.sprint_capacity > 0.0 {
            self.capacity_used / self.sprint_capacity
        } else {
            0.0
        };
        self.allocation_status = if self.capacity_used > self.sprint_capacity {
            AllocationStatus::OverAllocated
        } else if self.capacity_used < self.sprint_capacity * UNDER_ALLOCATED_RATIO {
            AllocationStatus::UnderAllocated
        } else {
            AllocationStatus::OnTrack
        };
    }
}

pub type StatsByAssignee = BTreeMap<String, AssigneeStats>;

pub fn filter_rows(rows: &[Row], filters: &Filters) -> Vec<Row> {
    rows.iter()
        .filter(|row| {
            (filters.sprint_is_all() || field(row, columns::SPRINT) == filters.sprint)
                && (filters.assignee_is_all() || field(row, columns::ASSIGNEE) == filters.assignee)
        })
        .cloned()
        .collect()
}

/// Distinct sprint labels, newest first, preceded by the `all` sentinel.
pub fn sprint_names(rows: &[Row]) -> Vec<String> {
    let set: BTreeSet<&str> = rows
        .iter()
        .map(|row| field(row, columns::SPRINT))
        .filter(|sprint| !sprint.is_empty())
        .collect();
    let mut sprints: Vec<&str> = set.into_iter().collect();
    // Numbered labels first (highest number first), then the rest by
    // descending text.
    sprints.sort_by(|a, b| match (first_number(a), first_number(b)) {
        (Some(na), Some(nb)) => nb.cmp(&na).then_with(|| b.cmp(a)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.cmp(a),
    });
    std::iter::once(ALL.to_string())
        .chain(sprints.into_iter().map(str::to_string))
        .collect()
}

pub fn assignee_names(rows: &[Row]) -> Vec<String> {
    let set: BTreeSet<&str> = rows
        .iter()
        .map(|row| field(row, columns::ASSIGNEE))
        .filter(|assignee| !assignee.is_empty())
        .collect();
    std::iter::once(ALL.to_string())
        .chain(set.into_iter().map(str::to_string))
        .collect()
}

fn first_number(label: &str) -> Option<u64> {
    FIRST_NUMBER
        .captures(label)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Per-assignee counts, story point buckets and capacity figures for the
/// rows that pass the filters.
pub fn compute_assignee_stats(rows: &[Row], config: &DashboardConfig) -> StatsByAssignee {
    let filtered = filter_rows(rows, &config.filters);
    stats_for_rows(&filtered, &config.preferences)
}

/// Same as [`compute_assignee_stats`] for rows that are already filtered.
pub fn stats_for_rows(rows: &[Row], preferences: &Preferences) -> StatsByAssignee {
    let mut stats = StatsByAssignee::new();
    for row in rows {
        let assignee = field_or(row, columns::ASSIGNEE, UNASSIGNED);
        stats
            .entry(assignee.to_string())
            .or_insert_with(|| AssigneeStats::with_capacity(preferences.capacity_for(assignee)))
            .record(row);
    }
    for entry in stats.values_mut() {
        entry.finalize();
    }
    stats
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_sp: f64,
    pub completed_sp: f64,
    pub awaiting_testing_sp: f64,
    pub available_sp: f64,
    /// Rounded percentage of completed story points.
    pub completion_rate: i64,
    pub high_risks: usize,
    pub overloaded_count: usize,
}

pub fn summarize(stats: &StatsByAssignee, risks: &[super::risk::RiskEntry]) -> DashboardSummary {
    let total_sp: f64 = stats.values().map(|s| s.total_story_points).sum();
    let completed_sp: f64 = stats.values().map(|s| s.completed_story_points).sum();
    let completion_rate = if total_sp > 0.0 {
        (completed_sp / total_sp * 100.0).round() as i64
    } else {
        0
    };
    DashboardSummary {
        total_sp,
        completed_sp,
        awaiting_testing_sp: stats.values().map(|s| s.awaiting_testing_story_points).sum(),
        available_sp: stats.values().map(|s| s.available_story_points).sum(),
        completion_rate,
        high_risks: risks
            .iter()
            .filter(|r| r.risk_level == super::risk::RiskLevel::High)
            .count(),
        overloaded_count: stats
            .values()
            .filter(|s| s.allocation_status == AllocationStatus::OverAllocated)
            .count(),
    }
}
