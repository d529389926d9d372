use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::Preferences;
use crate::dates::days_between;
use crate::row::{ALL, NO_SPRINT, Row, UNKNOWN, columns, field, field_or, story_points};
use crate::sprint_dates::SprintDates;

const EARLY_THRESHOLD_DAYS: i64 = 14;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintTimeline {
    pub start_date: String,
    pub end_date: String,
    pub elapsed_days: i64,
    pub total_days: i64,
    pub days_remaining: i64,
    pub percent_time_elapsed: i64,
    pub is_configured: bool,
}

/// Elapsed/remaining day counts for the selected sprint. The configured day
/// count, when set, replaces the calendar length of the sprint.
pub fn compute_sprint_timeline(
    sprint: &str,
    sprint_dates: &SprintDates,
    preferences: &Preferences,
    today: NaiveDate,
) -> Option<SprintTimeline> {
    if sprint == ALL {
        return None;
    }
    let range = sprint_dates.get(sprint)?;
    let start = range.start_date()?;
    let end = range.end_date()?;

    let default_days = days_between(start, end) + 1;
    let configured = preferences.sprint_days_for(sprint);
    let total_days = configured.map(i64::from).unwrap_or(default_days).max(1);

    let days_since_start = days_between(start, today);
    let elapsed_days = (days_since_start + 1).min(total_days).max(1);
    let days_remaining = (total_days - elapsed_days + 1).max(0);
    let percent = (elapsed_days as f64 / total_days as f64 * 100.0).round() as i64;

    Some(SprintTimeline {
        start_date: range.start.clone(),
        end_date: range.end.clone(),
        elapsed_days,
        total_days,
        days_remaining,
        percent_time_elapsed: percent.clamp(0, 100),
        is_configured: configured.is_some(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MilestoneStatus {
    Complete,
    Delayed,
    Behind,
    #[serde(rename = "At Risk")]
    AtRisk,
    #[serde(rename = "On Track")]
    OnTrack,
}

impl MilestoneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MilestoneStatus::Complete => "Complete",
            MilestoneStatus::Delayed => "Delayed",
            MilestoneStatus::Behind => "Behind",
            MilestoneStatus::AtRisk => "At Risk",
            MilestoneStatus::OnTrack => "On Track",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub project: String,
    pub sprint: String,
    /// Sprint end as `MM/DD/YYYY`, `None` when the sprint label has no dates.
    pub target_end: Option<String>,
    #[serde(rename = "totalSP")]
    pub total_sp: f64,
    #[serde(rename = "completedSP")]
    pub completed_sp: f64,
    pub percent_complete: i64,
    pub days_remaining: Option<i64>,
    pub status: MilestoneStatus,
}

struct MilestoneAcc {
    project: String,
    sprint: String,
    total_sp: f64,
    completed_sp: f64,
    items: u32,
    done_items: u32,
}

fn rounded_percent(part: f64, whole: f64) -> i64 {
    (part / whole * 100.0).round() as i64
}

/// One milestone per (project, sprint) pair, in first-seen order. Rows
/// without a sprint, or in `No Sprint`, are ignored.
pub fn compute_milestones(rows: &[Row], sprint_dates: &SprintDates, today: NaiveDate) -> Vec<Milestone> {
    let mut accs: Vec<MilestoneAcc> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    for row in rows {
        let sprint = field(row, columns::SPRINT);
        if sprint.is_empty() || sprint == NO_SPRINT {
            continue;
        }
        let project = field_or(row, columns::PROJECT, UNKNOWN);
        let slot = *index
            .entry((project.to_string(), sprint.to_string()))
            .or_insert_with(|| {
                accs.push(MilestoneAcc {
                    project: project.to_string(),
                    sprint: sprint.to_string(),
                    total_sp: 0.0,
                    completed_sp: 0.0,
                    items: 0,
                    done_items: 0,
                });
                accs.len() - 1
            });
        let acc = &mut accs[slot];
        let done = field(row, columns::STATUS) == "Done";
        acc.items += 1;
        if done {
            acc.done_items += 1;
        }
        let sp = story_points(row);
        if sp > 0.0 {
            acc.total_sp += sp;
            if done {
                acc.completed_sp += sp;
            }
        }
    }

    accs.into_iter()
        .map(|acc| {
            let range = sprint_dates.get(&acc.sprint);
            let percent_complete = if acc.total_sp > 0.0 {
                rounded_percent(acc.completed_sp, acc.total_sp)
            } else if acc.items > 0 {
                rounded_percent(f64::from(acc.done_items), f64::from(acc.items))
            } else {
                0
            };
            let days_remaining = range
                .and_then(|r| r.end_date())
                .map(|end| days_between(today, end));
            let status = if percent_complete >= 100 {
                MilestoneStatus::Complete
            } else if days_remaining.is_some_and(|days| days < 0) {
                MilestoneStatus::Delayed
            } else if percent_complete < 50 {
                MilestoneStatus::Behind
            } else if percent_complete < 75 {
                MilestoneStatus::AtRisk
            } else {
                MilestoneStatus::OnTrack
            };
            Milestone {
                project: acc.project,
                sprint: acc.sprint,
                target_end: range.map(|r| r.end.clone()),
                total_sp: acc.total_sp,
                completed_sp: acc.completed_sp,
                percent_complete,
                days_remaining,
                status,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    Delayed,
    Early,
    #[serde(rename = "On Track")]
    OnTrack,
    Complete,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Delayed => "Delayed",
            DeliveryStatus::Early => "Early",
            DeliveryStatus::OnTrack => "On Track",
            DeliveryStatus::Complete => "Complete",
        }
    }

    fn sort_order(&self) -> u8 {
        match self {
            DeliveryStatus::Delayed => 0,
            DeliveryStatus::Early => 1,
            DeliveryStatus::OnTrack => 2,
            DeliveryStatus::Complete => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTimeline {
    pub project: String,
    pub sprints: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(rename = "totalSP")]
    pub total_sp: f64,
    #[serde(rename = "completedSP")]
    pub completed_sp: f64,
    pub items: u32,
    pub done_items: u32,
    pub percent_complete: i64,
    /// Custom project target when one is configured, else `end_date`.
    pub target_end_date: NaiveDate,
    pub days_to_target: i64,
    pub status: DeliveryStatus,
    /// Set only when a program end date is configured.
    pub past_program_end: Option<bool>,
}

struct ProjectAcc {
    project: String,
    sprints: BTreeSet<String>,
    total_sp: f64,
    completed_sp: f64,
    items: u32,
    done_items: u32,
}

/// Delivery window of each project derived from the dates of the sprints
/// its issues ran in. Projects with no dated sprint are left out. Delayed
/// projects first, then early, on track and complete; ties by end date.
pub fn compute_project_timelines(
    rows: &[Row],
    sprint_dates: &SprintDates,
    preferences: &Preferences,
    today: NaiveDate,
) -> Vec<ProjectTimeline> {
    let mut accs: Vec<ProjectAcc> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for row in rows {
        let project = field_or(row, columns::PROJECT, UNKNOWN);
        let slot = *index.entry(project.to_string()).or_insert_with(|| {
            accs.push(ProjectAcc {
                project: project.to_string(),
                sprints: BTreeSet::new(),
                total_sp: 0.0,
                completed_sp: 0.0,
                items: 0,
                done_items: 0,
            });
            accs.len() - 1
        });
        let acc = &mut accs[slot];
        let sprint = field(row, columns::SPRINT);
        if !sprint.is_empty() {
            acc.sprints.insert(sprint.to_string());
        }
        let sp = story_points(row);
        acc.total_sp += sp;
        acc.items += 1;
        if field(row, columns::STATUS) == "Done" {
            acc.completed_sp += sp;
            acc.done_items += 1;
        }
    }

    let mut timelines: Vec<ProjectTimeline> = accs
        .into_iter()
        .filter_map(|acc| {
            let ranges: Vec<(NaiveDate, NaiveDate)> = acc
                .sprints
                .iter()
                .filter_map(|sprint| sprint_dates.get(sprint))
                .filter_map(|range| Some((range.start_date()?, range.end_date()?)))
                .collect();
            let start_date = ranges.iter().map(|(start, _)| *start).min()?;
            let end_date = ranges.iter().map(|(_, end)| *end).max()?;

            let percent_complete = if acc.total_sp > 0.0 {
                rounded_percent(acc.completed_sp, acc.total_sp)
            } else if acc.items > 0 {
                rounded_percent(f64::from(acc.done_items), f64::from(acc.items))
            } else {
                0
            };
            let target_end_date = preferences
                .project_targets
                .get(&acc.project)
                .copied()
                .unwrap_or(end_date);
            let days_to_target = days_between(today, target_end_date);
            let status = if percent_complete >= 100 {
                DeliveryStatus::Complete
            } else if days_to_target < 0 {
                DeliveryStatus::Delayed
            } else if days_to_target > EARLY_THRESHOLD_DAYS {
                DeliveryStatus::Early
            } else {
                DeliveryStatus::OnTrack
            };
            let past_program_end = preferences
                .program_end_date
                .map(|program_end| target_end_date > program_end);

            Some(ProjectTimeline {
                project: acc.project,
                sprints: acc.sprints.into_iter().collect(),
                start_date,
                end_date,
                total_sp: acc.total_sp,
                completed_sp: acc.completed_sp,
                items: acc.items,
                done_items: acc.done_items,
                percent_complete,
                target_end_date,
                days_to_target,
                status,
                past_program_end,
            })
        })
        .collect();

    timelines.sort_by(|a, b| {
        a.status
            .sort_order()
            .cmp(&b.status.sort_order())
            .then_with(|| a.end_date.cmp(&b.end_date))
    });
    timelines
}
