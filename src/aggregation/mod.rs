pub mod progress;
pub mod risk;
pub mod stats;
pub mod timeline;

use serde::Serialize;

use crate::config::DashboardConfig;
use crate::row::Row;
use crate::sprint_dates::SprintDates;

pub use progress::{ProjectProgress, compute_project_progress, compute_sprint_project_progress};
pub use risk::{RiskEntry, RiskLevel, compute_risk_register};
pub use stats::{
    AllocationStatus, AssigneeStats, DashboardSummary, StatsByAssignee, assignee_names,
    compute_assignee_stats, filter_rows, sprint_names, summarize,
};
pub use timeline::{
    DeliveryStatus, Milestone, MilestoneStatus, ProjectTimeline, SprintTimeline,
    compute_milestones, compute_project_timelines, compute_sprint_timeline,
};

/// Every derived view of one dataset under one configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardViews {
    pub sprints: Vec<String>,
    pub assignees: Vec<String>,
    pub filtered_rows: usize,
    pub stats: StatsByAssignee,
    pub summary: DashboardSummary,
    pub sprint_timeline: Option<SprintTimeline>,
    pub risks: Vec<RiskEntry>,
    pub milestones: Vec<Milestone>,
    pub project_progress: Vec<ProjectProgress>,
    pub timelines: Vec<ProjectTimeline>,
}

/// Recomputes all views from scratch; nothing is cached between calls.
pub fn compute_views(rows: &[Row], sprint_dates: &SprintDates, config: &DashboardConfig) -> DashboardViews {
    let filtered = filter_rows(rows, &config.filters);
    let stats = stats::stats_for_rows(&filtered, &config.preferences);
    let risks = compute_risk_register(rows, &stats, sprint_dates, config.today);
    let summary = summarize(&stats, &risks);
    DashboardViews {
        sprints: sprint_names(rows),
        assignees: assignee_names(rows),
        filtered_rows: filtered.len(),
        sprint_timeline: compute_sprint_timeline(
            &config.filters.sprint,
            sprint_dates,
            &config.preferences,
            config.today,
        ),
        milestones: compute_milestones(rows, sprint_dates, config.today),
        project_progress: compute_project_progress(rows, &filtered, &config.filters),
        timelines: compute_project_timelines(rows, sprint_dates, &config.preferences, config.today),
        risks,
        summary,
        stats,
    }
}
