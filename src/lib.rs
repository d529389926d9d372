pub mod aggregation;
pub mod config;
pub mod dashboard;
pub mod dates;
pub mod error;
pub mod logging;
pub mod merge;
pub mod parser;
pub mod preferences;
pub mod rebalance;
pub mod row;
pub mod sprint_dates;

#[cfg(feature = "http_api")]
pub mod proxy;

pub use aggregation::{
    AssigneeStats, DashboardSummary, DashboardViews, ProjectProgress, RiskEntry, StatsByAssignee,
    compute_assignee_stats, compute_project_progress, compute_risk_register,
    compute_sprint_project_progress, compute_views,
};
pub use config::{DashboardConfig, Filters, Preferences};
pub use dashboard::Dashboard;
pub use error::{DashboardError, DashboardResult};
pub use parser::{Delimiter, ParsedExport, parse, parse_export};
pub use preferences::{
    JsonFilePreferenceStore, MemoryPreferenceStore, PreferenceError, PreferenceStore,
    load_preferences, save_preferences,
};
pub use rebalance::{
    RebalancePlan, RebalanceSuggestion, WhatIfProjection, compute_suggestions,
    compute_suggestions_detailed, compute_what_if_projection,
};
pub use row::Row;
