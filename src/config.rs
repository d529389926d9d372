use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::row::ALL;

pub const DEFAULT_SPRINT_CAPACITY: f64 = 16.0;

/// User-editable settings that feed the aggregations. Everything here is
/// persisted through a [`crate::preferences::PreferenceStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub assignee_caps: HashMap<String, f64>,
    #[serde(default)]
    pub sprint_days_config: HashMap<String, u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub project_targets: HashMap<String, NaiveDate>,
}

impl Preferences {
    /// Configured capacity for `assignee`; unset or zero falls back to
    /// [`DEFAULT_SPRINT_CAPACITY`].
    pub fn capacity_for(&self, assignee: &str) -> f64 {
        match self.assignee_caps.get(assignee) {
            Some(cap) if *cap != 0.0 && cap.is_finite() => *cap,
            _ => DEFAULT_SPRINT_CAPACITY,
        }
    }

    pub fn sprint_days_for(&self, sprint: &str) -> Option<u32> {
        self.sprint_days_config
            .get(sprint)
            .copied()
            .filter(|days| *days > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    pub sprint: String,
    pub assignee: String,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            sprint: ALL.to_string(),
            assignee: ALL.to_string(),
        }
    }
}

impl Filters {
    pub fn sprint_is_all(&self) -> bool {
        self.sprint == ALL
    }

    pub fn assignee_is_all(&self) -> bool {
        self.assignee == ALL
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Immutable input to every aggregation: the persisted preferences, the
/// active filters and the date the views are computed against.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub preferences: Preferences,
    pub filters: Filters,
    pub today: NaiveDate,
}

impl DashboardConfig {
    pub fn new(preferences: Preferences, filters: Filters, today: NaiveDate) -> Self {
        Self {
            preferences,
            filters,
            today,
        }
    }
}
