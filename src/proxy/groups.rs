use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::client::WorkItem;
use crate::row::{UNKNOWN, parse_number};

pub const DEFAULT_COMPLETED_STATES: &[&str] = &["Done", "Closed", "Resolved", "Completed"];

const AREA_PATH_FIELD: &str = "System.AreaPath";
const TEAM_PROJECT_FIELD: &str = "System.TeamProject";
const STATE_FIELD: &str = "System.State";
const STORY_POINTS_FIELD: &str = "Microsoft.VSTS.Scheduling.StoryPoints";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupBy {
    #[default]
    AreaPath,
    Project,
}

impl GroupBy {
    /// Anything other than `Project` groups by area path.
    pub fn from_label(label: &str) -> Self {
        if label == "Project" {
            GroupBy::Project
        } else {
            GroupBy::AreaPath
        }
    }

    fn field(self) -> &'static str {
        match self {
            GroupBy::AreaPath => AREA_PATH_FIELD,
            GroupBy::Project => TEAM_PROJECT_FIELD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressGroup {
    pub key: String,
    pub items_count: usize,
    pub completed_count: usize,
    #[serde(rename = "totalSP")]
    pub total_sp: f64,
    #[serde(rename = "completedSP")]
    pub completed_sp: f64,
    pub percent: f64,
}

fn item_story_points(item: &WorkItem) -> f64 {
    match item.fields.get(STORY_POINTS_FIELD) {
        Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
        Some(Value::String(text)) => parse_number(text),
        _ => 0.0,
    }
}

/// Buckets work items and sorts the buckets by total story points,
/// largest first. Ties keep first-seen order.
pub fn aggregate_groups(
    items: &[WorkItem],
    group_by: GroupBy,
    completed_states: &[String],
) -> Vec<ProgressGroup> {
    let completed: HashSet<String> = completed_states
        .iter()
        .map(|state| state.to_lowercase())
        .collect();

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<ProgressGroup> = Vec::new();
    for item in items {
        let key = item
            .field_str(group_by.field())
            .filter(|value| !value.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string();
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(ProgressGroup {
                key,
                items_count: 0,
                completed_count: 0,
                total_sp: 0.0,
                completed_sp: 0.0,
                percent: 0.0,
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        let sp = item_story_points(item);
        group.items_count += 1;
        group.total_sp += sp;
        let state = item.field_str(STATE_FIELD).unwrap_or_default().to_lowercase();
        if completed.contains(&state) {
            group.completed_sp += sp;
            group.completed_count += 1;
        }
    }

    for group in &mut groups {
        group.percent = if group.total_sp > 0.0 {
            (group.completed_sp / group.total_sp * 100.0).min(100.0)
        } else {
            0.0
        };
    }
    groups.sort_by(|a, b| b.total_sp.total_cmp(&a.total_sp));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(id: i64, fields: Value) -> WorkItem {
        WorkItem {
            id,
            fields: fields.as_object().cloned().unwrap_or_default(),
        }
    }

    fn defaults() -> Vec<String> {
        DEFAULT_COMPLETED_STATES.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn groups_by_area_path_and_sorts_by_points() {
        let items = vec![
            item(1, json!({"System.AreaPath": "Web", "System.State": "Done", "Microsoft.VSTS.Scheduling.StoryPoints": 3})),
            item(2, json!({"System.AreaPath": "Api", "System.State": "Active", "Microsoft.VSTS.Scheduling.StoryPoints": 8})),
            item(3, json!({"System.AreaPath": "Web", "System.State": "closed", "Microsoft.VSTS.Scheduling.StoryPoints": "2"})),
        ];
        let groups = aggregate_groups(&items, GroupBy::AreaPath, &defaults());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "Api");
        assert_eq!(groups[0].percent, 0.0);
        assert_eq!(groups[1].key, "Web");
        assert_eq!(groups[1].items_count, 2);
        assert_eq!(groups[1].completed_count, 2);
        assert_eq!(groups[1].total_sp, 5.0);
        assert_eq!(groups[1].percent, 100.0);
    }

    #[test]
    fn missing_group_field_falls_back_to_unknown() {
        let items = vec![item(7, json!({"System.State": "New"}))];
        let groups = aggregate_groups(&items, GroupBy::Project, &defaults());
        assert_eq!(groups[0].key, "Unknown");
        assert_eq!(groups[0].total_sp, 0.0);
        assert_eq!(groups[0].percent, 0.0);
    }
}
