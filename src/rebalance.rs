use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::aggregation::StatsByAssignee;
use crate::merge::merge_move_candidates;
use crate::row::Row;

/// Capacity assumed by the advisor for an assignee with no (or zero) capacity.
pub const DEFAULT_ADVISOR_CAPACITY: f64 = 14.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceSuggestion {
    pub id: String,
    pub from: String,
    pub to: String,
    pub sp: f64,
    pub summary: String,
    pub project: String,
    pub parent: Option<String>,
    pub is_subtask: bool,
    pub eligible_candidates: Vec<String>,
    /// Same as `eligible_candidates`: no assignee/project mapping restricts
    /// who may receive work.
    pub allowed_candidates: Vec<String>,
}

/// A candidate issue the advisor could not place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rejection {
    pub id: String,
    pub from: String,
    pub sp: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RebalancePlan {
    pub suggestions: Vec<RebalanceSuggestion>,
    pub rejections: Vec<Rejection>,
}

struct Overflow<'a> {
    assignee: &'a str,
    overflow: f64,
}

struct Slack<'a> {
    assignee: &'a str,
    slack: f64,
}

pub fn compute_suggestions(rows: &[Row], stats: &StatsByAssignee) -> Vec<RebalanceSuggestion> {
    compute_suggestions_detailed(rows, stats).suggestions
}

/// Greedy single pass that proposes whole-issue moves from over-capacity
/// assignees to under-capacity ones.
///
/// Over-capacity assignees are visited largest overflow first; each one's
/// issues largest first. An issue goes to the first under-capacity assignee
/// whose slack covers it entirely; that list is ordered by slack, largest
/// first, once before the pass and not re-sorted as slack is used up.
/// Equal overflow or slack keeps assignee-name order.
pub fn compute_suggestions_detailed(rows: &[Row], stats: &StatsByAssignee) -> RebalancePlan {
    let items = merge_move_candidates(rows);

    let mut over: Vec<Overflow> = Vec::new();
    let mut under: Vec<Slack> = Vec::new();
    for (assignee, entry) in stats {
        let capacity = if entry.sprint_capacity != 0.0 && entry.sprint_capacity.is_finite() {
            entry.sprint_capacity
        } else {
            DEFAULT_ADVISOR_CAPACITY
        };
        let diff = entry.capacity_used - capacity;
        if diff > 0.0 {
            over.push(Overflow {
                assignee: assignee.as_str(),
                overflow: diff,
            });
        } else if diff < 0.0 {
            under.push(Slack {
                assignee: assignee.as_str(),
                slack: -diff,
            });
        }
    }
    over.sort_by(|a, b| b.overflow.total_cmp(&a.overflow));
    under.sort_by(|a, b| b.slack.total_cmp(&a.slack));

    let mut plan = RebalancePlan::default();
    let mut already_suggested: HashSet<&str> = HashSet::new();

    for source in &mut over {
        let mut candidates: Vec<_> = items
            .iter()
            .filter(|item| item.assignee == source.assignee && item.sp > 0.0)
            .collect();
        candidates.sort_by(|a, b| b.sp.total_cmp(&a.sp));

        for candidate in candidates {
            if already_suggested.contains(candidate.id.as_str()) {
                continue;
            }
            let eligible: Vec<String> = under
                .iter()
                .filter(|u| u.slack >= candidate.sp)
                .map(|u| u.assignee.to_string())
                .collect();
            let Some(target_idx) = under.iter().position(|u| u.slack >= candidate.sp) else {
                plan.rejections.push(Rejection {
                    id: candidate.id.clone(),
                    from: source.assignee.to_string(),
                    sp: candidate.sp,
                    reason: "no under-capacity assignee has enough slack".to_string(),
                });
                continue;
            };

            let target = &mut under[target_idx];
            plan.suggestions.push(RebalanceSuggestion {
                id: candidate.id.clone(),
                from: source.assignee.to_string(),
                to: target.assignee.to_string(),
                sp: candidate.sp,
                summary: candidate.summary.clone(),
                project: candidate.project.clone(),
                parent: candidate.parent.clone(),
                is_subtask: candidate.is_subtask,
                allowed_candidates: eligible.clone(),
                eligible_candidates: eligible,
            });
            already_suggested.insert(candidate.id.as_str());
            target.slack -= candidate.sp;
            source.overflow -= candidate.sp;
            if target.slack <= 0.0 {
                under.remove(target_idx);
            }
            if source.overflow <= 0.0 {
                break;
            }
        }
    }

    tracing::debug!(
        suggestions = plan.suggestions.len(),
        rejections = plan.rejections.len(),
        "computed rebalance suggestions"
    );
    plan
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatIfProjection {
    #[serde(rename = "totalSP")]
    pub total_sp: f64,
    #[serde(rename = "completedSP")]
    pub completed_sp: f64,
    pub current_capacity: f64,
    pub projected_capacity: f64,
    /// Percentage, capped at 100; zero when there are no story points.
    pub projected_completion: f64,
}

/// Projects completion if every assignee's capacity were scaled by
/// `multiplier`; only capacity beyond what is already committed counts.
pub fn compute_what_if_projection(stats: &StatsByAssignee, multiplier: f64) -> WhatIfProjection {
    let total_sp: f64 = stats.values().map(|s| s.total_story_points).sum();
    let completed_sp: f64 = stats.values().map(|s| s.completed_story_points).sum();
    let current_capacity: f64 = stats.values().map(|s| s.sprint_capacity).sum();
    let projected_capacity: f64 = stats.values().map(|s| s.sprint_capacity * multiplier).sum();
    let current_used: f64 = stats.values().map(|s| s.capacity_used).sum();

    let additional = (projected_capacity - current_used).max(0.0);
    let projected_completion = if total_sp > 0.0 {
        ((completed_sp + additional) / total_sp * 100.0).min(100.0)
    } else {
        0.0
    };
    WhatIfProjection {
        total_sp,
        completed_sp,
        current_capacity,
        projected_capacity,
        projected_completion,
    }
}
