use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::stats::{StatsByAssignee, StatusBucket};
use crate::dates::{days_between, parse_export_date};
use crate::row::{Row, UNASSIGNED, UNKNOWN, columns, field, field_or, story_points};
use crate::sprint_dates::SprintDates;

const OVERLOADED_UTILIZATION_PERCENT: f64 = 200.0;
const DUE_SOON_DAYS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Medium,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::High => "High",
            RiskLevel::Medium => "Medium",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskEntry {
    pub issue_key: String,
    pub project: String,
    pub assignee: String,
    pub risk_level: RiskLevel,
    pub reason: String,
    pub days_late: Option<i64>,
    pub status: String,
    pub sp: f64,
    pub sprint: String,
}

fn plural(count: i64) -> &'static str {
    if count == 1 { "" } else { "s" }
}

/// Target date of an issue: its due date, else its target end, else the end
/// of its sprint.
fn target_date(row: &Row, sprint: &str, sprint_dates: &SprintDates) -> Option<NaiveDate> {
    parse_export_date(field(row, columns::DUE_DATE))
        .or_else(|| parse_export_date(field(row, columns::TARGET_END)))
        .or_else(|| sprint_dates.get(sprint).and_then(|range| range.end_date()))
}

/// Flags overdue work, work held by heavily overloaded assignees and
/// unestimated work due within the next few days. Runs over every row;
/// `stats` only supplies utilisation.
pub fn compute_risk_register(
    rows: &[Row],
    stats: &StatsByAssignee,
    sprint_dates: &SprintDates,
    today: NaiveDate,
) -> Vec<RiskEntry> {
    let utilization: HashMap<&str, f64> = stats
        .iter()
        .map(|(assignee, s)| {
            let percent = if s.sprint_capacity > 0.0 {
                s.total_story_points / s.sprint_capacity * 100.0
            } else {
                0.0
            };
            (assignee.as_str(), percent)
        })
        .collect();

    let mut risks = Vec::new();
    for row in rows {
        let status = field(row, columns::STATUS);
        if StatusBucket::from_status(status) == StatusBucket::Done {
            continue;
        }
        let assignee = field_or(row, columns::ASSIGNEE, UNASSIGNED);
        let sprint = field(row, columns::SPRINT);
        let sp = story_points(row);
        let target = target_date(row, sprint, sprint_dates);
        let days_late = target.map(|date| days_between(date, today));
        let assignee_utilization = utilization.get(assignee).copied().unwrap_or(0.0);

        let flagged = match days_late {
            Some(late) if late > 0 => {
                Some((RiskLevel::High, format!("Overdue by {late} day{}", plural(late))))
            }
            _ if assignee_utilization > OVERLOADED_UTILIZATION_PERCENT => Some((
                RiskLevel::High,
                format!("Assignee at {}% utilization", assignee_utilization.round()),
            )),
            Some(late) if sp == 0.0 && (-DUE_SOON_DAYS..0).contains(&late) => {
                let days = late.abs();
                Some((
                    RiskLevel::Medium,
                    format!("No Story Points - due in {days} day{}", plural(days)),
                ))
            }
            _ => None,
        };

        if let Some((risk_level, reason)) = flagged {
            risks.push(RiskEntry {
                issue_key: field(row, columns::ISSUE_KEY).to_string(),
                project: field_or(row, columns::PROJECT, UNKNOWN).to_string(),
                assignee: assignee.to_string(),
                risk_level,
                reason,
                days_late,
                status: status.to_string(),
                sp,
                sprint: sprint.to_string(),
            });
        }
    }

    risks.sort_by(|a, b| {
        a.risk_level
            .cmp(&b.risk_level)
            .then_with(|| b.days_late.unwrap_or(0).cmp(&a.days_late.unwrap_or(0)))
    });
    risks
}
