use std::fs;
use std::path::Path;

use chrono::NaiveDate;

use crate::aggregation::{self, DashboardViews, StatsByAssignee};
use crate::config::{DashboardConfig, Filters, Preferences};
use crate::error::{DashboardError, DashboardResult};
use crate::parser::{self, Delimiter, ParsedExport};
use crate::rebalance::{self, RebalancePlan, WhatIfProjection};

pub const ACCEPTED_EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];

/// One analyst's session: the uploaded export, the saved preferences and
/// the active filters. Every view is recomputed on demand.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    export: ParsedExport,
    preferences: Preferences,
    filters: Filters,
}

impl Dashboard {
    pub fn new(preferences: Preferences) -> Self {
        Self {
            export: ParsedExport::default(),
            preferences,
            filters: Filters::default(),
        }
    }

    pub fn export(&self) -> &ParsedExport {
        &self.export
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn preferences_mut(&mut self) -> &mut Preferences {
        &mut self.preferences
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn has_data(&self) -> bool {
        !self.export.is_empty()
    }

    /// Replaces the dataset with the parsed contents of `path`. A file that
    /// cannot be read leaves the current dataset untouched; a file that
    /// cannot be parsed loads as an empty dataset.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> DashboardResult<usize> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(DashboardError::UnsupportedFile(path.display().to_string()));
        }
        let bytes = fs::read(path).map_err(|source| {
            tracing::error!(path = %path.display(), error = %source, "failed to read export");
            DashboardError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(self.load_text(&text))
    }

    pub fn load_text(&mut self, text: &str) -> usize {
        self.export = parser::parse_export(text);
        self.filters.reset();
        tracing::info!(rows = self.export.rows.len(), "loaded export");
        self.export.rows.len()
    }

    /// Drops the dataset and filters but keeps the preferences.
    pub fn clear(&mut self) {
        self.export = ParsedExport::default();
        self.filters.reset();
    }

    pub fn set_sprint_filter(&mut self, sprint: impl Into<String>) {
        self.filters.sprint = sprint.into();
    }

    pub fn set_assignee_filter(&mut self, assignee: impl Into<String>) {
        self.filters.assignee = assignee.into();
    }

    pub fn reset_filters(&mut self) {
        self.filters.reset();
    }

    pub fn set_capacity(&mut self, assignee: impl Into<String>, story_points: f64) {
        self.preferences
            .assignee_caps
            .insert(assignee.into(), story_points);
    }

    /// Overrides the day count of a sprint; zero removes the override.
    pub fn set_sprint_days(&mut self, sprint: impl Into<String>, days: u32) {
        let sprint = sprint.into();
        if days == 0 {
            self.preferences.sprint_days_config.remove(&sprint);
        } else {
            self.preferences.sprint_days_config.insert(sprint, days);
        }
    }

    pub fn set_program_end_date(&mut self, date: Option<NaiveDate>) {
        self.preferences.program_end_date = date;
    }

    pub fn set_project_target(&mut self, project: impl Into<String>, date: Option<NaiveDate>) {
        let project = project.into();
        match date {
            Some(date) => {
                self.preferences.project_targets.insert(project, date);
            }
            None => {
                self.preferences.project_targets.remove(&project);
            }
        }
    }

    pub fn config(&self, today: NaiveDate) -> DashboardConfig {
        DashboardConfig::new(self.preferences.clone(), self.filters.clone(), today)
    }

    pub fn views(&self, today: NaiveDate) -> DashboardViews {
        aggregation::compute_views(&self.export.rows, &self.export.sprint_dates, &self.config(today))
    }

    pub fn stats(&self, today: NaiveDate) -> StatsByAssignee {
        aggregation::compute_assignee_stats(&self.export.rows, &self.config(today))
    }

    /// Suggestions over the filtered rows, matching the stats they are
    /// computed from.
    pub fn rebalance(&self, today: NaiveDate) -> RebalancePlan {
        let filtered = aggregation::filter_rows(&self.export.rows, &self.filters);
        rebalance::compute_suggestions_detailed(&filtered, &self.stats(today))
    }

    pub fn what_if(&self, today: NaiveDate, multiplier: f64) -> WhatIfProjection {
        rebalance::compute_what_if_projection(&self.stats(today), multiplier)
    }

    /// Writes the filtered rows, in their original column order.
    pub fn export_rows<P: AsRef<Path>>(&self, path: P, delimiter: Delimiter) -> DashboardResult<usize> {
        let filtered = aggregation::filter_rows(&self.export.rows, &self.filters);
        let file = fs::File::create(path.as_ref()).map_err(|source| DashboardError::Write {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        parser::write_rows(file, &self.export.headers, &filtered, delimiter)?;
        Ok(filtered.len())
    }
}

/// Parses a `YYYY-MM-DD` argument.
pub fn parse_date_arg(input: &str) -> DashboardResult<NaiveDate> {
    crate::dates::parse_iso(input).ok_or_else(|| DashboardError::InvalidDate(input.to_string()))
}
