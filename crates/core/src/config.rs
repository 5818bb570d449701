//! Transformer configuration.
//!
//! The configuration is a plain serde structure so it can be read from TOML
//! or JSON. Every field besides the three required column names has a
//! default.

use crate::color::PaletteName;
use crate::error::{Error, Result};
use crate::sort::SortCriterion;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default cap on the number of displayed tasks.
pub const DEFAULT_MAX_TASKS: usize = 1000;

/// What to do with rows whose identifier was already used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateIdHandling {
    /// Keep every row, suffixing repeats with `_1`, `_2`, ...
    #[default]
    Rename,
    /// Keep only the first row with a given identifier
    Skip,
}

impl fmt::Display for DuplicateIdHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rename => write!(f, "rename"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

impl FromStr for DuplicateIdHandling {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rename" => Ok(Self::Rename),
            "skip" => Ok(Self::Skip),
            _ => Err(format!(
                "Invalid duplicate id handling: {s}. Expected one of: rename, skip"
            )),
        }
    }
}

/// Configuration for one transformation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskTransformerConfig {
    /// Column holding the task identifier
    pub id_column: String,

    /// Column holding the start date
    pub start_column: String,

    /// Column holding the end date
    pub end_column: String,

    /// Column holding the display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_column: Option<String>,

    /// Column holding completion percentage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_column: Option<String>,

    /// Column holding comma-separated prerequisite identifiers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies_column: Option<String>,

    /// Categorical column driving bar colours
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_column: Option<String>,

    /// Palette used for the colour column
    #[serde(default)]
    pub color_palette: PaletteName,

    /// Hex colours for the custom palette
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_colors: Vec<String>,

    /// Extra columns copied onto each task for tooltips
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tooltip_columns: Vec<String>,

    /// Grouping columns, outermost first
    #[serde(default, alias = "groupBy", skip_serializing_if = "Vec::is_empty")]
    pub group_by_columns: Vec<String>,

    /// Sort applied to the whole list, or within each leaf group
    #[serde(default)]
    pub sort_by: SortCriterion,

    /// Maximum tasks in the output; 0 means unlimited
    #[serde(default = "default_max_tasks")]
    pub max_tasks: usize,

    /// Rename or drop repeated identifiers
    #[serde(default)]
    pub duplicate_id_handling: DuplicateIdHandling,

    /// Escape identifier characters that are not safe in CSS selectors
    #[serde(default = "default_css_safe_ids")]
    pub css_safe_ids: bool,

    /// Date against which expected progress is computed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_date: Option<NaiveDate>,
}

const fn default_max_tasks() -> usize {
    DEFAULT_MAX_TASKS
}

const fn default_css_safe_ids() -> bool {
    true
}

impl TaskTransformerConfig {
    /// Configuration with the required columns and every default.
    pub fn new(
        id_column: impl Into<String>,
        start_column: impl Into<String>,
        end_column: impl Into<String>,
    ) -> Self {
        Self {
            id_column: id_column.into(),
            start_column: start_column.into(),
            end_column: end_column.into(),
            name_column: None,
            progress_column: None,
            dependencies_column: None,
            color_column: None,
            color_palette: PaletteName::default(),
            custom_colors: Vec::new(),
            tooltip_columns: Vec::new(),
            group_by_columns: Vec::new(),
            sort_by: SortCriterion::default(),
            max_tasks: DEFAULT_MAX_TASKS,
            duplicate_id_handling: DuplicateIdHandling::default(),
            css_safe_ids: true,
            reference_date: None,
        }
    }

    /// Column holding the display name.
    #[must_use]
    pub fn with_name_column(mut self, column: impl Into<String>) -> Self {
        self.name_column = Some(column.into());
        self
    }

    /// Column holding completion percentages.
    #[must_use]
    pub fn with_progress_column(mut self, column: impl Into<String>) -> Self {
        self.progress_column = Some(column.into());
        self
    }

    /// Column holding comma-separated prerequisite ids.
    #[must_use]
    pub fn with_dependencies_column(mut self, column: impl Into<String>) -> Self {
        self.dependencies_column = Some(column.into());
        self
    }

    /// Categorical column that drives bar colours.
    #[must_use]
    pub fn with_color_column(mut self, column: impl Into<String>) -> Self {
        self.color_column = Some(column.into());
        self
    }

    /// Built-in palette for the colour column.
    #[must_use]
    pub const fn with_palette(mut self, palette: PaletteName) -> Self {
        self.color_palette = palette;
        self
    }

    /// Use the custom palette with the given hex colours.
    #[must_use]
    pub fn with_custom_colors<I, S>(mut self, colors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.color_palette = PaletteName::Custom;
        self.custom_colors = colors.into_iter().map(Into::into).collect();
        self
    }

    /// Extra columns copied into each task's tooltip data.
    #[must_use]
    pub fn with_tooltip_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tooltip_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Columns to group by, outermost first.
    #[must_use]
    pub fn with_group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Order applied to the tasks, within each group when grouping.
    #[must_use]
    pub const fn with_sort_by(mut self, criterion: SortCriterion) -> Self {
        self.sort_by = criterion;
        self
    }

    /// Cap on displayed tasks. Zero disables the cap.
    #[must_use]
    pub const fn with_max_tasks(mut self, max_tasks: usize) -> Self {
        self.max_tasks = max_tasks;
        self
    }

    /// What to do with rows whose id is already taken.
    #[must_use]
    pub const fn with_duplicate_id_handling(mut self, handling: DuplicateIdHandling) -> Self {
        self.duplicate_id_handling = handling;
        self
    }

    /// Escape ids so they are usable as CSS identifiers.
    #[must_use]
    pub const fn with_css_safe_ids(mut self, enabled: bool) -> Self {
        self.css_safe_ids = enabled;
        self
    }

    /// Date used to compute expected progress.
    #[must_use]
    pub const fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// Configured name column, ignoring blank names.
    #[must_use]
    pub fn name_column(&self) -> Option<&str> {
        non_blank(self.name_column.as_ref())
    }

    /// Configured progress column, ignoring blank names.
    #[must_use]
    pub fn progress_column(&self) -> Option<&str> {
        non_blank(self.progress_column.as_ref())
    }

    /// Configured dependencies column, ignoring blank names.
    #[must_use]
    pub fn dependencies_column(&self) -> Option<&str> {
        non_blank(self.dependencies_column.as_ref())
    }

    /// Configured colour column, ignoring blank names.
    #[must_use]
    pub fn color_column(&self) -> Option<&str> {
        non_blank(self.color_column.as_ref())
    }

    /// The three required column names, in id/start/end order.
    #[must_use]
    pub fn required_columns(&self) -> [&str; 3] {
        [&self.id_column, &self.start_column, &self.end_column]
    }

    /// Configured optional single-value columns.
    pub fn optional_columns(&self) -> impl Iterator<Item = &str> {
        [
            self.name_column(),
            self.progress_column(),
            self.dependencies_column(),
            self.color_column(),
        ]
        .into_iter()
        .flatten()
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] when a required column name is
    /// blank or a tooltip or grouping list contains a blank name.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("idColumn", &self.id_column),
            ("startColumn", &self.start_column),
            ("endColumn", &self.end_column),
        ] {
            if value.trim().is_empty() {
                return Err(Error::invalid_configuration(format!(
                    "{field} must not be empty"
                )));
            }
        }

        for (field, columns) in [
            ("tooltipColumns", &self.tooltip_columns),
            ("groupByColumns", &self.group_by_columns),
        ] {
            if columns.iter().any(|c| c.trim().is_empty()) {
                return Err(Error::invalid_configuration(format!(
                    "{field} must not contain empty column names"
                )));
            }
        }

        Ok(())
    }
}

fn non_blank(column: Option<&String>) -> Option<&str> {
    column.map(|c| c.trim()).filter(|c| !c.is_empty())
}
