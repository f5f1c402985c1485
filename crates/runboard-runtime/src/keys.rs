//! Key discovery
//!
//! Derives the keys a client can filter, sort, group and plot by from the
//! current run set, and picks which config and summary keys get their own
//! table column.

use crate::grouping::Grouping;
use runboard_core::run::RUN_FIELDS;
use runboard_core::{Run, RunKey, Section};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Fixed leading columns of the run table
pub const LEADING_COLUMNS: &[&str] = &["Select", "Description"];
/// Column shown when a subgroup key is set
pub const SUBGROUP_COLUMN: &str = "Subgroup";
/// Fixed columns between the leading ones and the data columns
pub const TIME_COLUMNS: &[&str] = &["Ran", "Runtime"];

/// Keys available in one section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySuggestion {
    pub section: Section,
    pub suggestions: Vec<RunKey>,
}

/// An entry of a chart axis picker. All three fields hold the display key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisOption {
    pub key: String,
    pub value: String,
    pub text: String,
}

impl AxisOption {
    pub fn new(key: &RunKey) -> Self {
        let display = key.display_key();
        Self {
            key: display.clone(),
            value: display.clone(),
            text: display,
        }
    }
}

/// Column selection for one section. `auto` defaults to on; when off the
/// listed columns are used verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub auto: Option<bool>,
    pub columns: Vec<String>,
}

impl ColumnConfig {
    pub fn explicit(columns: Vec<String>) -> Self {
        Self {
            auto: Some(false),
            columns,
        }
    }

    pub fn is_auto(&self) -> bool {
        self.auto.unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    pub config: Option<ColumnConfig>,
    pub summary: Option<ColumnConfig>,
}

/// Thresholds for automatic column selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoColumnOptions {
    /// Distinct values a config key needs to get a column
    pub config_min_unique: usize,
    /// Distinct values a summary key needs to get a column
    pub summary_min_unique: usize,
    /// Cap on automatic columns per section
    pub max_auto_columns: Option<usize>,
}

impl Default for AutoColumnOptions {
    fn default() -> Self {
        Self {
            config_min_unique: 2,
            summary_min_unique: 1,
            max_auto_columns: None,
        }
    }
}

/// Distinct keys of `section` across `runs`, sorted by name. The run section
/// is the fixed list of run fields.
pub fn section_keys(section: &Section, runs: &[Run]) -> Vec<RunKey> {
    if *section == Section::Run {
        return RUN_FIELDS.iter().map(|f| RunKey::run(*f)).collect();
    }
    let mut names = BTreeSet::new();
    for run in runs {
        match section {
            Section::Tags => names.extend(run.tags().iter().cloned()),
            Section::Config => names.extend(run.config().keys().cloned()),
            Section::Summary => names.extend(
                run.summary()
                    .iter()
                    .filter(|(_, v)| v.is_scalar())
                    .map(|(k, _)| k.clone()),
            ),
            Section::Run | Section::Unknown(_) => {}
        }
    }
    names
        .into_iter()
        .map(|name| RunKey::new(section.clone(), name))
        .collect()
}

/// Suggested keys per section, in `run`, `tags`, `config`, `summary` order
pub fn key_suggestions(runs: &[Run]) -> Vec<KeySuggestion> {
    [Section::Run, Section::Tags, Section::Config, Section::Summary]
        .into_iter()
        .map(|section| KeySuggestion {
            suggestions: section_keys(&section, runs),
            section,
        })
        .collect()
}

/// One axis option per suggested key
pub fn axis_options(suggestions: &[KeySuggestion]) -> Vec<AxisOption> {
    suggestions
        .iter()
        .flat_map(|s| s.suggestions.iter().map(AxisOption::new))
        .collect()
}

/// Keys of `section` with at least `min_unique` distinct non-null values,
/// most varied first, as display keys.
pub fn auto_cols(section: &Section, runs: &[Run], min_unique: usize) -> Vec<String> {
    let mut distinct: BTreeMap<&str, HashSet<String>> = BTreeMap::new();
    for run in runs {
        let values = match section {
            Section::Config => run.config(),
            Section::Summary => run.summary(),
            _ => continue,
        };
        for (name, value) in values {
            if !value.is_scalar() {
                continue;
            }
            let seen = distinct.entry(name.as_str()).or_default();
            if !value.is_null() {
                seen.insert(value.to_string());
            }
        }
    }

    let mut ranked: Vec<(&str, usize)> = distinct
        .into_iter()
        .map(|(name, values)| (name, values.len()))
        .filter(|(_, count)| *count >= min_unique)
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    ranked
        .into_iter()
        .map(|(name, _)| RunKey::new(section.clone(), name).display_key())
        .collect()
}

/// Column list of the run table
pub fn column_names(
    runs: &[Run],
    grouping: Option<&Grouping>,
    columns: &ColumnsConfig,
    options: &AutoColumnOptions,
) -> Vec<String> {
    let mut names: Vec<String> = LEADING_COLUMNS.iter().map(|c| c.to_string()).collect();
    if grouping.is_some_and(|g| g.subgroup.is_some()) {
        names.push(SUBGROUP_COLUMN.to_string());
    }
    names.extend(TIME_COLUMNS.iter().map(|c| c.to_string()));

    let sections = [
        (Section::Config, columns.config.as_ref(), options.config_min_unique),
        (Section::Summary, columns.summary.as_ref(), options.summary_min_unique),
    ];
    for (section, config, min_unique) in sections {
        match config {
            Some(config) if !config.is_auto() => {
                names.extend(config.columns.iter().map(|c| qualify(&section, c)));
            }
            _ => {
                let mut auto = auto_cols(&section, runs, min_unique);
                if let Some(cap) = options.max_auto_columns {
                    auto.truncate(cap);
                }
                names.extend(auto);
            }
        }
    }
    names
}

/// Display key for an explicitly listed column, adding the section prefix
/// when it is missing.
fn qualify(section: &Section, column: &str) -> String {
    match column.parse::<RunKey>() {
        Ok(key) if key.section == *section => key.display_key(),
        _ => RunKey::new(section.clone(), column).display_key(),
    }
}
