use crate::types::UNKNOWN_LABEL;
use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Which calendar date an incident is bucketed and range-filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateBasis {
    /// The reported incident date. Incidents without one fall in the
    /// unknown bucket and never match a date range.
    #[default]
    IncidentDate,
    /// The date the FIR row was created. Always present.
    CreatedAt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Label a missing or blank dimension value is coalesced to.
    #[serde(default = "default_unknown_label")]
    pub unknown_label: String,
    /// Minimum accused-row count for a fingerprint to be a repeat offender.
    #[serde(default = "default_repeat_threshold")]
    pub repeat_offender_threshold: u64,
    /// Drop rows with no mobile, national ID or name before repeat-offender
    /// grouping instead of collapsing them into one shared blank identity.
    #[serde(default)]
    pub exclude_blank_identity: bool,
    #[serde(default)]
    pub date_basis: DateBasis,
}

fn default_unknown_label() -> String {
    UNKNOWN_LABEL.to_string()
}

fn default_repeat_threshold() -> u64 {
    2
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            unknown_label: default_unknown_label(),
            repeat_offender_threshold: default_repeat_threshold(),
            exclude_blank_identity: false,
            date_basis: DateBasis::default(),
        }
    }
}

impl ReportConfig {
    /// Load from the data/ directory.
    /// In tests, use ReportConfig::default().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/reports/report_config.json");
        let content =
            std::fs::read_to_string(&path).with_context(|| format!("Cannot read {path}"))?;
        let config: ReportConfig =
            serde_json::from_str(&content).with_context(|| format!("Cannot parse {path}"))?;
        if config.repeat_offender_threshold == 0 {
            anyhow::bail!("{path}: repeat_offender_threshold must be at least 1");
        }
        Ok(config)
    }
}
