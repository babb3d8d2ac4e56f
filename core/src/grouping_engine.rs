//! Grouping Engine: partition rows by a derived dimension key and fold
//! each partition into an accumulator.
//!
//! Key functions never drop a row. A missing or blank dimension value is
//! coalesced to the configured unknown label, so the row counts across all
//! groups always add up to the input row count.

use crate::{
    config::DateBasis,
    model::{AccusedStatus, IncidentRecord},
    types::{non_blank, KEY_DISPLAY_SEPARATOR},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Partition `rows` by `key_fn` and fold each row into its group's
/// accumulator. Group order is unspecified; callers sort.
pub fn group_by<R, K, A, KF, FF>(
    rows: impl IntoIterator<Item = R>,
    key_fn: KF,
    mut fold_fn: FF,
) -> HashMap<K, A>
where
    K: Eq + Hash,
    A: Default,
    KF: Fn(&R) -> K,
    FF: FnMut(&mut A, R),
{
    let mut groups: HashMap<K, A> = HashMap::new();
    for row in rows {
        let acc = groups.entry(key_fn(&row)).or_default();
        fold_fn(acc, row);
    }
    groups
}

/// Composite dimension key. Components are compared as a tuple, never as a
/// joined string, so "A-B" + "C" and "A" + "B-C" stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey(pub Vec<String>);

impl GroupKey {
    pub fn single(component: impl Into<String>) -> Self {
        Self(vec![component.into()])
    }

    pub fn components(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(KEY_DISPLAY_SEPARATOR))
    }
}

/// Trimmed text, or the unknown label when absent or blank.
pub fn text_dimension(value: Option<&str>, unknown: &str) -> String {
    non_blank(value).unwrap_or(unknown).to_string()
}

/// Calendar month as `YYYY-MM`.
pub fn month_dimension(date: Option<NaiveDate>, unknown: &str) -> String {
    date.map_or_else(|| unknown.to_string(), |d| d.format("%Y-%m").to_string())
}

/// Calendar day as `YYYY-MM-DD`.
pub fn day_dimension(date: Option<NaiveDate>, unknown: &str) -> String {
    date.map_or_else(|| unknown.to_string(), |d| d.format("%Y-%m-%d").to_string())
}

/// An incident attribute a report can group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    District,
    Thana,
    Month,
    Day,
    CaseStatus,
}

impl Dimension {
    pub fn label(&self) -> &'static str {
        match self {
            Self::District => "district",
            Self::Thana => "thana",
            Self::Month => "month",
            Self::Day => "day",
            Self::CaseStatus => "case_status",
        }
    }

    pub fn key_for(&self, incident: &IncidentRecord, basis: DateBasis, unknown: &str) -> String {
        match self {
            Self::District => text_dimension(incident.district.as_deref(), unknown),
            Self::Thana => text_dimension(incident.thana.as_deref(), unknown),
            Self::CaseStatus => text_dimension(incident.case_status.as_deref(), unknown),
            Self::Month => month_dimension(basis_date(incident, basis), unknown),
            Self::Day => day_dimension(basis_date(incident, basis), unknown),
        }
    }
}

/// The date an incident is bucketed by under `basis`.
pub fn basis_date(incident: &IncidentRecord, basis: DateBasis) -> Option<NaiveDate> {
    match basis {
        DateBasis::IncidentDate => incident.incident_date,
        DateBasis::CreatedAt => Some(incident.created_at.date()),
    }
}

/// Build the composite key of `incident` over `dimensions`.
pub fn composite_key(
    incident: &IncidentRecord,
    dimensions: &[Dimension],
    basis: DateBasis,
    unknown: &str,
) -> GroupKey {
    GroupKey(
        dimensions
            .iter()
            .map(|d| d.key_for(incident, basis, unknown))
            .collect(),
    )
}

/// Per-classification accused counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub arrested: u64,
    pub bailed: u64,
    pub absconding: u64,
    pub unknown: u64,
}

impl StatusCounts {
    pub fn record(&mut self, status: AccusedStatus) {
        match status {
            AccusedStatus::Arrested => self.arrested += 1,
            AccusedStatus::Bailed => self.bailed += 1,
            AccusedStatus::Absconding => self.absconding += 1,
            AccusedStatus::Unknown => self.unknown += 1,
        }
    }

    pub fn get(&self, status: AccusedStatus) -> u64 {
        match status {
            AccusedStatus::Arrested => self.arrested,
            AccusedStatus::Bailed => self.bailed,
            AccusedStatus::Absconding => self.absconding,
            AccusedStatus::Unknown => self.unknown,
        }
    }

    pub fn total(&self) -> u64 {
        self.arrested + self.bailed + self.absconding + self.unknown
    }

    pub fn add(&mut self, other: &StatusCounts) {
        self.arrested += other.arrested;
        self.bailed += other.bailed;
        self.absconding += other.absconding;
        self.unknown += other.unknown;
    }
}
