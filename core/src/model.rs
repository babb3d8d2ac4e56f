//! Record types consumed by the reporting engine.
//!
//! Rows are read-only here: case-entry workflows create them, the engine
//! only fetches, joins and counts them.

use crate::types::RecordId;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A First Information Report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub id: RecordId,
    pub fir_number: Option<String>,
    pub district: Option<String>,
    pub thana: Option<String>,
    pub created_at: NaiveDateTime,
    pub incident_date: Option<NaiveDate>,
    pub case_status: Option<String>,
    pub complainant_name: Option<String>,
}

/// One accused entry, tied to exactly one FIR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccusedRecord {
    pub id: RecordId,
    pub fir_id: RecordId,
    pub name: Option<String>,
    pub mobile: Option<String>,
    pub national_id: Option<String>,
    #[serde(default)]
    pub status: AccusedStatus,
}

/// A bail surety. `fir_id` is denormalized from the accused row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BailRecord {
    pub id: RecordId,
    pub accused_id: RecordId,
    pub fir_id: RecordId,
    pub surety_name: Option<String>,
    pub surety_mobile: Option<String>,
    pub surety_relation: Option<String>,
    pub surety_amount: Option<f64>,
}

/// Current custody classification of an accused person.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccusedStatus {
    Arrested,
    Bailed,
    Absconding,
    #[default]
    Unknown,
}

impl AccusedStatus {
    pub const ALL: [AccusedStatus; 4] = [
        AccusedStatus::Arrested,
        AccusedStatus::Bailed,
        AccusedStatus::Absconding,
        AccusedStatus::Unknown,
    ];

    /// Classify free-form status text. Never fails: blank or unrecognised
    /// text is `Unknown`.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(text) = raw.map(|r| r.trim().to_ascii_lowercase()) else {
            return Self::Unknown;
        };
        match text.as_str() {
            "arrested" | "in custody" | "custody" | "jail" | "judicial custody" => Self::Arrested,
            "bailed" | "on bail" | "bail" | "released on bail" => Self::Bailed,
            "absconding" | "absconder" | "absconded" | "fugitive" => Self::Absconding,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arrested => "arrested",
            Self::Bailed => "bailed",
            Self::Absconding => "absconding",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AccusedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
