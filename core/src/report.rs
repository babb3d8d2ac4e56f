//! Report structures handed to the presentation layer and the export
//! projection. Created fresh per generation; never persisted.

use crate::{
    config::DateBasis,
    error::{ReportError, ReportResult},
    grouping_engine::{Dimension, GroupKey, StatusCounts},
    identity_resolver::IdentityBasis,
    model::AccusedStatus,
    query::{Entity, FetchQuery, Field},
    types::{non_blank, RecordId},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportKind {
    District,
    Thana,
    DistrictThana,
    Monthly,
    Daily,
    CaseStatus,
    Custom { dimensions: Vec<Dimension> },
    CustodyStatus,
    RepeatOffender,
}

impl ReportKind {
    /// Incident dimensions for the group-by-incident report family, or
    /// None for the accused-centred reports.
    pub fn dimensions(&self) -> Option<Vec<Dimension>> {
        Some(match self {
            Self::District => vec![Dimension::District],
            Self::Thana => vec![Dimension::Thana],
            Self::DistrictThana => vec![Dimension::District, Dimension::Thana],
            Self::Monthly => vec![Dimension::Month],
            Self::Daily => vec![Dimension::Day],
            Self::CaseStatus => vec![Dimension::CaseStatus],
            Self::Custom { dimensions } => dimensions.clone(),
            Self::CustodyStatus | Self::RepeatOffender => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::District => "district",
            Self::Thana => "thana",
            Self::DistrictThana => "district_thana",
            Self::Monthly => "monthly",
            Self::Daily => "daily",
            Self::CaseStatus => "case_status",
            Self::Custom { .. } => "custom",
            Self::CustodyStatus => "custody_status",
            Self::RepeatOffender => "repeat_offender",
        }
    }

    /// The metric groups are ranked by.
    pub fn primary_metric(&self, metrics: &GroupMetrics) -> u64 {
        match self {
            Self::CustodyStatus | Self::RepeatOffender => metrics.accused,
            _ => metrics.incidents,
        }
    }
}

/// Caller-supplied predicates, echoed back verbatim in the report.
/// Blank text fields mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportFilter {
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub thana: Option<String>,
    #[serde(default)]
    pub case_status: Option<String>,
    /// Accused classifications to keep. Empty keeps all.
    #[serde(default)]
    pub accused_statuses: Vec<AccusedStatus>,
}

impl ReportFilter {
    pub fn validate(&self) -> ReportResult<()> {
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(ReportError::InvalidFilter {
                    message: format!("date_from {from} is after date_to {to}"),
                });
            }
        }
        Ok(())
    }

    /// The incident fetch these predicates translate to.
    pub fn incident_query(&self, basis: DateBasis) -> FetchQuery {
        let mut query = FetchQuery::new(Entity::Incident);
        if self.date_from.is_some() || self.date_to.is_some() {
            let field = match basis {
                DateBasis::IncidentDate => Field::IncidentDate,
                DateBasis::CreatedAt => Field::CreatedAt,
            };
            query = query.between(field, self.date_from, self.date_to);
        }
        if let Some(district) = non_blank(self.district.as_deref()) {
            query = query.eq(Field::District, district);
        }
        if let Some(thana) = non_blank(self.thana.as_deref()) {
            query = query.eq(Field::Thana, thana);
        }
        if let Some(status) = non_blank(self.case_status.as_deref()) {
            query = query.eq(Field::CaseStatus, status);
        }
        query
    }

    pub fn keeps_status(&self, status: AccusedStatus) -> bool {
        self.accused_statuses.is_empty() || self.accused_statuses.contains(&status)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Primary metric descending, ties by key ascending.
    #[default]
    MetricDescending,
    /// Key ascending (chronological for month/day reports).
    KeyAscending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    #[serde(flatten)]
    pub kind: ReportKind,
    #[serde(default)]
    pub filter: ReportFilter,
    #[serde(default)]
    pub sort: SortOrder,
}

impl ReportRequest {
    pub fn new(kind: ReportKind) -> Self {
        Self {
            kind,
            filter: ReportFilter::default(),
            sort: SortOrder::default(),
        }
    }

    pub fn with_filter(mut self, filter: ReportFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn sorted(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupMetrics {
    /// Distinct FIRs in the group.
    pub incidents: u64,
    /// Accused rows in the group.
    pub accused: u64,
    /// Distinct identity fingerprints among the accused rows.
    pub persons: u64,
    #[serde(flatten)]
    pub statuses: StatusCounts,
    /// Total surety amount; None for reports that do not read bail rows.
    pub surety_amount: Option<f64>,
}

/// Who a repeat-offender group is believed to be.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffenderProfile {
    pub fingerprint: String,
    pub basis: IdentityBasis,
    pub display_name: String,
    /// Every distinct non-blank name spelling, first seen first.
    pub names: Vec<String>,
    pub fir_ids: Vec<RecordId>,
    pub districts: Vec<String>,
    pub latest_status: AccusedStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportGroup {
    /// 1-based position after sorting.
    pub rank: usize,
    pub key: GroupKey,
    pub metrics: GroupMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offender: Option<OffenderProfile>,
}

/// Grand totals, always the sum of the emitted groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub groups: u64,
    pub incidents: u64,
    pub accused: u64,
    pub persons: u64,
    #[serde(flatten)]
    pub statuses: StatusCounts,
    pub surety_amount: f64,
}

impl ReportSummary {
    pub fn from_groups(groups: &[ReportGroup]) -> Self {
        let mut summary = Self::default();
        for group in groups {
            let m = &group.metrics;
            summary.groups += 1;
            summary.incidents += m.incidents;
            summary.accused += m.accused;
            summary.persons += m.persons;
            summary.statuses.add(&m.statuses);
            summary.surety_amount += m.surety_amount.unwrap_or(0.0);
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(flatten)]
    pub kind: ReportKind,
    pub sort: SortOrder,
    pub groups: Vec<ReportGroup>,
    pub summary: ReportSummary,
    pub filter: ReportFilter,
}

impl Report {
    /// A valid report with no groups and an all-zero summary.
    pub fn empty(request: &ReportRequest) -> Self {
        Self {
            kind: request.kind.clone(),
            sort: request.sort,
            groups: Vec::new(),
            summary: ReportSummary::default(),
            filter: request.filter.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
