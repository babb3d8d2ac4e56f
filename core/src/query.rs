//! Fetch predicates handed to a record store.
//!
//! A store may push predicates down (SQL) or evaluate them in memory with
//! [`FetchQuery::matches`]; both must select the same rows.

use crate::{
    error::{ReportError, ReportResult},
    model::{AccusedRecord, BailRecord, IncidentRecord},
    types::{non_blank, RecordId},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Incident,
    Accused,
    Bail,
}

impl Entity {
    pub fn table(&self) -> &'static str {
        match self {
            Self::Incident => "fir",
            Self::Accused => "accused",
            Self::Bail => "bail",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Filterable columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Id,
    District,
    Thana,
    CaseStatus,
    IncidentDate,
    CreatedAt,
    FirId,
    AccusedId,
}

impl Field {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::District => "district",
            Self::Thana => "thana",
            Self::CaseStatus => "case_status",
            Self::IncidentDate => "incident_date",
            Self::CreatedAt => "created_at",
            Self::FirId => "fir_id",
            Self::AccusedId => "accused_id",
        }
    }

    fn belongs_to(&self, entity: Entity) -> bool {
        match entity {
            Entity::Incident => matches!(
                self,
                Self::Id
                    | Self::District
                    | Self::Thana
                    | Self::CaseStatus
                    | Self::IncidentDate
                    | Self::CreatedAt
            ),
            Entity::Accused => matches!(self, Self::Id | Self::FirId),
            Entity::Bail => matches!(self, Self::Id | Self::FirId | Self::AccusedId),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    /// Text equality after trimming both sides. Rows with a missing or
    /// blank value never match.
    Eq { field: Field, value: String },
    /// Membership in an id set. An empty set matches nothing.
    In { field: Field, ids: Vec<RecordId> },
    /// Inclusive calendar-date range; either bound may be open.
    DateRange {
        field: Field,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
}

impl Predicate {
    pub fn field(&self) -> Field {
        match self {
            Self::Eq { field, .. } | Self::In { field, .. } | Self::DateRange { field, .. } => {
                *field
            }
        }
    }

    fn matches_value(&self, value: FieldValue<'_>) -> bool {
        match (self, value) {
            (Self::Eq { value: want, .. }, FieldValue::Text(have)) => {
                non_blank(have) == Some(want.trim())
            }
            (Self::In { ids, .. }, FieldValue::Id(have)) => ids.contains(&have),
            (Self::DateRange { from, to, .. }, FieldValue::Date(have)) => match have {
                Some(d) => from.map_or(true, |f| d >= f) && to.map_or(true, |t| d <= t),
                None => false,
            },
            _ => false,
        }
    }
}

/// A column value as seen by in-memory predicate evaluation.
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    Text(Option<&'a str>),
    Id(RecordId),
    Date(Option<NaiveDate>),
}

/// Rows that can be filtered by [`Predicate`]s.
pub trait Filterable {
    const ENTITY: Entity;

    fn field_value(&self, field: Field) -> Option<FieldValue<'_>>;
}

impl Filterable for IncidentRecord {
    const ENTITY: Entity = Entity::Incident;

    fn field_value(&self, field: Field) -> Option<FieldValue<'_>> {
        Some(match field {
            Field::Id => FieldValue::Id(self.id),
            Field::District => FieldValue::Text(self.district.as_deref()),
            Field::Thana => FieldValue::Text(self.thana.as_deref()),
            Field::CaseStatus => FieldValue::Text(self.case_status.as_deref()),
            Field::IncidentDate => FieldValue::Date(self.incident_date),
            Field::CreatedAt => FieldValue::Date(Some(self.created_at.date())),
            Field::FirId | Field::AccusedId => return None,
        })
    }
}

impl Filterable for AccusedRecord {
    const ENTITY: Entity = Entity::Accused;

    fn field_value(&self, field: Field) -> Option<FieldValue<'_>> {
        match field {
            Field::Id => Some(FieldValue::Id(self.id)),
            Field::FirId => Some(FieldValue::Id(self.fir_id)),
            _ => None,
        }
    }
}

impl Filterable for BailRecord {
    const ENTITY: Entity = Entity::Bail;

    fn field_value(&self, field: Field) -> Option<FieldValue<'_>> {
        match field {
            Field::Id => Some(FieldValue::Id(self.id)),
            Field::FirId => Some(FieldValue::Id(self.fir_id)),
            Field::AccusedId => Some(FieldValue::Id(self.accused_id)),
            _ => None,
        }
    }
}

/// Entity name + predicate set + optional row limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchQuery {
    pub entity: Entity,
    pub predicates: Vec<Predicate>,
    pub limit: Option<usize>,
}

impl FetchQuery {
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            predicates: Vec::new(),
            limit: None,
        }
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn eq(self, field: Field, value: impl Into<String>) -> Self {
        self.with(Predicate::Eq {
            field,
            value: value.into(),
        })
    }

    pub fn within(self, field: Field, ids: Vec<RecordId>) -> Self {
        self.with(Predicate::In { field, ids })
    }

    pub fn between(self, field: Field, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.with(Predicate::DateRange { field, from, to })
    }

    /// Reject predicates on columns the entity does not have, and
    /// inverted date ranges.
    pub fn validate(&self) -> ReportResult<()> {
        for predicate in &self.predicates {
            let field = predicate.field();
            if !field.belongs_to(self.entity) {
                return Err(ReportError::InvalidFilter {
                    message: format!("{} has no column '{}'", self.entity, field.column()),
                });
            }
            if let Predicate::DateRange {
                from: Some(from),
                to: Some(to),
                ..
            } = predicate
            {
                if from > to {
                    return Err(ReportError::InvalidFilter {
                        message: format!("date range is inverted: {from} > {to}"),
                    });
                }
            }
        }
        Ok(())
    }

    /// Evaluate every predicate against one row.
    pub fn matches<R: Filterable>(&self, row: &R) -> bool {
        self.predicates.iter().all(|p| match row.field_value(p.field()) {
            Some(value) => p.matches_value(value),
            None => false,
        })
    }

    /// Filter and truncate an already-materialised row set.
    pub fn apply<R: Filterable + Clone>(&self, rows: &[R]) -> Vec<R> {
        let selected = rows.iter().filter(|r| self.matches(*r)).cloned();
        match self.limit {
            Some(n) => selected.take(n).collect(),
            None => selected.collect(),
        }
    }
}
