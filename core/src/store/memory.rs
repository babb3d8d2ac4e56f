//! Vector-backed record store for callers that already hold rows.

use super::{check_query, RecordStore};
use crate::{
    error::{ReportError, ReportResult},
    model::{AccusedRecord, BailRecord, IncidentRecord},
    query::{Entity, FetchQuery},
    types::non_blank,
};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct MemoryStore {
    incidents: Vec<IncidentRecord>,
    accused: Vec<AccusedRecord>,
    bails: Vec<BailRecord>,
    failing: Option<Entity>,
    incident_fetches: AtomicUsize,
    accused_fetches: AtomicUsize,
    bail_fetches: AtomicUsize,
}

impl MemoryStore {
    pub fn new(
        mut incidents: Vec<IncidentRecord>,
        mut accused: Vec<AccusedRecord>,
        mut bails: Vec<BailRecord>,
    ) -> Self {
        incidents.sort_by_key(|r| r.id);
        accused.sort_by_key(|r| r.id);
        bails.sort_by_key(|r| r.id);
        Self {
            incidents,
            accused,
            bails,
            ..Self::default()
        }
    }

    /// Make every fetch of `entity` fail, as an unreachable backend would.
    pub fn fail_on(mut self, entity: Entity) -> Self {
        self.failing = Some(entity);
        self
    }

    /// Number of fetches issued for `entity` so far.
    pub fn fetch_count(&self, entity: Entity) -> usize {
        self.counter(entity).load(Ordering::Relaxed)
    }

    fn counter(&self, entity: Entity) -> &AtomicUsize {
        match entity {
            Entity::Incident => &self.incident_fetches,
            Entity::Accused => &self.accused_fetches,
            Entity::Bail => &self.bail_fetches,
        }
    }

    fn begin(&self, query: &FetchQuery, entity: Entity) -> ReportResult<()> {
        self.counter(entity).fetch_add(1, Ordering::Relaxed);
        check_query(query, entity)?;
        if self.failing == Some(entity) {
            return Err(ReportError::Fetch {
                entity,
                message: "record store unavailable".into(),
            });
        }
        Ok(())
    }
}

impl RecordStore for MemoryStore {
    fn fetch_incidents(&self, query: &FetchQuery) -> ReportResult<Vec<IncidentRecord>> {
        self.begin(query, Entity::Incident)?;
        Ok(query.apply(&self.incidents))
    }

    fn fetch_accused(&self, query: &FetchQuery) -> ReportResult<Vec<AccusedRecord>> {
        self.begin(query, Entity::Accused)?;
        Ok(query.apply(&self.accused))
    }

    fn fetch_bails(&self, query: &FetchQuery) -> ReportResult<Vec<BailRecord>> {
        self.begin(query, Entity::Bail)?;
        Ok(query.apply(&self.bails))
    }

    fn distinct_districts(&self) -> ReportResult<Vec<String>> {
        let names: BTreeSet<String> = self
            .incidents
            .iter()
            .filter_map(|r| non_blank(r.district.as_deref()))
            .map(str::to_string)
            .collect();
        Ok(names.into_iter().collect())
    }

    fn distinct_thanas(&self, district: Option<&str>) -> ReportResult<Vec<String>> {
        let names: BTreeSet<String> = self
            .incidents
            .iter()
            .filter(|r| {
                district.map_or(true, |d| non_blank(r.district.as_deref()) == Some(d.trim()))
            })
            .filter_map(|r| non_blank(r.thana.as_deref()))
            .map(str::to_string)
            .collect();
        Ok(names.into_iter().collect())
    }
}
