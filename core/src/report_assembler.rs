//! Report Assembler: one pipeline behind every report screen.
//!
//! STAGES (fixed order, per generation, no state kept between runs):
//!   1. Filter      : fetch FIRs matching the caller's predicates
//!   2. Dependents  : fetch accused/bail rows for those FIR ids only;
//!                   skipped entirely when no FIR matched
//!   3. Enrich      : hash-join dependents to their FIR
//!   4. Aggregate   : group by dimension, classification or fingerprint
//!   5. Post-filter : classification filter and repeat threshold, with
//!                   counts re-derived from the surviving rows
//!   6. Sort & rank : stable, primary metric desc then key asc
//!   7. Emit        : summary summed from the emitted groups
//!
//! Any fetch failure aborts the whole report. No retries here.

use crate::{
    config::ReportConfig,
    error::ReportResult,
    grouping_engine::{composite_key, group_by, text_dimension, Dimension, GroupKey, StatusCounts},
    identity_resolver::{fingerprint, Fingerprint},
    join_resolver::{resolve, Joined},
    model::{AccusedRecord, AccusedStatus, BailRecord, IncidentRecord},
    query::{Entity, FetchQuery, Field},
    report::{
        GroupMetrics, OffenderProfile, Report, ReportFilter, ReportGroup, ReportKind,
        ReportRequest, ReportSummary, SortOrder,
    },
    store::RecordStore,
    types::{non_blank, RecordId},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

type AccusedRow<'a> = Joined<'a, IncidentRecord, AccusedRecord>;
type BailRow<'a> = Joined<'a, IncidentRecord, BailRecord>;

/// Values to populate the district and thana filter dropdowns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub districts: Vec<String>,
    pub thanas: Vec<String>,
}

pub struct ReportAssembler<'s, S: RecordStore + ?Sized> {
    store: &'s S,
    config: ReportConfig,
}

impl<'s, S: RecordStore + ?Sized> ReportAssembler<'s, S> {
    pub fn new(store: &'s S, config: ReportConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Dropdown values. The two lookups share no data.
    pub fn filter_options(&self, district: Option<&str>) -> ReportResult<FilterOptions> {
        Ok(FilterOptions {
            districts: self.store.distinct_districts()?,
            thanas: self.store.distinct_thanas(non_blank(district))?,
        })
    }

    /// Generate one report. Returns an empty report, not an error, when no
    /// FIR matches the filter.
    pub fn generate(&self, request: &ReportRequest) -> ReportResult<Report> {
        request.filter.validate()?;

        // 1. Filter
        let query = request.filter.incident_query(self.config.date_basis);
        let incidents = self.store.fetch_incidents(&query)?;
        log::debug!(
            "report {}: {} incidents after filter",
            request.kind.name(),
            incidents.len()
        );
        if incidents.is_empty() {
            log::info!("report {}: no matching incidents", request.kind.name());
            return Ok(Report::empty(request));
        }
        let ids: Vec<RecordId> = incidents.iter().map(|i| i.id).collect();

        // 2-5
        let groups = match request.kind.dimensions() {
            Some(dimensions) => self.dimension_groups(request, &incidents, &ids, &dimensions)?,
            None if request.kind == ReportKind::CustodyStatus => {
                self.custody_groups(request, &incidents, &ids)?
            }
            None => self.repeat_offender_groups(request, &incidents, &ids)?,
        };

        // 6-7
        let groups = rank(&request.kind, request.sort, groups);
        let summary = ReportSummary::from_groups(&groups);
        log::info!(
            "report {}: {} groups, {} incidents, {} accused",
            request.kind.name(),
            summary.groups,
            summary.incidents,
            summary.accused,
        );
        Ok(Report {
            kind: request.kind.clone(),
            sort: request.sort,
            groups,
            summary,
            filter: request.filter.clone(),
        })
    }

    fn fetch_accused(&self, ids: &[RecordId]) -> ReportResult<Vec<AccusedRecord>> {
        let query = FetchQuery::new(Entity::Accused).within(Field::FirId, ids.to_vec());
        self.store.fetch_accused(&query)
    }

    fn fetch_bails(&self, ids: &[RecordId]) -> ReportResult<Vec<BailRecord>> {
        let query = FetchQuery::new(Entity::Bail).within(Field::FirId, ids.to_vec());
        self.store.fetch_bails(&query)
    }

    /// District, thana, month, day, case-status and custom reports: every
    /// FIR lands in exactly one group; accused and bail rows follow their FIR.
    fn dimension_groups(
        &self,
        request: &ReportRequest,
        incidents: &[IncidentRecord],
        ids: &[RecordId],
        dimensions: &[Dimension],
    ) -> ReportResult<Vec<Draft>> {
        // 2. Dependents
        let accused = self.fetch_accused(ids)?;
        let bails = self.fetch_bails(ids)?;

        // 3. Enrich
        let accused_rows = resolve(incidents, &accused, |i| i.id, |a| a.fir_id);
        let bail_rows = resolve(incidents, &bails, |i| i.id, |b| b.fir_id);
        log::debug!(
            "report {}: joined {}/{} accused, {}/{} bail rows",
            request.kind.name(),
            accused_rows.len(),
            accused.len(),
            bail_rows.len(),
            bails.len(),
        );

        // 4. Aggregate
        let basis = self.config.date_basis;
        let unknown = self.config.unknown_label.as_str();
        let keys: HashMap<RecordId, GroupKey> = incidents
            .iter()
            .map(|i| (i.id, composite_key(i, dimensions, basis, unknown)))
            .collect();
        let contributions = incidents
            .iter()
            .map(Contribution::Incident)
            .chain(accused_rows.iter().copied().map(Contribution::Accused))
            .chain(bail_rows.iter().copied().map(Contribution::Bail));
        let mut buckets: HashMap<GroupKey, Bucket<'_>> = group_by(
            contributions,
            // Every joined parent is one of `incidents`.
            |c| keys[&c.parent().id].clone(),
            Bucket::absorb,
        );

        // 5. Post-filter
        if !request.filter.accused_statuses.is_empty() {
            buckets.retain(|_, bucket| bucket.retain_statuses(&request.filter));
        }

        let exclude_blank = self.config.exclude_blank_identity;
        Ok(buckets
            .into_iter()
            .map(|(key, bucket)| Draft {
                key,
                metrics: bucket.metrics(true, exclude_blank),
                offender: None,
            })
            .collect())
    }

    /// Accused rows grouped by custody classification.
    fn custody_groups(
        &self,
        request: &ReportRequest,
        incidents: &[IncidentRecord],
        ids: &[RecordId],
    ) -> ReportResult<Vec<Draft>> {
        let accused = self.fetch_accused(ids)?;
        let rows = resolve(incidents, &accused, |i| i.id, |a| a.fir_id);
        log::debug!(
            "report {}: joined {}/{} accused rows",
            request.kind.name(),
            rows.len(),
            accused.len(),
        );

        let mut buckets: HashMap<AccusedStatus, Bucket<'_>> = group_by(
            rows,
            |r| r.row.status,
            Bucket::absorb_accused,
        );
        buckets.retain(|status, _| request.filter.keeps_status(*status));

        let exclude_blank = self.config.exclude_blank_identity;
        Ok(buckets
            .into_iter()
            .map(|(status, bucket)| Draft {
                key: GroupKey::single(status.as_str()),
                metrics: bucket.metrics(false, exclude_blank),
                offender: None,
            })
            .collect())
    }

    /// Accused rows grouped by identity fingerprint, keeping fingerprints
    /// seen at least `repeat_offender_threshold` times.
    fn repeat_offender_groups(
        &self,
        request: &ReportRequest,
        incidents: &[IncidentRecord],
        ids: &[RecordId],
    ) -> ReportResult<Vec<Draft>> {
        let accused = self.fetch_accused(ids)?;
        let rows = resolve(incidents, &accused, |i| i.id, |a| a.fir_id);

        let exclude_blank = self.config.exclude_blank_identity;
        let fingerprinted = rows
            .into_iter()
            .map(|r| (fingerprint(r.row), r))
            .filter(|(fp, _)| !(exclude_blank && fp.is_blank()));
        let mut buckets: HashMap<Fingerprint, Bucket<'_>> = group_by(
            fingerprinted,
            |(fp, _)| fp.clone(),
            Bucket::absorb_fingerprinted,
        );
        log::debug!(
            "report {}: {} accused rows resolved to {} fingerprints",
            request.kind.name(),
            accused.len(),
            buckets.len(),
        );

        if !request.filter.accused_statuses.is_empty() {
            buckets.retain(|_, bucket| bucket.retain_statuses(&request.filter));
        }
        let threshold = self.config.repeat_offender_threshold;
        buckets.retain(|_, bucket| bucket.accused.len() as u64 >= threshold);

        let unknown = self.config.unknown_label.as_str();
        Ok(buckets
            .into_iter()
            .map(|(fp, bucket)| Draft {
                key: GroupKey::single(fp.as_str()),
                metrics: bucket.metrics(false, exclude_blank),
                offender: Some(offender_profile(&fp, &bucket, unknown)),
            })
            .collect())
    }
}

/// An aggregated group before ranking.
struct Draft {
    key: GroupKey,
    metrics: GroupMetrics,
    offender: Option<OffenderProfile>,
}

/// One row folded into a bucket, always carrying its parent FIR.
#[derive(Clone, Copy)]
enum Contribution<'a> {
    Incident(&'a IncidentRecord),
    Accused(AccusedRow<'a>),
    Bail(BailRow<'a>),
}

impl<'a> Contribution<'a> {
    fn parent(&self) -> &'a IncidentRecord {
        match self {
            Self::Incident(incident) => incident,
            Self::Accused(row) => row.parent,
            Self::Bail(row) => row.parent,
        }
    }
}

/// Rows of one group, kept so counts can be re-derived after post-filtering.
#[derive(Default)]
struct Bucket<'a> {
    incident_ids: BTreeSet<RecordId>,
    accused: Vec<AccusedRow<'a>>,
    bails: Vec<BailRow<'a>>,
}

impl<'a> Bucket<'a> {
    fn absorb(&mut self, contribution: Contribution<'a>) {
        self.incident_ids.insert(contribution.parent().id);
        match contribution {
            Contribution::Incident(_) => {}
            Contribution::Accused(row) => self.accused.push(row),
            Contribution::Bail(row) => self.bails.push(row),
        }
    }

    fn absorb_accused(&mut self, row: AccusedRow<'a>) {
        self.absorb(Contribution::Accused(row));
    }

    fn absorb_fingerprinted(&mut self, (_, row): (Fingerprint, AccusedRow<'a>)) {
        self.absorb(Contribution::Accused(row));
    }

    /// Drop accused rows of unwanted classifications, and bail rows of the
    /// dropped accused, then recompute the FIR set from what is left.
    /// Returns false when no accused row survives.
    fn retain_statuses(&mut self, filter: &ReportFilter) -> bool {
        self.accused.retain(|r| filter.keeps_status(r.row.status));
        let kept: HashSet<RecordId> = self.accused.iter().map(|r| r.row.id).collect();
        self.bails.retain(|b| kept.contains(&b.row.accused_id));
        self.incident_ids = self.accused.iter().map(|r| r.parent.id).collect();
        !self.accused.is_empty()
    }

    fn metrics(&self, with_surety: bool, exclude_blank: bool) -> GroupMetrics {
        let mut statuses = StatusCounts::default();
        let mut persons = HashSet::new();
        for r in &self.accused {
            statuses.record(r.row.status);
            let fp = fingerprint(r.row);
            if !(exclude_blank && fp.is_blank()) {
                persons.insert(fp);
            }
        }
        GroupMetrics {
            incidents: self.incident_ids.len() as u64,
            accused: self.accused.len() as u64,
            persons: persons.len() as u64,
            statuses,
            surety_amount: with_surety
                .then(|| self.bails.iter().filter_map(|b| b.row.surety_amount).sum::<f64>()),
        }
    }
}

fn offender_profile(fp: &Fingerprint, bucket: &Bucket<'_>, unknown: &str) -> OffenderProfile {
    let mut names: Vec<String> = Vec::new();
    for r in &bucket.accused {
        if let Some(name) = non_blank(r.row.name.as_deref()) {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    let districts: BTreeSet<String> = bucket
        .accused
        .iter()
        .map(|r| text_dimension(r.parent.district.as_deref(), unknown))
        .collect();
    let latest_status = bucket
        .accused
        .iter()
        .max_by_key(|r| (r.parent.created_at, r.row.id))
        .map(|r| r.row.status)
        .unwrap_or_default();

    OffenderProfile {
        fingerprint: fp.as_str().to_string(),
        basis: fp.basis(),
        display_name: names.first().cloned().unwrap_or_else(|| unknown.to_string()),
        names,
        fir_ids: bucket.incident_ids.iter().copied().collect(),
        districts: districts.into_iter().collect(),
        latest_status,
    }
}

/// Stable sort and assign 1-based ranks. Keys are unique within a report,
/// so the order is total and independent of hash-map iteration order.
fn rank(kind: &ReportKind, sort: SortOrder, mut drafts: Vec<Draft>) -> Vec<ReportGroup> {
    match sort {
        SortOrder::MetricDescending => drafts.sort_by(|a, b| {
            kind.primary_metric(&b.metrics)
                .cmp(&kind.primary_metric(&a.metrics))
                .then_with(|| a.key.cmp(&b.key))
        }),
        SortOrder::KeyAscending => drafts.sort_by(|a, b| a.key.cmp(&b.key)),
    }
    drafts
        .into_iter()
        .enumerate()
        .map(|(index, draft)| ReportGroup {
            rank: index + 1,
            key: draft.key,
            metrics: draft.metrics,
            offender: draft.offender,
        })
        .collect()
}
