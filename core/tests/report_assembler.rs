//! Report Assembler tests.
//!
//! Tests cover: per-dimension counts, empty filters, orphan rows, fetch
//! failures, the repeat-offender threshold, classification post-filters,
//! ranking and idempotence.

use chrono::NaiveDate;
use firdesk_core::{
    config::{DateBasis, ReportConfig},
    error::ReportError,
    grouping_engine::{Dimension, GroupKey},
    model::{AccusedRecord, AccusedStatus, BailRecord, IncidentRecord},
    query::Entity,
    report::{Report, ReportFilter, ReportGroup, ReportKind, ReportRequest, SortOrder},
    report_assembler::ReportAssembler,
    store::MemoryStore,
    types::RecordId,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn fir(id: RecordId, district: &str, thana: &str, day: NaiveDate) -> IncidentRecord {
    IncidentRecord {
        id,
        fir_number: Some(format!("FIR-{id:04}")),
        district: Some(district.into()),
        thana: Some(thana.into()),
        created_at: day.and_hms_opt(10, 0, 0).unwrap(),
        incident_date: Some(day),
        case_status: Some("Open".into()),
        complainant_name: None,
    }
}

fn accused(id: RecordId, fir_id: RecordId, name: &str, mobile: Option<&str>, status: AccusedStatus) -> AccusedRecord {
    AccusedRecord {
        id,
        fir_id,
        name: Some(name.into()),
        mobile: mobile.map(Into::into),
        national_id: None,
        status,
    }
}

fn bail(id: RecordId, accused_id: RecordId, fir_id: RecordId, amount: f64) -> BailRecord {
    BailRecord {
        id,
        accused_id,
        fir_id,
        surety_name: Some("Surety".into()),
        surety_mobile: None,
        surety_relation: Some("Brother".into()),
        surety_amount: Some(amount),
    }
}

/// Three FIRs (Central x2, North x1), four accused, one bail.
/// Mobile 9990001111 appears on FIRs 1 and 3.
fn fixture() -> MemoryStore {
    MemoryStore::new(
        vec![
            fir(1, "Central", "Kotwali", date(2024, 1, 5)),
            fir(2, "Central", "Civil Lines", date(2024, 1, 20)),
            fir(3, "North", "Model Town", date(2024, 2, 3)),
        ],
        vec![
            accused(10, 1, "A", Some("9990001111"), AccusedStatus::Arrested),
            accused(11, 1, "C", Some("9990002222"), AccusedStatus::Bailed),
            accused(12, 2, "D", None, AccusedStatus::Absconding),
            accused(13, 3, "A. Kumar", Some("9990001111"), AccusedStatus::Bailed),
        ],
        vec![bail(100, 11, 1, 5000.0), bail(101, 13, 3, 2500.0)],
    )
}

fn run(store: &MemoryStore, request: &ReportRequest) -> Report {
    ReportAssembler::new(store, ReportConfig::default())
        .generate(request)
        .expect("report generation")
}

fn group<'r>(report: &'r Report, key: &[&str]) -> &'r ReportGroup {
    report
        .groups
        .iter()
        .find(|g| g.key.components() == key)
        .unwrap_or_else(|| panic!("no group {key:?} in {:?}", report.groups))
}

// ── Dimension reports ────────────────────────────────────────────────────────

/// Scenario: Central 2, North 1, summary total 3.
#[test]
fn district_report_counts_incidents_per_district() {
    let store = fixture();
    let report = run(&store, &ReportRequest::new(ReportKind::District));

    assert_eq!(report.groups.len(), 2);
    assert_eq!(group(&report, &["Central"]).metrics.incidents, 2);
    assert_eq!(group(&report, &["North"]).metrics.incidents, 1);
    assert_eq!(report.summary.incidents, 3);
    assert_eq!(report.summary.accused, 4);
    assert_eq!(report.summary.surety_amount, 7500.0);
}

/// Higher metric ranks first; rank numbering starts at 1.
#[test]
fn groups_are_ranked_by_primary_metric() {
    let store = fixture();
    let report = run(&store, &ReportRequest::new(ReportKind::District));

    assert_eq!(report.groups[0].key, GroupKey::single("Central"));
    assert_eq!(report.groups[0].rank, 1);
    assert_eq!(report.groups[1].rank, 2);
}

/// Equal metrics fall back to key order, whatever the hash order.
#[test]
fn ties_are_broken_by_key() {
    let store = fixture();
    let report = run(&store, &ReportRequest::new(ReportKind::Thana));

    let keys: Vec<&str> = report.groups.iter().map(|g| g.key.components()[0].as_str()).collect();
    assert_eq!(keys, vec!["Civil Lines", "Kotwali", "Model Town"]);
}

/// KeyAscending orders months chronologically.
#[test]
fn monthly_report_sorts_chronologically_on_request() {
    let store = fixture();
    let request = ReportRequest::new(ReportKind::Monthly).sorted(SortOrder::KeyAscending);
    let report = run(&store, &request);

    let keys: Vec<String> = report.groups.iter().map(|g| g.key.to_string()).collect();
    assert_eq!(keys, vec!["2024-01", "2024-02"]);
}

/// Incidents with no incident date land in the unknown month.
#[test]
fn missing_incident_date_is_unknown_month() {
    let mut undated = fir(4, "East", "Shahdara", date(2024, 3, 1));
    undated.incident_date = None;
    let store = MemoryStore::new(vec![undated], vec![], vec![]);
    let report = run(&store, &ReportRequest::new(ReportKind::Monthly));

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].key, GroupKey::single("Unknown"));
}

/// With the created-at basis the same incident is bucketed by row date.
#[test]
fn created_at_basis_buckets_by_row_date() {
    let mut undated = fir(4, "East", "Shahdara", date(2024, 3, 1));
    undated.incident_date = None;
    let store = MemoryStore::new(vec![undated], vec![], vec![]);
    let config = ReportConfig {
        date_basis: DateBasis::CreatedAt,
        ..ReportConfig::default()
    };
    let report = ReportAssembler::new(&store, config)
        .generate(&ReportRequest::new(ReportKind::Monthly))
        .unwrap();

    assert_eq!(report.groups[0].key, GroupKey::single("2024-03"));
}

/// Composite district/thana keys carry both components.
#[test]
fn custom_dimensions_form_composite_keys() {
    let store = fixture();
    let request = ReportRequest::new(ReportKind::Custom {
        dimensions: vec![Dimension::District, Dimension::Thana],
    });
    let report = run(&store, &request);

    assert_eq!(report.groups.len(), 3);
    let kotwali = group(&report, &["Central", "Kotwali"]);
    assert_eq!(kotwali.metrics.accused, 2);
    assert_eq!(kotwali.metrics.statuses.arrested, 1);
    assert_eq!(kotwali.metrics.statuses.bailed, 1);
    assert_eq!(kotwali.metrics.surety_amount, Some(5000.0));
}

/// Every FIR in the filtered set lands in exactly one group.
#[test]
fn dimension_groups_conserve_incidents() {
    let store = fixture();
    for kind in [
        ReportKind::District,
        ReportKind::Thana,
        ReportKind::DistrictThana,
        ReportKind::Monthly,
        ReportKind::Daily,
        ReportKind::CaseStatus,
    ] {
        let report = run(&store, &ReportRequest::new(kind.clone()));
        assert_eq!(report.summary.incidents, 3, "{} lost incidents", kind.name());
        assert_eq!(report.summary.accused, 4, "{} lost accused rows", kind.name());
    }
}

// ── Filters ──────────────────────────────────────────────────────────────────

/// Scenario: a date range matching nothing gives an empty report, not an error.
#[test]
fn date_range_matching_nothing_yields_empty_report() {
    let store = fixture();
    let filter = ReportFilter {
        date_from: Some(date(2023, 1, 1)),
        date_to: Some(date(2023, 12, 31)),
        ..ReportFilter::default()
    };
    let report = run(&store, &ReportRequest::new(ReportKind::District).with_filter(filter));

    assert!(report.is_empty());
    assert_eq!(report.summary.groups, 0);
    assert_eq!(report.summary.incidents, 0);
    assert_eq!(report.summary.accused, 0);
    assert_eq!(report.summary.surety_amount, 0.0);
}

/// No dependent fetch is issued when the incident filter matches nothing.
#[test]
fn empty_incident_set_skips_dependent_fetches() {
    let store = fixture();
    let filter = ReportFilter {
        district: Some("Nowhere".into()),
        ..ReportFilter::default()
    };
    run(&store, &ReportRequest::new(ReportKind::RepeatOffender).with_filter(filter));

    assert_eq!(store.fetch_count(Entity::Incident), 1);
    assert_eq!(store.fetch_count(Entity::Accused), 0);
    assert_eq!(store.fetch_count(Entity::Bail), 0);
}

/// Date range is inclusive at both ends.
#[test]
fn date_range_is_inclusive() {
    let store = fixture();
    let filter = ReportFilter {
        date_from: Some(date(2024, 1, 5)),
        date_to: Some(date(2024, 1, 20)),
        ..ReportFilter::default()
    };
    let report = run(&store, &ReportRequest::new(ReportKind::District).with_filter(filter));

    assert_eq!(report.summary.incidents, 2);
    assert_eq!(group(&report, &["Central"]).metrics.incidents, 2);
}

/// from > to is rejected before any fetch.
#[test]
fn inverted_date_range_is_invalid() {
    let store = fixture();
    let filter = ReportFilter {
        date_from: Some(date(2024, 2, 1)),
        date_to: Some(date(2024, 1, 1)),
        ..ReportFilter::default()
    };
    let result = ReportAssembler::new(&store, ReportConfig::default())
        .generate(&ReportRequest::new(ReportKind::District).with_filter(filter));

    assert!(matches!(result, Err(ReportError::InvalidFilter { .. })));
    assert_eq!(store.fetch_count(Entity::Incident), 0);
}

/// Classification filter keeps only matching accused rows and re-derives
/// incident, surety and status counts from what survives.
#[test]
fn status_filter_rederives_dimension_counts() {
    let store = fixture();
    let filter = ReportFilter {
        accused_statuses: vec![AccusedStatus::Bailed],
        ..ReportFilter::default()
    };
    let report = run(&store, &ReportRequest::new(ReportKind::District).with_filter(filter));

    let central = group(&report, &["Central"]);
    assert_eq!(central.metrics.accused, 1);
    assert_eq!(central.metrics.incidents, 1, "FIR 2 has no bailed accused");
    assert_eq!(central.metrics.statuses.bailed, 1);
    assert_eq!(central.metrics.statuses.arrested, 0);
    assert_eq!(central.metrics.surety_amount, Some(5000.0));
    assert_eq!(report.summary.accused, 2);
}

/// Groups left with no accused after the classification filter are dropped.
#[test]
fn status_filter_drops_emptied_groups() {
    let store = fixture();
    let filter = ReportFilter {
        accused_statuses: vec![AccusedStatus::Absconding],
        ..ReportFilter::default()
    };
    let report = run(&store, &ReportRequest::new(ReportKind::District).with_filter(filter));

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].key, GroupKey::single("Central"));
}

// ── Orphans & failures ───────────────────────────────────────────────────────

/// Scenario: an accused row whose FIR is gone is absent from every count.
#[test]
fn orphan_accused_rows_are_not_counted() {
    let store = MemoryStore::new(
        vec![fir(1, "Central", "Kotwali", date(2024, 1, 5))],
        vec![
            accused(10, 1, "A", Some("1"), AccusedStatus::Arrested),
            accused(11, 99, "Ghost", Some("1"), AccusedStatus::Arrested),
        ],
        vec![bail(100, 11, 99, 1000.0)],
    );

    for kind in [ReportKind::District, ReportKind::CustodyStatus, ReportKind::RepeatOffender] {
        let report = run(&store, &ReportRequest::new(kind.clone()));
        assert!(
            report.summary.accused <= 1,
            "{}: orphan counted, summary {:?}",
            kind.name(),
            report.summary
        );
        assert_eq!(report.summary.surety_amount, 0.0);
    }
    let repeat = run(&store, &ReportRequest::new(ReportKind::RepeatOffender));
    assert!(repeat.is_empty(), "Orphan must not lift a person over the threshold");
}

/// A failed incident fetch aborts the report.
#[test]
fn incident_fetch_failure_aborts_report() {
    let store = fixture().fail_on(Entity::Incident);
    let result = ReportAssembler::new(&store, ReportConfig::default())
        .generate(&ReportRequest::new(ReportKind::District));

    match result {
        Err(err) => assert!(err.is_fetch_failure(), "Unexpected error {err}"),
        Ok(report) => panic!("Expected fetch failure, got {report:?}"),
    }
}

/// A failed dependent fetch aborts too; no partial report is returned.
#[test]
fn accused_fetch_failure_aborts_report() {
    let store = fixture().fail_on(Entity::Accused);
    let result = ReportAssembler::new(&store, ReportConfig::default())
        .generate(&ReportRequest::new(ReportKind::CustodyStatus));

    assert!(matches!(
        result,
        Err(ReportError::Fetch {
            entity: Entity::Accused,
            ..
        })
    ));
}

// ── Custody & repeat offenders ───────────────────────────────────────────────

/// One group per classification present, ranked by accused count.
#[test]
fn custody_report_groups_by_classification() {
    let store = fixture();
    let report = run(&store, &ReportRequest::new(ReportKind::CustodyStatus));

    assert_eq!(report.groups.len(), 3);
    assert_eq!(report.groups[0].key, GroupKey::single("bailed"));
    assert_eq!(report.groups[0].metrics.accused, 2);
    assert_eq!(report.groups[0].metrics.persons, 2);
    assert_eq!(report.groups[0].metrics.surety_amount, None);
    assert_eq!(report.summary.accused, 4);
}

/// Custody status filter keeps only the requested classifications.
#[test]
fn custody_report_honours_status_filter() {
    let store = fixture();
    let filter = ReportFilter {
        accused_statuses: vec![AccusedStatus::Arrested, AccusedStatus::Absconding],
        ..ReportFilter::default()
    };
    let report = run(&store, &ReportRequest::new(ReportKind::CustodyStatus).with_filter(filter));

    let keys: Vec<String> = report.groups.iter().map(|g| g.key.to_string()).collect();
    assert_eq!(keys, vec!["absconding", "arrested"]);
}

/// A fingerprint is listed iff it occurs at least threshold times.
#[test]
fn repeat_offender_threshold_is_inclusive() {
    let store = fixture();
    let report = run(&store, &ReportRequest::new(ReportKind::RepeatOffender));

    assert_eq!(report.groups.len(), 1);
    let offender = report.groups[0].offender.as_ref().expect("offender profile");
    assert_eq!(offender.fingerprint, "mobile:9990001111");
    assert_eq!(offender.names, vec!["A".to_string(), "A. Kumar".to_string()]);
    assert_eq!(offender.display_name, "A");
    assert_eq!(offender.fir_ids, vec![1, 3]);
    assert_eq!(offender.districts, vec!["Central".to_string(), "North".to_string()]);
    assert_eq!(offender.latest_status, AccusedStatus::Bailed);

    let strict = ReportConfig {
        repeat_offender_threshold: 3,
        ..ReportConfig::default()
    };
    let report = ReportAssembler::new(&store, strict)
        .generate(&ReportRequest::new(ReportKind::RepeatOffender))
        .unwrap();
    assert!(report.is_empty());
}

/// Blank identities collapse into one person unless excluded by config.
#[test]
fn blank_identities_collide_unless_excluded() {
    let blank = |id, fir_id| AccusedRecord {
        id,
        fir_id,
        name: None,
        mobile: None,
        national_id: None,
        status: AccusedStatus::Unknown,
    };
    let store = MemoryStore::new(
        vec![
            fir(1, "Central", "Kotwali", date(2024, 1, 5)),
            fir(2, "North", "Model Town", date(2024, 1, 6)),
        ],
        vec![blank(10, 1), blank(11, 2)],
        vec![],
    );

    let report = run(&store, &ReportRequest::new(ReportKind::RepeatOffender));
    assert_eq!(report.groups.len(), 1);
    let offender = report.groups[0].offender.as_ref().unwrap();
    assert_eq!(offender.display_name, "Unknown");
    assert!(offender.names.is_empty());

    let config = ReportConfig {
        exclude_blank_identity: true,
        ..ReportConfig::default()
    };
    let report = ReportAssembler::new(&store, config)
        .generate(&ReportRequest::new(ReportKind::RepeatOffender))
        .unwrap();
    assert!(report.is_empty());
}

// ── Idempotence ──────────────────────────────────────────────────────────────

/// Same inputs, same report, down to the serialized bytes.
#[test]
fn generation_is_idempotent() {
    let store = fixture();
    for kind in [
        ReportKind::District,
        ReportKind::DistrictThana,
        ReportKind::Daily,
        ReportKind::CustodyStatus,
        ReportKind::RepeatOffender,
    ] {
        let request = ReportRequest::new(kind);
        let first = serde_json::to_string(&run(&store, &request)).unwrap();
        let second = serde_json::to_string(&run(&store, &request)).unwrap();
        assert_eq!(first, second);
    }
}

/// The summary is the sum of the emitted groups.
#[test]
fn summary_is_sum_of_groups() {
    let store = fixture();
    let report = run(&store, &ReportRequest::new(ReportKind::DistrictThana));

    let accused: u64 = report.groups.iter().map(|g| g.metrics.accused).sum();
    let persons: u64 = report.groups.iter().map(|g| g.metrics.persons).sum();
    assert_eq!(report.summary.accused, accused);
    assert_eq!(report.summary.persons, persons);
    assert_eq!(report.summary.groups, report.groups.len() as u64);
}

/// Dropdown values: sorted, distinct, thanas narrowed by district.
#[test]
fn filter_options_list_distinct_values() {
    let store = fixture();
    let assembler = ReportAssembler::new(&store, ReportConfig::default());

    let all = assembler.filter_options(None).unwrap();
    assert_eq!(all.districts, vec!["Central", "North"]);
    assert_eq!(all.thanas.len(), 3);

    let central = assembler.filter_options(Some("Central")).unwrap();
    assert_eq!(central.thanas, vec!["Civil Lines", "Kotwali"]);
}

/// A district picked from the dropdown selects every row its group counts,
/// including rows stored with surrounding whitespace.
#[test]
fn dropdown_district_filter_matches_its_group() {
    let store = MemoryStore::new(
        vec![
            fir(1, "Central", "Kotwali", date(2024, 1, 5)),
            fir(2, " Central ", "Kotwali ", date(2024, 1, 6)),
            fir(3, "North", "Rohini", date(2024, 1, 7)),
        ],
        vec![],
        vec![],
    );
    let assembler = ReportAssembler::new(&store, ReportConfig::default());
    let options = assembler.filter_options(Some("Central")).unwrap();
    assert_eq!(options.districts, vec!["Central", "North"]);
    assert_eq!(options.thanas, vec!["Kotwali"]);

    let unfiltered = assembler
        .generate(&ReportRequest::new(ReportKind::District))
        .unwrap();
    let filter = ReportFilter {
        district: Some(options.districts[0].clone()),
        ..ReportFilter::default()
    };
    let filtered = assembler
        .generate(&ReportRequest::new(ReportKind::District).with_filter(filter))
        .unwrap();

    assert_eq!(group(&unfiltered, &["Central"]).metrics.incidents, 2);
    assert_eq!(filtered.summary.incidents, 2);
    assert_eq!(filtered.groups.len(), 1);
}
