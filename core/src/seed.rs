//! Synthetic FIR, accused and bail rows for demos and volume tests.
//!
//! Generation is deterministic: the same seed and plan always produce the
//! same rows. A share of accused rows re-use an earlier person's identity
//! (sometimes with a differently spelled name) so repeat-offender reports
//! have something to find.

use crate::{
    error::ReportResult,
    model::{AccusedRecord, AccusedStatus, BailRecord, IncidentRecord},
    name_generator::NameGenerator,
    rng::{SeedRng, SeedStream},
    store::{MemoryStore, SqliteStore},
};
use chrono::{Duration, NaiveDate, NaiveTime};

pub const DISTRICTS: &[(&str, &[&str])] = &[
    ("Central", &["Kotwali", "Civil Lines", "Sadar Bazar"]),
    ("North", &["Model Town", "Rohini", "Narela"]),
    ("South", &["Hauz Khas", "Saket", "Malviya Nagar"]),
    ("East", &["Shahdara", "Gandhi Nagar"]),
    ("West", &["Janakpuri", "Punjabi Bagh"]),
];

const CASE_STATUSES: &[&str] = &["Under Investigation", "Chargesheeted", "Pending Trial", "Closed"];

/// 2024-01-01, checked at compile time.
const DEFAULT_START: NaiveDate = match NaiveDate::from_ymd_opt(2024, 1, 1) {
    Some(date) => date,
    None => panic!("invalid seed start date"),
};

#[derive(Debug, Clone)]
pub struct SeedPlan {
    pub incidents: usize,
    pub max_accused_per_incident: u64,
    /// Probability an accused row re-uses an earlier person.
    pub repeat_share: f64,
    /// Probability an accused row has no mobile, national ID or name.
    pub blank_identity_share: f64,
    /// Probability a FIR has no district/thana recorded.
    pub missing_location_share: f64,
    pub start: NaiveDate,
    pub span_days: u64,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            incidents: 200,
            max_accused_per_incident: 3,
            repeat_share: 0.15,
            blank_identity_share: 0.02,
            missing_location_share: 0.03,
            start: DEFAULT_START,
            span_days: 365,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SeedData {
    pub incidents: Vec<IncidentRecord>,
    pub accused: Vec<AccusedRecord>,
    pub bails: Vec<BailRecord>,
}

impl SeedData {
    pub fn load_into(&self, store: &SqliteStore) -> ReportResult<()> {
        store.insert_batch(&self.incidents, &self.accused, &self.bails)
    }

    pub fn into_memory_store(self) -> MemoryStore {
        MemoryStore::new(self.incidents, self.accused, self.bails)
    }
}

struct Person {
    name: Option<String>,
    mobile: Option<String>,
    national_id: Option<String>,
}

pub fn generate(seed: u64, plan: &SeedPlan) -> SeedData {
    let mut incident_rng = SeedRng::new(seed, SeedStream::Incident);
    let mut accused_rng = SeedRng::new(seed, SeedStream::Accused);
    let mut bail_rng = SeedRng::new(seed, SeedStream::Bail);

    let mut data = SeedData::default();
    let mut people: Vec<Person> = Vec::new();
    let span = plan.span_days.max(1);

    for n in 0..plan.incidents {
        let fir_id = n as i64 + 1;
        let (district, thanas) = *incident_rng.pick(DISTRICTS);
        let thana = *incident_rng.pick(thanas);
        let missing_location = incident_rng.chance(plan.missing_location_share);

        let day = incident_rng.next_u64_below(span) as i64;
        let hour = incident_rng.next_u64_below(24) as i64;
        let created_at = (plan.start + Duration::days(day)).and_time(NaiveTime::MIN)
            + Duration::hours(hour);
        let lag = incident_rng.next_u64_below(4) as i64;
        let incident_date =
            (!incident_rng.chance(0.05)).then(|| created_at.date() - Duration::days(lag));

        data.incidents.push(IncidentRecord {
            id: fir_id,
            fir_number: Some(format!("FIR/{}/{:05}", created_at.format("%Y"), fir_id)),
            district: (!missing_location).then(|| district.to_string()),
            thana: (!missing_location).then(|| thana.to_string()),
            created_at,
            incident_date,
            case_status: Some(incident_rng.pick(CASE_STATUSES).to_string()),
            complainant_name: Some(NameGenerator::full_name(&mut incident_rng)),
        });

        let accused_count = 1 + accused_rng.next_u64_below(plan.max_accused_per_incident.max(1));
        for _ in 0..accused_count {
            let person = if accused_rng.chance(plan.blank_identity_share) {
                Person {
                    name: None,
                    mobile: None,
                    national_id: None,
                }
            } else if !people.is_empty() && accused_rng.chance(plan.repeat_share) {
                let known = accused_rng.pick(&people);
                let name = match &known.name {
                    Some(name) if accused_rng.chance(0.5) => {
                        Some(NameGenerator::variant_of(name, &mut accused_rng))
                    }
                    other => other.clone(),
                };
                Person {
                    name,
                    mobile: known.mobile.clone(),
                    national_id: known.national_id.clone(),
                }
            } else {
                let fresh = Person {
                    name: Some(NameGenerator::full_name(&mut accused_rng)),
                    mobile: (!accused_rng.chance(0.2))
                        .then(|| format!("9{:09}", accused_rng.next_u64_below(1_000_000_000))),
                    national_id: accused_rng.chance(0.5).then(|| {
                        format!("{:012}", accused_rng.next_u64_below(1_000_000_000_000))
                    }),
                };
                people.push(Person {
                    name: fresh.name.clone(),
                    mobile: fresh.mobile.clone(),
                    national_id: fresh.national_id.clone(),
                });
                fresh
            };

            let roll = accused_rng.next_f64();
            let status = if roll < 0.40 {
                AccusedStatus::Arrested
            } else if roll < 0.70 {
                AccusedStatus::Bailed
            } else if roll < 0.85 {
                AccusedStatus::Absconding
            } else {
                AccusedStatus::Unknown
            };

            let accused_id = data.accused.len() as i64 + 1;
            data.accused.push(AccusedRecord {
                id: accused_id,
                fir_id,
                name: person.name,
                mobile: person.mobile,
                national_id: person.national_id,
                status,
            });

            if status == AccusedStatus::Bailed {
                data.bails.push(BailRecord {
                    id: data.bails.len() as i64 + 1,
                    accused_id,
                    fir_id,
                    surety_name: Some(NameGenerator::full_name(&mut bail_rng)),
                    surety_mobile: Some(format!("8{:09}", bail_rng.next_u64_below(1_000_000_000))),
                    surety_relation: Some(NameGenerator::relation(&mut bail_rng).to_string()),
                    surety_amount: Some(5_000.0 * (2 + bail_rng.next_u64_below(19)) as f64),
                });
            }
        }
    }

    log::debug!(
        "seed {seed}: generated {} incidents, {} accused, {} bails",
        data.incidents.len(),
        data.accused.len(),
        data.bails.len(),
    );
    data
}
