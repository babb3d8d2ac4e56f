//! FIR row queries.

use super::{conversion_error, where_clause, SqliteStore};
use crate::{error::ReportResult, model::IncidentRecord, query::FetchQuery, types::RecordId};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, params_from_iter};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

impl SqliteStore {
    pub fn insert_incident(&self, row: &IncidentRecord) -> ReportResult<()> {
        self.conn.execute(
            "INSERT INTO fir (
                 id, fir_number, district, thana, created_at,
                 incident_date, case_status, complainant_name
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                row.id,
                row.fir_number,
                row.district,
                row.thana,
                row.created_at.format(DATETIME_FORMAT).to_string(),
                row.incident_date.map(|d| d.format(DATE_FORMAT).to_string()),
                row.case_status,
                row.complainant_name,
            ],
        )?;
        Ok(())
    }

    /// Remove a FIR row without touching its dependents.
    pub fn delete_incident(&self, id: RecordId) -> ReportResult<()> {
        self.conn
            .execute("DELETE FROM fir WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Count total FIR rows (test helper).
    pub fn incident_count(&self) -> ReportResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM fir", [], |r| r.get(0))?)
    }

    pub(super) fn select_incidents(&self, query: &FetchQuery) -> ReportResult<Vec<IncidentRecord>> {
        let (clause, values) = where_clause(query);
        let sql = format!(
            "SELECT id, fir_number, district, thana, created_at,
                    incident_date, case_status, complainant_name
             FROM fir{clause}"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), |r| {
                let created_at: String = r.get(4)?;
                let incident_date: Option<String> = r.get(5)?;
                Ok(IncidentRecord {
                    id: r.get(0)?,
                    fir_number: r.get(1)?,
                    district: r.get(2)?,
                    thana: r.get(3)?,
                    created_at: NaiveDateTime::parse_from_str(&created_at, DATETIME_FORMAT)
                        .map_err(|e| conversion_error(4, e))?,
                    incident_date: incident_date
                        .map(|d| NaiveDate::parse_from_str(&d, DATE_FORMAT))
                        .transpose()
                        .map_err(|e| conversion_error(5, e))?,
                    case_status: r.get(6)?,
                    complainant_name: r.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
