//! Accused row queries.

use super::{where_clause, SqliteStore};
use crate::{
    error::ReportResult,
    model::{AccusedRecord, AccusedStatus},
    query::FetchQuery,
};
use rusqlite::{params, params_from_iter};

impl SqliteStore {
    pub fn insert_accused(&self, row: &AccusedRecord) -> ReportResult<()> {
        self.insert_accused_with_status_text(row, Some(row.status.as_str()))
    }

    /// Insert with the status column exactly as a case-entry screen would
    /// have written it (free text, possibly blank).
    pub fn insert_accused_with_status_text(
        &self,
        row: &AccusedRecord,
        status_text: Option<&str>,
    ) -> ReportResult<()> {
        self.conn.execute(
            "INSERT INTO accused (id, fir_id, name, mobile, national_id, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                row.id,
                row.fir_id,
                row.name,
                row.mobile,
                row.national_id,
                status_text,
            ],
        )?;
        Ok(())
    }

    /// Count total accused rows (test helper).
    pub fn accused_count(&self) -> ReportResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM accused", [], |r| r.get(0))?)
    }

    pub(super) fn select_accused(&self, query: &FetchQuery) -> ReportResult<Vec<AccusedRecord>> {
        let (clause, values) = where_clause(query);
        let sql = format!(
            "SELECT id, fir_id, name, mobile, national_id, status FROM accused{clause}"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), |r| {
                let status: Option<String> = r.get(5)?;
                Ok(AccusedRecord {
                    id: r.get(0)?,
                    fir_id: r.get(1)?,
                    name: r.get(2)?,
                    mobile: r.get(3)?,
                    national_id: r.get(4)?,
                    status: AccusedStatus::parse(status.as_deref()),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
