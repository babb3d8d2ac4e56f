//! Bail surety row queries.

use super::{where_clause, SqliteStore};
use crate::{error::ReportResult, model::BailRecord, query::FetchQuery};
use rusqlite::{params, params_from_iter};

impl SqliteStore {
    pub fn insert_bail(&self, row: &BailRecord) -> ReportResult<()> {
        self.conn.execute(
            "INSERT INTO bail (
                 id, accused_id, fir_id, surety_name, surety_mobile,
                 surety_relation, surety_amount
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                row.id,
                row.accused_id,
                row.fir_id,
                row.surety_name,
                row.surety_mobile,
                row.surety_relation,
                row.surety_amount,
            ],
        )?;
        Ok(())
    }

    /// Count total bail rows (test helper).
    pub fn bail_count(&self) -> ReportResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM bail", [], |r| r.get(0))?)
    }

    pub(super) fn select_bails(&self, query: &FetchQuery) -> ReportResult<Vec<BailRecord>> {
        let (clause, values) = where_clause(query);
        let sql = format!(
            "SELECT id, accused_id, fir_id, surety_name, surety_mobile,
                    surety_relation, surety_amount
             FROM bail{clause}"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), |r| {
                Ok(BailRecord {
                    id: r.get(0)?,
                    accused_id: r.get(1)?,
                    fir_id: r.get(2)?,
                    surety_name: r.get(3)?,
                    surety_mobile: r.get(4)?,
                    surety_relation: r.get(5)?,
                    surety_amount: r.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
