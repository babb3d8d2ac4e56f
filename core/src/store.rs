//! Record Store Client: the engine's only data source.
//!
//! RULE: Only the store talks to the database.
//! The report assembler calls `RecordStore` methods and never builds SQL.

use crate::{
    error::{ReportError, ReportResult},
    model::{AccusedRecord, BailRecord, IncidentRecord},
    query::{Entity, FetchQuery, Predicate},
};
use rusqlite::{types::Value, Connection};

mod accused;
mod bail;
mod incident;
mod memory;

pub use memory::MemoryStore;

/// Largest id list bound into a single `IN (...)` clause.
const MAX_IN_PARAMS: usize = 500;

/// Fetch capability the report assembler is handed explicitly.
///
/// Rows come back fully materialised and ordered by id. Any failure aborts
/// the report that asked for them; implementations own retry policy.
pub trait RecordStore {
    fn fetch_incidents(&self, query: &FetchQuery) -> ReportResult<Vec<IncidentRecord>>;

    fn fetch_accused(&self, query: &FetchQuery) -> ReportResult<Vec<AccusedRecord>>;

    fn fetch_bails(&self, query: &FetchQuery) -> ReportResult<Vec<BailRecord>>;

    /// Non-blank district names, sorted, for filter dropdowns.
    fn distinct_districts(&self) -> ReportResult<Vec<String>>;

    /// Non-blank thana names, sorted, optionally within one district.
    fn distinct_thanas(&self, district: Option<&str>) -> ReportResult<Vec<String>>;
}

/// Reject a query addressed to the wrong entity or carrying bad predicates.
pub(crate) fn check_query(query: &FetchQuery, entity: Entity) -> ReportResult<()> {
    if query.entity != entity {
        return Err(ReportError::InvalidFilter {
            message: format!("expected a {entity} query, got {}", query.entity),
        });
    }
    query.validate()
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the record database at `path`.
    pub fn open(path: &str) -> ReportResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode: better concurrent read performance.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> ReportResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> ReportResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_records.sql"))?;
        Ok(())
    }

    /// Insert every row in one transaction.
    pub fn insert_batch(
        &self,
        incidents: &[IncidentRecord],
        accused: &[AccusedRecord],
        bails: &[BailRecord],
    ) -> ReportResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for row in incidents {
            self.insert_incident(row)?;
        }
        for row in accused {
            self.insert_accused(row)?;
        }
        for row in bails {
            self.insert_bail(row)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Run `select` once per id chunk when the query carries an `IN` list
    /// too long for one statement, then restore id order and the limit.
    fn chunked<T>(
        &self,
        query: &FetchQuery,
        id_of: impl Fn(&T) -> i64,
        select: impl Fn(&FetchQuery) -> ReportResult<Vec<T>>,
    ) -> ReportResult<Vec<T>> {
        let oversized = query.predicates.iter().position(|p| {
            matches!(p, Predicate::In { ids, .. } if ids.len() > MAX_IN_PARAMS)
        });
        let Some(index) = oversized else {
            return select(query);
        };
        let Predicate::In { field, ids } = &query.predicates[index] else {
            return select(query);
        };

        let mut rows = Vec::new();
        for chunk in ids.chunks(MAX_IN_PARAMS) {
            let mut part = query.clone();
            part.predicates[index] = Predicate::In {
                field: *field,
                ids: chunk.to_vec(),
            };
            rows.extend(select(&part)?);
        }
        rows.sort_by_key(|r| id_of(r));
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }
}

impl RecordStore for SqliteStore {
    fn fetch_incidents(&self, query: &FetchQuery) -> ReportResult<Vec<IncidentRecord>> {
        check_query(query, Entity::Incident)?;
        self.chunked(query, |r: &IncidentRecord| r.id, |q| self.select_incidents(q))
    }

    fn fetch_accused(&self, query: &FetchQuery) -> ReportResult<Vec<AccusedRecord>> {
        check_query(query, Entity::Accused)?;
        self.chunked(query, |r: &AccusedRecord| r.id, |q| self.select_accused(q))
    }

    fn fetch_bails(&self, query: &FetchQuery) -> ReportResult<Vec<BailRecord>> {
        check_query(query, Entity::Bail)?;
        self.chunked(query, |r: &BailRecord| r.id, |q| self.select_bails(q))
    }

    fn distinct_districts(&self) -> ReportResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT trim(district) FROM fir
             WHERE district IS NOT NULL AND trim(district) <> ''
             ORDER BY 1 ASC",
        )?;
        let names = stmt
            .query_map([], |r| r.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn distinct_thanas(&self, district: Option<&str>) -> ReportResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT trim(thana) FROM fir
             WHERE thana IS NOT NULL AND trim(thana) <> ''
               AND (?1 IS NULL OR trim(district) = ?1)
             ORDER BY 1 ASC",
        )?;
        let names = stmt
            .query_map([district.map(str::trim)], |r| r.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }
}

/// Build ` WHERE ... ORDER BY id ASC [LIMIT n]` and its bound values.
fn where_clause(query: &FetchQuery) -> (String, Vec<Value>) {
    let mut frags = Vec::new();
    let mut values = Vec::new();

    for predicate in &query.predicates {
        let column = predicate.field().column();
        match predicate {
            Predicate::Eq { value, .. } => {
                frags.push(format!("trim({column}) = ?"));
                values.push(Value::Text(value.trim().to_string()));
            }
            Predicate::In { ids, .. } => {
                if ids.is_empty() {
                    frags.push("0".to_string());
                    continue;
                }
                let marks = vec!["?"; ids.len()].join(", ");
                frags.push(format!("{column} IN ({marks})"));
                values.extend(ids.iter().map(|id| Value::Integer(*id)));
            }
            Predicate::DateRange { from, to, .. } => {
                // Dates are stored as ISO text, so the leading 10 chars
                // compare correctly for both DATE and DATETIME columns.
                let expr = format!("substr({column}, 1, 10)");
                frags.push(format!("{column} IS NOT NULL"));
                if let Some(from) = from {
                    frags.push(format!("{expr} >= ?"));
                    values.push(Value::Text(from.format("%Y-%m-%d").to_string()));
                }
                if let Some(to) = to {
                    frags.push(format!("{expr} <= ?"));
                    values.push(Value::Text(to.format("%Y-%m-%d").to_string()));
                }
            }
        }
    }

    let mut sql = String::new();
    if !frags.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&frags.join(" AND "));
    }
    sql.push_str(" ORDER BY id ASC");
    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        values.push(Value::Integer(limit as i64));
    }
    (sql, values)
}

pub(crate) fn conversion_error(
    index: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(err))
}
