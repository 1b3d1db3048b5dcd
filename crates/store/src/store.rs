use std::cmp::Ordering;
use std::path::Path;

use chrono::Datelike;
use idmatch_recon::{CandidateRecord, DemographicStore, PersonQuery, StoreUnavailable, UsState};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OpenFlags, Row};

use crate::error::store_error;
use crate::schema::{create_table_sql, table_name, DemographicRow, COLUMNS};

/// Case-insensitive comparison that also folds non-ASCII letters
/// (`JOSÉ` = `José`). SQLite's built-in NOCASE only folds ASCII.
const FOLD_COLLATION: &str = "IDMATCH_NOCASE";

/// SQLite-backed demographic store
pub struct SqliteDemographicStore {
    conn: Connection,
    reference_year: Option<i32>,
}

impl SqliteDemographicStore {
    /// Open an existing database file read-only.
    ///
    /// Fails with [`StoreUnavailable::Connection`] if the file is missing or
    /// is not a SQLite database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreUnavailable> {
        let path = path.as_ref();
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)
            .map_err(|e| StoreUnavailable::Connection(format!("{}: {e}", path.display())))?;

        // SQLite opens lazily; touch the schema so a bad file fails here.
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |r| r.get::<_, i64>(0))
            .map_err(|e| StoreUnavailable::Connection(format!("{}: {e}", path.display())))?;

        log::debug!("opened demographic store {}", path.display());
        Self::new(conn).map_err(|e| StoreUnavailable::Connection(format!("{}: {e}", path.display())))
    }

    /// Wrap an existing connection, registering the lookup collation on it.
    pub fn new(conn: Connection) -> rusqlite::Result<Self> {
        conn.create_collation(FOLD_COLLATION, fold_case_cmp)?;
        Ok(Self { conn, reference_year: None })
    }

    /// Writable in-memory store (for testing and fixtures)
    pub fn in_memory() -> rusqlite::Result<Self> {
        Self::new(Connection::open_in_memory()?)
    }

    /// Compute ages against a fixed year instead of the current one.
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn create_state_table(&self, state: UsState) -> rusqlite::Result<()> {
        self.conn.execute(&create_table_sql(state), [])?;
        Ok(())
    }

    pub fn insert(&self, state: UsState, row: &DemographicRow) -> rusqlite::Result<()> {
        self.conn.execute(
            &format!("INSERT INTO {} ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)", table_name(state)),
            rusqlite::params![
                row.individualid,
                row.firstname,
                row.lastname,
                row.gender,
                row.birthdate,
                row.city,
                row.state,
                row.zip,
            ],
        )?;
        Ok(())
    }

    fn reference_year(&self) -> i32 {
        self.reference_year.unwrap_or_else(|| chrono::Local::now().year())
    }
}

impl DemographicStore for SqliteDemographicStore {
    fn lookup(&self, query: &PersonQuery) -> Result<Vec<CandidateRecord>, StoreUnavailable> {
        let mut columns = vec!["firstname", "lastname"];
        let mut values = vec![query.given_name.as_str(), query.family_name.as_str()];
        if let Some(city) = &query.city {
            columns.push("city");
            values.push(city.as_str());
        }
        if let Some(zip) = &query.postal_code {
            columns.push("zip");
            values.push(zip.as_str());
        }

        let predicates: Vec<String> = columns
            .iter()
            .map(|c| format!("{c} = ? COLLATE {FOLD_COLLATION}"))
            .collect();
        let sql = format!(
            "SELECT {COLUMNS} FROM {} WHERE {}",
            table_name(query.state),
            predicates.join(" AND "),
        );

        let mut stmt = self.conn.prepare(&sql).map_err(store_error)?;
        let rows = stmt
            .query_map(params_from_iter(values), read_row)
            .map_err(store_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(store_error)?;

        let year = self.reference_year();
        Ok(rows.into_iter().map(|r| r.into_candidate(year)).collect())
    }
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<DemographicRow> {
    Ok(DemographicRow {
        individualid: text(row.get(0)?).unwrap_or_default(),
        firstname: text(row.get(1)?).unwrap_or_default(),
        lastname: text(row.get(2)?).unwrap_or_default(),
        gender: text(row.get(3)?),
        birthdate: text(row.get(4)?),
        city: text(row.get(5)?),
        state: text(row.get(6)?),
        zip: text(row.get(7)?),
    })
}

fn fold_case_cmp(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Source tables mix TEXT, INTEGER and REAL affinity for ids, dates and zips.
/// Whole REAL values read as their integer text; fractional ones are dropped.
fn text(value: Value) -> Option<String> {
    match value {
        Value::Text(s) if !s.is_empty() => Some(s),
        Value::Integer(n) => Some(n.to_string()),
        Value::Real(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some((f as i64).to_string()),
        _ => None,
    }
}
