use crate::error::StoreError;
use crate::models::ListingRecord;
use crate::store::{InsertOutcome, ListingStore};
use rusqlite::{ffi, params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS listings (
    id            INTEGER PRIMARY KEY,
    url           TEXT    NOT NULL UNIQUE,
    title         TEXT    NOT NULL,
    price_usd     INTEGER NOT NULL CHECK (price_usd >= 0),
    odometer_km   INTEGER NOT NULL CHECK (odometer_km >= 0),
    seller_name   TEXT    NOT NULL,
    phone_numbers TEXT    NOT NULL,
    image_url     TEXT    NOT NULL,
    image_count   INTEGER NOT NULL CHECK (image_count >= 0),
    plate_number  TEXT    NOT NULL,
    vin           TEXT    NOT NULL,
    discovered_at TEXT    NOT NULL
);
"#;

const COLUMNS: &str = "url, title, price_usd, odometer_km, seller_name, phone_numbers, \
                       image_url, image_count, plate_number, vin, discovered_at";

/// SQLite-backed store; one connection shared behind a mutex
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file and make sure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        info!("Opened listing store at {}", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    pub fn get(&self, url: &str) -> Result<Option<ListingRecord>, StoreError> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM listings WHERE url = ?1"),
                params![url],
                read_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Every stored record, ordered by URL.
    pub fn all(&self) -> Result<Vec<ListingRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM listings ORDER BY url"))?;
        let rows = stmt.query_map([], read_record)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM listings", [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }
}

fn read_record(row: &Row<'_>) -> rusqlite::Result<ListingRecord> {
    Ok(ListingRecord {
        url: row.get(0)?,
        title: row.get(1)?,
        price_usd: row.get(2)?,
        odometer_km: row.get(3)?,
        seller_name: row.get(4)?,
        phone_numbers: row.get(5)?,
        image_url: row.get(6)?,
        image_count: row.get(7)?,
        plate_number: row.get(8)?,
        vin: row.get(9)?,
        discovered_at: row.get(10)?,
    })
}

impl ListingStore for SqliteStore {
    fn exists(&self, url: &str) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM listings WHERE url = ?1 LIMIT 1",
                params![url],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn insert(&self, record: &ListingRecord) -> Result<InsertOutcome, StoreError> {
        let conn = self.conn()?;
        let result = conn.execute(
            &format!(
                "INSERT INTO listings ({COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
            ),
            params![
                record.url,
                record.title,
                record.price_usd,
                record.odometer_km,
                record.seller_name,
                record.phone_numbers,
                record.image_url,
                record.image_count,
                record.plate_number,
                record.vin,
                record.discovered_at,
            ],
        );

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }
}
