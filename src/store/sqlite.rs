use super::{RateStore, Result, validate_records};
use crate::core::rates::{NewRateRecord, RateRecord};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, instrument};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS Rates (
        Id INTEGER PRIMARY KEY AUTOINCREMENT,
        CurrencyCode TEXT NOT NULL,
        ExchangeRate REAL NOT NULL,
        Timestamp DATETIME NOT NULL
    );
    CREATE INDEX IF NOT EXISTS IX_Rates_CurrencyCode ON Rates (CurrencyCode);";

/// Rate table in a local SQLite file.
///
/// A connection is opened per operation, so a locked or broken file surfaces as an
/// error on the call that hits it and the next call starts fresh.
pub struct SqliteRateStore {
    path: PathBuf,
    writer: Mutex<()>,
}

impl SqliteRateStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn)
    }
}

fn to_record(row: &Row<'_>) -> rusqlite::Result<RateRecord> {
    Ok(RateRecord {
        id: row.get(0)?,
        currency_code: row.get(1)?,
        exchange_rate: row.get(2)?,
        timestamp: row.get(3)?,
    })
}

fn has_rows(conn: &Connection) -> rusqlite::Result<bool> {
    conn.query_row("SELECT EXISTS (SELECT 1 FROM Rates)", [], |row| row.get(0))
}

impl RateStore for SqliteRateStore {
    fn ensure_schema(&self) -> Result<()> {
        self.connect().map(|_| ())
    }

    #[instrument(name = "RateStoreReplace", skip_all, fields(count = records.len()))]
    fn replace_all(&self, records: &[NewRateRecord]) -> Result<()> {
        validate_records(records)?;
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if has_rows(&tx)? {
            let removed = tx.execute("DELETE FROM Rates", [])?;
            debug!(removed, "Cleared previous rates");
        }
        {
            let mut insert = tx.prepare(
                "INSERT INTO Rates (CurrencyCode, ExchangeRate, Timestamp) VALUES (?1, ?2, ?3)",
            )?;
            for record in records {
                insert.execute(params![
                    record.currency_code,
                    record.exchange_rate,
                    record.timestamp
                ])?;
            }
        }
        tx.commit()?;
        debug!("Stored {} rates", records.len());
        Ok(())
    }

    fn find_by_code(&self, code: &str) -> Result<Option<RateRecord>> {
        let conn = self.connect()?;
        let record = conn
            .query_row(
                "SELECT Id, CurrencyCode, ExchangeRate, Timestamp FROM Rates
                 WHERE CurrencyCode = ?1 ORDER BY Id DESC LIMIT 1",
                params![code],
                to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn any(&self) -> Result<bool> {
        let conn = self.connect()?;
        Ok(has_rows(&conn)?)
    }

    fn count(&self) -> Result<usize> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM Rates", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn all(&self) -> Result<Vec<RateRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT Id, CurrencyCode, ExchangeRate, Timestamp FROM Rates
             ORDER BY CurrencyCode, Id",
        )?;
        let records = stmt
            .query_map([], to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}
