//! Persistent storage for battery health history.
//!
//! One SQLite table of point-in-time samples. The recorder decides when a
//! sample is worth keeping; this module only stores and serves rows.

use std::path::PathBuf;

use chrono::{Local, TimeZone};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::config::data_dir;

const DATABASE_NAME: &str = "battery_records.db";

/// One persisted health sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryRecord {
    pub id: Option<i64>,
    /// Unix timestamp of the sample.
    pub create_date: i64,
    /// Which policy produced the row; see `RecordPolicy::record_type_code`.
    pub record_type: i64,
    pub cycle_count: i64,
    pub nominal_charge_capacity: Option<i64>,
    pub design_capacity: Option<i64>,
    /// Pre-formatted health percentage at the time of the sample.
    pub maximum_capacity: Option<String>,
}

impl BatteryRecord {
    pub fn new(
        create_date: i64,
        record_type: i64,
        cycle_count: i64,
        nominal_charge_capacity: Option<i64>,
        design_capacity: Option<i64>,
        maximum_capacity: Option<String>,
    ) -> Self {
        Self {
            id: None,
            create_date,
            record_type,
            cycle_count,
            nominal_charge_capacity,
            design_capacity,
            maximum_capacity,
        }
    }
}

/// Errors that can occur during history storage operations
#[derive(Debug, thiserror::Error)]
pub enum HistoryStoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HistoryStoreError>;

/// History storage backed by SQLite
pub struct HistoryStore {
    conn: Connection,
}

impl HistoryStore {
    /// Open or create the history database in the app data directory.
    pub fn open() -> Result<Self> {
        let dir = data_dir();
        std::fs::create_dir_all(&dir)?;
        Self::open_at(dir.join(DATABASE_NAME))
    }

    pub fn open_at(path: PathBuf) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA busy_timeout=5000;",
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS battery_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                createDate INTEGER NOT NULL,
                recordType INTEGER NOT NULL,
                cycleCount INTEGER NOT NULL,
                nominalChargeCapacity INTEGER,
                designCapacity INTEGER,
                maximumCapacity TEXT
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_battery_records_date
             ON battery_records(createDate)",
            [],
        )?;

        Ok(Self { conn })
    }

    pub fn count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM battery_records", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn insert(&self, record: &BatteryRecord) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO battery_records
                (createDate, recordType, cycleCount, nominalChargeCapacity, designCapacity, maximumCapacity)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                record.create_date,
                record.record_type,
                record.cycle_count,
                record.nominal_charge_capacity,
                record.design_capacity,
                record.maximum_capacity,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All records, newest first.
    pub fn fetch_all(&self) -> Result<Vec<BatteryRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, createDate, recordType, cycleCount, nominalChargeCapacity, designCapacity, maximumCapacity
             FROM battery_records
             ORDER BY createDate DESC, id DESC",
        )?;

        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// The most recent record, if any.
    pub fn latest(&self) -> Result<Option<BatteryRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, createDate, recordType, cycleCount, nominalChargeCapacity, designCapacity, maximumCapacity
                 FROM battery_records
                 ORDER BY createDate DESC, id DESC
                 LIMIT 1",
                [],
                Self::row_to_record,
            )
            .optional()?;

        Ok(record)
    }

    /// Newest record carrying the given cycle count.
    pub fn record_for_cycle_count(&self, cycle_count: i64) -> Result<Option<BatteryRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, createDate, recordType, cycleCount, nominalChargeCapacity, designCapacity, maximumCapacity
                 FROM battery_records
                 WHERE cycleCount = ?
                 ORDER BY createDate DESC, id DESC
                 LIMIT 1",
                [cycle_count],
                Self::row_to_record,
            )
            .optional()?;

        Ok(record)
    }

    /// Delete one record by id. Returns whether a row was removed.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM battery_records WHERE id = ?", [id])?;
        Ok(deleted > 0)
    }

    pub fn delete_all(&self) -> Result<usize> {
        let deleted = self.conn.execute("DELETE FROM battery_records", [])?;
        Ok(deleted)
    }

    /// Render every record as CSV, newest first. Numeric nulls render `0`,
    /// the text column renders `N/A`.
    pub fn export_csv(&self) -> Result<String> {
        let mut csv =
            String::from("ID,CreateDate,CycleCount,NominalChargeCapacity,DesignCapacity,MaximumCapacity\n");

        for record in self.fetch_all()? {
            let date = match Local.timestamp_opt(record.create_date, 0) {
                chrono::LocalResult::Single(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
                _ => "N/A".to_string(),
            };
            csv.push_str(&format!(
                "{},{},{},{},{},{}\n",
                record.id.unwrap_or(0),
                date,
                record.cycle_count,
                record.nominal_charge_capacity.unwrap_or(0),
                record.design_capacity.unwrap_or(0),
                record.maximum_capacity.as_deref().unwrap_or("N/A"),
            ));
        }

        Ok(csv)
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<BatteryRecord> {
        Ok(BatteryRecord {
            id: Some(row.get(0)?),
            create_date: row.get(1)?,
            record_type: row.get(2)?,
            cycle_count: row.get(3)?,
            nominal_charge_capacity: row.get(4)?,
            design_capacity: row.get(5)?,
            maximum_capacity: row.get(6)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample(create_date: i64, cycle_count: i64) -> BatteryRecord {
        BatteryRecord::new(
            create_date,
            1,
            cycle_count,
            Some(3500),
            Some(4000),
            Some("88".to_string()),
        )
    }

    #[test]
    fn insert_and_fetch_newest_first() {
        let store = HistoryStore::open_in_memory().expect("open");
        store.insert(&sample(1000, 10)).expect("insert");
        store.insert(&sample(2000, 11)).expect("insert");
        store.insert(&sample(1500, 12)).expect("insert");

        let all = store.fetch_all().expect("fetch");
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].create_date, 2000);
        assert_eq!(all[1].create_date, 1500);
        assert_eq!(all[2].create_date, 1000);
        assert_eq!(store.count().expect("count"), 3);
    }

    #[test]
    fn latest_returns_none_on_empty_store() {
        let store = HistoryStore::open_in_memory().expect("open");
        assert_eq!(store.latest().expect("latest"), None);
    }

    #[test]
    fn record_for_cycle_count_prefers_newest_match() {
        let store = HistoryStore::open_in_memory().expect("open");
        store.insert(&sample(1000, 42)).expect("insert");
        store.insert(&sample(3000, 42)).expect("insert");
        store.insert(&sample(2000, 43)).expect("insert");

        let hit = store
            .record_for_cycle_count(42)
            .expect("query")
            .expect("match");
        assert_eq!(hit.create_date, 3000);

        assert_eq!(store.record_for_cycle_count(99).expect("query"), None);
    }

    #[test]
    fn delete_reports_whether_a_row_existed() {
        let store = HistoryStore::open_in_memory().expect("open");
        let id = store.insert(&sample(1000, 10)).expect("insert");
        assert!(store.delete(id).expect("delete"));
        assert!(!store.delete(id).expect("delete"));
        assert_eq!(store.count().expect("count"), 0);
    }

    #[test]
    fn delete_all_clears_the_table() {
        let store = HistoryStore::open_in_memory().expect("open");
        store.insert(&sample(1000, 10)).expect("insert");
        store.insert(&sample(2000, 11)).expect("insert");
        assert_eq!(store.delete_all().expect("clear"), 2);
        assert_eq!(store.count().expect("count"), 0);
    }

    #[test]
    fn csv_export_renders_nulls_and_header() {
        let store = HistoryStore::open_in_memory().expect("open");
        store
            .insert(&BatteryRecord::new(1000, 4, 77, None, None, None))
            .expect("insert");

        let csv = store.export_csv().expect("export");
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "ID,CreateDate,CycleCount,NominalChargeCapacity,DesignCapacity,MaximumCapacity"
        );
        assert!(lines[1].ends_with(",77,0,0,N/A"));
    }

    #[test]
    fn csv_numeric_columns_parse_back_to_inserted_values() {
        let store = HistoryStore::open_in_memory().expect("open");
        let id = store
            .insert(&BatteryRecord::new(
                1000,
                2,
                421,
                Some(3333),
                Some(4000),
                Some("83.33".to_string()),
            ))
            .expect("insert");

        let csv = store.export_csv().expect("export");
        let row = csv.lines().nth(1).expect("data row");
        let fields: Vec<&str> = row.split(',').collect();
        assert_eq!(fields.len(), 6);
        assert_eq!(fields[0].parse::<i64>().expect("id"), id);
        assert_eq!(fields[2].parse::<i64>().expect("cycles"), 421);
        assert_eq!(fields[3].parse::<i64>().expect("nominal"), 3333);
        assert_eq!(fields[4].parse::<i64>().expect("design"), 4000);
        assert_eq!(fields[5], "83.33");
    }

    #[test]
    fn csv_export_is_newest_first() {
        let store = HistoryStore::open_in_memory().expect("open");
        store.insert(&sample(1000, 10)).expect("insert");
        store.insert(&sample(2000, 20)).expect("insert");

        let csv = store.export_csv().expect("export");
        let lines: Vec<&str> = csv.lines().collect();
        assert!(lines[1].contains(",20,"));
        assert!(lines[2].contains(",10,"));
    }
}
