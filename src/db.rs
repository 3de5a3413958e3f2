use crate::error::{FinanceError, Result};
use crate::record::AssetRecord;
use crate::summary::Summary;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

pub const SNAPSHOT_TITLE: &str = "资产数据";
pub const SNAPSHOT_CATEGORY: &str = "资产";

/// One stored asset record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: i64,
    pub title: String,
    pub category: String,

    /// Total assets (liabilities subtracted) at the time of saving
    pub amount: f64,

    pub recorded_at: DateTime<Utc>,

    /// SHA-256 of the record; unchanged saves keep the same fingerprint
    pub fingerprint: String,

    pub record: AssetRecord,
}

/// Event for audit trail: every store mutation leaves one row.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub snapshot_id: i64,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(event_type: &str, snapshot_id: i64, data: serde_json::Value, actor: &str) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            snapshot_id,
            data,
            actor: actor.to_string(),
        }
    }
}

// ============================================================================
// STORE CONTRACT
// ============================================================================

/// Persistence for the single latest asset record.
///
/// Every method either fully succeeds or leaves the store untouched.
pub trait SnapshotStore {
    /// Most recently recorded snapshot, `None` when nothing has been saved.
    fn latest(&self) -> Result<Option<Snapshot>>;

    /// All snapshots, newest first.
    fn list(&self) -> Result<Vec<Snapshot>>;

    /// Upsert: overwrite the latest snapshot if there is one, else create it.
    fn save(&mut self, record: &AssetRecord) -> Result<Snapshot>;

    /// Overwrite a specific snapshot.
    fn update(&mut self, id: i64, record: &AssetRecord) -> Result<Snapshot>;

    fn delete(&mut self, id: i64) -> Result<()>;
}

// ============================================================================
// SQLITE STORE
// ============================================================================

pub struct SqliteSnapshotStore {
    conn: Connection,
    actor: String,
}

impl SqliteSnapshotStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "snapshot database opened");
        Self::with_connection(conn)
    }

    /// In-memory database (for tests and throwaway sessions).
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(Self {
            conn,
            actor: "dashboard".to_string(),
        })
    }

    /// Name recorded on audit events (e.g. "api", "csv_importer").
    pub fn with_actor(mut self, actor: &str) -> Self {
        self.actor = actor.to_string();
        self
    }

    pub fn find(&self, id: i64) -> Result<Option<Snapshot>> {
        let snapshot = self
            .conn
            .query_row(
                "SELECT id, title, category, amount, recorded_at, fingerprint, record
                 FROM snapshots WHERE id = ?1",
                params![id],
                snapshot_from_row,
            )
            .optional()?;

        Ok(snapshot)
    }

    pub fn count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn events_for_snapshot(&self, snapshot_id: i64) -> Result<Vec<Event>> {
        get_events_for_snapshot(&self.conn, snapshot_id)
    }

    fn write(&mut self, existing: Option<i64>, record: &AssetRecord) -> Result<Snapshot> {
        let now = Utc::now();
        let amount = Summary::of(record).total_assets;
        let fingerprint = record.fingerprint();
        let record_json = serde_json::to_string(record)?;

        let tx = self.conn.transaction()?;

        let (id, event_type) = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE snapshots
                     SET amount = ?1, recorded_at = ?2, fingerprint = ?3, record = ?4
                     WHERE id = ?5",
                    params![amount, format_timestamp(now), fingerprint, record_json, id],
                )?;
                (id, "snapshot_updated")
            }
            None => {
                tx.execute(
                    "INSERT INTO snapshots (title, category, amount, recorded_at, fingerprint, record)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        SNAPSHOT_TITLE,
                        SNAPSHOT_CATEGORY,
                        amount,
                        format_timestamp(now),
                        fingerprint,
                        record_json
                    ],
                )?;
                (tx.last_insert_rowid(), "snapshot_created")
            }
        };

        let event = Event::new(
            event_type,
            id,
            serde_json::json!({
                "amount": amount,
                "fingerprint": fingerprint,
                "fields": record.len(),
            }),
            &self.actor,
        );
        insert_event(&tx, &event)?;
        tx.commit()?;

        debug!(id, event_type, "snapshot written");

        self.find(id)?.ok_or_else(|| {
            FinanceError::Persistence(format!("snapshot {} vanished after write", id))
        })
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn latest(&self) -> Result<Option<Snapshot>> {
        let snapshot = self
            .conn
            .query_row(
                "SELECT id, title, category, amount, recorded_at, fingerprint, record
                 FROM snapshots
                 ORDER BY recorded_at DESC, id DESC
                 LIMIT 1",
                [],
                snapshot_from_row,
            )
            .optional()?;

        Ok(snapshot)
    }

    fn list(&self) -> Result<Vec<Snapshot>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, category, amount, recorded_at, fingerprint, record
             FROM snapshots
             ORDER BY recorded_at DESC, id DESC",
        )?;

        let snapshots = stmt
            .query_map([], snapshot_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(snapshots)
    }

    fn save(&mut self, record: &AssetRecord) -> Result<Snapshot> {
        let existing = self.latest()?.map(|s| s.id);
        self.write(existing, record)
    }

    fn update(&mut self, id: i64, record: &AssetRecord) -> Result<Snapshot> {
        if self.find(id)?.is_none() {
            return Err(FinanceError::NotFound(format!("snapshot {}", id)));
        }
        self.write(Some(id), record)
    }

    fn delete(&mut self, id: i64) -> Result<()> {
        let tx = self.conn.transaction()?;

        let removed = tx.execute("DELETE FROM snapshots WHERE id = ?1", params![id])?;
        if removed == 0 {
            return Err(FinanceError::NotFound(format!("snapshot {}", id)));
        }

        let event = Event::new("snapshot_deleted", id, serde_json::json!({}), &self.actor);
        insert_event(&tx, &event)?;
        tx.commit()?;

        info!(id, "snapshot deleted");
        Ok(())
    }
}

// ============================================================================
// SCHEMA & ROW MAPPING
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL for crash recovery; in-memory databases silently stay in "memory" mode
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS snapshots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            category TEXT NOT NULL,
            amount REAL NOT NULL,
            recorded_at TEXT NOT NULL,
            fingerprint TEXT NOT NULL,
            record TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            snapshot_id INTEGER NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_snapshots_recorded_at ON snapshots(recorded_at)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_snapshot ON events(snapshot_id)",
        [],
    )?;

    Ok(())
}

/// Fixed-width RFC 3339 so stored timestamps sort lexically.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn snapshot_from_row(row: &Row<'_>) -> rusqlite::Result<Snapshot> {
    let recorded_at_str: String = row.get(4)?;
    let record_json: String = row.get(6)?;

    let recorded_at = DateTime::parse_from_rfc3339(&recorded_at_str)
        .map_err(|e| text_conversion_error(4, e))?
        .with_timezone(&Utc);
    let record: AssetRecord =
        serde_json::from_str(&record_json).map_err(|e| text_conversion_error(6, e))?;

    Ok(Snapshot {
        id: row.get(0)?,
        title: row.get(1)?,
        category: row.get(2)?,
        amount: row.get(3)?,
        recorded_at,
        fingerprint: row.get(5)?,
        record,
    })
}

fn text_conversion_error<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
}

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, snapshot_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            event.event_id,
            format_timestamp(event.timestamp),
            event.event_type,
            event.snapshot_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Events for one snapshot, newest first
pub fn get_events_for_snapshot(conn: &Connection, snapshot_id: i64) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, snapshot_id, data, actor
         FROM events
         WHERE snapshot_id = ?1
         ORDER BY id DESC",
    )?;

    let events = stmt
        .query_map(params![snapshot_id], |row| {
            let timestamp_str: String = row.get(1)?;
            let data_json: String = row.get(4)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?
                    .with_timezone(&Utc),
                event_type: row.get(2)?,
                snapshot_id: row.get(3)?,
                data: serde_json::from_str(&data_json)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?,
                actor: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(events)
}
