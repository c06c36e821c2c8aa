//! SQLite-backed game store.
//!
//! Uses `rusqlite` with the `bundled` feature so no system SQLite
//! library is required.  All async trait methods are thin wrappers
//! around synchronous rusqlite calls executed under a `Mutex`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::store::{new_record_id, GameFields, GameRecord, GameStore, UpsertOutcome};

/// Current schema version. Bumped when migrations are added.
const SCHEMA_VERSION: i64 = 1;

/// Game store backed by a single SQLite database file.
pub struct SqliteGameStore {
    /// The database connection, guarded by a mutex for Send + Sync.
    conn: Mutex<Connection>,
}

impl SqliteGameStore {
    /// Open (or create) the database at `path` and initialize the schema.
    ///
    /// Passing `":memory:"` creates an in-memory database (useful for tests).
    pub fn new(path: &str) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.apply_pragmas()?;
        store.init_db()?;
        Ok(store)
    }

    /// Apply recommended SQLite pragmas for performance and safety.
    fn apply_pragmas(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().expect("mutex poisoned");
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            ",
        )?;
        Ok(())
    }

    /// Create the required tables if they do not already exist.
    /// Idempotent -- safe to call on every startup.
    fn init_db(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().expect("mutex poisoned");
        conn.execute_batch(
            "
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version    INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );

            -- Game records; rowid gives list_all its insertion order.
            CREATE TABLE IF NOT EXISTS games (
                id           TEXT PRIMARY KEY,
                name         TEXT,
                console      TEXT,
                condition    TEXT,
                availability TEXT,
                notes        TEXT,
                img          TEXT
            );
            ",
        )?;

        let existing: Option<i64> = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })
            .optional()?
            .flatten();

        if existing.is_none() || existing.unwrap() < SCHEMA_VERSION {
            let now = chrono::Utc::now().to_rfc3339();
            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version, applied_at) VALUES (?1, ?2)",
                params![SCHEMA_VERSION, now],
            )?;
        }

        Ok(())
    }
}

/// Map a `games` row (selected in column order) to a record.
fn row_to_record(row: &Row<'_>) -> rusqlite::Result<GameRecord> {
    Ok(GameRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        console: row.get(2)?,
        condition: row.get(3)?,
        availability: row.get(4)?,
        notes: row.get(5)?,
        img: row.get(6)?,
    })
}

const SELECT_COLUMNS: &str = "id, name, console, condition, availability, notes, img";

impl GameStore for SqliteGameStore {
    fn list_all(
        &self,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<GameRecord>>> + Send + '_>> {
        Box::pin(async move {
            let conn = self.conn.lock().expect("mutex poisoned");
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM games ORDER BY rowid"
            ))?;
            let records = stmt
                .query_map([], row_to_record)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(records)
        })
    }

    fn find_by_id(
        &self,
        id: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<GameRecord>>> + Send + '_>> {
        let id = id.to_string();
        Box::pin(async move {
            let conn = self.conn.lock().expect("mutex poisoned");
            let record = conn
                .query_row(
                    &format!("SELECT {SELECT_COLUMNS} FROM games WHERE id = ?1"),
                    params![id],
                    row_to_record,
                )
                .optional()?;
            Ok(record)
        })
    }

    fn upsert_by_id(
        &self,
        id: &str,
        fields: GameFields,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<UpsertOutcome>> + Send + '_>> {
        let id = id.to_string();
        Box::pin(async move {
            let conn = self.conn.lock().expect("mutex poisoned");
            let record = fields.into_record(id);
            // INSERT OR IGNORE + UPDATE under one connection lock keeps the
            // created flag consistent with the write.
            let created = conn.execute(
                "INSERT OR IGNORE INTO games (id, name, console, condition, availability, notes, img)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.id,
                    record.name,
                    record.console,
                    record.condition,
                    record.availability,
                    record.notes,
                    record.img
                ],
            )? == 1;
            if !created {
                conn.execute(
                    "UPDATE games
                     SET name = ?2, console = ?3, condition = ?4,
                         availability = ?5, notes = ?6, img = ?7
                     WHERE id = ?1",
                    params![
                        record.id,
                        record.name,
                        record.console,
                        record.condition,
                        record.availability,
                        record.notes,
                        record.img
                    ],
                )?;
            }
            Ok(UpsertOutcome { record, created })
        })
    }

    fn delete_by_id(
        &self,
        id: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        let id = id.to_string();
        Box::pin(async move {
            let conn = self.conn.lock().expect("mutex poisoned");
            conn.execute("DELETE FROM games WHERE id = ?1", params![id])?;
            Ok(())
        })
    }

    fn insert(
        &self,
        fields: GameFields,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<GameRecord>> + Send + '_>> {
        Box::pin(async move {
            let conn = self.conn.lock().expect("mutex poisoned");
            let record = fields.into_record(new_record_id());
            conn.execute(
                "INSERT INTO games (id, name, console, condition, availability, notes, img)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.id,
                    record.name,
                    record.console,
                    record.condition,
                    record.availability,
                    record.notes,
                    record.img
                ],
            )?;
            Ok(record)
        })
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fields() -> GameFields {
        GameFields {
            name: Some("Chrono Trigger".to_string()),
            console: Some("SNES".to_string()),
            condition: Some("Good".to_string()),
            availability: Some("Available".to_string()),
            notes: Some("".to_string()),
            img: Some("".to_string()),
        }
    }

    #[tokio::test]
    async fn test_insert_then_list_roundtrip() {
        let store = SqliteGameStore::new(":memory:").unwrap();
        let inserted = store.insert(sample_fields()).await.unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all, vec![inserted]);
        assert_eq!(all[0].name.as_deref(), Some("Chrono Trigger"));
    }

    #[tokio::test]
    async fn test_unset_fields_survive_as_none() {
        let store = SqliteGameStore::new(":memory:").unwrap();
        let inserted = store
            .insert(GameFields {
                name: Some("Ico".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let found = store.find_by_id(&inserted.id).await.unwrap().unwrap();
        assert_eq!(found.name.as_deref(), Some("Ico"));
        assert!(found.console.is_none());
        assert!(found.img.is_none());
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let store = SqliteGameStore::new(":memory:").unwrap();
        for title in ["A", "B", "C"] {
            store
                .insert(GameFields {
                    name: Some(title.to_string()),
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        let names: Vec<_> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name.unwrap())
            .collect();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_upsert_existing_and_missing() {
        let store = SqliteGameStore::new(":memory:").unwrap();
        let inserted = store.insert(sample_fields()).await.unwrap();

        let updated = store
            .upsert_by_id(
                &inserted.id,
                GameFields {
                    availability: Some("Loaned out".to_string()),
                    ..sample_fields()
                },
            )
            .await
            .unwrap();
        assert!(!updated.created);
        assert_eq!(updated.record.availability.as_deref(), Some("Loaned out"));

        let fresh = store
            .upsert_by_id("fixed-id", sample_fields())
            .await
            .unwrap();
        assert!(fresh.created);
        assert_eq!(fresh.record.id, "fixed-id");
        assert_eq!(store.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = SqliteGameStore::new(":memory:").unwrap();
        let inserted = store.insert(sample_fields()).await.unwrap();

        let first = store
            .upsert_by_id(&inserted.id, sample_fields())
            .await
            .unwrap();
        let second = store
            .upsert_by_id(&inserted.id, sample_fields())
            .await
            .unwrap();
        assert_eq!(first.record, second.record);
        assert_eq!(store.list_all().await.unwrap(), vec![second.record]);
    }

    #[tokio::test]
    async fn test_delete_removes_exactly_one() {
        let store = SqliteGameStore::new(":memory:").unwrap();
        let a = store.insert(sample_fields()).await.unwrap();
        let _b = store.insert(sample_fields()).await.unwrap();

        store.delete_by_id(&a.id).await.unwrap();
        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all.iter().all(|r| r.id != a.id));

        // Deleting again is a no-op.
        store.delete_by_id(&a.id).await.unwrap();
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_records_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("games.db");
        let path = path.to_str().unwrap();

        let inserted = {
            let store = SqliteGameStore::new(path).unwrap();
            store.insert(sample_fields()).await.unwrap()
        };

        let reopened = SqliteGameStore::new(path).unwrap();
        let found = reopened.find_by_id(&inserted.id).await.unwrap();
        assert_eq!(found, Some(inserted));
    }
}
