//! In-memory game store.
//!
//! Keeps all records in a vector with no persistence. Useful for testing
//! and ephemeral deployments. Uses `RwLock<Vec<...>>` for thread-safe
//! access; the vector order is the insertion order returned by
//! `list_all`.

use std::future::Future;
use std::pin::Pin;
use std::sync::RwLock;

use super::store::{new_record_id, GameFields, GameRecord, GameStore, UpsertOutcome};

pub struct MemoryGameStore {
    records: RwLock<Vec<GameRecord>>,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryGameStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GameStore for MemoryGameStore {
    fn list_all(
        &self,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<GameRecord>>> + Send + '_>> {
        Box::pin(async move {
            let records = self.records.read().expect("rwlock poisoned");
            Ok(records.clone())
        })
    }

    fn find_by_id(
        &self,
        id: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<GameRecord>>> + Send + '_>> {
        let id = id.to_string();
        Box::pin(async move {
            let records = self.records.read().expect("rwlock poisoned");
            Ok(records.iter().find(|r| r.id == id).cloned())
        })
    }

    fn upsert_by_id(
        &self,
        id: &str,
        fields: GameFields,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<UpsertOutcome>> + Send + '_>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut records = self.records.write().expect("rwlock poisoned");
            let record = fields.into_record(id.clone());
            match records.iter_mut().find(|r| r.id == id) {
                Some(existing) => {
                    *existing = record.clone();
                    Ok(UpsertOutcome {
                        record,
                        created: false,
                    })
                }
                None => {
                    records.push(record.clone());
                    Ok(UpsertOutcome {
                        record,
                        created: true,
                    })
                }
            }
        })
    }

    fn delete_by_id(
        &self,
        id: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut records = self.records.write().expect("rwlock poisoned");
            records.retain(|r| r.id != id);
            Ok(())
        })
    }

    fn insert(
        &self,
        fields: GameFields,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<GameRecord>> + Send + '_>> {
        Box::pin(async move {
            let mut records = self.records.write().expect("rwlock poisoned");
            let record = fields.into_record(new_record_id());
            records.push(record.clone());
            Ok(record)
        })
    }
}

// ── Tests ───────────────────────────────────────────────────────────
