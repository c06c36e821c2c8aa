//! Abstract game-record store trait.
//!
//! Any persistence backend must implement [`GameStore`].  The trait
//! uses `async_trait`-style methods (manual desugaring with pinned
//! futures) so it can be used with both SQLite and in-memory stores.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use utoipa::ToSchema;

// ── Record types ───────────────────────────────────────────────────

/// A single game in the inventory.
///
/// The identifier is store-assigned and immutable; every other field is
/// freely overwritable.  Unset fields are omitted from JSON rather than
/// serialized as null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GameRecord {
    /// Store-assigned identifier (opaque string).
    pub id: String,
    /// Game title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Console / platform.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub console: Option<String>,
    /// Physical condition (e.g. "Good", "Loose cart").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Availability status (e.g. "Available", "Loaned out").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    /// Free-form notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Cover image URL or storage key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
}

/// The writable payload fields of a game record, as accepted by the
/// insert and update routes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GameFields {
    pub name: Option<String>,
    pub console: Option<String>,
    pub condition: Option<String>,
    pub availability: Option<String>,
    pub notes: Option<String>,
    pub img: Option<String>,
}

impl GameFields {
    /// Materialize these fields into a record under `id`.
    pub fn into_record(self, id: String) -> GameRecord {
        GameRecord {
            id,
            name: self.name,
            console: self.console,
            condition: self.condition,
            availability: self.availability,
            notes: self.notes,
            img: self.img,
        }
    }
}

/// Result of [`GameStore::upsert_by_id`].
///
/// `record` is always the fully-materialized post-write state, whether
/// the operation updated an existing record or inserted a new one.
#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    /// The record as stored after the write.
    pub record: GameRecord,
    /// True when no record with the given id existed before the write.
    pub created: bool,
}

// ── Trait ───────────────────────────────────────────────────────────

/// Async game-record store contract.
///
/// Single-record operations are atomic at the store level; no
/// cross-record transactions are provided or required.
pub trait GameStore: Send + Sync + 'static {
    /// List every record in insertion order.
    fn list_all(
        &self,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<GameRecord>>> + Send + '_>>;

    /// Get the record whose identifier equals `id`.
    fn find_by_id(
        &self,
        id: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<GameRecord>>> + Send + '_>>;

    /// Overwrite the payload fields of the record with identifier `id`,
    /// inserting a new record under that id if none exists.
    fn upsert_by_id(
        &self,
        id: &str,
        fields: GameFields,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<UpsertOutcome>> + Send + '_>>;

    /// Remove the record with identifier `id`. No-op if absent.
    fn delete_by_id(
        &self,
        id: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>>;

    /// Create a new record with a store-assigned identifier.
    fn insert(
        &self,
        fields: GameFields,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<GameRecord>> + Send + '_>>;
}

/// Generate a fresh store-assigned record identifier.
pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ── Tests ───────────────────────────────────────────────────────────
