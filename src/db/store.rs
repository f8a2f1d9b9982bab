//! Encounter persistence
//!
//! Encounters are stored whole, as their JSON snapshot keyed by id. Loading
//! goes back through `Encounter::from_json`, so rows edited by hand or written
//! by an older build are repaired rather than rejected.

use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::combat::Encounter;
use crate::error::TrackerError;

/// Listing entry for a stored encounter
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct EncounterSummary {
    pub id: String,
    pub name: String,
    pub updated_at: i64,
}

/// Encounter storage with database backing
#[derive(Clone)]
pub struct EncounterStore {
    pool: SqlitePool,
}

impl EncounterStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace an encounter
    pub async fn save(&self, encounter: &Encounter) -> Result<(), TrackerError> {
        let data = serde_json::to_string(encounter)?;

        sqlx::query(
            r#"
            INSERT INTO encounters (id, name, data, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                data = excluded.data,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(encounter.id())
        .bind(encounter.name())
        .bind(&data)
        .bind(encounter.created_at())
        .bind(encounter.updated_at())
        .execute(&self.pool)
        .await?;

        debug!(encounter = %encounter.id(), bytes = data.len(), "encounter saved");
        Ok(())
    }

    pub async fn load(&self, id: &str) -> Result<Option<Encounter>, TrackerError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT data FROM encounters WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some((data,)) = row else {
            return Ok(None);
        };
        let value: serde_json::Value = serde_json::from_str(&data)?;
        let encounter = Encounter::from_json(&value)?;
        if encounter.id() != id {
            warn!(stored = %id, record = %encounter.id(), "encounter id mismatch in stored data");
        }
        Ok(Some(encounter))
    }

    /// Load by id, or by exact (case-insensitive) name
    pub async fn find(&self, key: &str) -> Result<Option<Encounter>, TrackerError> {
        if let Some(encounter) = self.load(key).await? {
            return Ok(Some(encounter));
        }
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT id FROM encounters WHERE name = ? COLLATE NOCASE ORDER BY updated_at DESC LIMIT 1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((id,)) => self.load(&id).await,
            None => Ok(None),
        }
    }

    /// Most recently updated first
    pub async fn list(&self) -> Result<Vec<EncounterSummary>, TrackerError> {
        let rows = sqlx::query_as::<_, EncounterSummary>(
            "SELECT id, name, updated_at FROM encounters ORDER BY updated_at DESC, name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn delete(&self, id: &str) -> Result<bool, TrackerError> {
        let result = sqlx::query("DELETE FROM encounters WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
