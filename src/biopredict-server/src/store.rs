// Copyright (c), BioPredict Contributors
// SPDX-License-Identifier: Apache-2.0

//! SQLite persistence for prediction history and API tokens.

use crate::app::types::FluidType;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS biomarker_records (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    fluid_type TEXT NOT NULL,
    biomarkers TEXT NOT NULL,
    predictions TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_records_user_created
    ON biomarker_records (user_id, created_at DESC);
CREATE TABLE IF NOT EXISTS api_tokens (
    token_hash BLOB PRIMARY KEY,
    user_id TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Invalid fluid type in stored record: {0}")]
    InvalidFluid(String),
}

/// One persisted prediction: the submitted biomarkers and what was returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub id: String,
    pub user_id: String,
    pub fluid_type: FluidType,
    pub biomarkers: serde_json::Value,
    pub predictions: serde_json::Value,
    pub created_at: u64,
}

pub struct RecordStore {
    conn: Mutex<Connection>,
}

impl RecordStore {
    /// Open (or create) the database at `path`. `:memory:` opens a private
    /// in-process database.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = if path == Path::new(":memory:") {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
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

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Persist one prediction for `user_id`. Absent biomarkers are not stored.
    pub fn insert_record<B, P>(
        &self,
        user_id: &str,
        fluid: FluidType,
        biomarkers: &B,
        predictions: &P,
    ) -> Result<StoredRecord, StoreError>
    where
        B: Serialize,
        P: Serialize,
    {
        let mut biomarkers = serde_json::to_value(biomarkers)?;
        if let Some(map) = biomarkers.as_object_mut() {
            map.retain(|_, v| !v.is_null());
        }
        let record = StoredRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            fluid_type: fluid,
            biomarkers,
            predictions: serde_json::to_value(predictions)?,
            created_at: now_millis(),
        };

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO biomarker_records
                (id, user_id, fluid_type, biomarkers, predictions, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.id,
                record.user_id,
                record.fluid_type.as_str(),
                serde_json::to_string(&record.biomarkers)?,
                serde_json::to_string(&record.predictions)?,
                record.created_at as i64,
            ],
        )?;
        Ok(record)
    }

    /// Up to `limit` records of `user_id`, newest first.
    pub fn history(&self, user_id: &str, limit: usize) -> Result<Vec<StoredRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, fluid_type, biomarkers, predictions, created_at
             FROM biomarker_records
             WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, user_id, fluid, biomarkers, predictions, created_at) = row?;
            records.push(StoredRecord {
                id,
                user_id,
                fluid_type: fluid.parse().map_err(|_| StoreError::InvalidFluid(fluid))?,
                biomarkers: serde_json::from_str(&biomarkers)?,
                predictions: serde_json::from_str(&predictions)?,
                created_at: created_at.max(0) as u64,
            });
        }
        Ok(records)
    }

    /// Create a fresh bearer token for `user_id`. Only its hash is stored, so
    /// the returned string cannot be recovered later.
    pub fn issue_token(&self, user_id: &str) -> Result<String, StoreError> {
        let token = generate_token();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO api_tokens (token_hash, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![hash_token(&token).to_vec(), user_id, now_millis() as i64],
        )?;
        Ok(token)
    }

    /// User id owning `token`, if any.
    pub fn resolve_token(&self, token: &str) -> Result<Option<String>, StoreError> {
        let conn = self.lock()?;
        let user = conn
            .query_row(
                "SELECT user_id FROM api_tokens WHERE token_hash = ?1",
                params![hash_token(token).to_vec()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(user)
    }

    #[cfg(test)]
    pub(crate) fn drop_records_table(&self) -> Result<(), StoreError> {
        self.lock()?.execute_batch("DROP TABLE biomarker_records;")?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn drop_tokens_table(&self) -> Result<(), StoreError> {
        self.lock()?.execute_batch("DROP TABLE api_tokens;")?;
        Ok(())
    }
}

/// 32 random bytes, URL-safe base64 without padding.
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

fn hash_token(token: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
