//! SQLite-backed record stores.
//!
//! All collections share one `records` table keyed by
//! `(collection, id)`, each row holding the record as JSON. Listing
//! follows insertion order (rowid); upserts keep the original rowid.

use std::marker::PhantomData;

use rusqlite::params;

use super::{DatabaseError, SharedConnection};
use crate::store::{Record, RecordStore, StoreError, Stores};

pub struct SqliteRecordStore<T> {
    conn: SharedConnection,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> SqliteRecordStore<T> {
    pub fn new(conn: SharedConnection) -> Self {
        Self {
            conn,
            _record: PhantomData,
        }
    }
}

impl<T: Record> RecordStore<T> for SqliteRecordStore<T> {
    fn list(&self) -> Result<Vec<T>, StoreError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        let mut stmt = conn
            .prepare("SELECT id, payload FROM records WHERE collection = ?1 ORDER BY rowid ASC")
            .map_err(DatabaseError::from)?;
        let rows = stmt
            .query_map(params![T::COLLECTION], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(DatabaseError::from)?;

        let mut records = Vec::new();
        for row in rows {
            let (id, payload) = row.map_err(DatabaseError::from)?;
            match serde_json::from_str::<T>(&payload) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(
                        collection = T::COLLECTION,
                        id = %id,
                        error = %e,
                        "Skipping unreadable record"
                    );
                }
            }
        }
        Ok(records)
    }

    fn create(&self, record: &T) -> Result<(), StoreError> {
        let payload = serde_json::to_string(record)?;
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        conn.execute(
            "INSERT INTO records (collection, id, payload) VALUES (?1, ?2, ?3)
             ON CONFLICT(collection, id) DO UPDATE SET
                payload = excluded.payload,
                updated_at = datetime('now')",
            params![T::COLLECTION, record.record_id(), payload],
        )
        .map_err(DatabaseError::from)?;
        Ok(())
    }

    fn update(&self, record: &T) -> Result<(), StoreError> {
        let payload = serde_json::to_string(record)?;
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        let changed = conn
            .execute(
                "UPDATE records SET payload = ?3, updated_at = datetime('now')
                 WHERE collection = ?1 AND id = ?2",
                params![T::COLLECTION, record.record_id(), payload],
            )
            .map_err(DatabaseError::from)?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                entity_type: T::COLLECTION.into(),
                id: record.record_id().into(),
            }
            .into());
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        conn.execute(
            "DELETE FROM records WHERE collection = ?1 AND id = ?2",
            params![T::COLLECTION, id],
        )
        .map_err(DatabaseError::from)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        conn.execute(
            "DELETE FROM records WHERE collection = ?1",
            params![T::COLLECTION],
        )
        .map_err(DatabaseError::from)?;
        Ok(())
    }
}

/// Build every collection store on top of one shared connection.
pub fn sqlite_stores(conn: &SharedConnection) -> Stores {
    Stores {
        appointments: Box::new(SqliteRecordStore::new(conn.clone())),
        medications: Box::new(SqliteRecordStore::new(conn.clone())),
        activities: Box::new(SqliteRecordStore::new(conn.clone())),
        documents: Box::new(SqliteRecordStore::new(conn.clone())),
        transcripts: Box::new(SqliteRecordStore::new(conn.clone())),
        completions: Box::new(SqliteRecordStore::new(conn.clone())),
        notifications: Box::new(SqliteRecordStore::new(conn.clone())),
    }
}
