//! In-memory record store.

use std::sync::Mutex;

use super::{Record, RecordStore, StoreError};
use crate::db::DatabaseError;

pub struct MemoryStore<T> {
    records: Mutex<Vec<T>>,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> RecordStore<T> for MemoryStore<T> {
    fn list(&self) -> Result<Vec<T>, StoreError> {
        let records = self.records.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(records.clone())
    }

    fn create(&self, record: &T) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::LockPoisoned)?;
        match records.iter_mut().find(|r| r.record_id() == record.record_id()) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        Ok(())
    }

    fn update(&self, record: &T) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::LockPoisoned)?;
        match records.iter_mut().find(|r| r.record_id() == record.record_id()) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(DatabaseError::NotFound {
                entity_type: T::COLLECTION.into(),
                id: record.record_id().into(),
            }
            .into()),
        }
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::LockPoisoned)?;
        records.retain(|r| r.record_id() != id);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::LockPoisoned)?;
        records.clear();
        Ok(())
    }
}
