//! Event store adapters.
//!
//! Each entity collection is reached through a `RecordStore<T>`: a durable
//! keyed collection with list/create/update/delete. The context keeps the
//! authoritative in-memory copy and writes through to the store; which
//! backend sits behind it (SQLite or memory) is interchangeable.

pub mod memory;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::db::DatabaseError;
use crate::models::{
    Appointment, CompletionRecord, CustomEvent, Document, Medication, Notification, Transcript,
};

pub use memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// A persisted entity addressable by id.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Name of the collection the record lives in.
    const COLLECTION: &'static str;

    fn record_id(&self) -> &str;
}

macro_rules! impl_record {
    ($ty:ty, $collection:literal) => {
        impl Record for $ty {
            const COLLECTION: &'static str = $collection;

            fn record_id(&self) -> &str {
                &self.id
            }
        }
    };
}

impl_record!(Appointment, "appointments");
impl_record!(Medication, "medications");
impl_record!(CustomEvent, "custom_events");
impl_record!(Document, "documents");
impl_record!(Transcript, "transcripts");
impl_record!(CompletionRecord, "completed_tasks");
impl_record!(Notification, "notifications");

/// CRUD contract for one collection. Listing preserves insertion order.
pub trait RecordStore<T: Record>: Send + Sync {
    fn list(&self) -> Result<Vec<T>, StoreError>;

    /// Insert a record. Writing an existing id replaces it.
    fn create(&self, record: &T) -> Result<(), StoreError>;

    /// Replace the stored record with the same id. Fails with
    /// `DatabaseError::NotFound` when the id is unknown.
    fn update(&self, record: &T) -> Result<(), StoreError>;

    /// Remove a record. Removing a missing id is not an error.
    fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Remove every record in the collection.
    fn clear(&self) -> Result<(), StoreError>;
}

/// One store per collection, injected into the context.
pub struct Stores {
    pub appointments: Box<dyn RecordStore<Appointment>>,
    pub medications: Box<dyn RecordStore<Medication>>,
    pub activities: Box<dyn RecordStore<CustomEvent>>,
    pub documents: Box<dyn RecordStore<Document>>,
    pub transcripts: Box<dyn RecordStore<Transcript>>,
    pub completions: Box<dyn RecordStore<CompletionRecord>>,
    pub notifications: Box<dyn RecordStore<Notification>>,
}

impl Stores {
    /// Volatile stores, for tests and sessions without a database.
    pub fn in_memory() -> Self {
        Self {
            appointments: Box::new(MemoryStore::new()),
            medications: Box::new(MemoryStore::new()),
            activities: Box::new(MemoryStore::new()),
            documents: Box::new(MemoryStore::new()),
            transcripts: Box::new(MemoryStore::new()),
            completions: Box::new(MemoryStore::new()),
            notifications: Box::new(MemoryStore::new()),
        }
    }
}
