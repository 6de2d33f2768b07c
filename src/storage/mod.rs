//! Storage for session exports
//!
//! Monitoring state lives in memory for the lifetime of a session. The only
//! thing ever written out is an optional session report on disconnect,
//! keyed by session id.

pub mod local_file;

use thiserror::Error;
use uuid::Uuid;

pub use local_file::LocalFileStorage;

/// Error types for storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("No data stored for ID: {0}")]
    NotFound(Uuid),
}

/// Trait for storage backends that keep exported session data
pub trait StorageBackend {
    /// Store data under an ID, replacing anything already there
    fn store(&self, id: Uuid, data: &[u8]) -> Result<(), StorageError>;

    /// Load data for an ID
    fn load(&self, id: Uuid) -> Result<Vec<u8>, StorageError>;

    /// Check if data exists for an ID
    fn exists(&self, id: Uuid) -> bool;

    /// IDs of everything stored, in a stable order
    fn list(&self) -> Result<Vec<Uuid>, StorageError>;
}
