//! Session report exported on disconnect

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::alert::AlertMessage;
use crate::storage::{StorageBackend, StorageError};
use crate::types::vitals::VitalsSample;

/// What a monitoring session saw, captured just before its state is cleared
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub samples: Vec<VitalsSample>,
    pub alert: Option<AlertMessage>,
}

impl SessionReport {
    pub fn export(&self, storage: &dyn StorageBackend) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        storage.store(self.session_id, &json)
    }

    pub fn load(storage: &dyn StorageBackend, session_id: Uuid) -> Result<Self, StorageError> {
        let data = storage.load(session_id)?;
        serde_json::from_slice(&data).map_err(|e| StorageError::SerializationError(e.to_string()))
    }

    /// Every stored report, oldest session first
    pub fn load_all(storage: &dyn StorageBackend) -> Result<Vec<Self>, StorageError> {
        let mut reports = storage
            .list()?
            .into_iter()
            .map(|id| Self::load(storage, id))
            .collect::<Result<Vec<_>, _>>()?;
        reports.sort_by_key(|r| r.started_at);
        Ok(reports)
    }
}
