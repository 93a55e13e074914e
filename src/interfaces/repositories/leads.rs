use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use crate::entities::lead::LeadRecord;
use crate::errors::StoreError;

/// Persistence seam for the sequence store. Every write replaces the whole
/// collection; the processor owns all read-modify-write cycles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn load(&self) -> Result<Vec<LeadRecord>, StoreError>;
    async fn save(&self, leads: &[LeadRecord]) -> Result<(), StoreError>;
}

/// Single-file JSON store. A missing file reads as an empty collection;
/// writes go to a temporary sibling and are renamed into place so a crash
/// mid-write can never leave a half-written store.
#[derive(Clone)]
pub struct JsonLeadStore {
    path: PathBuf,
}

impl JsonLeadStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonLeadStore { path: path.into() }
    }
}

#[async_trait]
impl LeadRepository for JsonLeadStore {
    async fn load(&self) -> Result<Vec<LeadRecord>, StoreError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, leads: &[LeadRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let payload = serde_json::to_vec_pretty(leads)?;
        let temp_path = self
            .path
            .with_extension(format!("{}.tmp", Uuid::new_v4().simple()));

        fs::write(&temp_path, &payload).await?;
        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}
