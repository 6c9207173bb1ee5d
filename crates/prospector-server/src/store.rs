//! Prospect records and their stored research, optionally backed by a JSON
//! file.
//!
//! The file is a JSON array of CRM prospect objects. Research aggregates
//! are written back onto each prospect under `research.{playwright,apify}`;
//! every other field is carried through untouched.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use prospector_core::{BackendKind, Prospect, ResearchAggregate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("prospect '{0}' not found")]
    NotFound(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize prospects: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Latest aggregate per backend. A new research call replaces its slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoredResearch {
    #[serde(default)]
    pub playwright: Option<ResearchAggregate>,
    #[serde(default)]
    pub apify: Option<ResearchAggregate>,
}

impl StoredResearch {
    fn set(&mut self, aggregate: ResearchAggregate) {
        match aggregate.source {
            BackendKind::Browser => self.playwright = Some(aggregate),
            BackendKind::ActorPlatform => self.apify = Some(aggregate),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProspectRecord {
    #[serde(flatten)]
    prospect: Prospect,
    #[serde(default)]
    research: StoredResearch,
}

#[derive(Debug, Default)]
struct Records {
    order: Vec<String>,
    by_id: HashMap<String, ProspectRecord>,
}

impl Records {
    fn from_records(records: Vec<ProspectRecord>) -> Self {
        let mut out = Self::default();
        for record in records {
            let id = record.prospect.id.clone();
            if out.by_id.insert(id.clone(), record).is_none() {
                out.order.push(id);
            } else {
                tracing::warn!(prospect_id = %id, "duplicate prospect id; keeping the last one");
            }
        }
        out
    }

    fn ordered(&self) -> Vec<&ProspectRecord> {
        self.order.iter().filter_map(|id| self.by_id.get(id)).collect()
    }
}

pub struct ProspectStore {
    path: Option<PathBuf>,
    records: RwLock<Records>,
    /// Held from snapshot to rename so file writes never interleave and the
    /// last write always carries the newest records.
    persist: Mutex<()>,
}

impl ProspectStore {
    /// A store that lives only in memory.
    #[must_use]
    pub fn in_memory(prospects: Vec<Prospect>) -> Self {
        let records = prospects
            .into_iter()
            .map(|prospect| ProspectRecord {
                prospect,
                research: StoredResearch::default(),
            })
            .collect();
        Self {
            path: None,
            records: RwLock::new(Records::from_records(records)),
            persist: Mutex::new(()),
        }
    }

    /// Loads prospects from `path`; a missing file starts an empty store
    /// that is created on the first write.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let records: Vec<ProspectRecord> = match std::fs::read_to_string(path) {
            Ok(raw) if raw.trim().is_empty() => Vec::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
                path: path.to_path_buf(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "prospects file not found; starting empty");
                Vec::new()
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        tracing::info!(path = %path.display(), count = records.len(), "prospects loaded");
        Ok(Self {
            path: Some(path.to_path_buf()),
            records: RwLock::new(Records::from_records(records)),
            persist: Mutex::new(()),
        })
    }

    pub async fn get(&self, id: &str) -> Option<Prospect> {
        self.records
            .read()
            .await
            .by_id
            .get(id)
            .map(|r| r.prospect.clone())
    }

    pub async fn research(&self, id: &str) -> Option<StoredResearch> {
        self.records
            .read()
            .await
            .by_id
            .get(id)
            .map(|r| r.research.clone())
    }

    /// Replaces the stored aggregate for the aggregate's backend and
    /// persists the file when the store has one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown prospect, or a write
    /// error if persisting fails. The in-memory update is kept either way.
    pub async fn save_research(&self, aggregate: ResearchAggregate) -> Result<(), StoreError> {
        let id = aggregate.prospect.id.clone();
        {
            let mut records = self.records.write().await;
            let record = records
                .by_id
                .get_mut(&id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            record.research.set(aggregate);
        }

        let Some(path) = &self.path else {
            return Ok(());
        };
        let _persisting = self.persist.lock().await;
        let json = serde_json::to_vec_pretty(&self.records.read().await.ordered())?;
        write_atomic(path, &json).await?;
        tracing::debug!(prospect_id = %id, path = %path.display(), "research persisted");
        Ok(())
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    let tmp = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
    tokio::fs::write(&tmp, bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(write_err)
}
