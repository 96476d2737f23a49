use crate::dataset::{AppraisalDataset, AppraisalRecord, AppraisalSummary};
use ahash::AHashMap;
use compsift_core::{Error, Result};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

/// Loaded appraisals plus an id index
struct Snapshot {
    records: Vec<AppraisalRecord>,
    index: AHashMap<String, usize>,
    modified: Option<SystemTime>,
}

impl Snapshot {
    fn build(dataset: AppraisalDataset, modified: Option<SystemTime>) -> Self {
        let mut index = AHashMap::with_capacity(dataset.appraisals.len());
        for (pos, record) in dataset.appraisals.iter().enumerate() {
            if index.contains_key(&record.order_id) {
                warn!(order_id = %record.order_id, "duplicate appraisal id, keeping the first");
                continue;
            }
            index.insert(record.order_id.clone(), pos);
        }
        Self {
            records: dataset.appraisals,
            index,
            modified,
        }
    }
}

/// Read-only appraisal repository backed by a JSON dataset file.
///
/// Readers never block each other; a reload swaps the whole snapshot.
pub struct AppraisalRepository {
    snapshot: Arc<RwLock<Snapshot>>,
    path: Option<PathBuf>,
}

impl AppraisalRepository {
    /// Load a dataset file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let snapshot = Self::load(&path)?;
        info!(path = %path.display(), appraisals = snapshot.records.len(), "appraisal dataset loaded");
        Ok(Self {
            snapshot: Arc::new(RwLock::new(snapshot)),
            path: Some(path),
        })
    }

    /// In-memory repository, mostly for tests and embedding
    pub fn from_dataset(dataset: AppraisalDataset) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(Snapshot::build(dataset, None))),
            path: None,
        }
    }

    fn load(path: &Path) -> Result<Snapshot> {
        let modified = std::fs::metadata(path)?.modified().ok();
        let bytes = std::fs::read(path)?;
        let dataset = AppraisalDataset::from_slice(&bytes)?;
        Ok(Snapshot::build(dataset, modified))
    }

    /// Re-read the dataset file. On failure the previous data is kept.
    pub fn reload(&self) -> Result<usize> {
        let Some(path) = &self.path else {
            return Ok(self.len());
        };
        let snapshot = Self::load(path)
            .map_err(|e| Error::UpstreamUnavailable(format!("{}: {}", path.display(), e)))?;
        let count = snapshot.records.len();
        *self.snapshot.write() = snapshot;
        Ok(count)
    }

    /// Whether the file changed since the last successful load
    fn is_stale(&self) -> bool {
        let Some(path) = &self.path else {
            return false;
        };
        let current = std::fs::metadata(path).and_then(|m| m.modified()).ok();
        current.is_some() && current != self.snapshot.read().modified
    }

    /// Start a background thread that reloads the file when it changes
    pub fn start_watch(self: &Arc<Self>, interval: Duration) {
        if self.path.is_none() {
            return;
        }
        let repository = Arc::downgrade(self);

        std::thread::spawn(move || loop {
            std::thread::sleep(interval);

            let Some(repository) = repository.upgrade() else {
                break;
            };
            if repository.is_stale() {
                match repository.reload() {
                    Ok(count) => info!(appraisals = count, "appraisal dataset reloaded"),
                    Err(e) => warn!(error = %e, "dataset reload failed, keeping previous data"),
                }
            }
        });
    }

    /// Appraisal ids and subject addresses, in dataset order
    #[must_use]
    pub fn list(&self) -> Vec<AppraisalSummary> {
        self.snapshot.read().records.iter().map(AppraisalRecord::summary).collect()
    }

    /// Look up one appraisal
    pub fn get(&self, order_id: &str) -> Result<AppraisalRecord> {
        let snapshot = self.snapshot.read();
        snapshot
            .index
            .get(order_id)
            .map(|&pos| snapshot.records[pos].clone())
            .ok_or_else(|| Error::NotFound(format!("appraisal '{}' does not exist", order_id)))
    }

    /// All appraisals, in dataset order
    #[must_use]
    pub fn records(&self) -> Vec<AppraisalRecord> {
        self.snapshot.read().records.clone()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot.read().records.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
