use crate::dataset::{AppraisalRecord, AppraisalSummary};
use crate::remote::RemoteRepository;
use crate::repository::AppraisalRepository;
use compsift_core::Result;
use std::sync::Arc;

/// Where appraisals come from
pub enum AppraisalSource {
    Local(Arc<AppraisalRepository>),
    Remote(RemoteRepository),
}

impl AppraisalSource {
    pub async fn list(&self) -> Result<Vec<AppraisalSummary>> {
        match self {
            AppraisalSource::Local(repository) => Ok(repository.list()),
            AppraisalSource::Remote(remote) => remote.list().await,
        }
    }

    pub async fn get(&self, order_id: &str) -> Result<AppraisalRecord> {
        match self {
            AppraisalSource::Local(repository) => repository.get(order_id),
            AppraisalSource::Remote(remote) => remote.get(order_id).await,
        }
    }

    /// Every appraisal, in dataset order
    pub async fn records(&self) -> Result<Vec<AppraisalRecord>> {
        match self {
            AppraisalSource::Local(repository) => Ok(repository.records()),
            AppraisalSource::Remote(remote) => Ok(remote.fetch().await?.appraisals),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            AppraisalSource::Local(repository) => format!("local dataset ({} appraisals)", repository.len()),
            AppraisalSource::Remote(remote) => format!("remote dataset at {}", remote.url()),
        }
    }
}

impl From<AppraisalRepository> for AppraisalSource {
    fn from(repository: AppraisalRepository) -> Self {
        AppraisalSource::Local(Arc::new(repository))
    }
}

impl From<RemoteRepository> for AppraisalSource {
    fn from(remote: RemoteRepository) -> Self {
        AppraisalSource::Remote(remote)
    }
}
