//! Appraisal dataset served over HTTP
//!
//! The endpoint returns the same document as a local dataset file. Every
//! transport, status or decoding failure is reported as
//! `UpstreamUnavailable`; no partial data is ever returned.

use crate::dataset::{AppraisalDataset, AppraisalRecord, AppraisalSummary};
use compsift_core::{Error, Result};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct RemoteRepository {
    client: reqwest::Client,
    url: String,
}

impl RemoteRepository {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::UpstreamUnavailable(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Download and decode the whole dataset
    pub async fn fetch(&self) -> Result<AppraisalDataset> {
        debug!(url = %self.url, "fetching appraisal dataset");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        if !response.status().is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "{} returned HTTP {}",
                self.url,
                response.status()
            )));
        }

        let bytes = response.bytes().await.map_err(|e| self.unavailable(e))?;
        AppraisalDataset::from_slice(&bytes).map_err(|e| self.unavailable(e))
    }

    pub async fn list(&self) -> Result<Vec<AppraisalSummary>> {
        Ok(self
            .fetch()
            .await?
            .appraisals
            .iter()
            .map(AppraisalRecord::summary)
            .collect())
    }

    pub async fn get(&self, order_id: &str) -> Result<AppraisalRecord> {
        self.fetch()
            .await?
            .appraisals
            .into_iter()
            .find(|record| record.order_id == order_id)
            .ok_or_else(|| Error::NotFound(format!("appraisal '{}' does not exist", order_id)))
    }

    fn unavailable(&self, e: impl std::fmt::Display) -> Error {
        Error::UpstreamUnavailable(format!("{}: {}", self.url, e))
    }
}
