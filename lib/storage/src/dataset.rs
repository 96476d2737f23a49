//! Appraisal dataset document
//!
//! The on-disk (or remote) layout is
//! `{"appraisals": [{"orderID", "subject", "properties", "comps"}]}`.
//! Subjects and candidates stay raw JSON here; the ranking path normalizes
//! them, and `/get_candidates` returns them untouched.

use compsift_core::normalize::{deserialize_id, normalize_text};
use compsift_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppraisalDataset {
    #[serde(default)]
    pub appraisals: Vec<AppraisalRecord>,
}

impl AppraisalDataset {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// One appraisal: the subject, the sold candidates and the appraiser's picks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppraisalRecord {
    #[serde(rename = "orderID", alias = "id", deserialize_with = "deserialize_order_id")]
    pub order_id: String,
    pub subject: Value,
    /// Candidate sale records
    #[serde(default, alias = "candidates")]
    pub properties: Vec<Value>,
    /// Comparables the appraiser actually selected
    #[serde(default)]
    pub comps: Vec<Value>,
}

fn deserialize_order_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserialize_id(deserializer)?
        .ok_or_else(|| serde::de::Error::custom("appraisal is missing its orderID"))
}

impl AppraisalRecord {
    /// Trimmed subject address, if the subject has one
    pub fn subject_address(&self) -> Option<String> {
        address_of(&self.subject)
    }

    /// Lowercased addresses of the appraiser's chosen comps
    pub fn comp_addresses(&self) -> Vec<String> {
        self.comps
            .iter()
            .filter_map(address_of)
            .map(|a| a.to_lowercase())
            .collect()
    }

    pub fn summary(&self) -> AppraisalSummary {
        AppraisalSummary {
            id: self.order_id.clone(),
            address: self.subject_address(),
        }
    }

    /// Subject must at least be a JSON object to be usable
    pub fn ensure_subject(&self) -> Result<&Value> {
        if self.subject.is_object() {
            Ok(&self.subject)
        } else {
            Err(Error::Serialization(format!(
                "appraisal {} has a malformed subject",
                self.order_id
            )))
        }
    }
}

fn address_of(value: &Value) -> Option<String> {
    value
        .get("address")
        .and_then(Value::as_str)
        .map(normalize_text)
        .filter(|a| !a.is_empty())
}

/// Entry in the appraisal listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppraisalSummary {
    pub id: String,
    pub address: Option<String>,
}
