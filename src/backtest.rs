//! Backtesting against recorded appraisals
//!
//! Each appraisal in a dataset carries the comparables the appraiser
//! actually chose. Running the ranker over the same subject and candidates
//! and matching addresses (trimmed, case-insensitive) shows how often the
//! engine agrees with a human.

use compsift_core::{Candidate, Error, Result, Subject};
use compsift_similarity::CompRanker;
use compsift_storage::AppraisalRecord;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Agreement for one appraisal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppraisalOutcome {
    pub order_id: String,
    /// Comps the engine returned
    pub picked: usize,
    /// Comps the appraiser recorded
    pub recorded: usize,
    /// Engine picks that the appraiser also chose
    pub matched: usize,
}

/// An appraisal that could not be ranked
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedAppraisal {
    pub order_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BacktestReport {
    pub appraisals: Vec<AppraisalOutcome>,
    pub skipped: Vec<SkippedAppraisal>,
}

impl BacktestReport {
    pub fn total_picked(&self) -> usize {
        self.appraisals.iter().map(|a| a.picked).sum()
    }

    pub fn total_recorded(&self) -> usize {
        self.appraisals.iter().map(|a| a.recorded).sum()
    }

    pub fn total_matched(&self) -> usize {
        self.appraisals.iter().map(|a| a.matched).sum()
    }

    /// Share of engine picks the appraiser also chose
    pub fn precision(&self) -> f64 {
        ratio(self.total_matched(), self.total_picked())
    }

    /// Share of appraiser comps the engine found
    pub fn recall(&self) -> f64 {
        ratio(self.total_matched(), self.total_recorded())
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Rank every appraisal and compare against the recorded comps
pub fn run(records: &[AppraisalRecord], ranker: &CompRanker) -> BacktestReport {
    let mut report = BacktestReport::default();

    for record in records {
        match evaluate(record, ranker) {
            Ok(outcome) => {
                debug!(order_id = %outcome.order_id, matched = outcome.matched, "appraisal evaluated");
                report.appraisals.push(outcome);
            }
            Err(e) => {
                warn!(order_id = %record.order_id, error = %e, "skipping appraisal");
                report.skipped.push(SkippedAppraisal {
                    order_id: record.order_id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    report
}

fn evaluate(record: &AppraisalRecord, ranker: &CompRanker) -> Result<AppraisalOutcome> {
    let subject: Subject = serde_json::from_value(record.ensure_subject()?.clone())
        .map_err(|e| Error::BadRequest(format!("malformed subject: {}", e)))?;

    let candidates: Vec<Candidate> = record
        .properties
        .iter()
        .filter(|p| p.is_object())
        .filter_map(|p| serde_json::from_value(p.clone()).ok())
        .collect();

    let ranking = ranker.rank(&subject, candidates)?;

    let recorded: HashSet<String> = record.comp_addresses().into_iter().collect();
    let matched = ranking
        .comps
        .iter()
        .filter(|c| recorded.contains(&c.candidate.property.address.to_lowercase()))
        .count();

    Ok(AppraisalOutcome {
        order_id: record.order_id.clone(),
        picked: ranking.comps.len(),
        recorded: recorded.len(),
        matched,
    })
}
