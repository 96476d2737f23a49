//! Comp ranker
//!
//! Screens candidates, scores the survivors against the subject, orders
//! them best match first and keeps the configured top-N. Bad candidates are
//! dropped and counted; only an unusable subject fails the call.

use crate::config::RankerConfig;
use crate::reasons::ReasonGenerator;
use crate::scorer::{Comparison, Scorer};
use compsift_core::{Candidate, Coordinates, Error, Result, Subject};
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Reverse;
use tracing::debug;

/// Candidate count at which scoring switches to the rayon pool
pub const PARALLEL_THRESHOLD: usize = 64;

/// A selected comparable with its score and explanation
#[derive(Debug, Clone, PartialEq)]
pub struct RankedComp {
    pub candidate: Candidate,
    /// Total penalty, lower is better
    pub score: f64,
    /// Full-precision distance to the subject
    pub distance_miles: f64,
    pub price_per_sqft: Option<f64>,
    pub reasons: Vec<String>,
}

/// Accounting for one ranking call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RankingStats {
    /// Number of candidates received
    pub candidates_count: usize,
    pub invalid_coordinates: usize,
    pub insufficient_data: usize,
    pub out_of_radius: usize,
    /// Number of candidates that were scored
    pub scored_count: usize,
    /// Number of comps returned
    pub results_count: usize,
}

/// Ranked comps plus the stats that produced them
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub comps: Vec<RankedComp>,
    pub stats: RankingStats,
}

/// Why a candidate was dropped before scoring
enum Exclusion {
    /// `InvalidCoordinates` or `InsufficientData`
    Unusable(Error),
    OutOfRadius(f64),
}

struct Scored {
    index: usize,
    candidate: Candidate,
    comparison: Comparison,
}

/// Ranks candidates against a subject
#[derive(Debug, Clone)]
pub struct CompRanker {
    config: RankerConfig,
    scorer: Scorer,
    reasons: ReasonGenerator,
}

impl CompRanker {
    /// Create a ranker from a configuration, validating it first
    pub fn new(config: RankerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            scorer: Scorer::new(&config),
            reasons: ReasonGenerator::new(config.thresholds),
            config,
        })
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    /// Create a ranker for one call with `top_n` / radius overrides
    pub fn with_overrides(&self, top_n: Option<usize>, max_radius_miles: Option<f64>) -> Result<CompRanker> {
        if top_n.is_none() && max_radius_miles.is_none() {
            return Ok(self.clone());
        }
        let config = self
            .config
            .with_overrides(top_n, max_radius_miles)
            .map_err(|e| Error::BadRequest(e.to_string()))?;
        CompRanker::new(config)
    }

    /// Rank candidates against the subject.
    ///
    /// Returns an empty ranking when nothing survives screening. Fails only
    /// when the subject itself has no usable location.
    pub fn rank(&self, subject: &Subject, candidates: Vec<Candidate>) -> Result<Ranking> {
        let origin = subject
            .property
            .coordinates()
            .map_err(|e| Error::BadRequest(format!("subject location is unusable: {}", e)))?;

        let mut stats = RankingStats {
            candidates_count: candidates.len(),
            ..Default::default()
        };

        let mut survivors = Vec::with_capacity(candidates.len());
        for (index, candidate) in candidates.into_iter().enumerate() {
            match self.screen(&origin, &candidate) {
                Ok(distance) => survivors.push((index, candidate, distance)),
                Err(Exclusion::Unusable(Error::InvalidCoordinates { lat, lon })) => {
                    debug!(candidate = candidate.label(), lat, lon, "dropping candidate: invalid coordinates");
                    stats.invalid_coordinates += 1;
                }
                Err(Exclusion::Unusable(e)) => {
                    debug!(candidate = candidate.label(), error = %e, "dropping candidate");
                    stats.insufficient_data += 1;
                }
                Err(Exclusion::OutOfRadius(distance)) => {
                    debug!(candidate = candidate.label(), distance, "dropping candidate: outside search radius");
                    stats.out_of_radius += 1;
                }
            }
        }

        let mut scored = self.score_all(subject, survivors);
        stats.scored_count = scored.len();

        // Best match first; ties by distance, then newer sale, then input order
        scored.sort_by_key(|s| {
            (
                OrderedFloat(s.comparison.penalty),
                OrderedFloat(s.comparison.distance_miles),
                Reverse(s.candidate.close_date),
                s.index,
            )
        });
        scored.truncate(self.config.top_n);

        let comps: Vec<RankedComp> = scored
            .into_iter()
            .map(|s| RankedComp {
                reasons: self.reasons.explain(&s.comparison),
                score: s.comparison.penalty,
                distance_miles: s.comparison.distance_miles,
                price_per_sqft: s.comparison.price_per_sqft,
                candidate: s.candidate,
            })
            .collect();

        stats.results_count = comps.len();
        debug!(
            candidates = stats.candidates_count,
            scored = stats.scored_count,
            returned = stats.results_count,
            "ranking complete"
        );

        Ok(Ranking { comps, stats })
    }

    /// Validate a candidate and return its distance from the subject
    fn screen(&self, origin: &Coordinates, candidate: &Candidate) -> std::result::Result<f64, Exclusion> {
        let location = candidate.property.coordinates().map_err(Exclusion::Unusable)?;
        if !candidate.property.has_size_signal() {
            return Err(Exclusion::Unusable(Error::InsufficientData(
                "neither living area nor lot size is known".to_string(),
            )));
        }

        let distance = origin.miles_to(&location);
        if distance > self.config.max_radius_miles {
            return Err(Exclusion::OutOfRadius(distance));
        }
        Ok(distance)
    }

    fn score_all(&self, subject: &Subject, survivors: Vec<(usize, Candidate, f64)>) -> Vec<Scored> {
        let score = |(index, candidate, distance): (usize, Candidate, f64)| {
            let comparison = self.scorer.compare(subject, &candidate, distance);
            Scored { index, candidate, comparison }
        };

        // collect() on an indexed parallel iterator keeps input order
        if survivors.len() >= PARALLEL_THRESHOLD {
            survivors.into_par_iter().map(score).collect()
        } else {
            survivors.into_iter().map(score).collect()
        }
    }
}
