//! # CompSift
//!
//! Comparable-property ("comps") selection for residential appraisals.
//!
//! Given a subject property and a pool of sold candidates, CompSift filters
//! out candidates it cannot compare, scores the rest with a weighted
//! penalty (lower is better), returns the best few and explains each pick
//! in plain language.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! compsift --data-file appraisals.json --http-port 8000
//! compsift backtest --data-file appraisals.json --per-appraisal
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use compsift::prelude::*;
//!
//! let subject = Subject::new(Property::new("1 Main St").at(40.0, -74.0).with_gla(2000.0));
//! let candidates = vec![
//!     Candidate::new(Property::new("2 Main St").at(40.001, -74.0).with_gla(2010.0)),
//!     Candidate::new(Property::new("9 Far Rd").at(40.2, -74.0).with_gla(2000.0)),
//! ];
//!
//! let ranker = CompRanker::new(RankerConfig::default()).unwrap();
//! let ranking = ranker.rank(&subject, candidates).unwrap();
//!
//! // The far candidate is outside the default 5 mile radius
//! assert_eq!(ranking.comps.len(), 1);
//! assert_eq!(ranking.stats.out_of_radius, 1);
//! ```
//!
//! ## Crate Structure
//!
//! - [`compsift_core`] - property model, normalization, geodesic distance, errors
//! - [`compsift_similarity`] - scoring weights, penalty scoring, ranking, reasons
//! - [`compsift_storage`] - appraisal dataset loading, local and remote sources
//! - [`compsift_api`] - REST API
//! - [`backtest`] - agreement between the ranker and recorded appraiser picks

pub mod backtest;

// Re-export core types
pub use compsift_core::{
    distance_miles, haversine_miles, Candidate, Coordinates, Error, Measure, Property, Result,
    Subject,
};

// Re-export ranking
pub use compsift_similarity::{
    CompRanker, RankedComp, RankerConfig, Ranking, RankingStats, ReasonThresholds, ScoringWeights,
};

// Re-export storage
pub use compsift_storage::{AppraisalDataset, AppraisalRecord, AppraisalRepository, AppraisalSource};

// Re-export API
pub use compsift_api::{AppState, RestApi};

/// Prelude module for convenient imports
pub mod prelude {
    pub use compsift_core::{Candidate, Coordinates, Error, Measure, Property, Result, Subject};
    pub use compsift_similarity::{CompRanker, RankedComp, RankerConfig, Ranking, ScoringWeights};
    pub use compsift_storage::{AppraisalRecord, AppraisalRepository, AppraisalSource};
}
