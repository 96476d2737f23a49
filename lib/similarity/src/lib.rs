//! # CompSift Similarity
//!
//! Comparable-property selection for appraisals.
//!
//! Given one subject property and a set of sold candidates, this crate
//! decides which candidates are comparable, scores them, orders them and
//! explains each pick.
//!
//! ## Features
//!
//! - **Scoring configuration**: documented, tunable penalty weights
//! - **Penalty scoring**: per-attribute deltas combined into one score, lower is better
//! - **Ranking**: screening, radius cut-off, deterministic ordering, top-N
//! - **Explainability**: reasons derived from the same deltas that produced the score
//!
//! ## Example
//!
//! ```rust
//! use compsift_core::{Candidate, Property, Subject};
//! use compsift_similarity::{CompRanker, RankerConfig};
//!
//! let subject = Subject::new(Property::new("1 Main St").at(40.0, -74.0).with_gla(2000.0));
//! let candidates = vec![
//!     Candidate::new(Property::new("2 Main St").at(40.005, -74.0).with_gla(1950.0)),
//!     Candidate::new(Property::new("3 Main St").at(40.05, -74.0).with_gla(2500.0)),
//! ];
//!
//! let ranker = CompRanker::new(RankerConfig::default()).unwrap();
//! let ranking = ranker.rank(&subject, candidates).unwrap();
//!
//! assert_eq!(ranking.comps[0].candidate.property.address, "2 Main St");
//! assert!(!ranking.comps[0].reasons.is_empty());
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Config    │────>│   Scorer    │────>│ Comparison  │
//! │  (weights)  │     │ (per pair)  │     │  (deltas)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!       │                                        │
//!       │              ┌─────────────┐           │
//!       └─────────────>│   Ranker    │<──────────┘
//!                      │ (screen/top)│
//!                      └─────────────┘
//!                             │
//!                      ┌─────────────┐
//!                      │   Reasons   │
//!                      │  (explain)  │
//!                      └─────────────┘
//! ```

pub mod config;
pub mod scorer;
pub mod rank;
pub mod reasons;

// Re-export main types for convenience
pub use config::{
    RankerConfig,
    ScoringWeights,
    ReasonThresholds,
    ConfigError,
    DEFAULT_MAX_RADIUS_MILES,
    DEFAULT_TOP_N,
};
pub use scorer::{Attribute, AttributeDelta, Comparison, Difference, Scorer};
pub use rank::{CompRanker, RankedComp, Ranking, RankingStats, PARALLEL_THRESHOLD};
pub use reasons::ReasonGenerator;
