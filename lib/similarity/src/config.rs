//! Scoring configuration
//!
//! Weights, notable thresholds, search radius and result size. All values
//! are deterministic heuristics, tunable from a JSON file; none are learned.

use serde::{Deserialize, Serialize};

/// Default maximum search radius in miles
pub const DEFAULT_MAX_RADIUS_MILES: f64 = 5.0;

/// Default number of comps returned
pub const DEFAULT_TOP_N: usize = 3;

/// Per-attribute penalty weights.
///
/// Each weight multiplies the attribute's difference in its natural unit:
/// miles, relative fraction of the subject's area, months, rooms or years.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringWeights {
    /// Penalty per mile of distance
    pub distance: f64,
    /// Penalty per unit of relative living-area difference (0.10 = 10%)
    pub gla: f64,
    /// Penalty per unit of relative lot-size difference
    pub lot_size: f64,
    /// Penalty per month between close date and effective date
    pub recency: f64,
    /// Penalty per bedroom of difference
    pub bedrooms: f64,
    /// Penalty per bathroom of difference
    pub bathrooms: f64,
    /// Penalty per year of difference in year built
    pub year_built: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            distance: 10.0,
            gla: 20.0,
            lot_size: 5.0,
            recency: 0.5,
            bedrooms: 1.0,
            bathrooms: 1.0,
            year_built: 0.1,
        }
    }
}

impl ScoringWeights {
    fn entries(&self) -> [(&'static str, f64); 7] {
        [
            ("distance", self.distance),
            ("gla", self.gla),
            ("lot_size", self.lot_size),
            ("recency", self.recency),
            ("bedrooms", self.bedrooms),
            ("bathrooms", self.bathrooms),
            ("year_built", self.year_built),
        ]
    }
}

/// How close an attribute must be before it is surfaced as a reason
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReasonThresholds {
    pub distance_miles: f64,
    /// Relative living-area difference, as a fraction
    pub gla_pct: f64,
    /// Relative lot-size difference, as a fraction
    pub lot_size_pct: f64,
    pub months: f64,
    pub bedrooms: f64,
    pub bathrooms: f64,
    pub year_built: f64,
}

impl Default for ReasonThresholds {
    fn default() -> Self {
        Self {
            distance_miles: 1.0,
            gla_pct: 0.10,
            lot_size_pct: 0.20,
            months: 6.0,
            bedrooms: 1.0,
            bathrooms: 1.0,
            year_built: 10.0,
        }
    }
}

impl ReasonThresholds {
    fn entries(&self) -> [(&'static str, f64); 7] {
        [
            ("distance_miles", self.distance_miles),
            ("gla_pct", self.gla_pct),
            ("lot_size_pct", self.lot_size_pct),
            ("months", self.months),
            ("bedrooms", self.bedrooms),
            ("bathrooms", self.bathrooms),
            ("year_built", self.year_built),
        ]
    }
}

/// Full ranking configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankerConfig {
    #[serde(default)]
    pub weights: ScoringWeights,

    #[serde(default)]
    pub thresholds: ReasonThresholds,

    /// Candidates farther than this are excluded, not penalized
    #[serde(default = "default_max_radius")]
    pub max_radius_miles: f64,

    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Divisor for the absolute living-area difference when the subject's area is zero
    #[serde(default = "default_gla_fallback_scale")]
    pub gla_fallback_scale: f64,

    /// Divisor for the absolute lot-size difference when the subject's lot is zero
    #[serde(default = "default_lot_fallback_scale")]
    pub lot_fallback_scale: f64,
}

fn default_max_radius() -> f64 {
    DEFAULT_MAX_RADIUS_MILES
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_gla_fallback_scale() -> f64 {
    1_000.0
}

fn default_lot_fallback_scale() -> f64 {
    10_000.0
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            thresholds: ReasonThresholds::default(),
            max_radius_miles: DEFAULT_MAX_RADIUS_MILES,
            top_n: DEFAULT_TOP_N,
            gla_fallback_scale: default_gla_fallback_scale(),
            lot_fallback_scale: default_lot_fallback_scale(),
        }
    }
}

impl RankerConfig {
    /// Validate the configuration
    /// - Weights and thresholds must be finite and non-negative
    /// - Radius and fallback scales must be positive
    /// - At least one comp must be requested
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, weight) in self.weights.entries() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidWeight(name.to_string(), weight));
            }
        }

        for (name, threshold) in self.thresholds.entries() {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(ConfigError::InvalidThreshold(name.to_string(), threshold));
            }
        }

        if !self.max_radius_miles.is_finite() || self.max_radius_miles <= 0.0 {
            return Err(ConfigError::InvalidRadius(self.max_radius_miles));
        }

        if self.top_n == 0 {
            return Err(ConfigError::ZeroTopN);
        }

        for (name, scale) in [
            ("gla_fallback_scale", self.gla_fallback_scale),
            ("lot_fallback_scale", self.lot_fallback_scale),
        ] {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(ConfigError::InvalidScale(name.to_string(), scale));
            }
        }

        Ok(())
    }

    /// Copy of this configuration with per-request overrides applied and validated
    pub fn with_overrides(
        &self,
        top_n: Option<usize>,
        max_radius_miles: Option<f64>,
    ) -> Result<RankerConfig, ConfigError> {
        let mut modified = self.clone();
        if let Some(top_n) = top_n {
            modified.top_n = top_n;
        }
        if let Some(radius) = max_radius_miles {
            modified.max_radius_miles = radius;
        }
        modified.validate()?;
        Ok(modified)
    }
}

/// Errors that can occur during configuration validation
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("Weight '{0}' must be finite and non-negative, got {1}")]
    InvalidWeight(String, f64),

    #[error("Threshold '{0}' must be finite and non-negative, got {1}")]
    InvalidThreshold(String, f64),

    #[error("Maximum radius must be positive, got {0}")]
    InvalidRadius(f64),

    #[error("top_n must be at least 1")]
    ZeroTopN,

    #[error("Scale '{0}' must be positive, got {1}")]
    InvalidScale(String, f64),
}

impl From<ConfigError> for compsift_core::Error {
    fn from(e: ConfigError) -> Self {
        compsift_core::Error::InvalidConfig(e.to_string())
    }
}
