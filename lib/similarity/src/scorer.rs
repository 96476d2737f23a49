//! Per-attribute comparison and penalty scoring
//!
//! A [`Comparison`] holds the raw difference and the weighted contribution
//! of every attribute for one subject/candidate pair. Lower penalty means a
//! better match. Attributes unknown on either side contribute nothing and
//! are flagged instead.

use crate::config::{RankerConfig, ScoringWeights};
use compsift_core::{Candidate, Measure, Subject};
use serde::Serialize;

/// Average month length used when converting day gaps to months
const DAYS_PER_MONTH: f64 = 30.0;

/// Scored attributes, in their fixed tie-break order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Distance,
    LivingArea,
    LotSize,
    Recency,
    Bedrooms,
    Bathrooms,
    YearBuilt,
}

impl Attribute {
    pub const ALL: [Attribute; 7] = [
        Attribute::Distance,
        Attribute::LivingArea,
        Attribute::LotSize,
        Attribute::Recency,
        Attribute::Bedrooms,
        Attribute::Bathrooms,
        Attribute::YearBuilt,
    ];

    /// Human-readable name used in explanations
    pub fn label(&self) -> &'static str {
        match self {
            Attribute::Distance => "distance",
            Attribute::LivingArea => "living area",
            Attribute::LotSize => "lot size",
            Attribute::Recency => "sale date",
            Attribute::Bedrooms => "bedrooms",
            Attribute::Bathrooms => "bathrooms",
            Attribute::YearBuilt => "year built",
        }
    }

    fn weight(&self, weights: &ScoringWeights) -> f64 {
        match self {
            Attribute::Distance => weights.distance,
            Attribute::LivingArea => weights.gla,
            Attribute::LotSize => weights.lot_size,
            Attribute::Recency => weights.recency,
            Attribute::Bedrooms => weights.bedrooms,
            Attribute::Bathrooms => weights.bathrooms,
            Attribute::YearBuilt => weights.year_built,
        }
    }
}

/// Raw difference between subject and candidate for one attribute
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Difference {
    /// Fraction of the subject's value (0.05 = 5%)
    Relative(f64),
    /// Difference in the attribute's own unit
    Absolute(f64),
    /// One side is unknown; the attribute was skipped
    Unknown,
}

impl Difference {
    #[inline]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Difference::Unknown)
    }
}

/// One attribute's share of a comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AttributeDelta {
    pub attribute: Attribute,
    pub difference: Difference,
    /// Weighted penalty added to the total
    pub contribution: f64,
}

impl AttributeDelta {
    fn unknown(attribute: Attribute) -> Self {
        Self {
            attribute,
            difference: Difference::Unknown,
            contribution: 0.0,
        }
    }
}

/// Per-pair comparison, consumed by the ranker and the reason generator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub distance_miles: f64,
    /// One entry per [`Attribute::ALL`], in that order
    pub deltas: Vec<AttributeDelta>,
    pub price_per_sqft: Option<f64>,
    /// The candidate has no usable close price
    pub missing_price: bool,
    pub penalty: f64,
}

impl Comparison {
    pub fn delta(&self, attribute: Attribute) -> Option<&AttributeDelta> {
        self.deltas.iter().find(|d| d.attribute == attribute)
    }

    /// Attributes skipped because a value was unknown
    pub fn unknown_attributes(&self) -> impl Iterator<Item = Attribute> + '_ {
        self.deltas
            .iter()
            .filter(|d| d.difference.is_unknown())
            .map(|d| d.attribute)
    }

    #[inline]
    pub fn has_unknowns(&self) -> bool {
        self.unknown_attributes().next().is_some()
    }
}

/// Weighted penalty scorer
#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    weights: ScoringWeights,
    gla_fallback_scale: f64,
    lot_fallback_scale: f64,
}

impl Scorer {
    pub fn new(config: &RankerConfig) -> Self {
        Self {
            weights: config.weights,
            gla_fallback_scale: config.gla_fallback_scale,
            lot_fallback_scale: config.lot_fallback_scale,
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Compare a candidate against the subject at an already computed distance
    pub fn compare(&self, subject: &Subject, candidate: &Candidate, distance_miles: f64) -> Comparison {
        let s = &subject.property;
        let c = &candidate.property;

        let deltas: Vec<AttributeDelta> = Attribute::ALL
            .iter()
            .map(|&attribute| match attribute {
                Attribute::Distance => self.absolute(attribute, Some(distance_miles)),
                Attribute::LivingArea => {
                    self.relative(attribute, s.gla, c.gla, self.gla_fallback_scale)
                }
                Attribute::LotSize => {
                    self.relative(attribute, s.lot_size, c.lot_size, self.lot_fallback_scale)
                }
                Attribute::Recency => {
                    let months = subject
                        .effective_date
                        .zip(candidate.close_date)
                        .map(|(effective, closed)| {
                            (effective - closed).num_days().abs() as f64 / DAYS_PER_MONTH
                        });
                    self.absolute(attribute, months)
                }
                Attribute::Bedrooms => self.count(attribute, s.bedrooms, c.bedrooms),
                Attribute::Bathrooms => self.count(attribute, s.bathrooms, c.bathrooms),
                Attribute::YearBuilt => self.count(attribute, s.year_built, c.year_built),
            })
            .collect();

        let penalty = deltas.iter().map(|d| d.contribution).sum();

        let price_per_sqft = candidate
            .close_price
            .zip(c.gla)
            .filter(|(_, gla)| *gla > 0.0)
            .map(|(price, gla)| price / gla);

        Comparison {
            distance_miles,
            deltas,
            price_per_sqft,
            missing_price: !candidate.close_price.is_known(),
            penalty,
        }
    }

    /// Linear penalty on an absolute difference
    fn absolute(&self, attribute: Attribute, difference: Option<f64>) -> AttributeDelta {
        match difference {
            Some(diff) => AttributeDelta {
                attribute,
                difference: Difference::Absolute(diff),
                contribution: attribute.weight(&self.weights) * diff,
            },
            None => AttributeDelta::unknown(attribute),
        }
    }

    fn count(&self, attribute: Attribute, subject: Measure, candidate: Measure) -> AttributeDelta {
        let diff = subject.zip(candidate).map(|(s, c)| (c - s).abs());
        self.absolute(attribute, diff)
    }

    /// Relative difference against the subject's value.
    ///
    /// A zero subject value cannot be a divisor, so the absolute difference
    /// is scaled by `fallback_scale` instead.
    fn relative(
        &self,
        attribute: Attribute,
        subject: Measure,
        candidate: Measure,
        fallback_scale: f64,
    ) -> AttributeDelta {
        let Some((s, c)) = subject.zip(candidate) else {
            return AttributeDelta::unknown(attribute);
        };

        let weight = attribute.weight(&self.weights);
        let diff = (c - s).abs();
        if s > 0.0 {
            let fraction = diff / s;
            AttributeDelta {
                attribute,
                difference: Difference::Relative(fraction),
                contribution: weight * fraction,
            }
        } else {
            AttributeDelta {
                attribute,
                difference: Difference::Absolute(diff),
                contribution: weight * diff / fallback_scale,
            }
        }
    }
}
