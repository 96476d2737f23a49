//! Human-readable justifications for ranked comps
//!
//! Reasons are read straight off a [`Comparison`], so an explanation can
//! never disagree with the score that ranked the comp.

use crate::config::ReasonThresholds;
use crate::scorer::{Attribute, AttributeDelta, Comparison, Difference};
use ordered_float::OrderedFloat;
use std::cmp::Reverse;

/// Builds ordered reason lists from comparisons
#[derive(Debug, Clone, Copy)]
pub struct ReasonGenerator {
    thresholds: ReasonThresholds,
}

impl ReasonGenerator {
    pub fn new(thresholds: ReasonThresholds) -> Self {
        Self { thresholds }
    }

    /// Explain one comparison.
    ///
    /// Notable attributes come first, largest weighted contribution first
    /// (fixed attribute order on ties). Data-quality notes follow.
    pub fn explain(&self, comparison: &Comparison) -> Vec<String> {
        let mut notable: Vec<(usize, &AttributeDelta, String)> = comparison
            .deltas
            .iter()
            .enumerate()
            .filter_map(|(order, delta)| self.describe(delta).map(|text| (order, delta, text)))
            .collect();

        notable.sort_by_key(|(order, delta, _)| (Reverse(OrderedFloat(delta.contribution)), *order));

        let mut reasons: Vec<String> = notable.into_iter().map(|(_, _, text)| text).collect();

        if comparison.missing_price {
            reasons.push("No recorded sale price (missing market evidence)".to_string());
        }

        let unknown: Vec<&str> = comparison.unknown_attributes().map(|a| a.label()).collect();
        if !unknown.is_empty() {
            reasons.push(format!("Reduced confidence: {} unknown", unknown.join(", ")));
        }

        reasons
    }

    /// Reason text for an attribute within its notable threshold
    fn describe(&self, delta: &AttributeDelta) -> Option<String> {
        let t = &self.thresholds;
        match (delta.attribute, delta.difference) {
            (_, Difference::Unknown) => None,
            (Attribute::Distance, Difference::Absolute(miles)) if miles <= t.distance_miles => {
                let shown = (ceil_eps(miles * 10.0) / 10.0).max(0.1);
                Some(format!("Within {:.1} miles", shown))
            }
            (Attribute::LivingArea, Difference::Relative(fraction)) if fraction <= t.gla_pct => {
                Some(similar_size("living area", fraction))
            }
            (Attribute::LotSize, Difference::Relative(fraction)) if fraction <= t.lot_size_pct => {
                Some(similar_size("lot size", fraction))
            }
            (Attribute::Recency, Difference::Absolute(months)) if months <= t.months => {
                let shown = ceil_eps(months).max(1.0) as u32;
                let unit = if shown == 1 { "month" } else { "months" };
                Some(format!("Sold within {} {} of the effective date", shown, unit))
            }
            (Attribute::Bedrooms, Difference::Absolute(diff)) if diff <= t.bedrooms => {
                Some(same_or_within("bedroom count", diff))
            }
            (Attribute::Bathrooms, Difference::Absolute(diff)) if diff <= t.bathrooms => {
                Some(same_or_within("bathroom count", diff))
            }
            (Attribute::YearBuilt, Difference::Absolute(years)) if years <= t.year_built => {
                if years == 0.0 {
                    Some("Built the same year".to_string())
                } else {
                    Some(format!("Built within {} years of the subject", format_count(years)))
                }
            }
            _ => None,
        }
    }
}

/// Ceiling that ignores float noise just above an integer
fn ceil_eps(value: f64) -> f64 {
    (value - 1e-9).ceil()
}

fn similar_size(label: &str, fraction: f64) -> String {
    if fraction == 0.0 {
        format!("Same {}", label)
    } else {
        let pct = ceil_eps(fraction * 100.0).max(1.0);
        format!("Similar {} (within {:.0}%)", label, pct)
    }
}

fn same_or_within(label: &str, diff: f64) -> String {
    if diff == 0.0 {
        format!("Same {}", label)
    } else {
        let mut text = format!("{} within {}", label, format_count(diff));
        text[..1].make_ascii_uppercase();
        text
    }
}

fn format_count(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}
