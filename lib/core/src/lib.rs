//! # CompSift Core
//!
//! Core data model for the CompSift comparable-property engine.
//!
//! - [`Property`], [`Subject`], [`Candidate`] - normalized property records
//! - [`Measure`] - a quantity that is either known or explicitly unknown
//! - [`Coordinates`] - validated latitude/longitude with haversine distance
//! - [`Error`] - the error taxonomy shared by every CompSift crate
//!
//! ## Example
//!
//! ```rust
//! use compsift_core::{Candidate, Measure};
//! use serde_json::json;
//!
//! let candidate: Candidate = serde_json::from_value(json!({
//!     "address": "12 Oak St",
//!     "gla": "1,800 sqft",
//!     "lot_size_sf": "",
//! })).unwrap();
//!
//! assert_eq!(candidate.property.gla, Measure::Known(1800.0));
//! assert_eq!(candidate.property.lot_size, Measure::Unknown);
//! ```

pub mod error;
pub mod geo;
pub mod normalize;
pub mod property;

pub use error::{Error, Result};
pub use geo::{distance_miles, haversine_miles, Coordinates, EARTH_RADIUS_MILES};
pub use normalize::{normalize_text, normalize_value, parse_date, parse_numeric, Measure, NOT_AVAILABLE};
pub use property::{Candidate, Property, Subject};
