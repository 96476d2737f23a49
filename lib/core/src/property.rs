use crate::error::Result;
use crate::geo::Coordinates;
use crate::normalize::{
    deserialize_coordinate, deserialize_date, deserialize_id, deserialize_text, Measure,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Physical and locational attributes shared by subjects and candidates.
///
/// Every numeric field goes through the normalizer during deserialization,
/// so a `Property` never carries currency strings or unit suffixes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Property {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub address: String,
    #[serde(default, alias = "orderID", deserialize_with = "deserialize_id")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, alias = "lat", deserialize_with = "deserialize_coordinate")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "lon", alias = "lng", deserialize_with = "deserialize_coordinate")]
    pub longitude: Option<f64>,
    /// Gross living area in square feet
    #[serde(default, alias = "living_area")]
    pub gla: Measure,
    /// Lot size in square feet
    #[serde(default, alias = "lot_size_sf")]
    pub lot_size: Measure,
    #[serde(default)]
    pub year_built: Measure,
    #[serde(default, alias = "num_beds")]
    pub bedrooms: Measure,
    #[serde(default, alias = "num_baths")]
    pub bathrooms: Measure,
}

impl Property {
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into().trim().to_string(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn at(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    #[must_use]
    pub fn with_gla(mut self, gla: f64) -> Self {
        self.gla = Measure::from_f64(gla);
        self
    }

    #[must_use]
    pub fn with_lot_size(mut self, lot_size: f64) -> Self {
        self.lot_size = Measure::from_f64(lot_size);
        self
    }

    #[must_use]
    pub fn with_year_built(mut self, year: f64) -> Self {
        self.year_built = Measure::from_f64(year);
        self
    }

    #[must_use]
    pub fn with_rooms(mut self, bedrooms: f64, bathrooms: f64) -> Self {
        self.bedrooms = Measure::from_f64(bedrooms);
        self.bathrooms = Measure::from_f64(bathrooms);
        self
    }

    /// Validated location, or `InvalidCoordinates`
    pub fn coordinates(&self) -> Result<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }

    /// Whether there is any size attribute to compare against
    #[inline]
    pub fn has_size_signal(&self) -> bool {
        self.gla.is_known() || self.lot_size.is_known()
    }
}

/// The property being appraised
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(flatten)]
    pub property: Property,
    /// Effective (appraisal) date
    #[serde(default, deserialize_with = "deserialize_date")]
    pub effective_date: Option<NaiveDate>,
}

impl Subject {
    #[must_use]
    pub fn new(property: Property) -> Self {
        Self {
            property,
            effective_date: None,
        }
    }

    #[must_use]
    pub fn effective(mut self, date: NaiveDate) -> Self {
        self.effective_date = Some(date);
        self
    }
}

/// A previously sold property considered as a comparable.
///
/// An inbound `distance` field is ignored; distance is always derived.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(flatten)]
    pub property: Property,
    #[serde(default, alias = "sale_price")]
    pub close_price: Measure,
    #[serde(default, alias = "sale_date", deserialize_with = "deserialize_date")]
    pub close_date: Option<NaiveDate>,
}

impl Candidate {
    #[must_use]
    pub fn new(property: Property) -> Self {
        Self {
            property,
            close_price: Measure::Unknown,
            close_date: None,
        }
    }

    #[must_use]
    pub fn sold(mut self, price: f64, date: NaiveDate) -> Self {
        self.close_price = Measure::from_f64(price);
        self.close_date = Some(date);
        self
    }

    #[must_use]
    pub fn closed_on(mut self, date: NaiveDate) -> Self {
        self.close_date = Some(date);
        self
    }

    /// Stable label for logs: the external id, else the address
    pub fn label(&self) -> &str {
        self.property
            .id
            .as_deref()
            .unwrap_or(self.property.address.as_str())
    }
}
