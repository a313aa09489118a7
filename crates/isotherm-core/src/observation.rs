//! Point climate observations in column layout.
//!
//! `coords[i]` is `[lon, lat]` of record `i`; every feature column holds one
//! value per record. The provider is expected to have deduplicated and
//! aggregated the records already (see [`crate::aggregate`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SurfaceError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationSet {
    coords: Vec<[f64; 2]>,
    feature_values: BTreeMap<String, Vec<f64>>,
}

/// Usable samples of one feature: coordinates and values of equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSamples {
    pub points: Vec<[f64; 2]>,
    pub values: Vec<f64>,
}

impl ObservationSet {
    /// Build and validate a set.
    ///
    /// Fails with `InvalidObservation` if a coordinate is non-finite or a
    /// feature column length differs from `coords.len()`.
    pub fn new(coords: Vec<[f64; 2]>, feature_values: BTreeMap<String, Vec<f64>>) -> Result<Self> {
        let set = Self { coords, feature_values };
        set.validate()?;
        Ok(set)
    }

    /// Re-check invariants, e.g. after deserialising.
    pub fn validate(&self) -> Result<()> {
        if let Some(index) = self
            .coords
            .iter()
            .position(|[lon, lat]| !lon.is_finite() || !lat.is_finite())
        {
            return Err(SurfaceError::InvalidObservation {
                index,
                reason: format!("non-finite coordinate {:?}", self.coords[index]),
            });
        }
        for (name, column) in &self.feature_values {
            if column.len() != self.coords.len() {
                return Err(SurfaceError::InvalidObservation {
                    index: column.len().min(self.coords.len()),
                    reason: format!(
                        "feature `{name}` has {} values for {} coordinates",
                        column.len(),
                        self.coords.len()
                    ),
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn coords(&self) -> &[[f64; 2]] {
        &self.coords
    }

    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.feature_values.keys().map(String::as_str)
    }

    pub fn feature(&self, name: &str) -> Result<&[f64]> {
        self.feature_values
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| SurfaceError::UnknownFeature(name.to_string()))
    }

    /// Coordinates and values of `name`, skipping records whose value is
    /// non-finite (a missing observation for this feature).
    pub fn samples(&self, name: &str) -> Result<FeatureSamples> {
        let column = self.feature(name)?;
        let (points, values) = self
            .coords
            .iter()
            .zip(column)
            .filter(|(_, v)| v.is_finite())
            .map(|(p, &v)| (*p, v))
            .unzip();
        Ok(FeatureSamples { points, values })
    }
}
