//! Per-location aggregation of raw observation records.
//!
//! Raw climate exports repeat each station once per day. Before interpolation
//! the records are grouped by exact `(lat, lon)` and each feature reduced to a
//! single scalar, e.g. mean temperature and summed precipitation.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SurfaceError};
use crate::observation::ObservationSet;

/// How one feature is reduced across the records of a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Mean,
    Sum,
}

impl FromStr for Aggregation {
    type Err = SurfaceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "sum" => Ok(Self::Sum),
            _ => Err(SurfaceError::InvalidConfig(format!("unknown aggregation `{s}` (expected mean or sum)"))),
        }
    }
}

/// Daily climate export rules: temperatures averaged, precipitation summed.
pub fn standard_rules() -> BTreeMap<String, Aggregation> {
    [
        ("temperature_2m_max", Aggregation::Mean),
        ("temperature_2m_min", Aggregation::Mean),
        ("precipitation_sum", Aggregation::Sum),
        ("temperature_2m_avg", Aggregation::Mean),
    ]
    .into_iter()
    .map(|(name, how)| (name.to_string(), how))
    .collect()
}

/// One un-aggregated observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub lon: f64,
    pub lat: f64,
    pub values: BTreeMap<String, f64>,
}

fn location_order(a: &RawRecord, b: &RawRecord) -> Ordering {
    a.lat.total_cmp(&b.lat).then(a.lon.total_cmp(&b.lon))
}

fn reduce(values: impl Iterator<Item = f64>, how: Aggregation) -> f64 {
    // Missing or NaN values are skipped: an empty mean is NaN, an empty sum 0.
    let (sum, n) = values
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    match how {
        Aggregation::Sum => sum,
        Aggregation::Mean if n == 0 => f64::NAN,
        Aggregation::Mean => sum / n as f64,
    }
}

/// Group `records` by location and reduce every feature named in `rules`.
///
/// Output rows are ordered by latitude, then longitude. Features absent from
/// `rules` are dropped.
pub fn aggregate(records: &[RawRecord], rules: &BTreeMap<String, Aggregation>) -> Result<ObservationSet> {
    let mut sorted: Vec<&RawRecord> = records.iter().collect();
    sorted.sort_by(|a, b| location_order(a, b));

    let mut coords = Vec::new();
    let mut columns: BTreeMap<String, Vec<f64>> =
        rules.keys().map(|k| (k.clone(), Vec::new())).collect();

    for group in sorted.chunk_by(|a, b| location_order(a, b) == Ordering::Equal) {
        coords.push([group[0].lon, group[0].lat]);
        for (name, &how) in rules {
            let reduced = reduce(group.iter().filter_map(|r| r.values.get(name).copied()), how);
            if let Some(column) = columns.get_mut(name) {
                column.push(reduced);
            }
        }
    }

    ObservationSet::new(coords, columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(lon: f64, lat: f64, t: f64, p: f64) -> RawRecord {
        let mut values = BTreeMap::new();
        values.insert("temperature_2m_avg".to_string(), t);
        values.insert("precipitation_sum".to_string(), p);
        RawRecord { lon, lat, values }
    }

    fn rules() -> BTreeMap<String, Aggregation> {
        let mut rules = BTreeMap::new();
        rules.insert("temperature_2m_avg".to_string(), Aggregation::Mean);
        rules.insert("precipitation_sum".to_string(), Aggregation::Sum);
        rules
    }

    #[test]
    fn groups_by_location_and_reduces() {
        let records = vec![
            record(80.0, 7.0, 26.0, 10.0),
            record(81.0, 6.5, 29.0, 1.0),
            record(80.0, 7.0, 28.0, 5.0),
        ];
        let set = aggregate(&records, &rules()).unwrap();

        assert_eq!(set.len(), 2);
        // Sorted by latitude: (81.0, 6.5) first.
        assert_eq!(set.coords(), &[[81.0, 6.5], [80.0, 7.0]]);
        let t = set.feature("temperature_2m_avg").unwrap();
        assert_relative_eq!(t[1], 27.0);
        let p = set.feature("precipitation_sum").unwrap();
        assert_relative_eq!(p[1], 15.0);
    }

    #[test]
    fn nan_values_are_skipped() {
        let records = vec![
            record(80.0, 7.0, f64::NAN, f64::NAN),
            record(80.0, 7.0, 24.0, f64::NAN),
        ];
        let set = aggregate(&records, &rules()).unwrap();
        assert_relative_eq!(set.feature("temperature_2m_avg").unwrap()[0], 24.0);
        assert_eq!(set.feature("precipitation_sum").unwrap()[0], 0.0);
    }

    #[test]
    fn all_missing_mean_is_nan() {
        let records = vec![record(80.0, 7.0, f64::NAN, 1.0)];
        let set = aggregate(&records, &rules()).unwrap();
        assert!(set.feature("temperature_2m_avg").unwrap()[0].is_nan());
    }

    #[test]
    fn empty_input_gives_empty_set() {
        let set = aggregate(&[], &rules()).unwrap();
        assert!(set.is_empty());
        assert!(set.feature("precipitation_sum").unwrap().is_empty());
    }

    #[test]
    fn rule_names_parse() {
        assert_eq!("mean".parse::<Aggregation>().unwrap(), Aggregation::Mean);
        assert_eq!(" SUM ".parse::<Aggregation>().unwrap(), Aggregation::Sum);
        assert!(matches!("median".parse::<Aggregation>(), Err(SurfaceError::InvalidConfig(_))));
    }

    #[test]
    fn standard_rules_sum_only_precipitation() {
        let rules = standard_rules();
        assert_eq!(rules.len(), 4);
        assert_eq!(rules["precipitation_sum"], Aggregation::Sum);
        assert!(rules
            .iter()
            .filter(|(name, _)| name.starts_with("temperature"))
            .all(|(_, &how)| how == Aggregation::Mean));
    }
}
