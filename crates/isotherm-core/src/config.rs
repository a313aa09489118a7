use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SurfaceError};

/// Scattered-data interpolation method for the primary surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Value of the closest observation. Defined everywhere.
    Nearest,
    /// Barycentric interpolation on the Delaunay triangulation.
    Linear,
    /// Clough–Tocher C1 cubic on the Delaunay triangulation.
    #[default]
    Cubic,
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Linear => "linear",
            Self::Cubic => "cubic",
        }
    }

    /// Minimum number of distinct observations the method accepts.
    pub fn min_points(&self) -> usize {
        match self {
            Self::Nearest => 1,
            Self::Linear | Self::Cubic => 3,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = SurfaceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "linear" => Ok(Self::Linear),
            "cubic" => Ok(Self::Cubic),
            _ => Err(SurfaceError::UnknownMethod(s.to_string())),
        }
    }
}

/// Tunables for one surface generation.
/// Defaults reproduce the reference behaviour (500×500 grid, cubic, σ = 10).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolationConfig {
    /// Grid nodes per axis (R in R×R). Must be ≥ 2.
    pub resolution: usize,
    pub method: Method,
    /// Gaussian spread of the smoothing fallback, in grid cells.
    pub smoothing_sigma: f64,
    /// Kernel radius in units of sigma.
    pub smoothing_truncate: f64,
    /// Sweep limit for the cubic gradient estimator.
    pub gradient_max_iterations: usize,
    /// Relative change at which the gradient estimator stops.
    pub gradient_tolerance: f64,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            resolution: 500,
            method: Method::Cubic,
            smoothing_sigma: 10.0,
            smoothing_truncate: 4.0,
            gradient_max_iterations: 400,
            gradient_tolerance: 1e-6,
        }
    }
}

impl InterpolationConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SurfaceError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.resolution < 2 {
            return Err(SurfaceError::InvalidConfig(format!(
                "resolution must be at least 2, got {}",
                self.resolution
            )));
        }
        if !(self.smoothing_sigma.is_finite() && self.smoothing_sigma > 0.0) {
            return Err(SurfaceError::InvalidConfig(format!(
                "smoothing_sigma must be positive, got {}",
                self.smoothing_sigma
            )));
        }
        if !(self.smoothing_truncate.is_finite() && self.smoothing_truncate > 0.0) {
            return Err(SurfaceError::InvalidConfig(format!(
                "smoothing_truncate must be positive, got {}",
                self.smoothing_truncate
            )));
        }
        if self.gradient_max_iterations == 0 {
            return Err(SurfaceError::InvalidConfig(
                "gradient_max_iterations must be at least 1".into(),
            ));
        }
        if !(self.gradient_tolerance.is_finite() && self.gradient_tolerance > 0.0) {
            return Err(SurfaceError::InvalidConfig(format!(
                "gradient_tolerance must be positive, got {}",
                self.gradient_tolerance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("nearest".parse::<Method>().unwrap(), Method::Nearest);
        assert_eq!(" Linear ".parse::<Method>().unwrap(), Method::Linear);
        assert_eq!("CUBIC".parse::<Method>().unwrap(), Method::Cubic);
    }

    #[test]
    fn unknown_method_is_rejected() {
        let err = "kriging".parse::<Method>().unwrap_err();
        assert_eq!(err, SurfaceError::UnknownMethod("kriging".into()));
    }

    #[test]
    fn defaults_match_reference_behaviour() {
        let c = InterpolationConfig::default();
        assert_eq!(c.resolution, 500);
        assert_eq!(c.method, Method::Cubic);
        assert_eq!(c.smoothing_sigma, 10.0);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c = InterpolationConfig::from_json(r#"{"resolution": 64, "method": "linear"}"#).unwrap();
        assert_eq!(c.resolution, 64);
        assert_eq!(c.method, Method::Linear);
        assert_eq!(c.gradient_max_iterations, 400);
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        let err = InterpolationConfig::from_json(r#"{"resolution": 1}"#).unwrap_err();
        assert!(matches!(err, SurfaceError::InvalidConfig(_)));

        let c = InterpolationConfig { smoothing_sigma: 0.0, ..Default::default() };
        assert!(c.validate().is_err());

        let err = InterpolationConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, SurfaceError::InvalidConfig(_)));
    }
}
