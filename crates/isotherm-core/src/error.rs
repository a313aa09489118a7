//! Failure taxonomy for the surface pipeline.
//!
//! Every stage returns one of these; no stage logs, prints, or returns a
//! partially resolved raster. Reporting is the caller's job.

use thiserror::Error;

use crate::config::Method;

/// Errors produced while building an interpolated surface.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    /// Bounding box has zero or negative extent, or a non-finite corner.
    #[error("invalid bounds: lon [{lon_min}, {lon_max}], lat [{lat_min}, {lat_max}]")]
    InvalidBounds {
        lon_min: f64,
        lat_min: f64,
        lon_max: f64,
        lat_max: f64,
    },

    /// Too few distinct (or only collinear) observations for the method.
    #[error("{method} interpolation needs at least {required} distinct non-collinear points, got {provided}")]
    InsufficientData {
        method: Method,
        required: usize,
        provided: usize,
    },

    /// Interpolation method name not recognised.
    #[error("unknown interpolation method `{0}` (expected nearest, linear or cubic)")]
    UnknownMethod(String),

    /// Boundary geometry is empty or malformed.
    #[error("invalid boundary geometry: {0}")]
    Geometry(String),

    /// Requested feature is not a column of the observation set.
    #[error("unknown feature `{0}`")]
    UnknownFeature(String),

    /// An observation record violates the data model.
    #[error("invalid observation at index {index}: {reason}")]
    InvalidObservation { index: usize, reason: String },

    /// Configuration value out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// In-boundary cells still undefined after every fallback stage ran.
    #[error("{remaining} cells inside the boundary are still undefined after gap filling")]
    UnresolvedGaps { remaining: usize },
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, SurfaceError>;
