//! Gridded climate surfaces from scattered station observations.
//!
//! Given point observations and a region boundary, build a regular grid over
//! the boundary, interpolate one feature onto it, fill cells the interpolant
//! leaves undefined, and mask everything outside the boundary.

pub mod aggregate;
pub mod boundary;
pub mod config;
pub mod error;
pub mod gap_fill;
pub mod grid;
pub mod interpolate;
pub mod mask;
pub mod observation;
pub mod pipeline;
pub mod raster;
pub mod smoothing;
pub mod triangulation;

pub use boundary::Boundary;
pub use config::{InterpolationConfig, Method};
pub use error::{Result, SurfaceError};
pub use gap_fill::{GapFillChain, GapFillReport};
pub use grid::{Bounds, Grid};
pub use observation::ObservationSet;
pub use pipeline::{interpolate_with_gap_filling, SurfaceEngine, SurfaceResult};
pub use raster::MaskedRaster;
