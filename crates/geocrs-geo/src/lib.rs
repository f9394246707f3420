//! GeoCRS Geo - Projection engines and datum-shift math
//!
//! Forward and inverse projections for every supported family, geographic to
//! geocentric conversion, Helmert similarity transforms, NTv2 grid shifts, and
//! the prepared form of a `Transformation` that evaluates points.

pub mod geocentric;
pub mod helmert;
pub mod ntv2;
pub mod projections;
pub mod steps;

pub use ntv2::{GridResolver, Ntv2Grid};
pub use projections::ProjectionEngine;
pub use steps::PreparedTransformation;
