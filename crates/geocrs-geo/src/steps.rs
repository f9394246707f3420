//! Evaluation of `Transformation` values
//!
//! A `Transformation` is plain data. Preparing it builds the projection
//! engines and Helmert matrices and resolves grid files once, so evaluating a
//! point does no allocation and no parameter checks.

use crate::geocentric::{from_geocentric, to_geocentric};
use crate::helmert::HelmertMatrix;
use crate::ntv2::{GridResolver, Ntv2Grid};
use crate::projections::ProjectionEngine;
use geocrs_core::error::{CrsError, Result};
use geocrs_core::models::{AxisUnitTransform, Ellipsoid, Point3d, PolynomialTransform, Transformation};
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Step {
    Projection { engine: ProjectionEngine, inverse: bool },
    Geocentric { ellipsoid: Ellipsoid, inverse: bool },
    Helmert { matrix: HelmertMatrix, inverse: bool },
    Ntv2 { grid: Arc<Ntv2Grid>, inverse: bool },
    Polynomial(PolynomialTransform),
    AxisUnit(AxisUnitTransform),
}

impl Step {
    fn apply(&self, p: Point3d) -> Result<Point3d> {
        match self {
            Step::Projection { engine, inverse: false } => {
                let (x, y) = engine.forward(p.x, p.y)?;
                Ok(Point3d::new(x, y, p.z))
            }
            Step::Projection { engine, inverse: true } => {
                let (lon, lat) = engine.inverse(p.x, p.y)?;
                Ok(Point3d::new(lon, lat, p.z))
            }
            Step::Geocentric { ellipsoid, inverse: false } => {
                let (x, y, z) = to_geocentric(ellipsoid, p.x, p.y, p.z)?;
                Ok(Point3d::new(x, y, z))
            }
            Step::Geocentric { ellipsoid, inverse: true } => {
                let (lon, lat, h) = from_geocentric(ellipsoid, p.x, p.y, p.z)?;
                Ok(Point3d::new(lon, lat, h))
            }
            Step::Helmert { matrix, inverse } => {
                let (x, y, z) = if *inverse {
                    matrix.inverse(p.x, p.y, p.z)
                } else {
                    matrix.forward(p.x, p.y, p.z)
                };
                Ok(Point3d::new(x, y, z))
            }
            Step::Ntv2 { grid, inverse } => {
                let (lon, lat) = if *inverse {
                    grid.apply_inverse(p.x, p.y)?
                } else {
                    grid.apply(p.x, p.y)?
                };
                Ok(Point3d::new(lon, lat, p.z))
            }
            Step::Polynomial(poly) => {
                let (x, y) = poly.evaluate(p.x, p.y);
                Ok(Point3d::new(x, y, p.z))
            }
            Step::AxisUnit(axis) => {
                let (x, y, z) = axis.apply(p.x, p.y, p.z);
                Ok(Point3d::new(x, y, z))
            }
        }
    }
}

/// A transformation with all engines built and grids loaded
#[derive(Debug, Clone, Default)]
pub struct PreparedTransformation {
    steps: Vec<Step>,
}

impl PreparedTransformation {
    pub fn prepare(transformation: &Transformation, grids: &dyn GridResolver) -> Result<Self> {
        let mut steps = Vec::new();
        prepare_into(transformation, grids, &mut steps)?;
        tracing::debug!(steps = steps.len(), "Prepared transformation");
        Ok(Self { steps })
    }

    pub fn is_identity(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Run every step in order. A non-finite intermediate value is reported
    /// as `OutOfDomain` rather than passed on.
    pub fn apply(&self, point: Point3d) -> Result<Point3d> {
        if !point.is_finite() {
            return Err(CrsError::out_of_domain(format!("non-finite input {}", point)));
        }
        let mut current = point;
        for step in &self.steps {
            current = step.apply(current)?;
            if !current.is_finite() {
                return Err(CrsError::out_of_domain(format!("non-finite intermediate result {}", current)));
            }
        }
        Ok(current)
    }
}

fn prepare_into(transformation: &Transformation, grids: &dyn GridResolver, steps: &mut Vec<Step>) -> Result<()> {
    match transformation {
        Transformation::Identity => {}
        Transformation::Concatenated(parts) => {
            for part in parts {
                prepare_into(part, grids, steps)?;
            }
        }
        Transformation::Projection { ellipsoid, projection, inverse } => {
            steps.push(Step::Projection { engine: ProjectionEngine::new(ellipsoid, projection)?, inverse: *inverse });
        }
        Transformation::Geocentric { ellipsoid, inverse } => {
            steps.push(Step::Geocentric { ellipsoid: ellipsoid.clone(), inverse: *inverse });
        }
        Transformation::Helmert { params, inverse } => {
            if !params.is_identity() {
                steps.push(Step::Helmert { matrix: HelmertMatrix::new(params)?, inverse: *inverse });
            }
        }
        Transformation::Ntv2 { grid, inverse } => {
            steps.push(Step::Ntv2 { grid: grids.grid(grid)?, inverse: *inverse });
        }
        Transformation::Polynomial(poly) => steps.push(Step::Polynomial(poly.clone())),
        Transformation::AxisUnit(axis) => {
            if !axis.is_noop() {
                steps.push(Step::AxisUnit(*axis));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geocrs_core::models::{HelmertParams, Projection, TransverseMercator};
    use std::collections::HashMap;

    fn no_grids() -> HashMap<String, Arc<Ntv2Grid>> {
        HashMap::new()
    }

    fn utm32() -> Transformation {
        Transformation::Projection {
            ellipsoid: Ellipsoid::grs80(),
            projection: Projection::TransverseMercator(TransverseMercator {
                central_meridian: 9.0,
                latitude_of_origin: 0.0,
                scale_factor: 0.9996,
                false_easting: 500_000.0,
                false_northing: 0.0,
            }),
            inverse: false,
        }
    }

    #[test]
    fn test_identity_prepares_to_nothing() {
        let prepared = PreparedTransformation::prepare(&Transformation::Identity, &no_grids()).unwrap();
        assert!(prepared.is_identity());
        let p = Point3d::new(1.0, 2.0, 3.0);
        assert_eq!(prepared.apply(p).unwrap(), p);
    }

    #[test]
    fn test_degrees_to_utm() {
        let chain = Transformation::concatenate([
            Transformation::AxisUnit(AxisUnitTransform::new(false, 1.0_f64.to_radians(), 0.0, 1.0)),
            utm32(),
        ]);
        let prepared = PreparedTransformation::prepare(&chain, &no_grids()).unwrap();
        assert_eq!(prepared.step_count(), 2);
        let out = prepared.apply(Point3d::new(6.610765, 53.235916, 12.0)).unwrap();
        assert!((out.x - 340_545.996_170_07).abs() < 1e-5);
        assert!((out.y - 5_901_178.799_049_23).abs() < 1e-5);
        assert_eq!(out.z, 12.0);
    }

    #[test]
    fn test_chain_and_inverse_round_trip() {
        let chain = Transformation::concatenate([
            Transformation::AxisUnit(AxisUnitTransform::new(false, 1.0_f64.to_radians(), 0.0, 1.0)),
            Transformation::Geocentric { ellipsoid: Ellipsoid::bessel1841(), inverse: false },
            Transformation::Helmert {
                params: HelmertParams::seven_param(598.1, 73.7, 418.2, 0.202, 0.045, -2.455, 6.7),
                inverse: false,
            },
            Transformation::Geocentric { ellipsoid: Ellipsoid::grs80(), inverse: true },
            Transformation::AxisUnit(AxisUnitTransform::new(false, 1.0_f64.to_radians(), 0.0, 1.0).inverted()),
        ]);
        let forward = PreparedTransformation::prepare(&chain, &no_grids()).unwrap();
        let backward = PreparedTransformation::prepare(&chain.inverse().unwrap(), &no_grids()).unwrap();

        let input = Point3d::new(8.833_190_47, 54.900_173_35, 0.0);
        let out = forward.apply(input).unwrap();
        assert!((out.x - 8.832_131_15).abs() < 1e-7);
        assert!((out.y - 54.898_464_42).abs() < 1e-7);

        let back = backward.apply(out).unwrap();
        assert!((back.x - input.x).abs() < 1e-9);
        assert!((back.y - input.y).abs() < 1e-9);
        assert!(back.z.abs() < 1e-4);
    }

    #[test]
    fn test_missing_grid_fails_at_prepare() {
        let chain = Transformation::Ntv2 { grid: "BETA2007.gsb".to_string(), inverse: false };
        let result = PreparedTransformation::prepare(&chain, &no_grids());
        assert!(matches!(result, Err(CrsError::OutOfDomain { .. })));
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let prepared = PreparedTransformation::prepare(&utm32(), &no_grids()).unwrap();
        let result = prepared.apply(Point3d::new(f64::NAN, 0.5, 0.0));
        assert!(matches!(result, Err(CrsError::OutOfDomain { .. })));
    }
}
