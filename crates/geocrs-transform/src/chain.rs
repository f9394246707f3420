//! Resolved transformation chains

use geocrs_core::error::{CrsError, Result};
use geocrs_core::models::{Crs, CrsKind, Point3d, Transformation};
use geocrs_geo::PreparedTransformation;
use rayon::prelude::*;
use std::sync::Arc;

/// How the `z` ordinate is treated, from whether each side carries a height
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightMode {
    /// Both sides carry heights; `z` takes part in the chain
    Carry,
    /// Neither side does; the chain runs on the ellipsoid and `z` is returned
    /// untouched
    PassThrough,
    /// Only the target does; input points are placed on the ellipsoid
    Surface,
    /// Only the source does; the output `z` is zero
    Drop,
}

impl HeightMode {
    pub fn between(source: &Crs, target: &Crs) -> Self {
        match (source.has_height(), target.has_height()) {
            (true, true) => HeightMode::Carry,
            (false, false) => HeightMode::PassThrough,
            (false, true) => HeightMode::Surface,
            (true, false) => HeightMode::Drop,
        }
    }
}

/// A chain between two CRSs with its steps prepared for evaluation
#[derive(Debug)]
pub struct TransformationChain {
    pub source: Arc<Crs>,
    pub target: Arc<Crs>,
    pub transformation: Transformation,
    /// Step names in application order
    pub description: Vec<String>,
    height: HeightMode,
    default_height: Option<f64>,
    stores: Vec<String>,
    prepared: PreparedTransformation,
}

impl TransformationChain {
    pub(crate) fn new(
        source: Arc<Crs>,
        target: Arc<Crs>,
        transformation: Transformation,
        prepared: PreparedTransformation,
        mut stores: Vec<String>,
    ) -> Self {
        let default_height = match &source.kind {
            CrsKind::Compound(c) => Some(c.default_height),
            _ => None,
        };
        stores.extend(source.store.iter().cloned());
        stores.extend(target.store.iter().cloned());
        stores.sort();
        stores.dedup();
        Self {
            height: HeightMode::between(&source, &target),
            description: transformation.describe(),
            source,
            target,
            transformation,
            default_height,
            stores,
            prepared,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.prepared.is_identity()
    }

    pub fn height_mode(&self) -> HeightMode {
        self.height
    }

    /// Stores whose definitions went into this chain
    pub fn stores(&self) -> &[String] {
        &self.stores
    }

    pub fn involves_store(&self, store_id: &str) -> bool {
        self.stores.iter().any(|s| s == store_id)
    }

    /// Transform one point
    pub fn apply(&self, point: Point3d) -> Result<Point3d> {
        let mut input = point;
        if let Some(height) = self.default_height {
            if !input.z.is_finite() {
                input.z = height;
            }
        }
        if matches!(self.height, HeightMode::PassThrough | HeightMode::Surface) {
            input.z = 0.0;
        }
        let output = self.prepared.apply(input)?;
        Ok(match self.height {
            HeightMode::PassThrough => Point3d { z: point.z, ..output },
            HeightMode::Drop => Point3d { z: 0.0, ..output },
            HeightMode::Carry | HeightMode::Surface => output,
        })
    }

    /// Transform a batch, keeping count and order. Any failing point fails
    /// the whole batch; the error names the lowest failing index. Batches of
    /// at least `parallel_threshold` points are spread over the rayon pool.
    pub fn evaluate(&self, points: &[Point3d], parallel_threshold: usize) -> Result<Vec<Point3d>> {
        let results: Vec<Result<Point3d>> = if points.len() >= parallel_threshold {
            points.par_iter().map(|p| self.apply(*p)).collect()
        } else {
            points.iter().map(|p| self.apply(*p)).collect()
        };

        let mut output = Vec::with_capacity(points.len());
        for (index, result) in results.into_iter().enumerate() {
            output.push(result.map_err(|e| self.point_error(index, e))?);
        }
        Ok(output)
    }

    pub(crate) fn point_error(&self, index: usize, error: CrsError) -> CrsError {
        let reason = match error {
            CrsError::OutOfDomain { reason } => reason,
            other => other.to_string(),
        };
        CrsError::PointTransformation {
            source_crs: self.source.id(),
            target_crs: self.target.id(),
            index,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geocrs_core::code::CrsCode;
    use geocrs_core::models::{
        AngularUnit, AxisOrder, AxisUnitTransform, CompoundCrs, CrsIdentifier, GeodeticDatum, GeographicCrs,
        LinearUnit,
    };
    use std::collections::HashMap;

    fn geographic(code: &str) -> Crs {
        Crs::new(
            CrsIdentifier::single(CrsCode::parse(code), code),
            CrsKind::Geographic(GeographicCrs::new(GeodeticDatum::wgs84(), AxisOrder::EastNorth, AngularUnit::Degree)),
        )
    }

    fn compound(code: &str, default_height: f64) -> Crs {
        Crs::new(
            CrsIdentifier::single(CrsCode::parse(code), code),
            CrsKind::Compound(CompoundCrs {
                underlying: Box::new(geographic("EPSG:4326")),
                height_unit: LinearUnit::Metre,
                default_height,
            }),
        )
    }

    fn shift_chain(source: Crs, target: Crs) -> TransformationChain {
        let transformation = Transformation::AxisUnit(AxisUnitTransform::new(false, 1.0, 10.0, 1.0));
        let prepared = PreparedTransformation::prepare(&transformation, &HashMap::new()).unwrap();
        TransformationChain::new(Arc::new(source), Arc::new(target), transformation, prepared, vec![])
    }

    #[test]
    fn test_height_pass_through() {
        let chain = shift_chain(geographic("A:1"), geographic("A:2"));
        assert_eq!(chain.height_mode(), HeightMode::PassThrough);
        let out = chain.apply(Point3d::new(1.0, 2.0, 123.0)).unwrap();
        assert_eq!(out, Point3d::new(11.0, 2.0, 123.0));
    }

    #[test]
    fn test_default_height_fills_missing_z() {
        let chain = shift_chain(compound("A:3", 50.0), compound("A:4", 0.0));
        assert_eq!(chain.height_mode(), HeightMode::Carry);
        let out = chain.apply(Point3d::new(1.0, 2.0, f64::NAN)).unwrap();
        assert_eq!(out.z, 50.0);
    }

    #[test]
    fn test_drop_height() {
        let chain = shift_chain(compound("A:3", 0.0), geographic("A:1"));
        let out = chain.apply(Point3d::new(1.0, 2.0, 99.0)).unwrap();
        assert_eq!(out.z, 0.0);
    }

    #[test]
    fn test_batch_reports_lowest_failing_index() {
        let chain = shift_chain(geographic("A:1"), geographic("A:2"));
        let mut points = vec![Point3d::new_2d(0.0, 0.0); 10];
        points[3].x = f64::INFINITY;
        points[7].y = f64::NAN;
        for threshold in [1, 1000] {
            match chain.evaluate(&points, threshold) {
                Err(CrsError::PointTransformation { index, source_crs, target_crs, .. }) => {
                    assert_eq!(index, 3);
                    assert_eq!(source_crs, "a:1");
                    assert_eq!(target_crs, "a:2");
                }
                other => panic!("unexpected result {:?}", other),
            }
        }
    }

    #[test]
    fn test_batch_keeps_order() {
        let chain = shift_chain(geographic("A:1"), geographic("A:2"));
        let points: Vec<_> = (0..100).map(|i| Point3d::new_2d(i as f64, 0.0)).collect();
        let out = chain.evaluate(&points, 10).unwrap();
        assert_eq!(out.len(), 100);
        assert!(out.iter().enumerate().all(|(i, p)| p.x == i as f64 + 10.0));
    }

    #[test]
    fn test_stores_collected() {
        let chain = shift_chain(geographic("A:1").with_store("s1"), geographic("A:2").with_store("s2"));
        assert_eq!(chain.stores(), &["s1".to_string(), "s2".to_string()]);
        assert!(chain.involves_store("s2"));
        assert!(!chain.involves_store("s3"));
    }
}
