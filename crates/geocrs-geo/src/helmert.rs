//! Helmert similarity transform on geocentric coordinates

use geocrs_core::error::{CrsError, Result};
use geocrs_core::models::HelmertParams;
use nalgebra::{Matrix3, Vector3};

const ARC_SECOND: f64 = std::f64::consts::PI / (180.0 * 3600.0);

/// A Helmert transform in matrix form: `X' = T + M X` with `M = (1 + s) R`.
/// The exact inverse is precomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct HelmertMatrix {
    translation: Vector3<f64>,
    matrix: Matrix3<f64>,
    inverse: Matrix3<f64>,
}

impl HelmertMatrix {
    pub fn new(params: &HelmertParams) -> Result<Self> {
        params.validate()?;
        let (rx, ry, rz) = (params.rx * ARC_SECOND, params.ry * ARC_SECOND, params.rz * ARC_SECOND);
        let scale = 1.0 + params.ppm * 1e-6;
        #[rustfmt::skip]
        let rotation = Matrix3::new(
            1.0, -rz,  ry,
             rz, 1.0, -rx,
            -ry,  rx, 1.0,
        );
        let matrix = rotation * scale;
        let inverse = matrix
            .try_inverse()
            .ok_or_else(|| CrsError::invalid("helmert", "rotation matrix is singular"))?;
        Ok(Self { translation: Vector3::new(params.dx, params.dy, params.dz), matrix, inverse })
    }

    pub fn forward(&self, x: f64, y: f64, z: f64) -> (f64, f64, f64) {
        let out = self.translation + self.matrix * Vector3::new(x, y, z);
        (out.x, out.y, out.z)
    }

    pub fn inverse(&self, x: f64, y: f64, z: f64) -> (f64, f64, f64) {
        let out = self.inverse * (Vector3::new(x, y, z) - self.translation);
        (out.x, out.y, out.z)
    }
}
