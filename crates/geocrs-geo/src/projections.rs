//! Projection engines
//!
//! Every engine works on geographic radians (longitude relative to Greenwich)
//! and projected metres. Parameters are checked and derived constants computed
//! once at construction; `forward`/`inverse` never return NaN, reporting
//! `OutOfDomain` instead.

mod laea;
mod lcc;
mod mercator;
mod stereographic;
mod tm;

pub use laea::LambertAzimuthalEqualAreaEngine;
pub use lcc::LambertConformalConicEngine;
pub use mercator::MercatorEngine;
pub use stereographic::StereographicEngine;
pub use tm::TransverseMercatorEngine;

use geocrs_core::error::{CrsError, Result};
use geocrs_core::models::{Ellipsoid, Projection};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// A ready-to-use projection, one variant per family
#[derive(Debug, Clone)]
pub enum ProjectionEngine {
    TransverseMercator(TransverseMercatorEngine),
    LambertConformalConic(LambertConformalConicEngine),
    LambertAzimuthalEqualArea(LambertAzimuthalEqualAreaEngine),
    Stereographic(StereographicEngine),
    Mercator(MercatorEngine),
}

impl ProjectionEngine {
    /// Validate the parameters and precompute the family constants
    pub fn new(ellipsoid: &Ellipsoid, projection: &Projection) -> Result<Self> {
        projection.validate()?;
        Ok(match projection {
            Projection::TransverseMercator(p) => {
                ProjectionEngine::TransverseMercator(TransverseMercatorEngine::new(ellipsoid, p))
            }
            Projection::LambertConformalConic(p) => {
                ProjectionEngine::LambertConformalConic(LambertConformalConicEngine::new(ellipsoid, p)?)
            }
            Projection::LambertAzimuthalEqualArea(p) => ProjectionEngine::LambertAzimuthalEqualArea(
                LambertAzimuthalEqualAreaEngine::new(ellipsoid, p),
            ),
            Projection::Stereographic(p) => {
                ProjectionEngine::Stereographic(StereographicEngine::new(ellipsoid, p))
            }
            Projection::Mercator(p) => ProjectionEngine::Mercator(MercatorEngine::new(ellipsoid, p)),
        })
    }

    /// Geographic (lon, lat) in radians to projected (x, y) in metres
    pub fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(CrsError::out_of_domain(format!("non-finite coordinate ({}, {})", lon, lat)));
        }
        if lat.abs() > FRAC_PI_2 + 1e-12 {
            return Err(CrsError::out_of_domain(format!(
                "latitude {:.9} degrees beyond a pole",
                lat.to_degrees()
            )));
        }
        let lat = lat.clamp(-FRAC_PI_2, FRAC_PI_2);
        let (x, y) = match self {
            ProjectionEngine::TransverseMercator(e) => e.forward(lon, lat)?,
            ProjectionEngine::LambertConformalConic(e) => e.forward(lon, lat)?,
            ProjectionEngine::LambertAzimuthalEqualArea(e) => e.forward(lon, lat)?,
            ProjectionEngine::Stereographic(e) => e.forward(lon, lat)?,
            ProjectionEngine::Mercator(e) => e.forward(lon, lat)?,
        };
        finite_pair(self.name(), x, y)
    }

    /// Projected (x, y) in metres to geographic (lon, lat) in radians
    pub fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            return Err(CrsError::out_of_domain(format!("non-finite coordinate ({}, {})", x, y)));
        }
        let (lon, lat) = match self {
            ProjectionEngine::TransverseMercator(e) => e.inverse(x, y)?,
            ProjectionEngine::LambertConformalConic(e) => e.inverse(x, y)?,
            ProjectionEngine::LambertAzimuthalEqualArea(e) => e.inverse(x, y)?,
            ProjectionEngine::Stereographic(e) => e.inverse(x, y)?,
            ProjectionEngine::Mercator(e) => e.inverse(x, y)?,
        };
        let (lon, lat) = finite_pair(self.name(), lon, lat)?;
        Ok((adjust_lon(lon), lat))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProjectionEngine::TransverseMercator(_) => "Transverse Mercator",
            ProjectionEngine::LambertConformalConic(_) => "Lambert Conformal Conic",
            ProjectionEngine::LambertAzimuthalEqualArea(_) => "Lambert Azimuthal Equal Area",
            ProjectionEngine::Stereographic(_) => "Oblique Stereographic",
            ProjectionEngine::Mercator(_) => "Mercator",
        }
    }
}

fn finite_pair(name: &str, a: f64, b: f64) -> Result<(f64, f64)> {
    if a.is_finite() && b.is_finite() {
        Ok((a, b))
    } else {
        Err(CrsError::out_of_domain(format!("{} produced no finite result", name)))
    }
}

/// Wrap a longitude into [-pi, pi]
pub(crate) fn adjust_lon(lon: f64) -> f64 {
    if lon.abs() <= PI {
        return lon;
    }
    let wrapped = (lon + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped == -PI && lon > 0.0 {
        PI
    } else {
        wrapped
    }
}

/// Conformal latitude helper t(phi) = tan(pi/4 - phi/2) / ((1 - e sin phi)/(1 + e sin phi))^(e/2)
pub(crate) fn tsfn(phi: f64, e: f64) -> f64 {
    let sinphi = e * phi.sin();
    (FRAC_PI_4 - 0.5 * phi).tan() / ((1.0 - sinphi) / (1.0 + sinphi)).powf(0.5 * e)
}

/// Invert `tsfn` by fixed point iteration
pub(crate) fn phi_from_ts(ts: f64, e: f64) -> Result<f64> {
    let half_e = 0.5 * e;
    let mut phi = FRAC_PI_2 - 2.0 * ts.atan();
    for _ in 0..30 {
        let con = e * phi.sin();
        let next = FRAC_PI_2 - 2.0 * (ts * ((1.0 - con) / (1.0 + con)).powf(half_e)).atan();
        if (next - phi).abs() < 1e-14 {
            return Ok(next);
        }
        phi = next;
    }
    Err(CrsError::out_of_domain("latitude iteration did not converge"))
}

/// m(phi) = cos phi / sqrt(1 - e² sin² phi)
pub(crate) fn msfn(phi: f64, es: f64) -> f64 {
    let s = phi.sin();
    phi.cos() / (1.0 - es * s * s).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjust_lon() {
        assert_eq!(adjust_lon(1.0), 1.0);
        assert!((adjust_lon(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-15);
        assert!((adjust_lon(-3.0 * PI / 2.0) - PI / 2.0).abs() < 1e-15);
        assert_eq!(adjust_lon(PI), PI);
    }

    #[test]
    fn test_tsfn_inverse() {
        let e = Ellipsoid::grs80().eccentricity();
        for deg in [-80.0_f64, -30.0, 0.0, 12.5, 60.0, 89.0] {
            let phi = deg.to_radians();
            let back = phi_from_ts(tsfn(phi, e), e).unwrap();
            assert!((back - phi).abs() < 1e-13);
        }
    }
}
